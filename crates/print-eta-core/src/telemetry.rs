//! Print progress telemetry as delivered by the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Point-in-time read of print progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Seconds since the print started.
    pub print_time_elapsed: Option<u64>,
    /// Estimated seconds until the print finishes.
    pub print_time_remaining: Option<u64>,
    /// Completion in percent (0-100), as estimated by the host.
    pub completion: Option<f64>,
}

impl TelemetrySnapshot {
    /// Parse from the host's current-data object, which nests progress under `progress`.
    pub fn from_current_data(data: &Value) -> Self {
        data.get("progress")
            .map(Self::from_progress)
            .unwrap_or_default()
    }

    /// Parse from a host progress object (`printTime`, `printTimeLeft`, `completion`).
    ///
    /// Times that are missing, null, negative or fractional are treated as unknown;
    /// the host reports them that way before a print has really begun.
    pub fn from_progress(progress: &Value) -> Self {
        Self {
            print_time_elapsed: progress.get("printTime").and_then(Value::as_u64),
            print_time_remaining: progress.get("printTimeLeft").and_then(Value::as_u64),
            completion: progress
                .get("completion")
                .and_then(Value::as_f64)
                .filter(|c| c.is_finite()),
        }
    }

    /// Whether there is enough data to compute an ETA.
    pub fn is_ready(&self) -> bool {
        self.print_time_remaining.is_some()
    }
}
