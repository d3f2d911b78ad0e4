//! Status message rotation: which message is due, and what it says.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::ops::Bound;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::config::{CycleConfig, DisplayConfig};
use crate::format::{
    apply_printer_display_constraints, format_duration, format_finish_time, NOT_READY,
};
use crate::telemetry::TelemetrySnapshot;
use crate::CoreError;

/// A status message shown on the printer display.
///
/// Variant order is the canonical cycling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Eta,
    Elapsed,
    Remaining,
    Percent,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] = [Self::Eta, Self::Elapsed, Self::Remaining, Self::Percent];

    pub fn label(self) -> &'static str {
        match self {
            Self::Eta => "eta",
            Self::Elapsed => "elapsed",
            Self::Remaining => "remaining",
            Self::Percent => "percent",
        }
    }
}

impl FromStr for MessageKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eta" => Ok(Self::Eta),
            "elapsed" => Ok(Self::Elapsed),
            "remaining" => Ok(Self::Remaining),
            "percent" => Ok(Self::Percent),
            other => Err(CoreError::Config(format!("unknown message kind: {other}"))),
        }
    }
}

/// Next message kind after `current` among `included`, wrapping around.
///
/// `current` need not be included itself (e.g. after a settings change dropped
/// it): the result is the first included kind after it, else the first
/// included kind. `None` iff `included` is empty.
pub fn advance(
    current: Option<MessageKind>,
    included: &BTreeSet<MessageKind>,
) -> Option<MessageKind> {
    let after = current.and_then(|kind| {
        included
            .range((Bound::Excluded(kind), Bound::Unbounded))
            .next()
    });
    after.or_else(|| included.first()).copied()
}

/// The currently active message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleState {
    pub current: Option<MessageKind>,
}

impl CycleState {
    /// Start of a rotation: the first included kind.
    pub fn initial(included: &BTreeSet<MessageKind>) -> Self {
        Self {
            current: included.first().copied(),
        }
    }

    /// Move to the next kind (timer tick).
    pub fn advance(&mut self, included: &BTreeSet<MessageKind>) {
        self.current = advance(self.current, included);
    }

    /// Re-establish membership after the included set changed.
    pub fn normalize(&mut self, included: &BTreeSet<MessageKind>) {
        let stale = match self.current {
            Some(kind) => !included.contains(&kind),
            None => !included.is_empty(),
        };
        if stale {
            self.advance(included);
        }
    }
}

/// Completion percent, preferring the ratio of elapsed to total time.
///
/// Remaining-time estimators adjust `printTimeLeft` without touching the
/// host's own completion figure, so the recomputed value tracks them better.
pub fn percent_complete(snapshot: &TelemetrySnapshot) -> Option<u64> {
    match (snapshot.print_time_elapsed, snapshot.print_time_remaining) {
        (Some(elapsed), Some(remaining)) if elapsed > 0 || remaining > 0 => {
            let elapsed = u128::from(elapsed);
            let total = elapsed + u128::from(remaining);
            Some((elapsed * 100 / total) as u64)
        }
        _ => snapshot
            .completion
            .map(|completion| completion.clamp(0.0, 100.0) as u64),
    }
}

/// Render one status message. Unknown inputs give an empty message.
pub fn render(kind: MessageKind, snapshot: &TelemetrySnapshot, eta_string: &str) -> String {
    match kind {
        MessageKind::Eta => format!("ETA: {eta_string}"),
        MessageKind::Elapsed => snapshot
            .print_time_elapsed
            .map(|secs| format!("Elapsed: {}", format_duration(secs)))
            .unwrap_or_default(),
        MessageKind::Remaining => snapshot
            .print_time_remaining
            .map(|secs| format!("Remaining: {}", format_duration(secs)))
            .unwrap_or_default(),
        MessageKind::Percent => percent_complete(snapshot)
            .map(|percent| format!("{percent}% complete"))
            .unwrap_or_default(),
    }
}

/// Output of one refresh, to be diffed against previously sent values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refresh {
    pub eta_string: String,
    /// Printer display text with display constraints applied (no command prefix).
    pub printer_message: String,
    pub state: CycleState,
    /// False when telemetry was not ready; nothing should be dispatched.
    pub ready: bool,
}

/// Compute the ETA string and the active printer message for a snapshot.
///
/// With cycling disabled, or no kinds selected, the printer shows the ETA.
pub fn refresh<Tz>(
    snapshot: &TelemetrySnapshot,
    display: &DisplayConfig,
    cycle: &CycleConfig,
    state: CycleState,
    now: &DateTime<Tz>,
) -> Refresh
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(remaining) = snapshot.print_time_remaining else {
        log::debug!("remaining print time unknown, ETA not ready");
        return Refresh {
            eta_string: NOT_READY.to_string(),
            printer_message: String::new(),
            state,
            ready: false,
        };
    };

    let eta_string = format_finish_time(remaining, now, display);
    let kind = match state.current {
        Some(kind) if cycle.enabled => kind,
        _ => MessageKind::Eta,
    };
    let message = render(kind, snapshot, &eta_string);
    let printer_message = apply_printer_display_constraints(&message, display.remove_colons);

    log::debug!("ETA string: {eta_string}, printer message ({}): {printer_message}", kind.label());

    Refresh {
        eta_string,
        printer_message,
        state,
        ready: true,
    }
}
