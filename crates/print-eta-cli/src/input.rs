use serde_json::Value;

use print_eta_core::{PrintEvent, Settings, TelemetrySnapshot};

/// One line of host input, decoded.
#[derive(Debug, Clone)]
pub enum HostInput {
    /// Progress telemetry, optionally with the host's printing flag.
    Progress {
        snapshot: TelemetrySnapshot,
        printing: Option<bool>,
    },
    Event(PrintEvent),
    Settings(Settings),
    None,
}

/// Map a JSON line from the host onto an input.
///
/// Accepted shapes:
/// - `{"event": "PrintStarted"}`
/// - `{"progress": {"printTime": 15, "printTimeLeft": 45, "completion": 25.0}}`
/// - `{"current_data": {"state": {"flags": {"printing": true}}, "progress": {...}}}`
/// - `{"settings": {"remove_colons": true, "cycle": {...}}}`
pub fn map_line(line: &str) -> anyhow::Result<HostInput> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(HostInput::None);
    }

    let value: Value = serde_json::from_str(line)?;

    if let Some(name) = value.get("event").and_then(Value::as_str) {
        return Ok(HostInput::Event(PrintEvent::from_name(name)));
    }
    if let Some(progress) = value.get("progress") {
        return Ok(HostInput::Progress {
            snapshot: TelemetrySnapshot::from_progress(progress),
            printing: None,
        });
    }
    if let Some(data) = value.get("current_data") {
        let printing = data
            .pointer("/state/flags/printing")
            .and_then(Value::as_bool);
        return Ok(HostInput::Progress {
            snapshot: TelemetrySnapshot::from_current_data(data),
            printing,
        });
    }
    if let Some(settings) = value.get("settings") {
        let settings: Settings = serde_json::from_value(settings.clone())?;
        return Ok(HostInput::Settings(settings.validated()));
    }

    anyhow::bail!("unrecognized host input: {line}")
}

/// Printing flag implied by a lifecycle event, if any.
pub fn printing_after(event: &PrintEvent) -> Option<bool> {
    match event {
        PrintEvent::PrintStarted | PrintEvent::PrintResumed => Some(true),
        PrintEvent::PrintPaused
        | PrintEvent::PrintDone
        | PrintEvent::PrintCancelled
        | PrintEvent::PrintFailed => Some(false),
        PrintEvent::FileRemoved | PrintEvent::ClientOpened | PrintEvent::Other(_) => None,
    }
}
