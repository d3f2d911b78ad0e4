use std::cell::Cell;

use serde_json::json;

use print_eta_core::{PrinterLink, TelemetrySnapshot, UiNotifier};

/// Printer side of the stdin/stdout host: remembers the latest telemetry and
/// printing flag, and writes commands to stdout.
#[derive(Default)]
pub struct StdoutPrinter {
    snapshot: Cell<TelemetrySnapshot>,
    printing: Cell<bool>,
}

impl StdoutPrinter {
    pub fn set_snapshot(&self, snapshot: TelemetrySnapshot) {
        self.snapshot.set(snapshot);
    }

    pub fn set_printing(&self, printing: bool) {
        self.printing.set(printing);
    }
}

impl PrinterLink for StdoutPrinter {
    fn current_snapshot(&self) -> TelemetrySnapshot {
        self.snapshot.get()
    }

    fn is_printing(&self) -> bool {
        self.printing.get()
    }

    fn send_command(&self, line: &str) {
        println!("{}", json!({ "type": "command", "line": line }));
    }
}

/// UI side of the host: plugin messages as JSON lines on stdout.
pub struct StdoutUi {
    pub identifier: String,
}

impl UiNotifier for StdoutUi {
    fn notify_eta(&self, eta_string: &str) {
        println!(
            "{}",
            json!({
                "type": "plugin_message",
                "plugin": self.identifier,
                "data": { "eta_string": eta_string },
            })
        );
    }
}
