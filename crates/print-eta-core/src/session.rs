//! The single owner of ETA state: settings, cycle state and sent-value shadows.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::cycle::{percent_complete, refresh, CycleState, Refresh};
use crate::event::{PrintEvent, SessionEvent, TimerAction};
use crate::format::NOT_READY;
use crate::telemetry::TelemetrySnapshot;
use crate::timer::CycleTimer;

/// Printer-side collaborator: telemetry queries and the command channel.
pub trait PrinterLink {
    /// Current progress telemetry, read on demand.
    fn current_snapshot(&self) -> TelemetrySnapshot;
    fn is_printing(&self) -> bool;
    /// Queue a command line for the printer. Fire-and-forget.
    fn send_command(&self, line: &str);
}

/// UI-side collaborator. Fire-and-forget.
pub trait UiNotifier {
    fn notify_eta(&self, eta_string: &str);
}

/// ETA session for one host process.
///
/// Every [`SessionEvent`] is handled to completion before the next; timer
/// ticks arrive as events too, so nothing here needs locking.
pub struct EtaSession<P, U> {
    printer: P,
    ui: U,
    settings: Settings,
    state: CycleState,
    timer: CycleTimer,
    eta_string: String,
    printer_message: String,
    previous_eta: String,
    previous_printer_message: String,
    previous_progress_command: String,
}

impl<P: PrinterLink, U: UiNotifier> EtaSession<P, U> {
    /// Create a session. Ticks from the cycle timer are posted to `tx`; the
    /// caller feeds them back through [`handle`](Self::handle).
    pub fn new(
        printer: P,
        ui: U,
        settings: Settings,
        tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let settings = settings.validated();
        let state = CycleState::initial(&settings.cycle.kinds);
        Self {
            printer,
            ui,
            settings,
            state,
            timer: CycleTimer::new(tx),
            eta_string: NOT_READY.to_string(),
            printer_message: String::new(),
            previous_eta: String::new(),
            previous_printer_message: String::new(),
            previous_progress_command: String::new(),
        }
    }

    pub fn printer(&self) -> &P {
        &self.printer
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cycle_state(&self) -> CycleState {
        self.state
    }

    /// Most recently computed ETA string (`-` when not ready).
    pub fn eta_string(&self) -> &str {
        &self.eta_string
    }

    /// Most recently computed printer message (empty when not ready).
    pub fn printer_message(&self) -> &str {
        &self.printer_message
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Process one inbound event.
    pub fn handle<Tz>(&mut self, event: SessionEvent, now: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match event {
            SessionEvent::Progress(snapshot) => self.refresh_with(&snapshot, now),
            SessionEvent::Lifecycle(event) => self.on_lifecycle(event, now),
            SessionEvent::SettingsChanged(settings) => {
                self.apply_settings(settings);
                let snapshot = self.printer.current_snapshot();
                self.refresh_with(&snapshot, now);
            }
            SessionEvent::Tick { generation } => {
                if !self.timer.accepts(generation) {
                    log::debug!("dropping tick from stopped timer (generation {generation})");
                    return;
                }
                self.state.advance(&self.settings.cycle.kinds);
                let snapshot = self.printer.current_snapshot();
                self.refresh_with(&snapshot, now);
            }
        }
    }

    fn on_lifecycle<Tz>(&mut self, event: PrintEvent, now: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        log::debug!("lifecycle event: {event:?}");

        match event.timer_action() {
            Some(TimerAction::Start) => {
                if event == PrintEvent::PrintStarted {
                    self.state = CycleState::initial(&self.settings.cycle.kinds);
                }
                if self.settings.cycle.enabled {
                    self.timer.start(self.settings.cycle.interval());
                }
            }
            Some(TimerAction::Stop) => self.timer.stop(),
            None => {}
        }

        if event == PrintEvent::ClientOpened {
            // A new client starts from the placeholder; resend even if unchanged.
            self.previous_eta.clear();
        }

        let snapshot = self.printer.current_snapshot();
        self.refresh_with(&snapshot, now);
    }

    fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.validated();
        let was_enabled = self.settings.cycle.enabled;
        self.settings = settings;

        let cycle = &self.settings.cycle;
        self.state.normalize(&cycle.kinds);

        if !cycle.enabled {
            self.timer.stop();
        } else if !was_enabled {
            if self.printer.is_printing() {
                self.timer.start(cycle.interval());
            }
        } else {
            self.timer.reschedule(cycle.interval());
        }
    }

    fn refresh_with<Tz>(&mut self, snapshot: &TelemetrySnapshot, now: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let Refresh {
            eta_string,
            printer_message,
            state,
            ready,
        } = refresh(
            snapshot,
            &self.settings.display(),
            &self.settings.cycle,
            self.state,
            now,
        );
        self.state = state;
        self.eta_string = eta_string;
        self.printer_message = printer_message;

        if !ready {
            return;
        }

        self.dispatch(snapshot);
    }

    fn dispatch(&mut self, snapshot: &TelemetrySnapshot) {
        if self.eta_string != self.previous_eta {
            self.previous_eta.clone_from(&self.eta_string);
            self.ui.notify_eta(&self.eta_string);
        }

        if !self.printer.is_printing() {
            return;
        }

        if self.settings.show_eta_on_printer
            && !self.printer_message.trim().is_empty()
            && self.printer_message != self.previous_printer_message
        {
            self.previous_printer_message.clone_from(&self.printer_message);
            self.printer
                .send_command(&format!("M117 {}", self.printer_message));
        }

        if self.settings.send_progress_to_printer {
            if let Some(command) = progress_command(snapshot) {
                if command != self.previous_progress_command {
                    self.printer.send_command(&command);
                    self.previous_progress_command = command;
                }
            }
        }
    }
}

/// `M73 P<percent> R<minutes>` progress directive.
fn progress_command(snapshot: &TelemetrySnapshot) -> Option<String> {
    let percent = percent_complete(snapshot)?;
    let mut command = format!("M73 P{percent}");
    if let Some(remaining) = snapshot.print_time_remaining {
        command.push_str(&format!(" R{}", remaining / 60));
    }
    Some(command)
}
