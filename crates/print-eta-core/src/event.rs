//! Inbound events for the ETA session.

use crate::config::Settings;
use crate::telemetry::TelemetrySnapshot;

/// Host lifecycle signals the session cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintEvent {
    PrintStarted,
    PrintPaused,
    PrintResumed,
    PrintDone,
    PrintCancelled,
    PrintFailed,
    FileRemoved,
    /// A UI client connected; it needs the current ETA.
    ClientOpened,
    /// Any other host event; triggers a refresh only.
    Other(String),
}

/// What a lifecycle event does to the cycle timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Stop,
}

impl PrintEvent {
    /// Map a host event name onto a lifecycle event.
    pub fn from_name(name: &str) -> Self {
        match name {
            "PrintStarted" => Self::PrintStarted,
            "PrintPaused" => Self::PrintPaused,
            "PrintResumed" => Self::PrintResumed,
            "PrintDone" => Self::PrintDone,
            "PrintCancelled" => Self::PrintCancelled,
            "PrintFailed" => Self::PrintFailed,
            "FileRemoved" => Self::FileRemoved,
            "ClientOpened" | "ClientConnected" => Self::ClientOpened,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn timer_action(&self) -> Option<TimerAction> {
        match self {
            Self::PrintStarted | Self::PrintResumed => Some(TimerAction::Start),
            Self::PrintPaused | Self::PrintDone | Self::PrintCancelled | Self::PrintFailed => {
                Some(TimerAction::Stop)
            }
            Self::FileRemoved | Self::ClientOpened | Self::Other(_) => None,
        }
    }
}

/// Messages processed, one at a time, by the session owner.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Fresh progress telemetry.
    Progress(TelemetrySnapshot),
    Lifecycle(PrintEvent),
    SettingsChanged(Settings),
    /// Cycle timer tick, tagged with the generation of the timer that sent it.
    Tick { generation: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_map_to_events() {
        assert_eq!(PrintEvent::from_name("PrintStarted"), PrintEvent::PrintStarted);
        assert_eq!(PrintEvent::from_name("ClientConnected"), PrintEvent::ClientOpened);
        assert_eq!(
            PrintEvent::from_name("ZChange"),
            PrintEvent::Other("ZChange".to_string())
        );
    }

    #[test]
    fn timer_actions() {
        assert_eq!(PrintEvent::PrintResumed.timer_action(), Some(TimerAction::Start));
        assert_eq!(PrintEvent::PrintFailed.timer_action(), Some(TimerAction::Stop));
        assert_eq!(PrintEvent::PrintPaused.timer_action(), Some(TimerAction::Stop));
        assert_eq!(PrintEvent::FileRemoved.timer_action(), None);
        assert_eq!(PrintEvent::Other("Connected".into()).timer_action(), None);
    }
}
