//! Print completion ETA computation for 3D printer hosts.
//!
//! The crate turns a telemetry snapshot (elapsed/remaining seconds, completion)
//! into a finish-time string for the host UI and a short status line for the
//! printer display, optionally rotating through elapsed/remaining/percent
//! messages on a timer. Transport to the UI and printer is left to the host
//! through the [`PrinterLink`] and [`UiNotifier`] traits.

use thiserror::Error;

pub mod config;
pub mod cycle;
pub mod event;
pub mod format;
pub mod session;
pub mod telemetry;
pub mod timer;

pub use config::{CycleConfig, DisplayConfig, Settings, MIN_INTERVAL_SECS};
pub use cycle::{advance, refresh, render, CycleState, MessageKind, Refresh};
pub use event::{PrintEvent, SessionEvent, TimerAction};
pub use format::{
    apply_printer_display_constraints, format_duration, format_finish_time, NOT_READY,
};
pub use session::{EtaSession, PrinterLink, UiNotifier};
pub use telemetry::TelemetrySnapshot;
pub use timer::CycleTimer;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for fallible core operations (configuration loading).
pub type Result<T> = std::result::Result<T, CoreError>;
