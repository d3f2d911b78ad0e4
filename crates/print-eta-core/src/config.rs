//! User settings: display preferences, printer output switches and message cycling.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cycle::MessageKind;
use crate::Result;

/// Shortest allowed message cycle interval.
pub const MIN_INTERVAL_SECS: u64 = 10;

/// Formatting preferences read during a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub use_24_hour_clock: bool,
    pub use_fancy_text: bool,
    pub remove_colons: bool,
}

/// Which status messages rotate on the printer display, and how often.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub enabled: bool,
    /// Ordered by the canonical ETA < elapsed < remaining < percent order.
    pub kinds: BTreeSet<MessageKind>,
    pub interval_secs: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kinds: MessageKind::ALL.into_iter().collect(),
            interval_secs: 30,
        }
    }
}

impl CycleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(MIN_INTERVAL_SECS))
    }
}

/// Complete plugin settings as stored by the host.
///
/// Field names follow the host's settings keys so a settings dump can be
/// deserialized directly. Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Strip colons from printer messages (required by some firmwares).
    pub remove_colons: bool,
    /// Send the status message to the printer display.
    pub show_eta_on_printer: bool,
    /// Say "tomorrow" instead of a weekday label for next-day finishes.
    pub use_fancy_text: bool,
    /// 13:00 rather than 01:00 PM.
    pub use_twenty_four_hour_view: bool,
    /// Also send a progress directive (percent and minutes left).
    pub send_progress_to_printer: bool,
    pub cycle: CycleConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remove_colons: false,
            show_eta_on_printer: true,
            use_fancy_text: true,
            use_twenty_four_hour_view: true,
            send_progress_to_printer: false,
            cycle: CycleConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, validating the result.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&raw)?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse settings from TOML text, validating the result.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(raw)?;
        Ok(settings.validated())
    }

    /// Clamp out-of-range values. Idempotent.
    pub fn validated(mut self) -> Self {
        if self.cycle.interval_secs < MIN_INTERVAL_SECS {
            log::warn!(
                "cycle interval {}s is below the {}s minimum, using {}s",
                self.cycle.interval_secs,
                MIN_INTERVAL_SECS,
                MIN_INTERVAL_SECS
            );
            self.cycle.interval_secs = MIN_INTERVAL_SECS;
        }
        self
    }

    pub fn display(&self) -> DisplayConfig {
        DisplayConfig {
            use_24_hour_clock: self.use_twenty_four_hour_view,
            use_fancy_text: self.use_fancy_text,
            remove_colons: self.remove_colons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_host_defaults() {
        let settings = Settings::default();
        assert!(!settings.remove_colons);
        assert!(settings.show_eta_on_printer);
        assert!(settings.use_fancy_text);
        assert!(settings.use_twenty_four_hour_view);
        assert!(!settings.cycle.enabled);
        assert_eq!(settings.cycle.kinds.len(), 4);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn short_interval_is_clamped() {
        let settings = Settings::from_toml_str("[cycle]\ninterval_secs = 3\n").unwrap();
        assert_eq!(settings.cycle.interval_secs, MIN_INTERVAL_SECS);
        assert_eq!(settings.cycle.interval(), Duration::from_secs(10));
    }

    #[test]
    fn kinds_are_sorted_and_deduplicated() {
        let raw = r#"
            [cycle]
            enabled = true
            kinds = ["percent", "eta", "percent"]
        "#;
        let settings = Settings::from_toml_str(raw).unwrap();
        let kinds: Vec<MessageKind> = settings.cycle.kinds.iter().copied().collect();
        assert_eq!(kinds, vec![MessageKind::Eta, MessageKind::Percent]);
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = Settings::from_toml_str("[cycle]\nkinds = [\"temperature\"]\n").unwrap_err();
        assert!(matches!(err, crate::CoreError::Toml(_)));
    }

    #[test]
    fn display_config_mirrors_flags() {
        let settings = Settings {
            remove_colons: true,
            use_twenty_four_hour_view: false,
            ..Settings::default()
        };
        let display = settings.display();
        assert!(display.remove_colons);
        assert!(!display.use_24_hour_clock);
        assert!(display.use_fancy_text);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "remove_colons = true\n[cycle]\nenabled = true\ninterval_secs = 15"
        )
        .unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert!(settings.remove_colons);
        assert!(settings.cycle.enabled);
        assert_eq!(settings.cycle.interval_secs, 15);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, crate::CoreError::Io(_)));
    }
}
