//! Display formatting for finish times and durations.

use std::fmt::Display;

use chrono::{DateTime, TimeDelta, TimeZone};

use crate::config::DisplayConfig;

/// Placeholder shown while remaining-time telemetry is unavailable.
pub const NOT_READY: &str = "-";

/// Upper bound on the remaining time fed into date arithmetic (100 years).
const MAX_REMAINING_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Format the wall-clock time at which a print with `remaining_secs` left will finish.
///
/// The clock part is `HH:MM:SS` or `hh:MM:SS AM/PM`. When the finish time falls
/// on a later calendar day than `now`, a suffix is appended: ` tomorrow` for
/// the next day when fancy text is enabled, otherwise the short weekday and
/// day of month (` Tue 14`).
pub fn format_finish_time<Tz>(
    remaining_secs: u64,
    now: &DateTime<Tz>,
    config: &DisplayConfig,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let clamped = remaining_secs.min(MAX_REMAINING_SECS) as i64;
    let finish = TimeDelta::try_seconds(clamped)
        .and_then(|delta| now.clone().checked_add_signed(delta))
        .unwrap_or_else(|| now.clone());

    let clock = if config.use_24_hour_clock {
        "%H:%M:%S"
    } else {
        "%I:%M:%S %p"
    };
    let mut eta = finish.format(clock).to_string();

    // Compare calendar dates; day-of-month wraps at month end.
    let today = now.date_naive();
    let finish_day = finish.date_naive();
    if finish_day != today {
        if config.use_fancy_text && today.succ_opt() == Some(finish_day) {
            eta.push_str(" tomorrow");
        } else {
            eta.push_str(&finish.format(" %a %-d").to_string());
        }
    }

    eta
}

/// Format a duration as its non-zero components, e.g. `1d, 2h, 5m`.
///
/// A zero duration renders as `0s`.
pub fn format_duration(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let parts: Vec<String> = [(days, 'd'), (hours, 'h'), (minutes, 'm'), (seconds, 's')]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(", ")
    }
}

/// Strip colons from a message bound for a printer display that cannot render them.
pub fn apply_printer_display_constraints(message: &str, remove_colons: bool) -> String {
    if remove_colons {
        message.replace(':', "")
    } else {
        message.to_string()
    }
}
