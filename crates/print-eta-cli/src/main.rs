use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use print_eta_core::{EtaSession, MessageKind, SessionEvent, Settings};

mod host;
mod input;

use host::{StdoutPrinter, StdoutUi};
use input::HostInput;

/// Print ETA host shim: reads host telemetry and events as JSON lines on stdin,
/// writes UI messages and printer commands as JSON lines on stdout.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable message cycling regardless of the settings file
    #[arg(long)]
    cycle: bool,

    /// Comma-separated message kinds to cycle through (eta, elapsed, remaining, percent)
    #[arg(long, value_delimiter = ',')]
    cycle_kinds: Vec<MessageKind>,

    /// Seconds between cycled messages (minimum 10)
    #[arg(long)]
    interval: Option<u64>,

    /// Plugin identifier used in UI messages
    #[arg(long, default_value = "print_eta")]
    identifier: String,
}

impl Args {
    /// Apply the cycling flags on top of settings from the file or the host.
    fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if self.cycle {
            settings.cycle.enabled = true;
        }
        if !self.cycle_kinds.is_empty() {
            settings.cycle.kinds = self.cycle_kinds.iter().copied().collect();
        }
        if let Some(interval) = self.interval {
            settings.cycle.interval_secs = interval;
        }
        settings.validated()
    }
}

fn resolve_settings(args: &Args) -> anyhow::Result<Settings> {
    // CLI flags > env vars > settings file > defaults
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("PRINT_ETA_CONFIG").ok().map(PathBuf::from));

    let settings = match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("settings file not found: {}", path.display());
            }
            Settings::load(&path)?
        }
        None => Settings::default(),
    };

    Ok(args.apply_overrides(settings))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = resolve_settings(&args)?;
    log::info!(
        "starting (24h: {}, fancy: {}, cycling: {})",
        settings.use_twenty_four_hour_view,
        settings.use_fancy_text,
        settings.cycle.enabled
    );

    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let printer = StdoutPrinter::default();
    let ui = StdoutUi {
        identifier: args.identifier.clone(),
    };
    let mut session = EtaSession::new(printer, ui, settings, tick_tx);

    // Read stdin on its own task so the loop below can also wait on ticks.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let cancel = CancellationToken::new();
    let cancel_reader = cancel.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = cancel_reader.cancelled() => break,
                next = lines.next_line() => match next {
                    Ok(Some(line)) => {
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("stdin read failed: {e}");
                        break;
                    }
                },
            }
        }
    });

    // Also handle Ctrl+C at the OS level for clean shutdown
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.cancel();
        }
    });

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            maybe_line = line_rx.recv() => {
                let Some(line) = maybe_line else {
                    // Host closed stdin
                    break;
                };
                match input::map_line(&line) {
                    Ok(input) => apply_input(&mut session, &args, input),
                    Err(e) => log::warn!("{e}"),
                }
            }
            Some(tick) = tick_rx.recv() => {
                session.handle(tick, &chrono::Local::now());
            }
        }
    }

    cancel.cancel();
    Ok(())
}

fn apply_input(
    session: &mut EtaSession<StdoutPrinter, StdoutUi>,
    args: &Args,
    input: HostInput,
) {
    let now = chrono::Local::now();
    match input {
        HostInput::Progress { snapshot, printing } => {
            session.printer().set_snapshot(snapshot);
            if let Some(printing) = printing {
                session.printer().set_printing(printing);
            }
            session.handle(SessionEvent::Progress(snapshot), &now);
        }
        HostInput::Event(event) => {
            if let Some(printing) = input::printing_after(&event) {
                session.printer().set_printing(printing);
            }
            session.handle(SessionEvent::Lifecycle(event), &now);
        }
        HostInput::Settings(settings) => {
            // Host settings replace the file, but CLI flags still win.
            let settings = args.apply_overrides(settings);
            session.handle(SessionEvent::SettingsChanged(settings), &now);
        }
        HostInput::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(flags: &[&str]) -> Args {
        Args::parse_from(std::iter::once("print-eta").chain(flags.iter().copied()))
    }

    #[test]
    fn no_flags_keep_settings() {
        let settings = Settings {
            remove_colons: true,
            ..Settings::default()
        };
        assert_eq!(args(&[]).apply_overrides(settings.clone()), settings);
    }

    #[test]
    fn cycle_flags_override_host_settings() {
        let args = args(&["--cycle", "--cycle-kinds", "percent,eta", "--interval", "3"]);
        let host = Settings {
            use_fancy_text: false,
            ..Settings::default()
        };
        let settings = args.apply_overrides(host);
        assert!(settings.cycle.enabled);
        let kinds: Vec<MessageKind> = settings.cycle.kinds.iter().copied().collect();
        assert_eq!(kinds, vec![MessageKind::Eta, MessageKind::Percent]);
        assert_eq!(settings.cycle.interval_secs, 10);
        assert!(!settings.use_fancy_text);
    }

    #[tokio::test]
    async fn runtime_settings_keep_cli_overrides() {
        let args = args(&["--cycle", "--cycle-kinds", "remaining"]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let settings = args.apply_overrides(Settings::default());
        let ui = StdoutUi {
            identifier: "print_eta".to_string(),
        };
        let mut session = EtaSession::new(StdoutPrinter::default(), ui, settings, tx);

        apply_input(&mut session, &args, HostInput::Settings(Settings::default()));

        assert!(session.settings().cycle.enabled);
        assert_eq!(
            session.settings().cycle.kinds.iter().copied().collect::<Vec<_>>(),
            vec![MessageKind::Remaining]
        );
    }
}
