//! Repeating message-cycle timer.
//!
//! The timer never touches session state. It only posts
//! [`SessionEvent::Tick`] into the owner's channel; the owner drops ticks whose
//! generation does not belong to the currently running timer, so a tick that
//! was queued before [`CycleTimer::stop`] is never acted on.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::event::SessionEvent;

struct Running {
    generation: u64,
    period: Duration,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Idempotently start/stop-able tick source. Must be used inside a tokio runtime.
pub struct CycleTimer {
    tx: mpsc::UnboundedSender<SessionEvent>,
    running: Option<Running>,
    generation: u64,
}

impl CycleTimer {
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            tx,
            running: None,
            generation: 0,
        }
    }

    /// Start ticking every `period`. No-op if already running.
    pub fn start(&mut self, period: Duration) {
        if self.running.is_some() {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(tick_loop(self.tx.clone(), generation, period, cancel.clone()));

        log::info!("message cycle timer started ({}s)", period.as_secs());
        self.running = Some(Running {
            generation,
            period,
            cancel,
            handle,
        });
    }

    /// Stop ticking. No-op if not running.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            running.handle.abort();
            log::info!("message cycle timer stopped");
        }
    }

    /// Restart with a new period if running with a different one.
    pub fn reschedule(&mut self, period: Duration) {
        if self.running.as_ref().is_some_and(|r| r.period != period) {
            self.stop();
            self.start(period);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Whether a tick with this generation came from the running timer.
    pub fn accepts(&self, generation: u64) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| r.generation == generation)
    }
}

impl Drop for CycleTimer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            running.handle.abort();
        }
    }
}

async fn tick_loop(
    tx: mpsc::UnboundedSender<SessionEvent>,
    generation: u64,
    period: Duration,
    cancel: CancellationToken,
) {
    // First tick one full period after start, not immediately.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if tx.send(SessionEvent::Tick { generation }).is_err() {
                    // Owner is gone.
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<u64> {
        let mut generations = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let SessionEvent::Tick { generation } = event {
                generations.push(generation);
            }
        }
        generations
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CycleTimer::new(tx);
        timer.start(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());

        tokio::time::sleep(Duration::from_secs(26)).await;
        assert_eq!(drain(&mut rx), vec![1, 1, 1]);
        timer.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CycleTimer::new(tx);

        timer.stop();
        assert!(!timer.is_running());

        timer.start(Duration::from_secs(10));
        timer.start(Duration::from_secs(10));
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_secs(11)).await;
        // A second start did not spawn a second ticker.
        assert_eq!(drain(&mut rx), vec![1]);

        timer.stop();
        timer.stop();
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_stop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CycleTimer::new(tx);
        timer.start(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;
        timer.stop();

        // The tick queued before stop is rejected by generation.
        let queued = drain(&mut rx);
        assert_eq!(queued, vec![1]);
        assert!(!timer.accepts(1));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_uses_new_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CycleTimer::new(tx);
        timer.start(Duration::from_secs(10));
        timer.stop();
        timer.start(Duration::from_secs(10));
        assert!(timer.accepts(2));
        assert!(!timer.accepts(1));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(drain(&mut rx), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_changes_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = CycleTimer::new(tx);

        // Not running: stays stopped.
        timer.reschedule(Duration::from_secs(20));
        assert!(!timer.is_running());

        timer.start(Duration::from_secs(10));
        timer.reschedule(Duration::from_secs(10));
        assert!(timer.accepts(1));

        timer.reschedule(Duration::from_secs(20));
        assert!(timer.accepts(2));
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(drain(&mut rx).is_empty());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(drain(&mut rx), vec![2]);
    }
}
