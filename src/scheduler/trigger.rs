//! Rendezvous wake-up channel between trigger sources and the scheduler loop
//!
//! A single-slot `mpsc` carries a `oneshot` acknowledgement with every signal.
//! [`Trigger::fire`] resolves only after the scheduler loop has taken the
//! signal at its receive point, so a caller that fires mid-cycle stays blocked
//! until the loop is idle again. At most one signal waits in the slot; further
//! senders queue on the slot itself.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Why a cycle started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Timer,
    Registration,
    Manual,
}

#[derive(Debug, Error)]
#[error("Scheduler loop is not running")]
pub struct TriggerClosed;

struct Signal {
    source: TriggerSource,
    ack: oneshot::Sender<()>,
}

/// Sending side, cheap to clone
#[derive(Clone)]
pub struct Trigger {
    tx: mpsc::Sender<Signal>,
}

/// Receiving side, owned by the scheduler loop
pub struct TriggerReceiver {
    rx: mpsc::Receiver<Signal>,
}

pub fn channel() -> (Trigger, TriggerReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (Trigger { tx }, TriggerReceiver { rx })
}

impl Trigger {
    /// Deliver a wake-up and wait until the scheduler loop has accepted it
    pub async fn fire(&self, source: TriggerSource) -> Result<(), TriggerClosed> {
        let (ack, accepted) = oneshot::channel();

        self.tx
            .send(Signal { source, ack })
            .await
            .map_err(|_| TriggerClosed)?;

        accepted.await.map_err(|_| TriggerClosed)
    }
}

impl TriggerReceiver {
    /// Take the next signal and release its sender
    ///
    /// Returns `None` once every [`Trigger`] has been dropped.
    pub async fn recv(&mut self) -> Option<TriggerSource> {
        let signal = self.rx.recv().await?;
        // The sender may have given up waiting; the signal still counts
        let _ = signal.ack.send(());
        Some(signal.source)
    }
}

/// Fire the trigger every `period` until `shutdown` is cancelled
///
/// With `fire_immediately` the first tick happens at once. Each tick blocks on
/// the rendezvous like any other sender, so ticks that land mid-cycle are
/// delayed rather than stacked.
pub async fn run_timer(
    trigger: Trigger,
    period: Duration,
    fire_immediately: bool,
    shutdown: CancellationToken,
) {
    let start = if fire_immediately {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period_secs = period.as_secs(), fire_immediately, "Refresh timer started");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            fired = trigger.fire(TriggerSource::Timer) => {
                if fired.is_err() {
                    debug!("Scheduler gone, stopping refresh timer");
                    break;
                }
            }
        }
    }

    info!("Refresh timer stopped");
}
