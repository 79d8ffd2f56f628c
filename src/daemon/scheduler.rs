use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    local::gate::NotificationGate,
    schedule::reference::{
        in_sleep_window, is_slot_boundary, slot_key, slot_start, to_reference_clock,
    },
    utils::clock::Clock,
};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(30);

/// Raised when a 30-minute boundary is reached that was not yet notified.
/// Carries the boundary instant the resulting entry will be stamped with.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAlert {
    pub timestamp: DateTime<Utc>,
    pub slot_key: String,
}

pub struct SchedulerModule {
    next: mpsc::Sender<SlotAlert>,
    gate: NotificationGate,
    shutdown: CancellationToken,
    tick_period: Duration,
    time_provider: Box<dyn Clock>,
}

impl SchedulerModule {
    pub fn new(
        next: mpsc::Sender<SlotAlert>,
        gate: NotificationGate,
        shutdown: CancellationToken,
        tick_period: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            gate,
            shutdown,
            tick_period,
            time_provider,
        }
    }

    /// Decides whether the current moment warrants a prompt: a :00/:30 mark
    /// in reference time, outside the sleep window, with a gate marker that
    /// differs from the current slot key. The gate is recorded before the
    /// alert is handed on.
    fn evaluate(&self) -> Result<Option<SlotAlert>> {
        let now = self.time_provider.time();
        let clock = to_reference_clock(now);

        if in_sleep_window(clock.hour) {
            return Ok(None);
        }
        if !is_slot_boundary(clock.minute) {
            return Ok(None);
        }

        let key = slot_key(clock.hour, clock.minute);
        if self.gate.last()?.as_deref() == Some(key.as_str()) {
            debug!("Slot {key} was already notified");
            return Ok(None);
        }

        self.gate.record(&key)?;
        Ok(Some(SlotAlert {
            timestamp: slot_start(now),
            slot_key: key,
        }))
    }

    /// Executes the scheduler event loop. The first evaluation happens
    /// immediately, which covers a session opened exactly on a boundary.
    /// Ticks keep their fixed period no matter what the gate decides.
    pub async fn run(self) -> Result<()> {
        let mut tick_point = self.time_provider.instant();
        loop {
            tick_point += self.tick_period;

            match self.evaluate() {
                Ok(Some(alert)) => {
                    info!("Raising prompt for slot {}", alert.slot_key);
                    self.next
                        .send(alert)
                        .await
                        .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Encountered an error during evaluation {:?}", e)
                }
            }

            tokio::select! {
                // Cancelation stops the event loop, drops the sender channel
                // and consequently stops the prompt module.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(tick_point) => ()
            }
        }
    }
}
