use super::{CycleOutput, Engine};
use crate::Result;
use core::pin::pin;
use core::time::Duration;
use tokio::time::MissedTickBehavior;

const LOG_TARGET: &str = "  poller";

/// Receives the output of each completed cycle.
pub trait StatsSink {
    /// # Errors
    ///
    /// Returns an error if the output cannot be published. Polling stops on error.
    fn publish(&mut self, output: &CycleOutput) -> Result<()>;
}

/// Runs cycles on a fixed interval.
///
/// A cycle that overruns the interval delays the next one instead of overlapping
/// with it; the missed ticks are skipped.
#[derive(Debug)]
pub struct Poller<'a> {
    engine: &'a Engine,
    interval: Duration,
    max_cycles: Option<u64>,
}

impl<'a> Poller<'a> {
    #[must_use]
    pub const fn new(engine: &'a Engine, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            max_cycles: None,
        }
    }

    /// Stop after `count` completed cycles.
    #[must_use]
    pub const fn max_cycles(mut self, count: u64) -> Self {
        self.max_cycles = Some(count);
        self
    }

    /// Poll until `shutdown` completes or the cycle limit is reached.
    ///
    /// Returns the number of cycles published. A cycle interrupted by shutdown is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the sink.
    pub async fn run(&self, sink: &mut dyn StatsSink, shutdown: impl Future<Output = ()>) -> Result<u64> {
        let mut shutdown = pin!(shutdown);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut published = 0;
        while self.max_cycles.is_none_or(|max| published < max) {
            tokio::select! {
                biased;

                () = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let Some(output) = self.engine.run_cycle_until(&mut shutdown).await else {
                break;
            };

            sink.publish(&output)?;
            published += 1;
            log::debug!(target: LOG_TARGET, "Published cycle {published}");
        }

        log::info!(target: LOG_TARGET, "Polling stopped after {published} cycle(s)");
        Ok(published)
    }
}
