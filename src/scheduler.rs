use crate::assembler::Assembler;
use crate::probes::Probes;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No cycle has completed; readers still see the zero snapshot.
    Warmup,
    Running,
}

/// Drives the assembler on a fixed interval until shutdown is signalled.
pub struct Scheduler<P> {
    assembler: Assembler<P>,
    interval: Duration,
    phase: Phase,
}

impl<P: Probes + 'static> Scheduler<P> {
    pub fn new(assembler: Assembler<P>, interval: Duration) -> Self {
        Self {
            assembler,
            interval,
            phase: Phase::Warmup,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<Self> {
        tokio::spawn(self.run(shutdown))
    }

    /// The first tick fires immediately. Ticks missed while a cycle is in
    /// flight are skipped, so cycles never overlap or burst. Shutdown is only
    /// observed between cycles.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("shutdown signal received, stopping collector");
                    break;
                }
                _ = ticker.tick() => {
                    self.assembler.run_cycle().await;
                    if self.phase == Phase::Warmup {
                        self.phase = Phase::Running;
                        info!(interval_ms = self.interval.as_millis() as u64, "first snapshot published");
                    }
                }
            }
        }

        info!(phase = ?self.phase, "collector stopped");
        self
    }
}
