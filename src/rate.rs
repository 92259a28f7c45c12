use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Samples closer together than this are treated as this far apart.
pub const MIN_ELAPSED: Duration = Duration::from_millis(100);

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// What a failed network probe does to the tracker's previous sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFailurePolicy {
    /// Leave the previous sample in place so the next success measures across the gap.
    #[default]
    Hold,
    /// Record zero counters at the failure instant.
    Reset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Throughput {
    pub rx_mb_per_sec: f64,
    pub tx_mb_per_sec: f64,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    rx_bytes: u64,
    tx_bytes: u64,
    at: Instant,
}

/// Turns cumulative byte counters into MB/s between consecutive cycles.
#[derive(Debug, Default)]
pub struct RateTracker {
    previous: Option<Sample>,
    on_failure: NetworkFailurePolicy,
}

impl RateTracker {
    pub fn new(on_failure: NetworkFailurePolicy) -> Self {
        Self {
            previous: None,
            on_failure,
        }
    }

    /// Rates since the previous sample; both are zero on the first call.
    ///
    /// A counter that went backwards yields a negative rate. The current
    /// sample always replaces the previous one.
    pub fn compute_rate(&mut self, rx_bytes: u64, tx_bytes: u64, now: Instant) -> Throughput {
        let throughput = match self.previous {
            None => Throughput::default(),
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev.at).max(MIN_ELAPSED);
                let secs = elapsed.as_secs_f64();
                Throughput {
                    rx_mb_per_sec: (rx_bytes as f64 - prev.rx_bytes as f64) / secs / BYTES_PER_MB,
                    tx_mb_per_sec: (tx_bytes as f64 - prev.tx_bytes as f64) / secs / BYTES_PER_MB,
                }
            }
        };
        self.previous = Some(Sample {
            rx_bytes,
            tx_bytes,
            at: now,
        });
        throughput
    }

    /// Called instead of [`compute_rate`](Self::compute_rate) when the counters
    /// could not be read. The cycle reports zero throughput either way.
    pub fn record_failure(&mut self, now: Instant) -> Throughput {
        match self.on_failure {
            NetworkFailurePolicy::Hold => {}
            NetworkFailurePolicy::Reset => {
                self.previous = Some(Sample {
                    rx_bytes: 0,
                    tx_bytes: 0,
                    at: now,
                });
            }
        }
        Throughput::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_sample_has_no_rate() {
        let mut tracker = RateTracker::default();
        let rate = tracker.compute_rate(u64::MAX / 2, 123_456, Instant::now());
        assert_eq!(rate, Throughput::default());
    }

    #[test]
    fn rate_is_megabytes_per_second() {
        let mut tracker = RateTracker::default();
        let t0 = Instant::now();
        tracker.compute_rate(1000, 2000, t0);
        let rate = tracker.compute_rate(1_000_000 + 1000, 3000, t0 + Duration::from_secs(1));
        assert!(approx(rate.rx_mb_per_sec, 1_000_000.0 / BYTES_PER_MB));
        assert!(approx(rate.tx_mb_per_sec, 1000.0 / BYTES_PER_MB));
    }

    #[test]
    fn elapsed_is_floored() {
        let t0 = Instant::now();

        let mut close = RateTracker::default();
        close.compute_rate(0, 0, t0);
        let fast = close.compute_rate(1_048_576, 0, t0 + Duration::from_millis(10));

        let mut floor = RateTracker::default();
        floor.compute_rate(0, 0, t0);
        let expected = floor.compute_rate(1_048_576, 0, t0 + MIN_ELAPSED);

        assert!(approx(fast.rx_mb_per_sec, expected.rx_mb_per_sec));
        assert!(approx(fast.rx_mb_per_sec, 10.0));
    }

    #[test]
    fn counter_reset_goes_negative() {
        let mut tracker = RateTracker::default();
        let t0 = Instant::now();
        tracker.compute_rate(2 * 1_048_576, 0, t0);
        let rate = tracker.compute_rate(0, 0, t0 + Duration::from_secs(2));
        assert!(approx(rate.rx_mb_per_sec, -1.0));
    }

    #[test]
    fn hold_measures_across_a_failed_sample() {
        let mut tracker = RateTracker::new(NetworkFailurePolicy::Hold);
        let t0 = Instant::now();
        tracker.compute_rate(0, 0, t0);
        let failed = tracker.record_failure(t0 + Duration::from_secs(1));
        assert_eq!(failed, Throughput::default());

        let rate = tracker.compute_rate(4 * 1_048_576, 0, t0 + Duration::from_secs(2));
        assert!(approx(rate.rx_mb_per_sec, 2.0));
    }

    #[test]
    fn reset_restarts_from_zero_counters() {
        let mut tracker = RateTracker::new(NetworkFailurePolicy::Reset);
        let t0 = Instant::now();
        tracker.compute_rate(10 * 1_048_576, 0, t0);
        tracker.record_failure(t0 + Duration::from_secs(1));

        let rate = tracker.compute_rate(11 * 1_048_576, 0, t0 + Duration::from_secs(2));
        assert!(approx(rate.rx_mb_per_sec, 11.0));
    }

    #[test]
    fn failure_before_first_sample_keeps_first_rate_zero_under_hold() {
        let mut tracker = RateTracker::new(NetworkFailurePolicy::Hold);
        let t0 = Instant::now();
        tracker.record_failure(t0);
        let rate = tracker.compute_rate(5_000_000, 5_000_000, t0 + Duration::from_secs(1));
        assert_eq!(rate, Throughput::default());
    }
}
