use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const TPS_WINDOW_MILLIS: i64 = 15_000;

/// a ledger version and when it was observed, in ms on the sampler's
/// monotonic clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSample {
    pub version: u64,
    pub observed_at_millis: i64,
}

/// sliding window of ledger samples, deriving throughput from the version
/// delta between the oldest and newest sample still inside the window.
///
/// with fewer than two samples there is no rate to derive and the last
/// known `tps` is kept instead of dropping to zero.
#[derive(Clone, Debug)]
pub struct TpsWindow {
    samples: VecDeque<LedgerSample>,
    window_millis: i64,
    tps: f64,
}

impl Default for TpsWindow {
    fn default() -> Self {
        TpsWindow::new(TPS_WINDOW_MILLIS)
    }
}

impl TpsWindow {
    pub fn new(window_millis: i64) -> Self {
        TpsWindow {
            samples: VecDeque::new(),
            window_millis,
            tps: 0.0,
        }
    }

    pub fn tps(&self) -> f64 {
        self.tps
    }

    pub fn samples(&self) -> impl Iterator<Item = &LedgerSample> {
        self.samples.iter()
    }

    /// records `version` (a decimal string, as the ledger info carries it)
    /// at `now_millis`. unparsable versions are ignored.
    pub fn record(&mut self, version: &str, now_millis: i64) {
        let Ok(version) = version.trim().parse::<u64>() else {
            return;
        };
        // time went backwards: nothing already held can be ordered against
        // `now_millis`, so restart the window and keep the last rate
        if self
            .samples
            .back()
            .is_some_and(|newest| now_millis < newest.observed_at_millis)
        {
            self.samples.clear();
        }
        self.samples.push_back(LedgerSample {
            version,
            observed_at_millis: now_millis,
        });
        while let Some(oldest) = self.samples.front() {
            if now_millis - oldest.observed_at_millis < self.window_millis {
                break;
            }
            self.samples.pop_front();
        }

        let (Some(oldest), Some(newest)) = (self.samples.front(), self.samples.back()) else {
            return;
        };
        if self.samples.len() < 2 {
            return;
        }
        let time_delta = newest.observed_at_millis - oldest.observed_at_millis;
        if time_delta == 0 {
            return;
        }
        let version_delta = newest.version as f64 - oldest.version as f64;
        self.tps = round_tenth(version_delta / (time_delta as f64 / 1000.0));
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_over_ten_seconds() {
        let mut window = TpsWindow::default();
        window.record("1000", 0);
        window.record("1300", 10_000);
        assert_eq!(window.tps(), 30.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        let mut window = TpsWindow::default();
        window.record("0", 0);
        window.record("100", 3_000);
        assert_eq!(window.tps(), 33.3);
    }

    #[test]
    fn single_sample_keeps_prior_tps() {
        let mut window = TpsWindow::default();
        window.tps = 5.0;
        window.record("1000", 0);
        assert_eq!(window.tps(), 5.0);
        assert_eq!(window.samples().count(), 1);
    }

    #[test]
    fn same_millisecond_samples_are_skipped() {
        let mut window = TpsWindow::default();
        window.tps = 7.5;
        window.record("1000", 42);
        window.record("1500", 42);
        assert_eq!(window.tps(), 7.5);
        assert_eq!(window.samples().count(), 2);
    }

    #[test]
    fn unparsable_version_is_a_no_op() {
        let mut window = TpsWindow::default();
        window.record("1000", 0);
        window.record("1300", 10_000);
        window.record("not-a-version", 11_000);
        assert_eq!(window.tps(), 30.0);
        assert_eq!(window.samples().count(), 2);
    }

    #[test]
    fn old_samples_leave_the_window() {
        let mut window = TpsWindow::default();
        window.record("0", 0);
        window.record("300", 3_000);
        window.record("600", 6_000);
        window.record("3600", 15_000);
        // the sample at t=0 is exactly one window old and must be gone
        let oldest = window.samples().next().copied().unwrap();
        assert_eq!(oldest.observed_at_millis, 3_000);
        assert_eq!(window.tps(), 275.0);
        for sample in window.samples() {
            assert!(15_000 - sample.observed_at_millis < TPS_WINDOW_MILLIS);
        }
    }

    #[test]
    fn earlier_timestamp_restarts_the_window() {
        let mut window = TpsWindow::default();
        window.record("1000", 100_000);
        window.record("1300", 103_000);
        assert_eq!(window.tps(), 100.0);

        window.record("1600", 106_000 - 3_600_000);
        assert_eq!(window.samples().count(), 1);
        assert_eq!(window.tps(), 100.0);

        window.record("1900", 109_000 - 3_600_000);
        assert_eq!(window.samples().count(), 2);
        assert_eq!(window.tps(), 100.0);
        assert!(window.samples().all(|s| s.observed_at_millis < 0));
    }

    #[test]
    fn lone_survivor_after_a_gap_keeps_tps() {
        let mut window = TpsWindow::default();
        window.record("0", 0);
        window.record("100", 1_000);
        assert_eq!(window.tps(), 100.0);
        window.record("5000", 60_000);
        assert_eq!(window.samples().count(), 1);
        assert_eq!(window.tps(), 100.0);
    }
}
