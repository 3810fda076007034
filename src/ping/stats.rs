use std::time::Duration;

/// Round-trip time statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RttStats {
    /// Minimum RTT
    pub min: Duration,
    /// Maximum RTT
    pub max: Duration,
    /// Mean RTT
    pub mean: Duration,
    /// Standard deviation of RTT
    pub stddev: Duration,
}

/// Counters and latency summary for one engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PingStats {
    /// Echo requests handed to the transport
    pub sent: u64,
    /// Probes completed by a matching reply
    pub received: u64,
    /// Probes completed by expiry
    pub timeouts: u64,
    /// Replies whose identifiers disagreed with their pending probe
    pub mismatches: u64,
    /// Replies with no live probe (late or duplicate)
    pub unmatched: u64,
    /// Inbound datagrams that failed to decode
    pub decode_errors: u64,
    /// Echo requests from other nodes that this node answered
    pub requests_answered: u64,
    /// Latency over all matched replies, if any
    pub rtt: Option<RttStats>,
}

impl PingStats {
    /// Fraction of sent probes that never got a matching reply
    pub fn loss_ratio(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        self.sent.saturating_sub(self.received) as f64 / self.sent as f64
    }
}

/// Running statistics, updated as probes complete.
///
/// RTT mean and variance use Welford's online update so no samples are kept.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    stats: PingStats,
    rtt_count: u64,
    rtt_mean: f64,
    rtt_m2: f64,
    rtt_min: Option<Duration>,
    rtt_max: Option<Duration>,
}

impl StatsRecorder {
    pub(crate) fn sent(&mut self) {
        self.stats.sent += 1;
    }

    pub(crate) fn received(&mut self, round_trip: Duration) {
        self.stats.received += 1;

        self.rtt_count += 1;
        let x = round_trip.as_secs_f64();
        let delta = x - self.rtt_mean;
        self.rtt_mean += delta / self.rtt_count as f64;
        self.rtt_m2 += delta * (x - self.rtt_mean);

        self.rtt_min = Some(self.rtt_min.map_or(round_trip, |m| m.min(round_trip)));
        self.rtt_max = Some(self.rtt_max.map_or(round_trip, |m| m.max(round_trip)));
    }

    pub(crate) fn timeout(&mut self) {
        self.stats.timeouts += 1;
    }

    pub(crate) fn mismatch(&mut self) {
        self.stats.mismatches += 1;
    }

    pub(crate) fn unmatched(&mut self) {
        self.stats.unmatched += 1;
    }

    pub(crate) fn decode_error(&mut self) {
        self.stats.decode_errors += 1;
    }

    pub(crate) fn answered(&mut self) {
        self.stats.requests_answered += 1;
    }

    pub(crate) fn snapshot(&self) -> PingStats {
        let mut stats = self.stats.clone();
        if let (Some(min), Some(max)) = (self.rtt_min, self.rtt_max) {
            let variance = if self.rtt_count > 1 {
                self.rtt_m2 / (self.rtt_count - 1) as f64
            } else {
                0.0
            };
            stats.rtt = Some(RttStats {
                min,
                max,
                mean: Duration::from_secs_f64(self.rtt_mean.max(0.0)),
                stddev: Duration::from_secs_f64(variance.max(0.0).sqrt()),
            });
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let stats = StatsRecorder::default().snapshot();
        assert_eq!(stats, PingStats::default());
        assert!(stats.rtt.is_none());
        assert_eq!(stats.loss_ratio(), 0.0);
    }

    #[test]
    fn test_rtt_summary() {
        let mut recorder = StatsRecorder::default();
        for ms in [10u64, 20, 30] {
            recorder.sent();
            recorder.received(Duration::from_millis(ms));
        }
        recorder.sent();
        recorder.timeout();

        let stats = recorder.snapshot();
        assert_eq!(stats.sent, 4);
        assert_eq!(stats.received, 3);
        assert_eq!(stats.timeouts, 1);
        assert!((stats.loss_ratio() - 0.25).abs() < f64::EPSILON);

        let rtt = stats.rtt.unwrap();
        assert_eq!(rtt.min, Duration::from_millis(10));
        assert_eq!(rtt.max, Duration::from_millis(30));
        assert!((rtt.mean.as_secs_f64() - 0.020).abs() < 1e-9);
        // sample stddev of 10, 20, 30 ms
        assert!((rtt.stddev.as_secs_f64() - 0.010).abs() < 1e-9);
    }
}
