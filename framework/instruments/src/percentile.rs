use perf_tunnel_summary_model::LatencyStats;

/// Nearest-rank percentile of an ascending sorted sample.
///
/// The rank is `ceil(pct / 100 * n)`, clamped to `1..=n`, so the result is always a value that was
/// actually observed. Returns `None` for an empty sample.
pub fn nearest_rank(sorted: &[f64], pct: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let n = sorted.len();
    let rank = (pct * n as f64 / 100.0).ceil() as usize;
    Some(sorted[rank.clamp(1, n) - 1])
}

/// Summarise a latency sample in milliseconds. Sorts the sample in place.
///
/// An empty sample gives all-zero statistics.
pub fn summarise_latencies(samples: &mut [f64]) -> LatencyStats {
    if samples.is_empty() {
        return LatencyStats::default();
    }

    samples.sort_by(f64::total_cmp);
    let sorted = &*samples;
    let at = |pct: f64| nearest_rank(sorted, pct).unwrap_or_default();

    LatencyStats {
        avg_ms: sorted.iter().sum::<f64>() / sorted.len() as f64,
        min_ms: sorted[0],
        med_ms: at(50.0),
        p90_ms: at(90.0),
        p95_ms: at(95.0),
        p99_ms: at(99.0),
        max_ms: sorted[sorted.len() - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_rank_on_one_to_hundred() {
        let sorted = (1..=100).map(f64::from).collect::<Vec<_>>();

        assert_eq!(Some(95.0), nearest_rank(&sorted, 95.0));
        assert_eq!(Some(99.0), nearest_rank(&sorted, 99.0));
        assert_eq!(Some(50.0), nearest_rank(&sorted, 50.0));
        assert_eq!(Some(1.0), nearest_rank(&sorted, 0.0));
        assert_eq!(Some(100.0), nearest_rank(&sorted, 100.0));
    }

    #[test]
    fn nearest_rank_small_sample_rounds_up() {
        let sorted = [10.0, 20.0, 30.0];
        assert_eq!(Some(30.0), nearest_rank(&sorted, 95.0));
        assert_eq!(Some(20.0), nearest_rank(&sorted, 50.0));
        assert_eq!(None, nearest_rank(&[], 95.0));
    }

    #[test]
    fn summary_is_ordered_for_uniform_sample() {
        let mut samples = (0..1000).rev().map(|i| 5.0 + (i % 97) as f64).collect::<Vec<_>>();
        let stats = summarise_latencies(&mut samples);

        assert!(stats.is_rank_ordered());
        assert!(stats.avg_ms <= stats.p95_ms);
        assert_eq!(5.0, stats.min_ms);
        assert_eq!(101.0, stats.max_ms);
    }

    #[test]
    fn single_sample() {
        let stats = summarise_latencies(&mut [42.0]);
        assert_eq!(42.0, stats.avg_ms);
        assert_eq!(42.0, stats.p99_ms);
        assert_eq!(42.0, stats.max_ms);
    }

    #[test]
    fn empty_sample_is_zeroed() {
        assert_eq!(LatencyStats::default(), summarise_latencies(&mut []));
    }
}
