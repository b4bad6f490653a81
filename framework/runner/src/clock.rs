use std::time::Duration;

/// A point on a scenario's arrival schedule, as an offset from the scenario start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationInstant {
    pub seq: u64,
    pub offset: Duration,
}

/// Lazily yields the arrival schedule for a constant target rate.
///
/// Instant `k` sits at `k / rate` seconds no matter how long earlier invocations take. The last
/// instant is the final one strictly before `duration`, so a schedule of 10/s over 2s yields 20
/// instants and a fractional `rate * duration` is truncated rather than rounded up past the end.
/// Nothing is materialised ahead of time.
#[derive(Debug, Clone)]
pub struct ScenarioClock {
    target_rate: f64,
    duration: Duration,
    next: u64,
}

impl ScenarioClock {
    pub fn new(target_rate: f64, duration: Duration) -> Self {
        Self {
            target_rate,
            duration,
            next: 0,
        }
    }

    /// Spacing between consecutive instants, capped at the scenario duration.
    pub fn interval(&self) -> Duration {
        self.saturating_secs(1.0 / self.target_rate)
    }

    fn offset_of(&self, seq: u64) -> Duration {
        self.saturating_secs(seq as f64 / self.target_rate)
    }

    fn saturating_secs(&self, secs: f64) -> Duration {
        Duration::try_from_secs_f64(secs)
            .map(|d| d.min(self.duration))
            .unwrap_or(self.duration)
    }

    fn has_instant(&self, seq: u64) -> bool {
        (seq as f64) < self.target_rate * self.duration.as_secs_f64()
    }
}

impl Iterator for ScenarioClock {
    type Item = InvocationInstant;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_instant(self.next) {
            return None;
        }

        let instant = InvocationInstant {
            seq: self.next,
            offset: self.offset_of(self.next),
        };
        self.next += 1;
        Some(instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ten_per_second_for_two_seconds() {
        let instants = ScenarioClock::new(10.0, Duration::from_secs(2)).collect::<Vec<_>>();

        assert_eq!(20, instants.len());
        for (k, instant) in instants.iter().enumerate() {
            assert_eq!(k as u64, instant.seq);
            assert_eq!(Duration::from_millis(100 * k as u64), instant.offset);
        }
        assert!(instants
            .iter()
            .all(|i| i.offset < Duration::from_millis(2000)));
    }

    #[test]
    fn spacing_is_independent_of_consumption() {
        let mut clock = ScenarioClock::new(4.0, Duration::from_secs(1));
        let first = clock.next().unwrap();
        std::thread::sleep(Duration::from_millis(30));
        let second = clock.next().unwrap();

        assert_eq!(Duration::ZERO, first.offset);
        assert_eq!(Duration::from_millis(250), second.offset);
        assert_eq!(Duration::from_millis(250), clock.interval());
    }

    #[test]
    fn fractional_final_interval_is_truncated() {
        let instants = ScenarioClock::new(3.0, Duration::from_millis(1500)).collect::<Vec<_>>();

        // 0, 333, 667, 1000, 1333 (ms); 1667 would be past the end
        assert_eq!(5, instants.len());
        assert!(instants
            .iter()
            .all(|i| i.offset < Duration::from_millis(1500)));
    }

    #[test]
    fn schedule_is_monotonic() {
        let offsets = ScenarioClock::new(7.3, Duration::from_secs(3))
            .map(|i| i.offset)
            .collect::<Vec<_>>();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn tiny_rate_does_not_overflow() {
        let clock = ScenarioClock::new(1e-20, Duration::from_secs(60));
        assert_eq!(Duration::from_secs(60), clock.interval());

        let instants = clock.collect::<Vec<_>>();
        assert_eq!(
            vec![InvocationInstant {
                seq: 0,
                offset: Duration::ZERO
            }],
            instants
        );
    }

    #[test]
    fn interval_longer_than_duration_is_capped() {
        let clock = ScenarioClock::new(0.5, Duration::from_secs(1));
        assert_eq!(Duration::from_secs(1), clock.interval());
        assert_eq!(1, clock.count());
    }

    #[test]
    fn long_schedules_are_lazy() {
        let mut clock = ScenarioClock::new(100_000.0, Duration::from_secs(60 * 60 * 24 * 365));
        let instant = clock.nth(1_000_000).unwrap();
        assert_eq!(1_000_000, instant.seq);
        assert_eq!(Duration::from_secs(10), instant.offset);
    }
}
