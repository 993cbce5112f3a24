#![forbid(unsafe_code)]

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PreloadStats {
    /// Unique urls that settled successfully.
    pub preloaded_count: usize,
    /// Items still waiting in the queue, including the batch in flight.
    pub queue_length: usize,
    /// `preloaded / (preloaded + queued)`, or `0.0` when both are zero.
    pub hit_rate: f64,
}

impl PreloadStats {
    pub fn new(preloaded_count: usize, queue_length: usize) -> Self {
        let total = preloaded_count + queue_length;
        let hit_rate = if total == 0 {
            0.0
        } else {
            preloaded_count as f64 / total as f64
        };
        Self {
            preloaded_count,
            queue_length,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_scheduler_has_zero_hit_rate() {
        assert_eq!(PreloadStats::new(0, 0).hit_rate, 0.0);
    }

    proptest! {
        #[test]
        fn hit_rate_is_a_fraction(done in 0usize..10_000, queued in 0usize..10_000) {
            let stats = PreloadStats::new(done, queued);
            prop_assert!(!stats.hit_rate.is_nan());
            prop_assert!((0.0..=1.0).contains(&stats.hit_rate));
            if queued == 0 && done > 0 {
                prop_assert_eq!(stats.hit_rate, 1.0);
            }
        }
    }
}
