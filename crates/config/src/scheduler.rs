use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Scheduler {
    /// Number of same-priority items dispatched concurrently as one batch.
    /// Values below 1 are treated as 1.
    pub batch_size: usize,

    /// Pause between two batches so prefetch traffic does not saturate the
    /// connection pool. **Measured in milliseconds**; `0` disables pacing.
    #[serde(rename = "batch_pause_ms")]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub batch_pause: Duration,

    /// Start another processing pass right away when items were enqueued
    /// while the previous pass was running. When off, those items wait for
    /// the next enqueue to trigger a pass.
    pub auto_drain: bool,

    /// Give up on a single dispatch after this long. Unset means a hanging
    /// hint stalls its batch slot until it resolves.
    #[serde(rename = "dispatch_timeout_ms", skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<serde_with::DurationMilliSeconds<u64>>")]
    pub dispatch_timeout: Option<Duration>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_pause: Duration::from_millis(100),
            auto_drain: false,
            dispatch_timeout: None,
        }
    }
}

impl Scheduler {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
