//! Usage counters exposed by the gate.

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of the gate's usage counters.
///
/// The per-kind counters are monotonic and incremented at admission time;
/// retries do not count again. `in_flight` is derived from the size of the
/// gate's worker table and is the only value that can decrease. Counters
/// are in-memory only and reset when the gate restarts.
///
/// # Examples
///
/// ```
/// use storgate_model::stats::UsageStats;
///
/// let stats = UsageStats::default();
/// assert_eq!(stats.fetches, 0);
/// assert_eq!(stats.in_flight, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    /// Fetch operations admitted since startup.
    pub fetches: u64,
    /// Store operations admitted since startup.
    pub stores: u64,
    /// Delete operations admitted since startup.
    pub deletes: u64,
    /// Operations currently executing.
    pub in_flight: usize,
}

impl UsageStats {
    /// Total counted operations admitted since startup.
    ///
    /// Enumerate operations are admitted and bounded by the concurrency
    /// ceiling but carry no dedicated counter, matching the stats surface.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.fetches + self.stores + self.deletes
    }
}
