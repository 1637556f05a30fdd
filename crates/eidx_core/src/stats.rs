//! Registry statistics.
//!
//! Counters for diagnosing how a registry is being fed and queried. In
//! particular, bulk loads skip malformed records instead of failing, and
//! [`RegistryStats::records_skipped`] is where those skips show up.
//!
//! ```rust,ignore
//! let registry = Registry::new(RegistryConfig::default());
//! registry.initialize(records);
//!
//! let stats = registry.stats().snapshot();
//! println!("loaded {} / skipped {}", stats.records_loaded, stats.records_skipped);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registry counters.
///
/// All counters are atomic and only ever increase.
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Records accepted by bulk loads.
    records_loaded: AtomicU64,
    /// Records rejected by bulk loads.
    records_skipped: AtomicU64,
    /// Single-record upserts.
    upserts: AtomicU64,
    /// Registry-level searches.
    searches: AtomicU64,
    /// Usage events applied to a known EID.
    usage_recorded: AtomicU64,
    /// Usage events for an unknown EID.
    usage_misses: AtomicU64,
    /// Successful snapshot exports.
    exports: AtomicU64,
    /// Successful snapshot imports.
    imports: AtomicU64,
    /// Rejected snapshot imports.
    import_failures: AtomicU64,
}

impl RegistryStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_load(&self, loaded: u64, skipped: u64) {
        self.records_loaded.fetch_add(loaded, Ordering::Relaxed);
        self.records_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    pub(crate) fn record_upsert(&self) {
        self.upserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_usage(&self, hit: bool) {
        if hit {
            self.usage_recorded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.usage_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_export(&self) {
        self.exports.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_import(&self, ok: bool) {
        if ok {
            self.imports.fetch_add(1, Ordering::Relaxed);
        } else {
            self.import_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Returns the number of records accepted by bulk loads.
    pub fn records_loaded(&self) -> u64 {
        self.records_loaded.load(Ordering::Relaxed)
    }

    /// Returns the number of records skipped by bulk loads.
    pub fn records_skipped(&self) -> u64 {
        self.records_skipped.load(Ordering::Relaxed)
    }

    /// Returns the number of usage events for unknown EIDs.
    pub fn usage_misses(&self) -> u64 {
        self.usage_misses.load(Ordering::Relaxed)
    }

    /// Returns the number of rejected imports.
    pub fn import_failures(&self) -> u64 {
        self.import_failures.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_loaded: self.records_loaded(),
            records_skipped: self.records_skipped(),
            upserts: self.upserts.load(Ordering::Relaxed),
            searches: self.searches.load(Ordering::Relaxed),
            usage_recorded: self.usage_recorded.load(Ordering::Relaxed),
            usage_misses: self.usage_misses(),
            exports: self.exports.load(Ordering::Relaxed),
            imports: self.imports.load(Ordering::Relaxed),
            import_failures: self.import_failures(),
        }
    }
}

/// A point-in-time copy of [`RegistryStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Records accepted by bulk loads.
    pub records_loaded: u64,
    /// Records rejected by bulk loads.
    pub records_skipped: u64,
    /// Single-record upserts.
    pub upserts: u64,
    /// Registry-level searches.
    pub searches: u64,
    /// Usage events applied to a known EID.
    pub usage_recorded: u64,
    /// Usage events for an unknown EID.
    pub usage_misses: u64,
    /// Successful snapshot exports.
    pub exports: u64,
    /// Successful snapshot imports.
    pub imports: u64,
    /// Rejected snapshot imports.
    pub import_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        assert_eq!(RegistryStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = RegistryStats::new();
        stats.record_load(10, 2);
        stats.record_load(5, 0);
        stats.record_usage(true);
        stats.record_usage(false);
        stats.record_import(false);

        let snap = stats.snapshot();
        assert_eq!(snap.records_loaded, 15);
        assert_eq!(snap.records_skipped, 2);
        assert_eq!(snap.usage_recorded, 1);
        assert_eq!(snap.usage_misses, 1);
        assert_eq!(snap.imports, 0);
        assert_eq!(snap.import_failures, 1);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(RegistryStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        s.record_search();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.snapshot().searches, 800);
    }
}
