//! Usage-derived rankings: the MRU list and hot scores.
//!
//! # Hot score
//!
//! For an EID with usage counter `f`, last used `age` ago:
//!
//! ```text
//! score = frequency_weight · ln(1 + f) + recency_weight · 0.5^(age / half_life)
//! ```
//!
//! Both terms are non-decreasing (one in `f`, the other as `age` shrinks),
//! so more use and more recent use never lower an EID's score.
//!
//! # Trend
//!
//! The usage rate over the recent window is compared with the rate over
//! the baseline window. A ratio at or above the threshold is rising, at or
//! below its inverse falling, anything else (or no history) stable.

use crate::config::RegistryConfig;
use crate::types::EidMetadata;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Direction of an EID's recent usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    /// Used more in the recent window than the baseline suggests.
    Rising,
    /// Used at about the baseline rate.
    Stable,
    /// Used less in the recent window than the baseline suggests.
    Falling,
}

/// A ranked hot EID.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotEidEntry {
    /// The EID.
    pub eid: String,
    /// Composite hot score.
    pub score: f64,
    /// Current metadata.
    pub metadata: EidMetadata,
    /// Usage trend.
    pub trend: Trend,
}

/// Computes the hot score of `meta` at time `now_ms`.
pub fn hot_score(meta: &EidMetadata, now_ms: u64, config: &RegistryConfig) -> f64 {
    let frequency_term = config.frequency_weight * (meta.frequency as f64).ln_1p();

    let age_ms = now_ms.saturating_sub(meta.last_seen);
    let half_life_ms = config.hot_half_life.as_millis() as f64;
    let decay = if half_life_ms > 0.0 {
        0.5_f64.powf(age_ms as f64 / half_life_ms)
    } else if age_ms == 0 {
        1.0
    } else {
        0.0
    };

    frequency_term + config.recency_weight * decay
}

/// Most-recently-used list without duplicates.
#[derive(Debug, Clone)]
pub(crate) struct RecentList {
    entries: VecDeque<String>,
    capacity: usize,
}

impl RecentList {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Moves `eid` to the front, evicting the oldest entry past capacity.
    pub(crate) fn touch(&mut self, eid: &str) {
        if let Some(pos) = self.entries.iter().position(|e| e == eid) {
            if let Some(existing) = self.entries.remove(pos) {
                self.entries.push_front(existing);
            }
        } else {
            self.entries.push_front(eid.to_string());
        }
        self.entries.truncate(self.capacity);
    }

    /// Restores a list, most recent first. Extra entries are dropped.
    pub(crate) fn restore(capacity: usize, eids: Vec<String>) -> Self {
        let mut entries: VecDeque<String> = eids.into();
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Per-EID usage timestamps, oldest first.
#[derive(Debug, Clone)]
pub(crate) struct UsageTracker {
    histories: HashMap<String, VecDeque<u64>>,
    capacity: usize,
}

impl UsageTracker {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            histories: HashMap::new(),
            capacity,
        }
    }

    pub(crate) fn record(&mut self, eid: &str, now_ms: u64) {
        let history = self.histories.entry(eid.to_string()).or_default();
        history.push_back(now_ms);
        while history.len() > self.capacity {
            history.pop_front();
        }
    }

    /// Replaces the history of `eid`, keeping the newest entries.
    pub(crate) fn restore(&mut self, eid: &str, mut timestamps: Vec<u64>) {
        timestamps.sort_unstable();
        let skip = timestamps.len().saturating_sub(self.capacity);
        let history: VecDeque<u64> = timestamps.into_iter().skip(skip).collect();
        if !history.is_empty() {
            self.histories.insert(eid.to_string(), history);
        }
    }

    pub(crate) fn history(&self, eid: &str) -> Option<&VecDeque<u64>> {
        self.histories.get(eid)
    }

    pub(crate) fn trend(&self, eid: &str, now_ms: u64, config: &RegistryConfig) -> Trend {
        let Some(history) = self.histories.get(eid) else {
            return Trend::Stable;
        };

        let recent_ms = config.trend_recent_window.as_millis() as u64;
        let baseline_ms = config.trend_baseline_window.as_millis() as u64;
        if recent_ms == 0 || baseline_ms == 0 {
            return Trend::Stable;
        }

        let count_since = |window: u64| {
            let from = now_ms.saturating_sub(window);
            history.iter().filter(|&&t| t >= from).count() as f64
        };
        let recent = count_since(recent_ms);
        let baseline = count_since(baseline_ms);
        if baseline == 0.0 {
            return Trend::Stable;
        }

        let ratio = (recent / recent_ms as f64) / (baseline / baseline_ms as f64);
        if ratio >= config.trend_threshold {
            Trend::Rising
        } else if ratio <= config.trend_threshold.recip() {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const HOUR: u64 = 60 * 60 * 1000;

    fn meta(frequency: u64, last_seen: u64) -> EidMetadata {
        let mut meta = EidMetadata::from_eid("a.b.c", last_seen).unwrap();
        meta.frequency = frequency;
        meta
    }

    #[test]
    fn recent_list_moves_to_front_without_duplicates() {
        let mut recent = RecentList::new(3);
        recent.touch("a");
        recent.touch("b");
        recent.touch("a");
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["a", "b"]);

        recent.touch("c");
        recent.touch("d");
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["d", "c", "a"]);
        assert_eq!(recent.len(), 3);
    }

    #[test]
    fn recent_list_restore_truncates() {
        let recent = RecentList::restore(2, vec!["x".into(), "y".into(), "z".into()]);
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn hot_score_monotonic_in_frequency() {
        let config = RegistryConfig::default();
        let now = 10 * HOUR;
        let mut last = f64::MIN;
        for f in [0, 1, 2, 10, 1000] {
            let score = hot_score(&meta(f, now - HOUR), now, &config);
            assert!(score >= last);
            last = score;
        }
    }

    #[test]
    fn hot_score_monotonic_in_recency() {
        let config = RegistryConfig::default();
        let now = 100 * HOUR;
        let older = hot_score(&meta(5, now - 10 * HOUR), now, &config);
        let newer = hot_score(&meta(5, now - HOUR), now, &config);
        let fresh = hot_score(&meta(5, now), now, &config);
        assert!(older < newer);
        assert!(newer < fresh);
    }

    #[test]
    fn zero_half_life_only_rewards_now() {
        let config = RegistryConfig::default().hot_half_life(Duration::ZERO);
        let now = HOUR;
        assert_eq!(hot_score(&meta(0, now), now, &config), config.recency_weight);
        assert_eq!(hot_score(&meta(0, now - 1), now, &config), 0.0);
    }

    #[test]
    fn usage_history_is_capped() {
        let mut usage = UsageTracker::new(3);
        for t in 0..5 {
            usage.record("a", t);
        }
        let history: Vec<_> = usage.history("a").unwrap().iter().copied().collect();
        assert_eq!(history, vec![2, 3, 4]);

        usage.restore("b", vec![9, 1, 5, 7]);
        let history: Vec<_> = usage.history("b").unwrap().iter().copied().collect();
        assert_eq!(history, vec![5, 7, 9]);
    }

    #[test]
    fn trend_classification() {
        let config = RegistryConfig::default();
        let now = 48 * HOUR;
        let mut usage = UsageTracker::new(256);

        // Burst within the last hour.
        for i in 0..5 {
            usage.record("burst", now - i * 1000);
        }
        assert_eq!(usage.trend("burst", now, &config), Trend::Rising);

        // Used hours ago, nothing recent.
        for i in 2..8 {
            usage.record("cooling", now - i * HOUR);
        }
        assert_eq!(usage.trend("cooling", now, &config), Trend::Falling);

        // One use per hour across the whole day.
        for i in 0..24 {
            usage.record("steady", now - i * HOUR - 1);
        }
        assert_eq!(usage.trend("steady", now, &config), Trend::Stable);

        assert_eq!(usage.trend("unknown", now, &config), Trend::Stable);
    }
}
