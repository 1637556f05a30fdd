//! Registry configuration.

use std::time::Duration;

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Number of EIDs retained in the most-recently-used list.
    pub recent_capacity: usize,

    /// Number of usage timestamps kept per EID for trend detection.
    pub usage_history_capacity: usize,

    /// Result limit used when a search does not specify one.
    pub default_max_results: usize,

    /// Half-life of the recency component of the hot score.
    pub hot_half_life: Duration,

    /// Weight of `ln(1 + frequency)` in the hot score.
    pub frequency_weight: f64,

    /// Weight of the decayed recency term in the hot score.
    pub recency_weight: f64,

    /// Window whose usage rate is compared against the baseline.
    pub trend_recent_window: Duration,

    /// Longer window the recent rate is compared to.
    pub trend_baseline_window: Duration,

    /// Rate ratio at or above which a trend is rising (and at or below
    /// whose inverse it is falling).
    pub trend_threshold: f64,

    /// Records inserted per write-lock acquisition during shared bulk loads.
    pub bulk_chunk_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            recent_capacity: 50,
            usage_history_capacity: 256,
            default_max_results: 10,
            hot_half_life: Duration::from_secs(60 * 60),
            frequency_weight: 10.0,
            recency_weight: 50.0,
            trend_recent_window: Duration::from_secs(60 * 60),
            trend_baseline_window: Duration::from_secs(24 * 60 * 60),
            trend_threshold: 1.5,
            bulk_chunk_size: 1000,
        }
    }
}

impl RegistryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the MRU retention size.
    #[must_use]
    pub const fn recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = capacity;
        self
    }

    /// Sets the per-EID usage history size.
    #[must_use]
    pub const fn usage_history_capacity(mut self, capacity: usize) -> Self {
        self.usage_history_capacity = capacity;
        self
    }

    /// Sets the default search result limit.
    #[must_use]
    pub const fn default_max_results(mut self, max_results: usize) -> Self {
        self.default_max_results = max_results;
        self
    }

    /// Sets the recency half-life.
    #[must_use]
    pub const fn hot_half_life(mut self, half_life: Duration) -> Self {
        self.hot_half_life = half_life;
        self
    }

    /// Sets the hot-score weights.
    #[must_use]
    pub const fn hot_weights(mut self, frequency: f64, recency: f64) -> Self {
        self.frequency_weight = frequency;
        self.recency_weight = recency;
        self
    }

    /// Sets the trend windows.
    #[must_use]
    pub const fn trend_windows(mut self, recent: Duration, baseline: Duration) -> Self {
        self.trend_recent_window = recent;
        self.trend_baseline_window = baseline;
        self
    }

    /// Sets the trend threshold ratio.
    #[must_use]
    pub const fn trend_threshold(mut self, threshold: f64) -> Self {
        self.trend_threshold = threshold;
        self
    }

    /// Sets the bulk-load chunk size.
    #[must_use]
    pub const fn bulk_chunk_size(mut self, size: usize) -> Self {
        self.bulk_chunk_size = size;
        self
    }
}
