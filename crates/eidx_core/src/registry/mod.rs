//! The EID registry.
//!
//! [`Registry`] is the surface external collaborators use. It owns:
//! - a [`TrieIndex`] of [`EidMetadata`] keyed by EID
//! - the namespace → radset → rad [`EidHierarchy`]
//! - the MRU list and per-EID usage history behind hot scores
//!
//! All mutations take `&mut self` and run to completion; wrap the registry
//! in a [`SharedRegistry`] to use it from several threads.

mod hierarchy;
mod search;
mod shared;
mod state;
mod usage;

pub use hierarchy::{EidHierarchy, Namespace, Rad, RadSet};
pub use search::{EidSuggestion, SearchMode, SearchOptions, SortBy};
pub use shared::SharedRegistry;
pub use state::{HotScoreRecord, RegistryState, STATE_VERSION};
pub use usage::{hot_score, HotEidEntry, Trend};

use crate::change_feed::{EventFeed, RegistryEvent, RegistryEventKind};
use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::error::{CoreError, CoreResult};
use crate::index::TrieIndex;
use crate::stats::RegistryStats;
use crate::types::{EidMetadata, EidUpdate};
use serde::Deserialize;
use std::sync::mpsc::Receiver;
use tracing::{debug, trace, warn};
use usage::{RecentList, UsageTracker};

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records inserted or updated.
    pub loaded: usize,
    /// Records rejected as malformed.
    pub skipped: Vec<SkippedRecord>,
}

impl LoadReport {
    /// Number of rejected records.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// A record rejected by a bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the input.
    pub position: usize,
    /// The record's EID, if one could be read.
    pub eid: Option<String>,
    /// Why the record was rejected.
    pub reason: String,
}

/// Everything that a snapshot import replaces in one step.
#[derive(Debug)]
pub(crate) struct Contents {
    pub(crate) index: TrieIndex<EidMetadata>,
    pub(crate) hierarchy: EidHierarchy,
    pub(crate) recent: RecentList,
    pub(crate) usage: UsageTracker,
}

impl Contents {
    pub(crate) fn new(config: &RegistryConfig) -> Self {
        Self {
            index: TrieIndex::new(),
            hierarchy: EidHierarchy::default(),
            recent: RecentList::new(config.recent_capacity),
            usage: UsageTracker::new(config.usage_history_capacity),
        }
    }

    /// Inserts or replaces a validated record. Returns true if it was new.
    ///
    /// The terminal node's frequency is raised by any growth in the
    /// record's usage counter, so prefix ranking reflects usage.
    pub(crate) fn upsert(&mut self, meta: EidMetadata) -> bool {
        let previous_frequency = match self.index.search(&meta.eid) {
            Some(old) => {
                self.hierarchy.remove(old);
                old.frequency
            }
            None => 0,
        };
        self.hierarchy.add(&meta);

        let eid = meta.eid.clone();
        let gained = meta.frequency.saturating_sub(previous_frequency);
        let is_new = self.index.insert(&eid, meta);
        if gained > 0 {
            self.index.update_frequency(&eid, gained);
        }
        is_new
    }
}

/// Registry of EIDs with ranked search and usage tracking.
///
/// # Example
///
/// ```
/// use eidx_core::{Registry, RegistryConfig, SearchOptions};
///
/// let mut registry = Registry::new(RegistryConfig::default());
/// registry.register_eid("commerce.cart.add").unwrap();
/// registry.register_eid("commerce.cart.remove").unwrap();
///
/// registry.record_usage("commerce.cart.remove");
///
/// let hits = registry.search("commerce.cart", &SearchOptions::default());
/// assert_eq!(hits[0].eid, "commerce.cart.remove");
/// assert_eq!(registry.get_recent_eids(1)[0].eid, "commerce.cart.remove");
/// ```
pub struct Registry {
    config: RegistryConfig,
    clock: Box<dyn Clock>,
    contents: Contents,
    stats: RegistryStats,
    feed: EventFeed,
}

impl Registry {
    /// Creates an empty registry on the system clock.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Creates an empty registry with an explicit time source.
    pub fn with_clock(config: RegistryConfig, clock: impl Clock + 'static) -> Self {
        let contents = Contents::new(&config);
        Self {
            config,
            clock: Box::new(clock),
            contents,
            stats: RegistryStats::new(),
            feed: EventFeed::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the registry counters.
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Subscribes to registry events.
    pub fn subscribe(&self) -> Receiver<RegistryEvent> {
        self.feed.subscribe()
    }

    /// Returns the event feed, for catch-up polling.
    pub fn events(&self) -> &EventFeed {
        &self.feed
    }

    /// Current time according to the registry clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Number of registered EIDs.
    pub fn len(&self) -> usize {
        self.contents.index.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.contents.index.is_empty()
    }

    /// Returns true if `eid` is registered.
    pub fn contains(&self, eid: &str) -> bool {
        self.contents.index.contains(eid)
    }

    /// Returns the metadata for `eid`.
    pub fn get(&self, eid: &str) -> Option<&EidMetadata> {
        self.contents.index.search(eid)
    }

    /// Every registered EID, in lexicographic order.
    pub fn all_eids(&self) -> Vec<String> {
        self.contents.index.all_keys()
    }

    /// Read access to the underlying index.
    pub fn index(&self) -> &TrieIndex<EidMetadata> {
        &self.contents.index
    }

    /// Bulk-loads records, skipping malformed ones.
    ///
    /// Records are upserted into the existing registry. The load never
    /// fails as a whole; rejected records are listed in the report, logged,
    /// and counted in [`RegistryStats::records_skipped`].
    pub fn initialize<I>(&mut self, records: I) -> LoadReport
    where
        I: IntoIterator<Item = EidMetadata>,
    {
        let mut report = LoadReport::default();
        self.load_chunk(records.into_iter().map(Ok), 0, &mut report);
        self.finish_load(&report);
        report
    }

    /// Bulk-loads records from loosely typed JSON values.
    ///
    /// Each value is decoded on its own, so one undecodable record does not
    /// affect the rest.
    pub fn initialize_json(&mut self, records: &[serde_json::Value]) -> LoadReport {
        let mut report = LoadReport::default();
        self.load_chunk(records.iter().map(decode_record), 0, &mut report);
        self.finish_load(&report);
        report
    }

    pub(crate) fn load_chunk<I>(&mut self, records: I, offset: usize, report: &mut LoadReport)
    where
        I: IntoIterator<Item = CoreResult<EidMetadata>>,
    {
        for (i, record) in records.into_iter().enumerate() {
            let position = offset + i;
            let checked = record.and_then(|meta| meta.validate().map(|()| meta));
            match checked {
                Ok(meta) => {
                    self.contents.upsert(meta);
                    report.loaded += 1;
                }
                Err(err) => {
                    let eid = match &err {
                        CoreError::InvalidRecord { eid, .. } if !eid.is_empty() => {
                            Some(eid.clone())
                        }
                        _ => None,
                    };
                    warn!(position, eid = ?eid, error = %err, "skipping malformed EID record");
                    report.skipped.push(SkippedRecord {
                        position,
                        eid,
                        reason: err.to_string(),
                    });
                }
            }
        }
        debug!(
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "bulk load progress"
        );
    }

    pub(crate) fn finish_load(&mut self, report: &LoadReport) {
        self.stats
            .record_load(report.loaded as u64, report.skipped.len() as u64);
        self.feed.emit(RegistryEventKind::BulkLoaded {
            loaded: report.loaded,
            skipped: report.skipped.len(),
        });
    }

    /// Inserts or replaces one record.
    pub fn add_eid(&mut self, metadata: EidMetadata) -> CoreResult<()> {
        metadata.validate()?;
        let eid = metadata.eid.clone();
        let is_new = self.contents.upsert(metadata);
        self.stats.record_upsert();

        let kind = if is_new {
            RegistryEventKind::EidAdded { eid }
        } else {
            RegistryEventKind::EidUpdated { eid }
        };
        self.feed.emit(kind);
        Ok(())
    }

    /// Registers a bare EID, deriving its metadata from the dotted form.
    ///
    /// Returns the existing record untouched if the EID is already known.
    pub fn register_eid(&mut self, eid: &str) -> CoreResult<EidMetadata> {
        if let Some(existing) = self.get(eid) {
            return Ok(existing.clone());
        }
        let metadata = EidMetadata::from_eid(eid, self.clock.now_ms())?;
        self.add_eid(metadata.clone())?;
        Ok(metadata)
    }

    /// Applies metric updates to known EIDs.
    ///
    /// Updates for unknown EIDs, or that would leave a record invalid, are
    /// skipped. Returns the number applied.
    pub fn apply_updates(&mut self, updates: &[EidUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            let Some(meta) = self.contents.index.get_mut(&update.eid) else {
                trace!(eid = %update.eid, "update for unknown EID ignored");
                continue;
            };
            if let Err(err) = update.apply_to(meta) {
                warn!(eid = %update.eid, error = %err, "rejected EID update");
                continue;
            }
            if update.frequency_delta > 0 {
                self.contents.hierarchy.add_events(meta, update.frequency_delta);
                self.contents
                    .index
                    .update_frequency(&update.eid, update.frequency_delta);
            }
            applied += 1;
            self.feed.emit(RegistryEventKind::EidUpdated {
                eid: update.eid.clone(),
            });
        }
        applied
    }

    /// Records one use of `eid`.
    ///
    /// Bumps its usage counter and index frequency, moves it to the front of
    /// the recent list, and extends its usage history. Unknown EIDs are
    /// ignored; returns whether anything was recorded.
    pub fn record_usage(&mut self, eid: &str) -> bool {
        let now = self.clock.now_ms();
        let Some(meta) = self.contents.index.get_mut(eid) else {
            self.stats.record_usage(false);
            trace!(eid, "usage for unknown EID ignored");
            return false;
        };

        meta.frequency = meta.frequency.saturating_add(1);
        meta.last_seen = meta.last_seen.max(now);
        let frequency = meta.frequency;
        self.contents.hierarchy.add_events(meta, 1);

        self.contents.index.update_frequency(eid, 1);
        self.contents.recent.touch(eid);
        self.contents.usage.record(eid, now);

        self.stats.record_usage(true);
        trace!(eid, frequency, "usage recorded");
        self.feed.emit(RegistryEventKind::UsageRecorded {
            eid: eid.to_string(),
            frequency,
        });
        true
    }

    /// The `limit` most recently used EIDs, newest first.
    pub fn get_recent_eids(&self, limit: usize) -> Vec<EidMetadata> {
        self.contents
            .recent
            .iter()
            .filter_map(|eid| self.get(eid))
            .take(limit)
            .cloned()
            .collect()
    }

    /// The `limit` hottest EIDs at the current time.
    ///
    /// Only EIDs with a positive usage counter are candidates. Ties are
    /// broken by EID.
    pub fn get_hot_eids(&self, limit: usize) -> Vec<HotEidEntry> {
        if limit == 0 {
            return Vec::new();
        }
        let now = self.clock.now_ms();

        let mut scored: Vec<(f64, &EidMetadata)> = self
            .contents
            .index
            .entries()
            .into_iter()
            .filter(|(_, meta)| meta.frequency > 0)
            .map(|(_, meta)| (hot_score(meta, now, &self.config), meta))
            .collect();
        scored.sort_by(|(sa, a), (sb, b)| sb.total_cmp(sa).then_with(|| a.eid.cmp(&b.eid)));

        scored
            .into_iter()
            .take(limit)
            .map(|(score, meta)| HotEidEntry {
                eid: meta.eid.clone(),
                score,
                metadata: meta.clone(),
                trend: self.contents.usage.trend(&meta.eid, now, &self.config),
            })
            .collect()
    }

    /// The namespace → radset → rad view of all registered EIDs.
    pub fn get_hierarchy(&self) -> &EidHierarchy {
        &self.contents.hierarchy
    }

    /// Removes every EID and all usage state.
    pub fn clear(&mut self) {
        self.contents = Contents::new(&self.config);
        self.feed.emit(RegistryEventKind::Cleared);
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("eids", &self.len())
            .field("recent", &self.contents.recent.len())
            .field("config", &self.config)
            .finish()
    }
}

fn decode_record(value: &serde_json::Value) -> CoreResult<EidMetadata> {
    EidMetadata::deserialize(value).map_err(|err| {
        let eid = value
            .get("eid")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        CoreError::invalid_record(eid, err.to_string())
    })
}
