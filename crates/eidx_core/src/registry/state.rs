//! Registry snapshots.
//!
//! A snapshot is a plain JSON document holding every metadata record, the
//! recent list and per-EID usage history. The hierarchy and the index are
//! derived data and are rebuilt on import.
//!
//! ## Format
//!
//! ```text
//! {
//!   "version": 1,
//!   "exportedAt": 1700000000000,
//!   "metadata": [ { "eid": "...", ... } ],
//!   "recent": [ "most.recent.eid", ... ],
//!   "hotScores": [ { "eid": "...", "score": 61.0, "usage": [ ... ] } ]
//! }
//! ```
//!
//! Imports are all-or-nothing: the snapshot is validated and a complete
//! replacement is built before the live registry is touched.

use super::{hot_score, Contents, Registry};
use crate::change_feed::RegistryEventKind;
use crate::error::{CoreError, CoreResult};
use crate::registry::usage::RecentList;
use crate::types::EidMetadata;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Current snapshot format version.
pub const STATE_VERSION: u32 = 1;

/// Serializable registry contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryState {
    /// Format version.
    pub version: u32,
    /// Export time (Unix ms).
    pub exported_at: u64,
    /// Every registered record, in EID order.
    pub metadata: Vec<EidMetadata>,
    /// Recent list, most recent first.
    #[serde(default)]
    pub recent: Vec<String>,
    /// Hot score and usage history of every used EID.
    #[serde(default)]
    pub hot_scores: Vec<HotScoreRecord>,
}

/// Usage state of one EID in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotScoreRecord {
    /// The EID.
    pub eid: String,
    /// Hot score at export time. Informational; scores are recomputed.
    pub score: f64,
    /// Usage timestamps (Unix ms), oldest first.
    #[serde(default)]
    pub usage: Vec<u64>,
}

impl Registry {
    /// Captures the registry contents.
    pub fn export_state(&self) -> RegistryState {
        let now = self.clock.now_ms();
        let entries = self.contents.index.entries();

        let hot_scores = entries
            .iter()
            .filter(|(_, meta)| meta.frequency > 0)
            .map(|(eid, meta)| HotScoreRecord {
                eid: eid.clone(),
                score: hot_score(meta, now, &self.config),
                usage: self
                    .contents
                    .usage
                    .history(eid)
                    .map(|h| h.iter().copied().collect())
                    .unwrap_or_default(),
            })
            .collect();

        let state = RegistryState {
            version: STATE_VERSION,
            exported_at: now,
            metadata: entries.into_iter().map(|(_, meta)| meta.clone()).collect(),
            recent: self.contents.recent.iter().map(str::to_string).collect(),
            hot_scores,
        };

        self.stats.record_export();
        debug!(
            eids = state.metadata.len(),
            recent = state.recent.len(),
            "registry state exported"
        );
        state
    }

    /// Captures the registry contents as JSON.
    pub fn export_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(&self.export_state())?)
    }

    /// Replaces the registry contents with a snapshot.
    ///
    /// On error the registry is unchanged.
    pub fn import_state(&mut self, state: RegistryState) -> CoreResult<()> {
        match self.build_contents(state) {
            Ok(contents) => {
                self.contents = contents;
                self.stats.record_import(true);
                let eids = self.len();
                debug!(eids, "registry state imported");
                self.feed.emit(RegistryEventKind::StateImported { eids });
                Ok(())
            }
            Err(err) => Err(self.reject_import(err)),
        }
    }

    /// Replaces the registry contents with a JSON snapshot.
    ///
    /// Unparseable input is reported as a state import error and leaves
    /// the registry unchanged.
    pub fn import_json(&mut self, json: &str) -> CoreResult<()> {
        match serde_json::from_str::<RegistryState>(json) {
            Ok(state) => self.import_state(state),
            Err(err) => Err(self.reject_import(CoreError::state_import(format!(
                "malformed snapshot: {err}"
            )))),
        }
    }

    fn reject_import(&self, err: CoreError) -> CoreError {
        self.stats.record_import(false);
        warn!(error = %err, "rejected registry state import");
        err
    }

    fn build_contents(&self, state: RegistryState) -> CoreResult<Contents> {
        if state.version != STATE_VERSION {
            return Err(CoreError::state_import(format!(
                "unsupported snapshot version {}",
                state.version
            )));
        }

        let mut known = HashSet::with_capacity(state.metadata.len());
        for meta in &state.metadata {
            meta.validate()
                .map_err(|err| CoreError::state_import(err.to_string()))?;
            if !known.insert(meta.eid.as_str()) {
                return Err(CoreError::state_import(format!(
                    "duplicate eid {:?}",
                    meta.eid
                )));
            }
        }

        let mut seen = HashSet::with_capacity(state.recent.len());
        for eid in &state.recent {
            if !known.contains(eid.as_str()) {
                return Err(CoreError::state_import(format!(
                    "recent list references unknown eid {eid:?}"
                )));
            }
            if !seen.insert(eid.as_str()) {
                return Err(CoreError::state_import(format!(
                    "recent list repeats eid {eid:?}"
                )));
            }
        }

        for record in &state.hot_scores {
            if !known.contains(record.eid.as_str()) {
                return Err(CoreError::state_import(format!(
                    "hot score references unknown eid {:?}",
                    record.eid
                )));
            }
        }

        let mut contents = Contents::new(&self.config);
        for meta in state.metadata {
            contents.upsert(meta);
        }
        contents.recent = RecentList::restore(self.config.recent_capacity, state.recent);
        for record in state.hot_scores {
            contents.usage.restore(&record.eid, record.usage);
        }
        Ok(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::RegistryConfig;
    use crate::registry::SearchOptions;

    const HOUR: u64 = 60 * 60 * 1000;

    fn populated() -> (Registry, ManualClock) {
        let clock = ManualClock::new(48 * HOUR);
        let mut registry = Registry::with_clock(RegistryConfig::default(), clock.clone());
        for eid in [
            "commerce.cart.add",
            "commerce.cart.remove",
            "pandc.vnext.recommendations.view",
        ] {
            registry.register_eid(eid).unwrap();
        }
        registry.record_usage("commerce.cart.add");
        registry.record_usage("commerce.cart.add");
        registry.record_usage("pandc.vnext.recommendations.view");
        (registry, clock)
    }

    fn fresh(clock: &ManualClock) -> Registry {
        Registry::with_clock(RegistryConfig::default(), clock.clone())
    }

    #[test]
    fn export_captures_contents() {
        let (registry, _) = populated();
        let state = registry.export_state();

        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.exported_at, 48 * HOUR);
        assert_eq!(state.metadata.len(), 3);
        assert_eq!(
            state.recent,
            vec!["pandc.vnext.recommendations.view", "commerce.cart.add"]
        );
        assert_eq!(state.hot_scores.len(), 2);
        let add = state
            .hot_scores
            .iter()
            .find(|h| h.eid == "commerce.cart.add")
            .unwrap();
        assert_eq!(add.usage, vec![48 * HOUR, 48 * HOUR]);
        assert_eq!(registry.stats().snapshot().exports, 1);
    }

    #[test]
    fn json_round_trip_restores_behavior() {
        let (registry, clock) = populated();
        let json = registry.export_json().unwrap();
        assert!(json.contains("\"hotScores\""));
        assert!(json.contains("\"exportedAt\""));

        let mut restored = fresh(&clock);
        restored.import_json(&json).unwrap();

        assert_eq!(restored.all_eids(), registry.all_eids());
        assert_eq!(restored.get_hierarchy(), registry.get_hierarchy());
        assert_eq!(restored.get_recent_eids(10), registry.get_recent_eids(10));
        assert_eq!(restored.get_hot_eids(10), registry.get_hot_eids(10));

        let options = SearchOptions::default();
        let before: Vec<_> = registry
            .search("commerce", &options)
            .into_iter()
            .map(|s| s.eid)
            .collect();
        let after: Vec<_> = restored
            .search("commerce", &options)
            .into_iter()
            .map(|s| s.eid)
            .collect();
        assert_eq!(before, after);
        assert_eq!(restored.stats().snapshot().imports, 1);
    }

    #[test]
    fn import_replaces_existing_contents() {
        let (registry, clock) = populated();
        let state = registry.export_state();

        let mut other = fresh(&clock);
        other.register_eid("other.thing.here").unwrap();
        other.import_state(state).unwrap();

        assert!(!other.contains("other.thing.here"));
        assert_eq!(other.len(), 3);
    }

    #[test]
    fn rejected_imports_leave_registry_unchanged() {
        let (mut registry, _) = populated();
        let original = registry.export_state();

        let mut bad_version = original.clone();
        bad_version.version = 99;

        let mut duplicate = original.clone();
        duplicate.metadata.push(duplicate.metadata[0].clone());

        let mut invalid = original.clone();
        invalid.metadata[1].error_rate = Some(3.0);

        let mut dangling_recent = original.clone();
        dangling_recent.recent.push("ghost.eid.here".into());

        let mut repeated_recent = original.clone();
        repeated_recent.recent.push(repeated_recent.recent[0].clone());

        let mut dangling_hot = original.clone();
        dangling_hot.hot_scores.push(HotScoreRecord {
            eid: "ghost.eid.here".into(),
            score: 1.0,
            usage: Vec::new(),
        });

        for state in [
            bad_version,
            duplicate,
            invalid,
            dangling_recent,
            repeated_recent,
            dangling_hot,
        ] {
            let err = registry.import_state(state).unwrap_err();
            assert!(err.is_state_import(), "{err}");
        }

        let err = registry.import_json("{ not json").unwrap_err();
        assert!(err.is_state_import());

        let mut after = registry.export_state();
        after.exported_at = original.exported_at;
        assert_eq!(after, original);
        assert_eq!(registry.stats().import_failures(), 7);
    }

    #[test]
    fn import_emits_event() {
        let (registry, clock) = populated();
        let state = registry.export_state();

        let mut restored = fresh(&clock);
        let rx = restored.subscribe();
        restored.import_state(state).unwrap();

        assert_eq!(
            rx.try_recv().unwrap().kind,
            RegistryEventKind::StateImported { eids: 3 }
        );
    }
}
