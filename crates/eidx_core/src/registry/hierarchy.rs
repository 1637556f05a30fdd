//! Namespace → radset → rad grouping of registered EIDs.
//!
//! The hierarchy is derived data. It is kept in step with the metadata set
//! by subtracting a record's old contribution before adding the new one,
//! and empty groups are pruned, so it never holds stale aggregates.

use crate::types::EidMetadata;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Aggregated view of every registered EID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EidHierarchy {
    /// Namespaces by name.
    pub namespaces: BTreeMap<String, Namespace>,
}

/// A namespace and its radsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// Radsets by name.
    pub radsets: BTreeMap<String, RadSet>,
    /// Number of EIDs below this namespace.
    pub eid_count: u64,
    /// Sum of the usage counters of those EIDs.
    pub event_count: u64,
}

/// A radset and its rads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadSet {
    /// Rads by id.
    pub rads: BTreeMap<String, Rad>,
    /// Number of EIDs below this radset.
    pub eid_count: u64,
    /// Sum of the usage counters of those EIDs.
    pub event_count: u64,
}

/// A rad and the EIDs filed under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rad {
    /// EIDs in this rad.
    pub eids: BTreeSet<String>,
    /// Sum of the usage counters of those EIDs.
    pub event_count: u64,
}

impl EidHierarchy {
    /// Builds a hierarchy from scratch.
    pub fn rebuild<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EidMetadata>,
    {
        let mut hierarchy = Self::default();
        for meta in records {
            hierarchy.add(meta);
        }
        hierarchy
    }

    /// Returns a namespace by name.
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    /// Returns a radset by namespace and name.
    pub fn radset(&self, namespace: &str, radset: &str) -> Option<&RadSet> {
        self.namespace(namespace)?.radsets.get(radset)
    }

    /// Returns a rad by its full path.
    pub fn rad(&self, namespace: &str, radset: &str, rad: &str) -> Option<&Rad> {
        self.radset(namespace, radset)?.rads.get(rad)
    }

    /// Total EIDs across all namespaces.
    pub fn total_eids(&self) -> u64 {
        self.namespaces.values().map(|ns| ns.eid_count).sum()
    }

    /// Total usage across all namespaces.
    pub fn total_events(&self) -> u64 {
        self.namespaces.values().map(|ns| ns.event_count).sum()
    }

    pub(crate) fn add(&mut self, meta: &EidMetadata) {
        let namespace = self.namespaces.entry(meta.namespace.clone()).or_default();
        let radset = namespace.radsets.entry(meta.radset.clone()).or_default();
        let rad = radset.rads.entry(meta.rad_id.clone()).or_default();

        if rad.eids.insert(meta.eid.clone()) {
            radset.eid_count += 1;
            namespace.eid_count += 1;
        }
        rad.event_count += meta.frequency;
        radset.event_count += meta.frequency;
        namespace.event_count += meta.frequency;
    }

    pub(crate) fn remove(&mut self, meta: &EidMetadata) {
        let Some(namespace) = self.namespaces.get_mut(&meta.namespace) else {
            return;
        };
        let Some(radset) = namespace.radsets.get_mut(&meta.radset) else {
            return;
        };
        let Some(rad) = radset.rads.get_mut(&meta.rad_id) else {
            return;
        };
        if !rad.eids.remove(&meta.eid) {
            return;
        }

        radset.eid_count = radset.eid_count.saturating_sub(1);
        namespace.eid_count = namespace.eid_count.saturating_sub(1);
        rad.event_count = rad.event_count.saturating_sub(meta.frequency);
        radset.event_count = radset.event_count.saturating_sub(meta.frequency);
        namespace.event_count = namespace.event_count.saturating_sub(meta.frequency);

        if rad.eids.is_empty() {
            radset.rads.remove(&meta.rad_id);
        }
        if radset.rads.is_empty() {
            namespace.radsets.remove(&meta.radset);
        }
        if namespace.radsets.is_empty() {
            self.namespaces.remove(&meta.namespace);
        }
    }

    /// Adds `delta` usage to the groups containing `meta`.
    pub(crate) fn add_events(&mut self, meta: &EidMetadata, delta: u64) {
        let Some(namespace) = self.namespaces.get_mut(&meta.namespace) else {
            return;
        };
        let Some(radset) = namespace.radsets.get_mut(&meta.radset) else {
            return;
        };
        let Some(rad) = radset.rads.get_mut(&meta.rad_id) else {
            return;
        };
        rad.event_count += delta;
        radset.event_count += delta;
        namespace.event_count += delta;
    }
}
