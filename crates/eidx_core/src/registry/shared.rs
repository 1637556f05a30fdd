//! Thread-safe registry handle.

use super::{decode_record, EidSuggestion, HotEidEntry, LoadReport, Registry, SearchOptions};
use crate::error::CoreResult;
use crate::types::{EidMetadata, EidUpdate};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use tracing::debug;

/// A [`Registry`] shared between threads.
///
/// Mutations are serialized behind a write lock; lookups and searches share
/// a read lock. Bulk loads release the lock between chunks of
/// `bulk_chunk_size` records, so readers keep making progress during a
/// large load but never observe a partially inserted record.
///
/// Cloning the handle is cheap and shares the registry.
#[derive(Debug, Clone)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    /// Wraps a registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Locks the registry for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read()
    }

    /// Locks the registry for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write()
    }

    /// Bulk-loads records one chunk at a time.
    pub fn initialize<I>(&self, records: I) -> LoadReport
    where
        I: IntoIterator<Item = EidMetadata>,
    {
        let chunk_size = self.chunk_size();
        let mut report = LoadReport::default();
        let mut records = records.into_iter().peekable();
        let mut offset = 0;

        while records.peek().is_some() {
            let chunk: Vec<EidMetadata> = records.by_ref().take(chunk_size).collect();
            let len = chunk.len();
            self.inner
                .write()
                .load_chunk(chunk.into_iter().map(Ok), offset, &mut report);
            offset += len;
            debug!(offset, "bulk load chunk applied");
        }

        self.inner.write().finish_load(&report);
        report
    }

    /// Bulk-loads JSON records one chunk at a time.
    pub fn initialize_json(&self, records: &[serde_json::Value]) -> LoadReport {
        let chunk_size = self.chunk_size();
        let mut report = LoadReport::default();

        for (i, chunk) in records.chunks(chunk_size).enumerate() {
            let offset = i * chunk_size;
            self.inner
                .write()
                .load_chunk(chunk.iter().map(decode_record), offset, &mut report);
            debug!(offset = offset + chunk.len(), "bulk load chunk applied");
        }

        self.inner.write().finish_load(&report);
        report
    }

    /// See [`Registry::add_eid`].
    pub fn add_eid(&self, metadata: EidMetadata) -> CoreResult<()> {
        self.inner.write().add_eid(metadata)
    }

    /// See [`Registry::register_eid`].
    pub fn register_eid(&self, eid: &str) -> CoreResult<EidMetadata> {
        self.inner.write().register_eid(eid)
    }

    /// See [`Registry::apply_updates`].
    pub fn apply_updates(&self, updates: &[EidUpdate]) -> usize {
        self.inner.write().apply_updates(updates)
    }

    /// See [`Registry::record_usage`].
    pub fn record_usage(&self, eid: &str) -> bool {
        self.inner.write().record_usage(eid)
    }

    /// Returns a copy of the metadata for `eid`.
    pub fn get(&self, eid: &str) -> Option<EidMetadata> {
        self.inner.read().get(eid).cloned()
    }

    /// See [`Registry::contains`].
    pub fn contains(&self, eid: &str) -> bool {
        self.inner.read().contains(eid)
    }

    /// See [`Registry::len`].
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// See [`Registry::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// See [`Registry::search`].
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<EidSuggestion> {
        self.inner.read().search(query, options)
    }

    /// See [`Registry::get_recent_eids`].
    pub fn get_recent_eids(&self, limit: usize) -> Vec<EidMetadata> {
        self.inner.read().get_recent_eids(limit)
    }

    /// See [`Registry::get_hot_eids`].
    pub fn get_hot_eids(&self, limit: usize) -> Vec<HotEidEntry> {
        self.inner.read().get_hot_eids(limit)
    }

    /// See [`Registry::export_json`].
    pub fn export_json(&self) -> CoreResult<String> {
        self.inner.read().export_json()
    }

    /// See [`Registry::import_json`].
    pub fn import_json(&self, json: &str) -> CoreResult<()> {
        self.inner.write().import_json(json)
    }

    /// See [`Registry::clear`].
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    fn chunk_size(&self) -> usize {
        self.inner.read().config().bulk_chunk_size.max(1)
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_feed::RegistryEventKind;
    use crate::config::RegistryConfig;
    use std::thread;

    fn records(n: usize) -> Vec<EidMetadata> {
        (0..n)
            .map(|i| EidMetadata::from_eid(&format!("ns{}.set{}.rad{i}", i % 3, i % 7), 0).unwrap())
            .collect()
    }

    #[test]
    fn chunked_load_reports_like_single_load() {
        let shared = SharedRegistry::new(Registry::new(
            RegistryConfig::default().bulk_chunk_size(7),
        ));
        let rx = shared.read().subscribe();

        let mut input = records(50);
        input[20].namespace.clear();
        let report = shared.initialize(input);

        assert_eq!(report.loaded, 49);
        assert_eq!(report.skipped[0].position, 20);
        assert_eq!(shared.len(), 49);
        assert_eq!(
            rx.try_recv().unwrap().kind,
            RegistryEventKind::BulkLoaded {
                loaded: 49,
                skipped: 1
            }
        );
    }

    #[test]
    fn chunked_json_load_keeps_positions() {
        let shared = SharedRegistry::new(Registry::new(
            RegistryConfig::default().bulk_chunk_size(2),
        ));
        let values = vec![
            serde_json::json!({"eid":"a.b.c","namespace":"a","radset":"b","radId":"c"}),
            serde_json::json!({"eid":"a.b.d","namespace":"a","radset":"b","radId":"d"}),
            serde_json::json!({"eid":"a.b.e"}),
            serde_json::json!({"eid":"a.b.f","namespace":"a","radset":"b","radId":"f"}),
        ];
        let report = shared.initialize_json(&values);
        assert_eq!(report.loaded, 3);
        assert_eq!(report.skipped[0].position, 2);
    }

    #[test]
    fn readers_interleave_with_bulk_load() {
        let shared = SharedRegistry::new(Registry::new(
            RegistryConfig::default().bulk_chunk_size(100),
        ));

        let writer = {
            let shared = shared.clone();
            thread::spawn(move || shared.initialize(records(3000)))
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..200 {
                        let registry = shared.read();
                        let len = registry.len();
                        assert!(len >= last);
                        assert_eq!(registry.all_eids().len(), len);
                        last = len;
                    }
                })
            })
            .collect();

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(writer.join().unwrap().loaded, 3000);
        assert_eq!(shared.len(), 3000);
    }

    #[test]
    fn concurrent_usage_is_serialized() {
        let shared = SharedRegistry::new(Registry::new(RegistryConfig::default()));
        shared.register_eid("shop.cart.add").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        shared.record_usage("shop.cart.add");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(shared.get("shop.cart.add").unwrap().frequency, 400);
        assert_eq!(shared.get_hot_eids(1)[0].eid, "shop.cart.add");
    }
}
