//! Test fixtures and registry helpers.
//!
//! Provides deterministic demo data, a registry driven by a manual clock,
//! and snapshot files in temporary directories.

use eidx_core::{EidMetadata, ManualClock, Registry, RegistryConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Start time of every [`TestRegistry`]: 2024-01-01T00:00:00Z.
pub const TEST_EPOCH_MS: u64 = 1_704_067_200_000;

/// EIDs used by the demo data set.
pub const DEMO_EIDS: &[&str] = &[
    "commerce.cart.add",
    "commerce.cart.remove",
    "commerce.checkout.pay",
    "commerce.checkout.pay.confirm",
    "media.player.play",
    "media.player.pause",
    "media.player.seek.forward",
    "pandc.vnext.discovery.search",
    "pandc.vnext.recommendations.click",
    "pandc.vnext.recommendations.view",
    "search.box.submit",
    "search.results.page.next",
];

/// Demo records, all last seen at [`TEST_EPOCH_MS`] with zero usage.
pub fn demo_records() -> Vec<EidMetadata> {
    DEMO_EIDS.iter().map(|eid| demo_record(eid)).collect()
}

/// A single record parsed from `eid` at [`TEST_EPOCH_MS`].
pub fn demo_record(eid: &str) -> EidMetadata {
    EidMetadata::from_eid(eid, TEST_EPOCH_MS).expect("Invalid demo EID")
}

/// Demo records as loosely typed JSON, the way a host would receive them.
pub fn demo_json_records() -> Vec<serde_json::Value> {
    demo_records()
        .iter()
        .map(|meta| serde_json::to_value(meta).expect("Failed to encode record"))
        .collect()
}

/// A registry with a manual clock.
pub struct TestRegistry {
    /// The registry instance.
    pub registry: Registry,
    /// Handle to the registry's clock.
    pub clock: ManualClock,
}

impl TestRegistry {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates an empty registry with `config`.
    pub fn with_config(config: RegistryConfig) -> Self {
        let clock = ManualClock::new(TEST_EPOCH_MS);
        Self {
            registry: Registry::with_clock(config, clock.clone()),
            clock,
        }
    }

    /// Creates a registry loaded with [`demo_records`].
    pub fn with_demo_data() -> Self {
        let mut test = Self::new();
        let report = test.registry.initialize(demo_records());
        assert_eq!(report.skipped_count(), 0, "demo data must load cleanly");
        test
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Records `times` uses of `eid`.
    pub fn use_eid(&mut self, eid: &str, times: usize) {
        for _ in 0..times {
            assert!(self.registry.record_usage(eid), "unknown EID {eid}");
        }
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestRegistry {
    type Target = Registry;

    fn deref(&self) -> &Self::Target {
        &self.registry
    }
}

impl std::ops::DerefMut for TestRegistry {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.registry
    }
}

/// A temporary directory for snapshot files.
pub struct SnapshotDir {
    temp_dir: TempDir,
}

impl SnapshotDir {
    /// Creates a new temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Path of the directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `registry`'s snapshot to `name` and returns its path.
    pub fn save(&self, registry: &Registry, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let json = registry.export_json().expect("Failed to export snapshot");
        std::fs::write(&path, json).expect("Failed to write snapshot");
        path
    }

    /// Reads a snapshot file into `registry`.
    pub fn load(&self, registry: &mut Registry, name: &str) -> eidx_core::CoreResult<()> {
        let path = self.temp_dir.path().join(name);
        let json = std::fs::read_to_string(path).expect("Failed to read snapshot");
        registry.import_json(&json)
    }
}

impl Default for SnapshotDir {
    fn default() -> Self {
        Self::new()
    }
}
