//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use eidx_core::{EidMetadata, EidUpdate};
use proptest::prelude::*;

/// Strategy for a single EID segment.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,7}").expect("Invalid regex")
}

/// Strategy for generating valid dotted EIDs with three to five segments.
pub fn eid_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 3..=5).prop_map(|segments| segments.join("."))
}

/// Strategy for arbitrary non-empty index keys, including non-ASCII chars.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-c.é_]{1,8}").expect("Invalid regex")
}

/// Strategy for generating valid metadata records.
pub fn metadata_strategy() -> impl Strategy<Value = EidMetadata> {
    (
        eid_strategy(),
        0u64..1_000,
        0u64..1_000_000,
        prop::option::of(0.0f64..=1.0),
        prop::option::of(0.0f64..5_000.0),
    )
        .prop_map(|(eid, frequency, last_seen, error_rate, avg)| {
            let mut meta = EidMetadata::from_eid(&eid, last_seen).expect("generated EID is valid");
            meta.frequency = frequency;
            meta.error_rate = error_rate;
            meta.avg_response_time = avg;
            meta
        })
}

/// Strategy for a batch of records with distinct EIDs.
pub fn metadata_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<EidMetadata>> {
    prop::collection::vec(metadata_strategy(), 0..max_len).prop_map(|mut records| {
        let mut seen = std::collections::HashSet::new();
        records.retain(|meta| seen.insert(meta.eid.clone()));
        records
    })
}

/// Strategy for metric updates against one of `eids`.
pub fn update_strategy(eids: Vec<String>) -> impl Strategy<Value = EidUpdate> {
    (
        prop::sample::select(eids),
        prop::option::of(0u64..2_000_000),
        prop::option::of(-0.5f64..1.5),
        0u64..10,
    )
        .prop_map(|(eid, last_seen, error_rate, frequency_delta)| EidUpdate {
            eid,
            last_seen,
            avg_response_time: None,
            error_rate,
            frequency_delta,
        })
}

/// Operations for registry state machine tests.
#[derive(Debug, Clone)]
pub enum RegistryOp {
    /// Upsert a record.
    Add(EidMetadata),
    /// Record one use of the EID at this position in the known set.
    Use(usize),
    /// Record one use of an EID that was never added.
    UseUnknown(String),
    /// Advance the clock.
    Tick(u64),
}

/// Strategy for generating registry operations.
pub fn registry_op_strategy() -> impl Strategy<Value = RegistryOp> {
    prop_oneof![
        3 => metadata_strategy().prop_map(RegistryOp::Add),
        4 => any::<usize>().prop_map(RegistryOp::Use),
        1 => eid_strategy().prop_map(|eid| RegistryOp::UseUnknown(format!("zz.{eid}"))),
        2 => (1u64..10_000_000).prop_map(RegistryOp::Tick),
    ]
}
