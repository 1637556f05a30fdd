//! # Eidx Core
//!
//! Prefix-tree index and usage-ranked registry for dotted event
//! identifiers (EIDs) such as `pandc.vnext.recommendations.view`.
//!
//! This crate provides:
//! - [`TrieIndex`], a character trie with frequency-weighted prefix and
//!   fuzzy search
//! - [`Registry`], which keeps EID metadata, the namespace hierarchy,
//!   the recent list and hot scores consistent with each other
//! - [`SharedRegistry`] for concurrent readers with serialized writers
//! - JSON snapshots for host-managed persistence
//!
//! ## Design Principles
//!
//! - Lookups and searches never fail; a miss is an empty result
//! - Bulk loads skip malformed records instead of aborting
//! - Snapshot imports are all-or-nothing
//! - Time is an explicit [`Clock`], never read from a global
//!
//! ## Example
//!
//! ```rust
//! use eidx_core::{Registry, RegistryConfig, SearchOptions};
//!
//! let mut registry = Registry::new(RegistryConfig::default());
//! registry.register_eid("commerce.cart.add").unwrap();
//! registry.register_eid("commerce.checkout.pay").unwrap();
//!
//! let hits = registry.search("cart", &SearchOptions::default());
//! assert_eq!(hits[0].eid, "commerce.cart.add");
//!
//! let json = registry.export_json().unwrap();
//! let mut restored = Registry::new(RegistryConfig::default());
//! restored.import_json(&json).unwrap();
//! assert_eq!(restored.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod change_feed;
pub mod clock;
mod config;
mod error;
pub mod index;
pub mod registry;
pub mod stats;
mod types;

pub use change_feed::{EventFeed, RegistryEvent, RegistryEventKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RegistryConfig;
pub use error::{CoreError, CoreResult};
pub use index::{fuzzy_match, FuzzyMatch, MatchKind, SearchResult, TrieIndex};
pub use registry::{
    hot_score, EidHierarchy, EidSuggestion, HotEidEntry, HotScoreRecord, LoadReport, Namespace,
    Rad, RadSet, Registry, RegistryState, SearchMode, SearchOptions, SharedRegistry,
    SkippedRecord, SortBy, Trend, STATE_VERSION,
};
pub use stats::{RegistryStats, StatsSnapshot};
pub use types::{EidMetadata, EidUpdate, EID_SEPARATOR};
