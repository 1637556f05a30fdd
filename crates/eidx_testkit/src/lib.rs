//! # Eidx Testkit
//!
//! Test utilities for eidx.
//!
//! This crate provides:
//! - Property-based test generators using proptest
//! - Deterministic demo data and registry fixtures
//! - Snapshot helpers for host-persistence tests
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use eidx_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_registry() {
//!     let mut registry = TestRegistry::with_demo_data();
//!     registry.record_usage("commerce.cart.add");
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
