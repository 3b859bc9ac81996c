//! # SFStore Testkit
//!
//! Test utilities for SFStore.
//!
//! This crate provides:
//! - Test fixtures and storage helpers
//! - Property-based test generators using proptest
//! - A reference model of a record stream
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sfstore_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_storage() {
//!     with_temp_storage(|storage| {
//!         storage.create_record("test").unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
