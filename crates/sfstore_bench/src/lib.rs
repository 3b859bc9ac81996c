//! Shared helpers for SFStore benchmarks.

#![warn(missing_docs)]

pub mod utils;
