//! CLI command implementations.

pub mod create;
pub mod defrag;
pub mod export;
pub mod import;
pub mod inspect;
pub mod list;
pub mod manage;
pub mod verify;
