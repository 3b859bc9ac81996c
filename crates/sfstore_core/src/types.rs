//! Core type definitions for SFStore.

use std::fmt;

/// Access mode of a whole storage, fixed when it is opened.
///
/// Every stream derived from a storage inherits this mode; there is no
/// per-record override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    /// Records can be listed, opened and read.
    Read,
    /// Records can also be created, renamed, deleted, written and truncated.
    #[default]
    Modify,
}

impl Access {
    /// Returns true if mutations are allowed.
    #[must_use]
    pub const fn can_modify(self) -> bool {
        matches!(self, Self::Modify)
    }

    /// Stream access used when a record is opened without an explicit mode.
    #[must_use]
    pub const fn default_record_access(self) -> RecordAccess {
        match self {
            Self::Read => RecordAccess::Read,
            Self::Modify => RecordAccess::ReadWrite,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Modify => write!(f, "modify"),
        }
    }
}

/// Access mode of a single record stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordAccess {
    /// `read`, `seek` and `len` only.
    Read,
    /// Additionally `write` and `set_len`.
    ReadWrite,
}

impl RecordAccess {
    /// Returns true if the stream may be written.
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

impl fmt::Display for RecordAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::ReadWrite => write!(f, "read-write"),
        }
    }
}
