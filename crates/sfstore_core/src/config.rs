//! Storage configuration.

use crate::types::Access;

/// Configuration for opening a storage.
#[derive(Debug, Clone)]
pub struct Config {
    /// Access mode applied to the storage and every stream opened from it.
    pub access: Access,

    /// Whether to create the storage file if it doesn't exist.
    ///
    /// Ignored for [`Access::Read`], which never creates files.
    pub create_if_missing: bool,

    /// Whether closing a written stream syncs the backend (safer but slower).
    ///
    /// When false, closing only flushes.
    pub sync_on_close: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access: Access::Modify,
            create_if_missing: true,
            sync_on_close: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for read-only access.
    #[must_use]
    pub fn read_only() -> Self {
        Self::default().access(Access::Read)
    }

    /// Sets the access mode.
    #[must_use]
    pub const fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Sets whether to create the storage file if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether closing a written stream syncs the backend.
    #[must_use]
    pub const fn sync_on_close(mut self, value: bool) -> Self {
        self.sync_on_close = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.access, Access::Modify);
        assert!(config.create_if_missing);
        assert!(!config.sync_on_close);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .access(Access::Read)
            .create_if_missing(false)
            .sync_on_close(true);

        assert_eq!(config.access, Access::Read);
        assert!(!config.create_if_missing);
        assert!(config.sync_on_close);
    }

    #[test]
    fn read_only_shortcut() {
        assert_eq!(Config::read_only().access, Access::Read);
    }
}
