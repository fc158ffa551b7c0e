//! Database configuration

use std::path::{Path, PathBuf};

/// Default database name
pub const DEFAULT_NAME: &str = "tinyrdb";

/// Database configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Directory holding one snapshot file per table; `None` keeps
    /// everything in memory
    pub data_dir: Option<PathBuf>,
    /// Display name
    pub name: String,
    /// Write pretty-printed snapshots
    pub pretty: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            name: DEFAULT_NAME.to_string(),
            pretty: true,
        }
    }
}

impl DatabaseConfig {
    /// Create an in-memory config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist tables under `dir`
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Keep everything in memory
    pub fn in_memory(mut self) -> Self {
        self.data_dir = None;
        self
    }

    /// Set the database name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Toggle pretty-printed snapshot files
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn is_persistent(&self) -> bool {
        self.data_dir.is_some()
    }

    pub fn data_path(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = DatabaseConfig::new();
        assert!(!config.is_persistent());
        assert_eq!(config.name, "tinyrdb");

        let config = config.data_dir("/tmp/db").name("shop").pretty(false);
        assert_eq!(config.data_path(), Some(Path::new("/tmp/db")));
        assert_eq!(config.name, "shop");
        assert!(!config.pretty);

        assert!(!config.in_memory().is_persistent());
    }
}
