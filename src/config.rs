//! Server configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::Result;

use crate::db::Database;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Where the task state lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    /// `tasks.csv` in the platform data directory.
    DefaultFile,
    File(PathBuf),
    /// Nothing is written to disk.
    Memory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (from TASKBOARD_HOST)
    pub host: String,
    /// Port to bind (from TASKBOARD_PORT)
    pub port: u16,
    /// From TASKBOARD_DATA_FILE, or TASKBOARD_IN_MEMORY=1 for no file
    pub storage: Storage,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source. Unparseable values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("TASKBOARD_HOST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = lookup("TASKBOARD_PORT")
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let in_memory = lookup("TASKBOARD_IN_MEMORY")
            .map(|s| matches!(s.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let storage = if in_memory {
            Storage::Memory
        } else {
            match lookup("TASKBOARD_DATA_FILE") {
                Some(path) if !path.trim().is_empty() => Storage::File(PathBuf::from(path.trim())),
                _ => Storage::DefaultFile,
            }
        };

        Self {
            host,
            port,
            storage,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn open_database(&self) -> Result<Database> {
        match &self.storage {
            Storage::DefaultFile => Database::open_default(),
            Storage::File(path) => Database::open(path.clone()),
            Storage::Memory => Ok(Database::open_memory()),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, Storage::DefaultFile);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("TASKBOARD_HOST", "0.0.0.0"),
            ("TASKBOARD_PORT", "9000"),
            ("TASKBOARD_DATA_FILE", "/tmp/board.csv"),
        ]);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.storage, Storage::File(PathBuf::from("/tmp/board.csv")));
    }

    #[test]
    fn in_memory_wins_over_data_file() {
        let config = config_from(&[
            ("TASKBOARD_IN_MEMORY", "1"),
            ("TASKBOARD_DATA_FILE", "/tmp/board.csv"),
        ]);
        assert_eq!(config.storage, Storage::Memory);
    }

    #[test]
    fn opens_database_for_file_and_memory_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.csv");

        let config = config_from(&[("TASKBOARD_DATA_FILE", path.to_str().unwrap())]);
        let db = config.open_database().unwrap();
        assert_eq!(db.path(), Some(path.as_path()));

        let config = config_from(&[("TASKBOARD_IN_MEMORY", "1")]);
        assert!(config.open_database().unwrap().path().is_none());
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        let config = config_from(&[("TASKBOARD_PORT", "not-a-port")]);
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
