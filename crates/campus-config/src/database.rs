//! Local libSQL database configuration.

use serde::{Deserialize, Serialize};

/// Path that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

fn default_path() -> String {
    String::from(".campus/campus.db")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// File path of the database, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_on_disk() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, ".campus/campus.db");
        assert!(!config.is_in_memory());
    }

    #[test]
    fn memory_path_detected() {
        let config = DatabaseConfig {
            path: IN_MEMORY.into(),
        };
        assert!(config.is_in_memory());
    }
}
