//! Store configuration
//!
//! Usually built in code, but can also be parsed from TOML:
//!
//! ```toml
//! name = "todos"
//! debug = true
//! log_target = "todos::action"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Target used by [`LogActionLogger`](crate::logging::LogActionLogger) unless configured otherwise
pub const DEFAULT_LOG_TARGET: &str = "slice_store::action";

/// Construction-time configuration of a store
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Name included in log lines
    #[serde(default = "default_name")]
    pub name: String,

    /// Log every dispatched action through the action logger
    #[serde(default)]
    pub debug: bool,

    /// `log` target for the default action logger
    #[serde(default = "default_log_target")]
    pub log_target: String,
}

fn default_name() -> String {
    "store".to_string()
}

fn default_log_target() -> String {
    DEFAULT_LOG_TARGET.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            debug: false,
            log_target: default_log_target(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        let config = toml::from_str(content)?;
        Ok(config)
    }
}
