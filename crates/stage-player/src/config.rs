//! Player configuration loaded from TOML
//!
//! ```toml
//! [viewport]
//! width = 800
//! height = 600
//! pixel_ratio = 2.0
//!
//! [scripts]
//! max_operations = 500000
//!
//! [logging]
//! filter = "info,stage::script=debug"
//! ```

use serde::{Deserialize, Serialize};
use stage_core::Result;
use stage_script::ScriptLimits;
use std::path::Path;

/// Top-level player configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub viewport: ViewportConfig,
    pub scripts: ScriptLimits,
    pub logging: LoggingConfig,
}

/// Initial drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
            pixel_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl PlayerConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
