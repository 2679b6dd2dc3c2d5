//! Layout builder configuration.
//!
//! All fields have defaults, so an empty document is a valid configuration.
//!
//! ```toml
//! default_stand = "bend1"
//! first_track_id = 100
//! strict_wiring = true
//! ```

use railnet_core::stand::SwitchStand;
use serde::{Deserialize, Serialize};

/// Errors from loading a [`LayoutConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid layout config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings for a [`Layout`](crate::Layout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Stand given to every switch when it is placed.
    pub default_stand: SwitchStand,
    /// First track id handed out; ids are allocated sequentially.
    pub first_track_id: u32,
    /// Fail wiring when any junction is left without a partner.
    pub strict_wiring: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_stand: SwitchStand::Straight1,
            first_track_id: 1,
            strict_wiring: false,
        }
    }
}

impl LayoutConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
