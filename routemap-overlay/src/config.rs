use std::path::Path;

use routemap_core::{ConfigError, ReferenceSpace};
use serde::{Deserialize, Serialize};

use crate::style::OverlayStyle;

/// Everything the renderer needs besides its inputs. Missing fields in a
/// config file fall back to the defaults (800x650 reference, red 3px route).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub reference: ReferenceSpace,
    pub style: OverlayStyle,
}

impl OverlayConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reference.validate()?;
        self.style.validate()
    }
}
