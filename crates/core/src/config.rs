use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid panel config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Behavior knobs for a [`crate::Panel`]. Every field has a default, so a
/// partial (or empty) JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    /// Collapse state for guids seen for the first time.
    pub collapse_new_nodes: bool,
    /// Send the capability handshake from `Panel::start`.
    pub probe_on_start: bool,
    /// Ask for promise updates as soon as support is confirmed.
    pub observe_on_support: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            collapse_new_nodes: true,
            probe_on_start: true,
            observe_on_support: true,
        }
    }
}

impl PanelConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}
