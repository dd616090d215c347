use serde::{Deserialize, Serialize};

use crate::error::EditorResult;

/// Tunables for an editing session.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo entries kept, baseline included
    pub history_capacity: usize,
    /// Quiet period before a burst of edits becomes one history entry
    pub history_debounce_ms: u64,
    /// Quiet period before a burst of edits is autosaved
    pub autosave_delay_ms: u64,
    /// Total padding subtracted from the container before fitting the document
    pub viewport_padding: f32,
    /// Maximum number of decoded/filtered images kept by the renderer
    pub image_cache_size: usize,
    /// Background color of a fresh or reset document
    pub default_background: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 20,
            history_debounce_ms: 500,
            autosave_delay_ms: 2000,
            viewport_padding: 40.0,
            image_cache_size: 32,
            default_background: "#ffffff".to_owned(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = EditorConfig::from_json_str(r#"{ "autosave_delay_ms": 500 }"#).unwrap();
        assert_eq!(config.autosave_delay_ms, 500);
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.default_background, "#ffffff");
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(EditorConfig::from_json_str("{ nope").is_err());
    }
}
