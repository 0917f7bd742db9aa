//! # Configuration
//!
//! Two independent pieces of state live here:
//!
//! - [`Preferences`]: the three user toggles. They are a persisted partition of
//!   the store (see [`crate::store`]) because every page context reads them
//!   and the settings surface writes them.
//! - [`PagepatchConfig`]: engine tuning, read from `config.json` in the data
//!   directory. Missing file or missing keys fall back to compiled defaults.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `settle_delay_ms` | `800` | Quiet period before stored edits replay |
//! | `overlay_width` | `300` | Width of a freshly created overlay |
//! | `overlay_height` | `300` | Height of a freshly created overlay |
//! | `overlay_fill` | `black` | Fill of a freshly created overlay |

use crate::error::{PatchError, Result};
use crate::overlay::OverlayFill;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_SETTLE_DELAY_MS: u64 = 800;
const DEFAULT_OVERLAY_SIZE: f64 = 300.0;

/// User toggles. Install defaults are all on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "enabled")]
    pub text_editing_enabled: bool,
    #[serde(default = "enabled")]
    pub image_editing_enabled: bool,
    /// When on, stored edits are not replayed on load.
    #[serde(default = "enabled")]
    pub show_edits_enabled: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            text_editing_enabled: true,
            image_editing_enabled: true,
            show_edits_enabled: true,
        }
    }
}

/// Partial preference change. Absent fields leave the current value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_editing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_editing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_edits_enabled: Option<bool>,
}

impl PreferenceUpdate {
    pub fn is_empty(&self) -> bool {
        self.text_editing_enabled.is_none()
            && self.image_editing_enabled.is_none()
            && self.show_edits_enabled.is_none()
    }
}

/// Names accepted by [`Preferences::get`] and [`Preferences::update_for`].
pub const PREFERENCE_KEYS: [&str; 3] = ["text-editing", "image-editing", "show-edits"];

impl Preferences {
    /// Replaces only the toggles present in `update`.
    pub fn apply(&mut self, update: &PreferenceUpdate) {
        if let Some(v) = update.text_editing_enabled {
            self.text_editing_enabled = v;
        }
        if let Some(v) = update.image_editing_enabled {
            self.image_editing_enabled = v;
        }
        if let Some(v) = update.show_edits_enabled {
            self.show_edits_enabled = v;
        }
    }

    pub fn get(&self, key: &str) -> Result<bool> {
        match key {
            "text-editing" => Ok(self.text_editing_enabled),
            "image-editing" => Ok(self.image_editing_enabled),
            "show-edits" => Ok(self.show_edits_enabled),
            other => Err(unknown_key(other)),
        }
    }

    /// Update for a single named toggle.
    pub fn update_for(key: &str, value: bool) -> Result<PreferenceUpdate> {
        let mut update = PreferenceUpdate::default();
        match key {
            "text-editing" => update.text_editing_enabled = Some(value),
            "image-editing" => update.image_editing_enabled = Some(value),
            "show-edits" => update.show_edits_enabled = Some(value),
            other => return Err(unknown_key(other)),
        }
        Ok(update)
    }

    /// Replay runs after the page settles only while show-edits is off.
    pub fn replay_on_load(&self) -> bool {
        !self.show_edits_enabled
    }
}

fn unknown_key(key: &str) -> PatchError {
    PatchError::Api(format!(
        "Unknown preference: {} (expected one of {})",
        key,
        PREFERENCE_KEYS.join(", ")
    ))
}

/// Engine tuning, stored in `<data dir>/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagepatchConfig {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_overlay_size")]
    pub overlay_width: f64,

    #[serde(default = "default_overlay_size")]
    pub overlay_height: f64,

    #[serde(default)]
    pub overlay_fill: OverlayFill,
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_overlay_size() -> f64 {
    DEFAULT_OVERLAY_SIZE
}

impl Default for PagepatchConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            overlay_width: DEFAULT_OVERLAY_SIZE,
            overlay_height: DEFAULT_OVERLAY_SIZE,
            overlay_fill: OverlayFill::default(),
        }
    }
}

impl PagepatchConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(PatchError::Io)?;
        let config: PagepatchConfig =
            serde_json::from_str(&content).map_err(PatchError::Serialization)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(PatchError::Io)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(PatchError::Serialization)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content).map_err(PatchError::Io)?;
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences_all_enabled() {
        let prefs = Preferences::default();
        assert!(prefs.text_editing_enabled);
        assert!(prefs.image_editing_enabled);
        assert!(prefs.show_edits_enabled);
        assert!(!prefs.replay_on_load());
    }

    #[test]
    fn test_apply_touches_only_present_fields() {
        let mut prefs = Preferences::default();
        prefs.apply(&PreferenceUpdate {
            show_edits_enabled: Some(false),
            ..Default::default()
        });
        assert!(prefs.text_editing_enabled);
        assert!(prefs.image_editing_enabled);
        assert!(!prefs.show_edits_enabled);
    }

    #[test]
    fn test_preferences_wire_names() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(json["textEditingEnabled"], true);
        assert_eq!(json["imageEditingEnabled"], true);
        assert_eq!(json["showEditsEnabled"], true);

        let partial: Preferences = serde_json::from_str(r#"{"showEditsEnabled":false}"#).unwrap();
        assert!(partial.text_editing_enabled);
        assert!(!partial.show_edits_enabled);
    }

    #[test]
    fn test_named_keys() {
        let mut prefs = Preferences::default();
        prefs.apply(&Preferences::update_for("image-editing", false).unwrap());
        assert!(!prefs.get("image-editing").unwrap());
        assert!(prefs.get("text-editing").unwrap());
        assert!(Preferences::update_for("colour", true).is_err());
        assert!(prefs.get("colour").is_err());
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = PagepatchConfig::load(dir.path()).unwrap();
        assert_eq!(config, PagepatchConfig::default());
        assert_eq!(config.settle_delay(), Duration::from_millis(800));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = PagepatchConfig {
            settle_delay_ms: 250,
            overlay_fill: OverlayFill::Blur,
            ..Default::default()
        };
        config.save(dir.path().join("nested")).unwrap();

        let loaded = PagepatchConfig::load(dir.path().join("nested")).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{"overlay_width": 120}"#).unwrap();
        let config = PagepatchConfig::load(dir.path()).unwrap();
        assert_eq!(config.overlay_width, 120.0);
        assert_eq!(config.overlay_height, 300.0);
        assert_eq!(config.settle_delay_ms, 800);
    }
}
