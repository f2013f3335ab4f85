// Settings persistence: host configuration stored separately from the saved
// layout. Uses the platform config dir, e.g. ~/.config/berth/settings.json
// on Linux.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use berth_core::{LayoutConfig, Rect};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BerthSettings {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub window: WindowSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(default = "default_separator_thickness")]
    pub separator_thickness: i32,
    #[serde(default = "default_hit_tolerance")]
    pub separator_hit_tolerance: i32,
    /// Defer separator drags until the pointer is released.
    #[serde(default)]
    pub lazy_resize: bool,
    #[serde(default = "default_drop_band")]
    pub drop_band: f32,
    #[serde(default = "default_outer_band")]
    pub outer_band: f32,
}

fn default_separator_thickness() -> i32 {
    LayoutConfig::default().separator_thickness
}

fn default_hit_tolerance() -> i32 {
    LayoutConfig::default().separator_hit_tolerance
}

fn default_drop_band() -> f32 {
    LayoutConfig::default().drop_band
}

fn default_outer_band() -> f32 {
    LayoutConfig::default().outer_band
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            separator_thickness: default_separator_thickness(),
            separator_hit_tolerance: default_hit_tolerance(),
            lazy_resize: false,
            drop_band: default_drop_band(),
            outer_band: default_outer_band(),
        }
    }
}

impl LayoutSettings {
    /// Out-of-range values fall back to the defaults.
    pub fn to_config(&self) -> LayoutConfig {
        let defaults = LayoutConfig::default();
        let band = |value: f32, fallback: f32| {
            if value > 0.0 && value <= 0.5 {
                value
            } else {
                log::warn!("Ignoring drop band {}, using {}", value, fallback);
                fallback
            }
        };
        LayoutConfig {
            separator_thickness: self.separator_thickness.max(0),
            separator_hit_tolerance: self.separator_hit_tolerance.max(0),
            lazy_resize: self.lazy_resize,
            drop_band: band(self.drop_band, defaults.drop_band),
            outer_band: band(self.outer_band, defaults.outer_band),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
}

fn default_width() -> i32 {
    1280
}

fn default_height() -> i32 {
    800
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl WindowSettings {
    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width.max(0), self.height.max(0))
    }
}

fn settings_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("berth").join("settings.json"))
}

/// Missing file means defaults (written back so the user has something to
/// edit). A malformed file is reported and ignored.
pub fn load_settings() -> BerthSettings {
    let path = match settings_path() {
        Some(p) => p,
        None => return BerthSettings::default(),
    };

    match std::fs::read_to_string(&path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to parse {}: {}", path.display(), e);
                BerthSettings::default()
            }
        },
        Err(_) => {
            let settings = BerthSettings::default();
            save_settings(&settings);
            settings
        }
    }
}

pub fn save_settings(settings: &BerthSettings) {
    let path = match settings_path() {
        Some(p) => p,
        None => {
            log::warn!("Cannot determine settings path");
            return;
        }
    };

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::error!("Failed to create config dir {}: {}", parent.display(), e);
            return;
        }
    }

    match serde_json::to_string_pretty(settings) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                log::error!("Failed to write {}: {}", path.display(), e);
            }
        }
        Err(e) => {
            log::error!("Failed to serialize settings: {}", e);
        }
    }
}
