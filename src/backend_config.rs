use std::{fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::systems::{
    detection::ColourRange, points_output::EmptyListSendMode, tracker::TrackerSettings,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    // -------- TRACKING SETTINGS
    /// Upper bound for a tracked point's health
    pub tracking_health_max: i32,

    /// Tracked points are removed once their health falls to this value
    pub tracking_health_min: i32,

    /// Health given to newly created tracked points
    pub tracking_health_start: i32,

    /// Health added each frame a tracked point is matched
    pub tracking_gain_on_match: i32,

    /// Health removed each frame a tracked point is not matched
    pub tracking_decay_on_miss: i32,

    /// Max distance (pixels) between a tracked point and a detection to count as the same point
    pub tracking_match_radius: f32,

    // -------- DETECTION SETTINGS
    /// Regions with this many pixels or fewer are ignored
    pub detection_area_threshold: u32,

    /// Hue range in degrees; wraps through 0 if min > max
    pub detection_hue_min: f64,
    pub detection_hue_max: f64,

    /// Minimum HSL saturation, percent
    pub detection_saturation_min: f64,

    /// HSL lightness range, percent
    pub detection_lightness_min: f64,
    pub detection_lightness_max: f64,

    /// How far (pixels) to grow the colour mask before finding regions; 0 disables
    pub detection_dilate_radius: u8,

    // -------- RENDER SETTINGS
    /// Blobs are drawn on a canvas this many times smaller than the frame, then scaled up
    pub render_canvas_scale: u32,

    /// Radius (frame pixels) of each blob before blurring
    pub render_blob_radius: f32,

    /// Gaussian blur sigma (frame pixels)
    pub render_blur_sigma: f32,

    // -------- OUTPUT SETTINGS
    /// How to treat empty tracked points lists - either send an empty
    /// list "once", "never" or "always"
    pub points_empty_send_mode: EmptyListSendMode,
}

impl Default for BackendConfig {
    fn default() -> Self {
        let tracker = TrackerSettings::default();
        let colour = ColourRange::default();
        BackendConfig {
            tracking_health_max: tracker.health_max,
            tracking_health_min: tracker.health_min,
            tracking_health_start: tracker.health_start,
            tracking_gain_on_match: tracker.gain_on_match,
            tracking_decay_on_miss: tracker.decay_on_miss,
            tracking_match_radius: tracker.match_radius,
            detection_area_threshold: 2000,
            detection_hue_min: colour.hue_min,
            detection_hue_max: colour.hue_max,
            detection_saturation_min: colour.saturation_min,
            detection_lightness_min: colour.lightness_min,
            detection_lightness_max: colour.lightness_max,
            detection_dilate_radius: 2,
            render_canvas_scale: 3,
            render_blob_radius: 30.,
            render_blur_sigma: 20.,
            points_empty_send_mode: EmptyListSendMode::Once,
        }
    }
}

impl BackendConfig {
    /// Load from a JSON file; a missing file means all defaults
    pub fn load_config_from_file(path: &Path) -> Result<BackendConfig> {
        let text = match fs::read_to_string(path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Config file \"{}\" not found, will use defaults",
                    path.display()
                );
                return Ok(BackendConfig::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read config from {}", path.display()));
            }
            Ok(s) => {
                info!("Loaded config OK from \"{}\"", path.display());
                s
            }
        };

        let config = BackendConfig::parse(&text)
            .with_context(|| format!("failed to parse config in {}", path.display()))?;
        debug!("Config parsed data from file: {:?}", config);
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<BackendConfig> {
        Ok(serde_json::from_str::<BackendConfig>(text)?)
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            health_max: self.tracking_health_max,
            health_min: self.tracking_health_min,
            health_start: self.tracking_health_start,
            gain_on_match: self.tracking_gain_on_match,
            decay_on_miss: self.tracking_decay_on_miss,
            match_radius: self.tracking_match_radius,
        }
    }

    pub fn colour_range(&self) -> ColourRange {
        ColourRange {
            hue_min: self.detection_hue_min,
            hue_max: self.detection_hue_max,
            saturation_min: self.detection_saturation_min,
            lightness_min: self.detection_lightness_min,
            lightness_max: self.detection_lightness_max,
        }
    }
}
