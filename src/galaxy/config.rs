use crate::engine::camera::ControlSettings;
use crate::error::GalaxyError;
use serde::{Deserialize, Serialize};

/// Which of the two interaction styles the component exposes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ControlScheme {
    pub toggle_via_button: bool,
    pub toggle_via_click: bool,
    pub speed_adjustable: bool,
}

impl ControlScheme {
    /// Overlay buttons for toggling and speed, clicks only report.
    pub fn buttons() -> Self {
        ControlScheme { toggle_via_button: true, toggle_via_click: false, speed_adjustable: true }
    }

    /// No overlay, clicking a body toggles rotation.
    pub fn click() -> Self {
        ControlScheme { toggle_via_button: false, toggle_via_click: true, speed_adjustable: false }
    }

    pub fn has_overlay(&self) -> bool {
        self.toggle_via_button || self.speed_adjustable
    }
}

impl Default for ControlScheme {
    fn default() -> Self {
        ControlScheme::buttons()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TexturePaths {
    pub sun: String,
    pub earth: String,
    pub earth_specular: String,
    pub earth_normal: String,
    pub moon: String,
}

impl Default for TexturePaths {
    fn default() -> Self {
        TexturePaths {
            sun: "sun_texture.jpeg".to_string(),
            earth: "earthmap1k.jpeg".to_string(),
            earth_specular: "earthspec1k.jpeg".to_string(),
            earth_normal: "earth_normalmap_flat.jpeg".to_string(),
            moon: "moonmap1k.jpeg".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GalaxyConfig {
    pub star_count: usize,
    pub star_half_extent: f32,
    pub moon_speed_ratio: f32,
    pub initial_speed: f32,
    pub speed_step: f32,
    pub rotation_enabled: bool,
    pub controls: ControlScheme,
    pub textures: TexturePaths,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub zoom_speed: f32,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        GalaxyConfig {
            star_count: 10_000,
            star_half_extent: 1000.0,
            moon_speed_ratio: 2.0,
            initial_speed: 0.005,
            speed_step: 0.001,
            rotation_enabled: true,
            controls: ControlScheme::default(),
            textures: TexturePaths::default(),
            damping_factor: 0.05,
            min_distance: 2.0,
            max_distance: 20.0,
            zoom_speed: 1.0,
        }
    }
}

impl GalaxyConfig {
    pub fn from_json(json: &str) -> Result<Self, GalaxyError> {
        let config: GalaxyConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Clamps values that would break the scene or the speed invariant.
    pub fn sanitized(mut self) -> Self {
        self.initial_speed = self.initial_speed.max(0.0);
        self.speed_step = self.speed_step.abs();
        self.star_half_extent = self.star_half_extent.abs();
        self.damping_factor = self.damping_factor.clamp(0.0, 1.0);
        if self.min_distance > self.max_distance {
            std::mem::swap(&mut self.min_distance, &mut self.max_distance);
        }
        self
    }

    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            damping_factor: self.damping_factor,
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            zoom_speed: self.zoom_speed,
            ..ControlSettings::default()
        }
    }
}
