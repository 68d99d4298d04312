//! Game balance settings
//!
//! Loaded from a JSON file next to the binary (or built in code). Every field
//! has a default so partial files work, and `sanitized()` coerces anything
//! non-finite or negative back to the default before the simulation sees it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::Result;

/// Difficulty and balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Playfield ===
    /// Playfield width in pixels
    pub screen_width: f32,
    /// Playfield height in pixels
    pub screen_height: f32,
    /// Number of energy cells the player defends
    pub resource_count: u32,
    /// Hard cap on live asteroids
    pub max_asteroids: usize,

    // === Flock ===
    /// Agent max speed on wave 1 (pixels/s)
    pub agent_base_speed: f32,
    /// Agent max steering force (pixels/s²) before personality scaling
    pub agent_base_force: f32,
    /// Seconds between shots for shooter agents
    pub shooter_cooldown: f32,
    /// Projectile muzzle speed (pixels/s) before jitter
    pub projectile_speed: f32,
    /// Projectile lifetime in seconds
    pub projectile_lifetime: f32,
    /// Agents spawned per escape on wave 1
    pub escape_burst_base: u32,
    /// Extra agents per escape for each wave after the first
    pub escape_burst_per_wave: u32,
    /// Seconds an agent may spend outside the playfield before it is culled
    pub boundary_timeout: f32,

    // === Scoring ===
    /// Idle window (seconds) before the combo resets
    pub combo_window: f32,

    // === Pacing ===
    /// Rest between waves (seconds)
    pub breather_duration: f32,
    /// First wave on which StarBases appear
    pub starbase_first_wave: u32,
    /// Seconds between StarBase arrivals
    pub starbase_interval: f32,
    /// First wave on which Shredders appear
    pub shredder_first_wave: u32,
    /// Seconds between Shredder arrivals
    pub shredder_interval: f32,

    // === Diagnostics ===
    /// Enables single-entity spawn commands
    pub dev_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            resource_count: 5,
            max_asteroids: MAX_ASTEROIDS,

            agent_base_speed: 120.0,
            agent_base_force: 240.0,
            shooter_cooldown: 2.0,
            projectile_speed: 260.0,
            projectile_lifetime: 2.5,
            escape_burst_base: 8,
            escape_burst_per_wave: 2,
            boundary_timeout: 5.0,

            combo_window: COMBO_WINDOW,

            breather_duration: 2.0,
            starbase_first_wave: 7,
            starbase_interval: 45.0,
            shredder_first_wave: 10,
            shredder_interval: 35.0,

            dev_mode: false,
        }
    }
}

/// Keep `value` if finite and positive, else warn and fall back
fn positive_or(name: &str, value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("Setting '{name}' = {value} is invalid, using {fallback}");
        fallback
    }
}

impl Settings {
    /// Parse settings from a JSON string (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a file, falling back to defaults when it is missing or malformed
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Malformed settings in {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No settings at {} ({e}), using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write settings to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Coerce every numeric field into a usable range
    pub fn sanitized(mut self) -> Self {
        let d = Settings::default();
        self.screen_width = positive_or("screen_width", self.screen_width, d.screen_width);
        self.screen_height = positive_or("screen_height", self.screen_height, d.screen_height);
        self.agent_base_speed =
            positive_or("agent_base_speed", self.agent_base_speed, d.agent_base_speed);
        self.agent_base_force =
            positive_or("agent_base_force", self.agent_base_force, d.agent_base_force);
        self.shooter_cooldown =
            positive_or("shooter_cooldown", self.shooter_cooldown, d.shooter_cooldown);
        self.projectile_speed =
            positive_or("projectile_speed", self.projectile_speed, d.projectile_speed);
        self.projectile_lifetime = positive_or(
            "projectile_lifetime",
            self.projectile_lifetime,
            d.projectile_lifetime,
        );
        self.boundary_timeout =
            positive_or("boundary_timeout", self.boundary_timeout, d.boundary_timeout);
        self.combo_window = positive_or("combo_window", self.combo_window, d.combo_window);
        self.breather_duration =
            positive_or("breather_duration", self.breather_duration, d.breather_duration);
        self.starbase_interval =
            positive_or("starbase_interval", self.starbase_interval, d.starbase_interval);
        self.shredder_interval =
            positive_or("shredder_interval", self.shredder_interval, d.shredder_interval);
        if self.resource_count == 0 {
            log::warn!("Setting 'resource_count' = 0 is invalid, using {}", d.resource_count);
            self.resource_count = d.resource_count;
        }
        if self.max_asteroids < 2 {
            log::warn!("Setting 'max_asteroids' = {} is invalid, using {}", self.max_asteroids, d.max_asteroids);
            self.max_asteroids = d.max_asteroids;
        }
        self
    }

    /// Escape burst size for a wave (agents spawned per escaping agent)
    pub fn escape_burst(&self, wave: u32) -> u32 {
        self.escape_burst_base
            .saturating_add(self.escape_burst_per_wave.saturating_mul(wave.saturating_sub(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_takes_defaults() {
        let settings = Settings::from_json(r#"{ "resource_count": 3, "dev_mode": true }"#).unwrap();
        assert_eq!(settings.resource_count, 3);
        assert!(settings.dev_mode);
        assert_eq!(settings.max_asteroids, MAX_ASTEROIDS);
    }

    #[test]
    fn test_sanitize_rejects_bad_numbers() {
        let settings = Settings {
            combo_window: -1.0,
            screen_width: 0.0,
            resource_count: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.combo_window, COMBO_WINDOW);
        assert_eq!(settings.screen_width, SCREEN_WIDTH);
        assert_eq!(settings.resource_count, 5);
    }

    #[test]
    fn test_escape_burst_scales_with_wave() {
        let settings = Settings::default();
        assert_eq!(settings.escape_burst(1), 8);
        assert_eq!(settings.escape_burst(2), 10);
        assert_eq!(settings.escape_burst(0), 8);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let settings = Settings::load("/definitely/not/here/settings.json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            resource_count: 7,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }
}
