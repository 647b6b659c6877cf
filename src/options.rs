//! Runtime configuration with TOML preset support.
//!
//! All tweakable settings (render quality, autofocus, ambient lighting)
//! are consolidated here. Options serialize to/from TOML; every section
//! uses `#[serde(default)]` so partial files (e.g. only overriding
//! `[quality]`) work correctly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OrbrayError;

/// Render quality scalars handed through to the compute kernel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QualityOptions {
    /// Number of render passes (samples) per frame.
    pub passes: u32,
    /// Shadow sampling quality in `[0, 1]`.
    pub shadow_quality: f32,
    /// Shadow ray jitter amount in `[0, 1]`.
    pub shadow_randomness: f32,
    /// Smoothness of the implicit ground plane in `[0, 1]`.
    pub ground_smoothness: f32,
    /// Per-frame noise: random jitter offset and seed. Disabling locks both
    /// to fixed values for deterministic output.
    pub noise: bool,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self {
            passes: 2,
            shadow_quality: 0.5,
            shadow_randomness: 0.1,
            ground_smoothness: 0.3,
            noise: true,
        }
    }
}

/// Focal distance behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FocusOptions {
    /// Derive the focal distance from what the camera is looking at.
    pub autofocus: bool,
    /// Focal distance used directly (no smoothing) when autofocus is off.
    pub focal_distance: f32,
}

impl Default for FocusOptions {
    fn default() -> Self {
        Self {
            autofocus: true,
            focal_distance: 10.0,
        }
    }
}

/// Ambient and skybox lighting parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AmbientOptions {
    /// Ambient light color added to every bounce.
    pub ambient: [f32; 3],
    /// Skybox sample intensity multiplier.
    pub skybox_strength: f32,
}

impl Default for AmbientOptions {
    fn default() -> Self {
        Self {
            ambient: [0.1, 0.1, 0.1],
            skybox_strength: 1.0,
        }
    }
}

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Render quality scalars.
    pub quality: QualityOptions,
    /// Focal distance behavior.
    pub focus: FocusOptions,
    /// Ambient and skybox lighting.
    pub ambient: AmbientOptions,
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OrbrayError::Io`] when the file cannot be read and
    /// [`OrbrayError::OptionsParse`] when it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, OrbrayError> {
        let content = std::fs::read_to_string(path).map_err(OrbrayError::Io)?;
        toml::from_str(&content)
            .map_err(|e| OrbrayError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`OrbrayError::OptionsParse`] on serialization failure and
    /// [`OrbrayError::Io`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), OrbrayError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| OrbrayError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(OrbrayError::Io)?;
        }
        std::fs::write(path, content).map_err(OrbrayError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[quality]
passes = 8
";
        let opts: Options = toml::from_str(toml_str).unwrap();
        assert_eq!(opts.quality.passes, 8);
        // Everything else should be default
        assert_eq!(opts.quality.shadow_quality, 0.5);
        assert!(opts.focus.autofocus);
        assert_eq!(opts.ambient.skybox_strength, 1.0);
    }

    #[test]
    fn noise_flag_parses() {
        let toml_str = r"
[quality]
noise = false
";
        let opts: Options = toml::from_str(toml_str).unwrap();
        assert!(!opts.quality.noise);
    }
}
