//! Vignette Configuration
//!
//! Tuning for the full-screen darkening pass that runs after bloom.

use serde::{Deserialize, Serialize};

/// Vignette pass configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteConfig {
    /// Whether the vignette pass runs. When disabled the pass is skipped and
    /// the frame passes through unchanged. Default: `true`
    pub enabled: bool,

    /// Maximum darkening at the frame corners, `0..=1`. Default: `0.4`
    pub intensity: f32,

    /// Normalized distance from the frame centre at which darkening begins,
    /// `0..=1`. Default: `0.25`
    pub dropoff: f32,
}

impl Default for VignetteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.4,
            dropoff: 0.25,
        }
    }
}

impl VignetteConfig {
    /// Sets the corner darkening amount (clamped to `0..=1`).
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
    }

    /// Sets the falloff start distance (clamped to `0..=1`).
    pub fn set_dropoff(&mut self, dropoff: f32) {
        self.dropoff = dropoff.clamp(0.0, 1.0);
    }
}
