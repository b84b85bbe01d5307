//! Bloom Post-Processing Configuration
//!
//! This module defines bloom tuning as pure data structures. The bloom
//! implementation is based on the dual-filter bloom technique from
//! *Call of Duty: Advanced Warfare*: progressive downsampling with a 13-tap
//! filter (Karis-averaged at the finest level) and upsampling with a 3×3 tent
//! filter that re-incorporates each downsample level.
//!
//! Settings are grouped the way the algorithm consumes them:
//!
//! - [`RenderSettings`]: per-tap tuning applied while the chain is built
//!   (colour grading at the finest level, sample radii everywhere).
//! - [`CompositeSettings`]: how strongly the accumulated bloom blends back
//!   over the original frame.
//! - [`BloomConfig`]: the full configuration including the chain depth, which
//!   is fixed when the compositor is constructed.
//!
//! All structs deserialize with per-field defaults, so a partial JSON config
//! (`{"composite": {"mix_factor": 0.05}}`) fills in the rest.
//!
//! # Reference
//!
//! - *Next Generation Post Processing in Call of Duty: Advanced Warfare*
//!   (SIGGRAPH 2014)

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::chain::MAX_LEVELS;
use crate::errors::{AfterglowError, Result};

// ============================================================================
// RenderSettings
// ============================================================================

/// Tuning applied while the mip chain is built.
///
/// Brightness, contrast and saturation are folded into a single colour
/// transform matrix applied exactly once, at the finest downsample level —
/// grading earlier levels repeatedly would compound through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Brightness adjustment. Values below 1 scale colours down; values above
    /// 1 lift them additively. Default: `1.0`
    pub brightness: f32,

    /// Contrast pivot adjustment around mid-grey. Default: `1.0`
    pub contrast: f32,

    /// Saturation via a luminance-weighted mix. Default: `1.0`
    pub saturation: f32,

    /// Texel-offset scale for every downsample tap. Default: `1.0`
    pub down_radius: f32,

    /// Texel-offset scale for every upsample tap. Default: `1.0`
    pub up_radius: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            down_radius: 1.0,
            up_radius: 1.0,
        }
    }
}

impl RenderSettings {
    /// Builds the combined brightness/contrast/saturation transform.
    ///
    /// The matrix is `B · C · S` applied to column vectors `(r, g, b, 1)`:
    ///
    /// - `B` scales when `brightness < 1`, translates by `brightness - 1`
    ///   otherwise (darkening multiplies, lightening lifts additively);
    /// - `C` remaps around mid-grey: `v ↦ contrast · v + (1 - contrast) / 2`;
    /// - `S` mixes each channel toward Rec.709 luminance.
    ///
    /// At `(1, 1, 1)` the result is exactly the identity.
    #[must_use]
    pub fn colour_matrix(&self) -> Mat4 {
        let b = self.brightness;
        let bm = if b < 1.0 {
            Mat4::from_scale(Vec3::splat(b))
        } else {
            Mat4::from_translation(Vec3::splat(b - 1.0))
        };

        let c1 = self.contrast;
        let c2 = (1.0 - c1) * 0.5;
        let cm = Mat4::from_translation(Vec3::splat(c2)) * Mat4::from_scale(Vec3::splat(c1));

        let s = self.saturation;
        let w = Vec3::new(0.2126, 0.7152, 0.0722);
        let sm = Mat4::from_cols(
            Vec4::new(s + (1.0 - s) * w.x, (1.0 - s) * w.x, (1.0 - s) * w.x, 0.0),
            Vec4::new((1.0 - s) * w.y, s + (1.0 - s) * w.y, (1.0 - s) * w.y, 0.0),
            Vec4::new((1.0 - s) * w.z, (1.0 - s) * w.z, s + (1.0 - s) * w.z, 0.0),
            Vec4::W,
        );

        bm * cm * sm
    }

    /// Sets the brightness adjustment (clamped to non-negative).
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness.max(0.0);
    }

    /// Sets the contrast adjustment (clamped to non-negative).
    pub fn set_contrast(&mut self, contrast: f32) {
        self.contrast = contrast.max(0.0);
    }

    /// Sets the saturation adjustment (clamped to non-negative).
    pub fn set_saturation(&mut self, saturation: f32) {
        self.saturation = saturation.max(0.0);
    }

    /// Sets the downsample tap radius (clamped to non-negative).
    pub fn set_down_radius(&mut self, radius: f32) {
        self.down_radius = radius.max(0.0);
    }

    /// Sets the upsample tap radius (clamped to non-negative).
    pub fn set_up_radius(&mut self, radius: f32) {
        self.up_radius = radius.max(0.0);
    }
}

// ============================================================================
// CompositeSettings
// ============================================================================

/// Final blend between the original frame and the accumulated bloom.
///
/// The composite is `mix(original, strength · bloom, mix_factor)`. Note that
/// with `strength == 0` the output is `original · (1 - mix_factor)` — the
/// frame darkens proportionally rather than passing through untouched. That
/// is the documented behaviour of this blend, not a bug.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeSettings {
    /// Multiplier on the bloom contribution before blending. Default: `1.0`
    pub strength: f32,

    /// Blend ratio between original and bloom-scaled image. Default: `0.03`
    pub mix_factor: f32,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self {
            strength: 1.0,
            mix_factor: 0.03,
        }
    }
}

impl CompositeSettings {
    /// Sets the bloom strength (clamped to non-negative).
    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength.max(0.0);
    }

    /// Sets the blend ratio (clamped to `0..=1`).
    pub fn set_mix_factor(&mut self, mix_factor: f32) {
        self.mix_factor = mix_factor.clamp(0.0, 1.0);
    }
}

// ============================================================================
// BloomConfig
// ============================================================================

/// Full bloom configuration.
///
/// `levels` is consumed once, when the compositor allocates its target chain;
/// later configuration updates may change every other field but not the chain
/// depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    /// Whether the bloom pass runs at all. When disabled the pass is skipped
    /// entirely and downstream passes read the unbloomed frame.
    /// Default: `true`
    pub enabled: bool,

    /// Chain-build tuning.
    pub render: RenderSettings,

    /// Final blend tuning.
    pub composite: CompositeSettings,

    /// Mip-chain depth. The pool allocates `levels + 1` buffers per chain so
    /// a final mip exists to seed the upsample walk. Default: `4`
    pub levels: u32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            render: RenderSettings::default(),
            composite: CompositeSettings::default(),
            levels: 4,
        }
    }
}

impl BloomConfig {
    /// Validates construction-time constraints.
    ///
    /// Fails fast on a level count outside `1..=MAX_LEVELS`; every other
    /// field is clamped by its setter rather than rejected.
    pub fn validate(&self) -> Result<()> {
        if self.levels == 0 || self.levels > MAX_LEVELS {
            return Err(AfterglowError::InvalidLevelCount {
                levels: self.levels,
                max: MAX_LEVELS,
            });
        }
        Ok(())
    }
}
