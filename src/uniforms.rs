//! GPU Uniform Block Layouts
//!
//! Plain-old-data mirrors of every uniform struct declared in the WGSL
//! shaders. Field order and explicit padding match WGSL's uniform address
//! space rules exactly, so each struct can be written with a single
//! `queue.write_buffer(.., bytemuck::bytes_of(..))`.
//!
//! Sizes are locked down by the tests at the bottom of this file; a field
//! added without re-checking its shader mirror will fail there first.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::settings::{CompositeSettings, RenderSettings, ResolvedForcefield};

// ============================================================================
// Bloom
// ============================================================================

/// Per-step parameters of the 13-tap downsample shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DownsampleUniforms {
    /// Colour grading matrix. Identity on every step but the first.
    pub colour_matrix: [[f32; 4]; 4],
    /// Pixel extent of the texture being read.
    pub resolution: [f32; 2],
    pub radius: f32,
    /// Non-zero enables the inverse-luminance weighted path.
    pub use_karis: u32,
}

impl DownsampleUniforms {
    #[must_use]
    pub fn for_step(
        source_extent: (u32, u32),
        settings: &RenderSettings,
        karis: bool,
        grade: bool,
    ) -> Self {
        let matrix = if grade {
            settings.colour_matrix()
        } else {
            Mat4::IDENTITY
        };
        Self {
            colour_matrix: matrix.to_cols_array_2d(),
            resolution: [source_extent.0 as f32, source_extent.1 as f32],
            radius: settings.down_radius,
            use_karis: u32::from(karis),
        }
    }
}

/// Per-step parameters of the 3×3 tent upsample shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct UpsampleUniforms {
    /// Pixel extent of the texture being read.
    pub resolution: [f32; 2],
    pub radius: f32,
    pub _pad: f32,
}

impl UpsampleUniforms {
    #[must_use]
    pub fn for_step(source_extent: (u32, u32), settings: &RenderSettings) -> Self {
        Self {
            resolution: [source_extent.0 as f32, source_extent.1 as f32],
            radius: settings.up_radius,
            _pad: 0.0,
        }
    }
}

/// Parameters of the final bloom blend.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CompositeUniforms {
    pub strength: f32,
    pub mix_factor: f32,
    pub _pad: [f32; 2],
}

impl CompositeUniforms {
    #[must_use]
    pub fn new(settings: &CompositeSettings) -> Self {
        Self {
            strength: settings.strength,
            mix_factor: settings.mix_factor,
            _pad: [0.0; 2],
        }
    }
}

// ============================================================================
// Depth resolve
// ============================================================================

/// Camera projection range for depth linearization.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DepthResolveUniforms {
    pub near: f32,
    pub far: f32,
    pub _pad: [f32; 2],
}

impl DepthResolveUniforms {
    #[must_use]
    pub fn new(near: f32, far: f32) -> Self {
        Self {
            near,
            far,
            _pad: [0.0; 2],
        }
    }
}

// ============================================================================
// Forcefield
// ============================================================================

/// Per-instance block of the forcefield shell shader.
///
/// Instances share one buffer at a fixed stride and bind with a dynamic
/// offset, so this struct must stay within [`ForcefieldUniforms::STRIDE`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ForcefieldUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub color1: [f32; 3],
    pub time: f32,
    pub color2: [f32; 3],
    pub scroll_speed: f32,
    pub near_far: [f32; 2],
    pub fade_top: f32,
    pub fade_bottom: f32,
    /// Pixel extent of the frame, for screen-space depth lookups.
    pub resolution: [f32; 2],
    pub pattern_tiling: f32,
    pub intersection_range: f32,
}

impl ForcefieldUniforms {
    /// Dynamic-offset stride per instance. Matches the largest
    /// `min_uniform_buffer_offset_alignment` in common use.
    pub const STRIDE: u64 = 256;

    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        resolved: &ResolvedForcefield,
        view_proj: Mat4,
        near: f32,
        far: f32,
        resolution: (u32, u32),
        time: f32,
        pattern_tiling: f32,
        scroll_speed: f32,
        intersection_range: f32,
    ) -> Self {
        Self {
            model: resolved.model.to_cols_array_2d(),
            view_proj: view_proj.to_cols_array_2d(),
            color1: resolved.color1.to_array(),
            time,
            color2: resolved.color2.to_array(),
            scroll_speed,
            near_far: [near, far],
            fade_top: resolved.fade_top,
            fade_bottom: resolved.fade_bottom,
            resolution: [resolution.0 as f32, resolution.1 as f32],
            pattern_tiling,
            intersection_range,
        }
    }
}

// ============================================================================
// Vignette / output
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct VignetteUniforms {
    pub intensity: f32,
    pub dropoff: f32,
    /// Seconds since composer start, drives the subtle pulse.
    pub time: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct OutputUniforms {
    pub exposure: f32,
    pub _pad: [f32; 3],
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};

    use super::*;

    #[test]
    fn uniform_sizes_match_shader_structs() {
        assert_eq!(size_of::<DownsampleUniforms>(), 80);
        assert_eq!(size_of::<UpsampleUniforms>(), 16);
        assert_eq!(size_of::<CompositeUniforms>(), 16);
        assert_eq!(size_of::<DepthResolveUniforms>(), 16);
        assert_eq!(size_of::<ForcefieldUniforms>(), 192);
        assert_eq!(size_of::<VignetteUniforms>(), 16);
        assert_eq!(size_of::<OutputUniforms>(), 16);
    }

    #[test]
    fn forcefield_block_fits_its_stride() {
        assert!(size_of::<ForcefieldUniforms>() as u64 <= ForcefieldUniforms::STRIDE);
    }

    #[test]
    fn forcefield_offsets_respect_wgsl_alignment() {
        // vec3 fields start on 16-byte boundaries, vec2 fields on 8-byte.
        assert_eq!(offset_of!(ForcefieldUniforms, color1), 128);
        assert_eq!(offset_of!(ForcefieldUniforms, color2), 144);
        assert_eq!(offset_of!(ForcefieldUniforms, near_far), 160);
        assert_eq!(offset_of!(ForcefieldUniforms, resolution), 176);
    }

    #[test]
    fn downsample_grading_is_identity_off_the_first_level() {
        let mut settings = RenderSettings::default();
        settings.set_saturation(2.0);
        let u = DownsampleUniforms::for_step((64, 64), &settings, false, false);
        assert_eq!(u.colour_matrix, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(u.use_karis, 0);
    }
}
