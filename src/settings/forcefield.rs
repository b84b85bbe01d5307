//! Forcefield Overlay Configuration
//!
//! The forcefield overlay renders translucent, depth-faded volumes on top of
//! the opaque scene. All instances share one material *template* (colours,
//! fade profile, pattern animation) and carry a per-instance *override*
//! record holding only the fields that vary. Resolving a template against an
//! instance produces the complete per-draw state — there is no clone-then-
//! patch step and shared resources (pattern texture, depth copy) stay shared.

use glam::{Mat4, Vec3};

/// Shared material template for every forcefield instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForcefieldTemplate {
    /// Base tint of the pattern. Default: blue `(0, 0, 1)`
    pub color1: Vec3,

    /// Tint blended in near intersections and the fade band.
    /// Default: orange `(1, 0.5, 0)`
    pub color2: Vec3,

    /// Fraction of the volume's height over which the top fade runs.
    /// Default: `0.25` (fade over the top quarter)
    pub fade_fraction: f32,

    /// How many times the circle pattern repeats across one face.
    /// Default: `4.0`
    pub pattern_tiling: f32,

    /// Vertical scroll speed of the pattern, in uv units per second.
    /// Default: `0.15`
    pub scroll_speed: f32,

    /// World-space distance over which the intersection glow decays.
    /// Default: `0.35`
    pub intersection_range: f32,
}

impl Default for ForcefieldTemplate {
    fn default() -> Self {
        Self {
            color1: Vec3::new(0.0, 0.0, 1.0),
            color2: Vec3::new(1.0, 0.5, 0.0),
            fade_fraction: 0.25,
            pattern_tiling: 4.0,
            scroll_speed: 0.15,
            intersection_range: 0.35,
        }
    }
}

/// Per-instance deviations from the template. `None` inherits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForcefieldOverrides {
    /// Overrides [`ForcefieldTemplate::color1`].
    pub color1: Option<Vec3>,
    /// Overrides [`ForcefieldTemplate::color2`].
    pub color2: Option<Vec3>,
    /// Overrides [`ForcefieldTemplate::fade_fraction`].
    pub fade_fraction: Option<f32>,
}

/// One forcefield volume: a unit cube placed and uniformly scaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForcefieldInstance {
    /// World-space centre of the volume.
    pub position: Vec3,

    /// Uniform scale; the unit cube makes this the world-space edge length.
    pub scale: f32,

    /// Per-instance template deviations.
    pub overrides: ForcefieldOverrides,
}

impl ForcefieldInstance {
    /// Creates an instance inheriting everything from the template.
    #[must_use]
    pub fn new(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            scale,
            overrides: ForcefieldOverrides::default(),
        }
    }
}

/// Fully resolved per-draw state for one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedForcefield {
    /// Object-to-world transform.
    pub model: Mat4,
    /// Resolved base tint.
    pub color1: Vec3,
    /// Resolved glow tint.
    pub color2: Vec3,
    /// World-space height where the top fade reaches full transparency.
    pub fade_top: f32,
    /// World-space height where the top fade begins.
    pub fade_bottom: f32,
}

impl ForcefieldTemplate {
    /// Resolves the complete draw state for one instance.
    ///
    /// The fade band sits at the top of the volume: `fade_top` is the upper
    /// face (`centre_y + height / 2`) and `fade_bottom` lies `fade_fraction`
    /// of the height below it.
    #[must_use]
    pub fn resolve(&self, instance: &ForcefieldInstance) -> ResolvedForcefield {
        let fade_fraction = instance.overrides.fade_fraction.unwrap_or(self.fade_fraction);
        let world_height = instance.scale;
        let fade_top = instance.position.y + world_height * 0.5;
        let fade_bottom = fade_top - world_height * fade_fraction;

        ResolvedForcefield {
            model: Mat4::from_translation(instance.position)
                * Mat4::from_scale(Vec3::splat(instance.scale)),
            color1: instance.overrides.color1.unwrap_or(self.color1),
            color2: instance.overrides.color2.unwrap_or(self.color2),
            fade_top,
            fade_bottom,
        }
    }
}
