//! Compositor Configuration
//!
//! Pure-data tuning structs for every stage of the pipeline. The compositor
//! owns one copy of each; the embedding application mutates them between
//! frames through the compositor's setters and the values are consumed at the
//! start of the next frame's prepare phase.

mod bloom;
mod forcefield;
mod vignette;

pub use bloom::{BloomConfig, CompositeSettings, RenderSettings};
pub use forcefield::{
    ForcefieldInstance, ForcefieldOverrides, ForcefieldTemplate, ResolvedForcefield,
};
pub use vignette::VignetteConfig;

/// Everything tunable about a frame, owned by the compositor.
///
/// `bloom.levels` is the one field that is fixed after construction: the
/// target chain is allocated against it. Every other field may change
/// between frames.
#[derive(Debug, Clone)]
pub struct FrameSettings {
    pub bloom: BloomConfig,
    pub vignette: VignetteConfig,

    /// Shared forcefield appearance; instances override per field.
    pub forcefield_template: ForcefieldTemplate,
    /// Active forcefield shells, drawn in order.
    pub forcefields: Vec<ForcefieldInstance>,

    /// Exposure multiplier applied by the output pass before tone mapping.
    pub exposure: f32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            bloom: BloomConfig::default(),
            vignette: VignetteConfig::default(),
            forcefield_template: ForcefieldTemplate::default(),
            forcefields: Vec::new(),
            exposure: 1.0,
        }
    }
}
