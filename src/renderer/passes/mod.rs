//! Built-in passes of the frame pipeline.
//!
//! One module per [`RenderStage`](crate::renderer::graph::RenderStage), in
//! execution order:
//!
//! 1. [`ScenePass`] clears the frame and hands the opened pass to the
//!    application's [`ScenePainter`].
//! 2. [`DepthResolvePass`] linearizes the scene depth into a sampleable copy.
//! 3. [`ForcefieldPass`] blends the holographic volumes over the scene.
//! 4. [`BloomPass`] runs the downsample/upsample chain and composites it.
//! 5. [`VignettePass`] darkens the frame edges.
//! 6. [`OutputPass`] tone maps into the caller's output view.

pub mod bloom;
pub mod depth_resolve;
pub mod forcefield;
pub mod output;
pub mod scene;
pub mod vignette;

pub use bloom::BloomPass;
pub use depth_resolve::DepthResolvePass;
pub use forcefield::ForcefieldPass;
pub use output::OutputPass;
pub use scene::{NullPainter, ScenePainter, ScenePass};
pub use vignette::VignettePass;
