#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! HDR frame compositor with a dual-filter bloom chain.
//!
//! The embedding application draws its scene through a [`ScenePainter`];
//! afterglow owns everything after that: depth resolve, forcefield overlays,
//! the downsample/upsample bloom chain with Karis averaging and in-chain
//! colour grading, vignette, and ACES tone mapping into the caller's output
//! view.
//!
//! ```no_run
//! use afterglow::{FrameComposer, FrameSettings, GpuContext, NullPainter};
//!
//! # fn main() -> afterglow::Result<()> {
//! let gpu = GpuContext::new_blocking()?;
//! let mut composer = FrameComposer::new(
//!     &gpu,
//!     FrameSettings::default(),
//!     1280,
//!     720,
//!     wgpu::TextureFormat::Bgra8UnormSrgb,
//! )?;
//! # let output_view: wgpu::TextureView = unimplemented!();
//! composer.render(&output_view, &NullPainter)?;
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod cpu;
pub mod errors;
pub mod renderer;
pub mod settings;
pub mod uniforms;

pub use wgpu;

pub use chain::{BloomPlan, BloomStep, ChainLayout, ChainRole, TargetRef};
pub use cpu::{CpuImage, SoftwareBloom};
pub use errors::{AfterglowError, Result};
pub use renderer::graph::{CameraState, FrameComposer};
pub use renderer::passes::{NullPainter, ScenePainter};
pub use renderer::GpuContext;
pub use settings::{
    BloomConfig, CompositeSettings, ForcefieldInstance, ForcefieldOverrides, ForcefieldTemplate,
    FrameSettings, RenderSettings, VignetteConfig,
};
