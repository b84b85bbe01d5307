//! Software Bloom Executor
//!
//! A plain-CPU mirror of the bloom chain: the same filter math the WGSL
//! shaders run, applied to owned f32 images, driven by the same
//! [`BloomPlan`](crate::chain::BloomPlan) the GPU pass records. The numeric
//! properties of the algorithm (energy behaviour, grading identity, the
//! closed-form uniform-input result) are asserted against this executor in
//! the test suite, where no adapter is needed.
//!
//! The kernels are written against the shader sources, tap for tap. When a
//! shader changes, its kernel here changes with it.

mod executor;
mod image;
pub mod kernels;

pub use executor::SoftwareBloom;
pub use image::CpuImage;
