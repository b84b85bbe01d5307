//! Render Node Trait
//!
//! The abstract interface every render pass implements. A node splits its
//! work across two phases: `prepare` holds mutable access and performs every
//! allocation, pipeline build and uniform upload; `run` is read-only and
//! records GPU commands into the frame's shared encoder.

use super::context::{ExecuteContext, PrepareContext};

/// One pass of the frame.
///
/// All mutation belongs in `prepare`. By the time `run` records commands the
/// pass must not need `&mut self`, which is what lets the whole frame share
/// a single command encoder.
pub trait RenderNode {
    /// Node name, used for debug groups and diagnostics.
    fn name(&self) -> &str;

    /// Prepare phase: allocate resources, compile pipelines, build bind
    /// groups, write uniforms.
    fn prepare(&mut self, _ctx: &mut PrepareContext) {}

    /// Execute phase: record render passes into the shared encoder.
    fn run(&self, ctx: &ExecuteContext, encoder: &mut wgpu::CommandEncoder);
}
