//! Frame Graph
//!
//! The composition layer: the [`RenderNode`] trait, the phase-separated
//! contexts, the fixed stage order, and the [`FrameComposer`] that owns the
//! built-in passes and drives prepare/execute over a single command encoder
//! each frame.

pub mod composer;
pub mod context;
pub mod node;
pub mod stage;

pub use composer::FrameComposer;
pub use context::{CameraState, ExecuteContext, PrepareContext};
pub use node::RenderNode;
pub use stage::RenderStage;
