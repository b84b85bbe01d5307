//! Render Stage Definitions
//!
//! `RenderStage` fixes the execution order of the frame. The composer runs
//! its built-in passes in this order and rejects any other arrangement; the
//! chain is data-dependent (depth resolve reads what the scene pass wrote,
//! the forcefields read the resolved depth, bloom reads the lit frame) so
//! reordering is never meaningful.

/// The frame's stages, in execution order.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
#[repr(u8)]
pub enum RenderStage {
    /// Primary scene geometry with depth writes.
    Scene = 0,

    /// Hardware depth resolved to linear view-space distance.
    DepthResolve = 1,

    /// Additive forcefield shells over the lit frame, depth-aware but not
    /// depth-writing.
    Forcefield = 2,

    /// Dual-filter bloom over the combined frame.
    Bloom = 3,

    /// Edge darkening with a subtle pulse.
    Vignette = 4,

    /// Tone mapping and conversion to the output format.
    Output = 5,
}

impl RenderStage {
    /// Numeric index of the stage, used for ordering.
    #[inline]
    #[must_use]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Stage name, for diagnostics.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scene => "Scene",
            Self::DepthResolve => "DepthResolve",
            Self::Forcefield => "Forcefield",
            Self::Bloom => "Bloom",
            Self::Vignette => "Vignette",
            Self::Output => "Output",
        }
    }

    /// All stages, in execution order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Scene,
            Self::DepthResolve,
            Self::Forcefield,
            Self::Bloom,
            Self::Vignette,
            Self::Output,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(RenderStage::Scene < RenderStage::DepthResolve);
        assert!(RenderStage::DepthResolve < RenderStage::Forcefield);
        assert!(RenderStage::Forcefield < RenderStage::Bloom);
        assert!(RenderStage::Bloom < RenderStage::Vignette);
        assert!(RenderStage::Vignette < RenderStage::Output);
    }

    #[test]
    fn all_lists_every_stage_in_order() {
        let all = RenderStage::all();
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(all[0].order(), 0);
        assert_eq!(all[all.len() - 1].order(), 5);
    }
}
