//! Bloom Chain Planning
//!
//! Pure CPU model of the bloom mip chain: which render targets exist, how big
//! each one is for a given base resolution, and the exact sequence of passes
//! one frame of bloom executes. Both executors consume this model — the GPU
//! pass records it into a command encoder, the software executor in
//! [`crate::cpu`] runs it on plain images — so the pass structure itself is
//! testable without a device.
//!
//! # Chain shape
//!
//! For a configured depth of `levels = L`, two target chains exist, named
//! `downsample-0..=L` and `upsample-0..=L` (`2·(L+1)` buffers total). Level
//! `i` is scaled by `1 / 2^i` of the base resolution, each dimension rounded
//! up and clamped to at least one texel, so a hidden 0×0 viewport degrades to
//! 1×1 targets instead of failing.
//!
//! # Pass sequence
//!
//! ```text
//! input ──copy──▶ downsample-0
//! downsample-i ──13-tap──▶ downsample-(i+1)         i = 0..L   (Karis + grading at i == 0)
//! downsample-L ──copy──▶ upsample-L
//! upsample-(i+1) ──tent──▶ (+ downsample-(i+1)) ──▶ upsample-i  i = L-1..=0
//! mix(input, strength · upsample-min(1,L), mix_factor) ──▶ output
//! ```
//!
//! The composite reads `upsample-1`, not `upsample-0`, and the deepest
//! upsample level is seeded by a plain copy rather than the tent filter. Both
//! are deliberate tuning choices in the source algorithm and are preserved
//! exactly.

use std::fmt;

use crate::errors::{AfterglowError, Result};

/// Maximum supported chain depth.
pub const MAX_LEVELS: u32 = 16;

/// Scales one dimension to a chain level: `ceil(base / 2^level)`, minimum 1.
#[must_use]
pub fn scaled_extent(base: u32, level: u32) -> u32 {
    let step = 1u64 << level;
    let scaled = (u64::from(base) + step - 1) / step;
    (scaled as u32).max(1)
}

// ============================================================================
// Target identity
// ============================================================================

/// Which of the two chains a target belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainRole {
    /// Progressive reduction chain, written top-down.
    Downsample,
    /// Accumulation chain, written bottom-up.
    Upsample,
}

impl ChainRole {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Downsample => "downsample",
            Self::Upsample => "upsample",
        }
    }
}

/// Identity of one chain target: role plus level.
///
/// Displays as the target's pool name, e.g. `downsample-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetRef {
    pub role: ChainRole,
    pub level: u32,
}

impl TargetRef {
    #[must_use]
    pub fn downsample(level: u32) -> Self {
        Self {
            role: ChainRole::Downsample,
            level,
        }
    }

    #[must_use]
    pub fn upsample(level: u32) -> Self {
        Self {
            role: ChainRole::Upsample,
            level,
        }
    }

    /// The pool name of this target.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}-{}", self.role.prefix(), self.level)
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.role.prefix(), self.level)
    }
}

/// A target's identity together with its current pixel extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub target: TargetRef,
    pub width: u32,
    pub height: u32,
}

// ============================================================================
// ChainLayout
// ============================================================================

/// Sizing model for the full target chain at one base resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLayout {
    base_width: u32,
    base_height: u32,
    levels: u32,
}

impl ChainLayout {
    /// Creates a layout, failing fast on an unsupported chain depth.
    ///
    /// Zero base dimensions clamp to 1 rather than erroring — the renderer
    /// must tolerate degenerate 1×1 targets (minimized windows, hidden tabs).
    pub fn new(width: u32, height: u32, levels: u32) -> Result<Self> {
        if levels == 0 || levels > MAX_LEVELS {
            return Err(AfterglowError::InvalidLevelCount {
                levels,
                max: MAX_LEVELS,
            });
        }
        Ok(Self::new_unchecked(width, height, levels))
    }

    /// Creates a layout without validating the depth.
    ///
    /// Used by tests exercising the degenerate `levels == 0` plan; public
    /// construction goes through [`ChainLayout::new`].
    #[must_use]
    pub fn new_unchecked(width: u32, height: u32, levels: u32) -> Self {
        Self {
            base_width: width.max(1),
            base_height: height.max(1),
            levels,
        }
    }

    #[inline]
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    #[inline]
    #[must_use]
    pub fn base_extent(&self) -> (u32, u32) {
        (self.base_width, self.base_height)
    }

    /// Total number of chain targets: `2 · (levels + 1)`.
    #[inline]
    #[must_use]
    pub fn target_count(&self) -> u32 {
        2 * (self.levels + 1)
    }

    /// Pixel extent of a chain level.
    ///
    /// A level beyond the configured depth is a configuration error, never a
    /// silent fallback.
    pub fn extent_of(&self, level: u32) -> Result<(u32, u32)> {
        if level > self.levels {
            return Err(AfterglowError::ChainIndexOutOfRange {
                context: "chain extent lookup",
                level,
                levels: self.levels,
            });
        }
        Ok((
            scaled_extent(self.base_width, level),
            scaled_extent(self.base_height, level),
        ))
    }

    /// Updates the base resolution; level count never changes.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.base_width = width.max(1);
        self.base_height = height.max(1);
    }

    /// All target specs, downsample chain first, each chain ordered by level.
    #[must_use]
    pub fn targets(&self) -> Vec<TargetSpec> {
        let mut specs = Vec::with_capacity(self.target_count() as usize);
        for role in [ChainRole::Downsample, ChainRole::Upsample] {
            for level in 0..=self.levels {
                specs.push(TargetSpec {
                    target: TargetRef { role, level },
                    width: scaled_extent(self.base_width, level),
                    height: scaled_extent(self.base_height, level),
                });
            }
        }
        specs
    }
}

// ============================================================================
// BloomPlan
// ============================================================================

/// One step of the bloom sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloomStep {
    /// Straight copy of the frame input into `downsample-0`.
    Seed { dest: TargetRef },

    /// 13-tap reduction from `source` into `dest`.
    ///
    /// `karis` and `grade` are set only for the first step of the chain:
    /// inverse-luminance weighting suppresses fireflies before they
    /// propagate, and colour grading runs exactly once at full chain
    /// resolution.
    Downsample {
        source: TargetRef,
        dest: TargetRef,
        karis: bool,
        grade: bool,
    },

    /// Straight copy of the deepest downsample into the deepest upsample.
    UpsampleSeed { source: TargetRef, dest: TargetRef },

    /// 3×3 tent over `source` plus a direct sample of `mip`, into `dest`.
    Upsample {
        source: TargetRef,
        mip: TargetRef,
        dest: TargetRef,
    },

    /// `mix(input, strength · bloom, mix_factor)` into the frame output.
    Composite { bloom: TargetRef },
}

/// The full per-frame bloom sequence for one chain depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomPlan {
    levels: u32,
    steps: Vec<BloomStep>,
}

impl BloomPlan {
    /// Builds the step sequence for a chain depth.
    ///
    /// Handles `levels == 0` gracefully: both filter loops vanish and the
    /// composite reads the seed copy, matching the documented degradation.
    #[must_use]
    pub fn build(levels: u32) -> Self {
        let mut steps = Vec::with_capacity(2 * levels as usize + 3);

        steps.push(BloomStep::Seed {
            dest: TargetRef::downsample(0),
        });

        for i in 0..levels {
            steps.push(BloomStep::Downsample {
                source: TargetRef::downsample(i),
                dest: TargetRef::downsample(i + 1),
                karis: i == 0,
                grade: i == 0,
            });
        }

        steps.push(BloomStep::UpsampleSeed {
            source: TargetRef::downsample(levels),
            dest: TargetRef::upsample(levels),
        });

        for i in (0..levels).rev() {
            steps.push(BloomStep::Upsample {
                source: TargetRef::upsample(i + 1),
                mip: TargetRef::downsample(i + 1),
                dest: TargetRef::upsample(i),
            });
        }

        steps.push(BloomStep::Composite {
            bloom: Self::composite_source(levels),
        });

        Self { levels, steps }
    }

    /// Which upsample level the composite reads: `upsample-1` normally,
    /// `upsample-0` (the seed copy) for a zero-depth chain.
    #[must_use]
    pub fn composite_source(levels: u32) -> TargetRef {
        TargetRef::upsample(levels.min(1))
    }

    #[inline]
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[BloomStep] {
        &self.steps
    }
}
