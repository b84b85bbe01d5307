//! Plan-driven software bloom.

use glam::Mat4;

use crate::chain::{BloomPlan, BloomStep, ChainLayout, ChainRole, TargetRef};
use crate::errors::{AfterglowError, Result};
use crate::settings::{CompositeSettings, RenderSettings};

use super::image::CpuImage;
use super::kernels;

/// Software bloom executor over a full target chain.
///
/// Owns CPU images for every chain target, sized by the same
/// [`ChainLayout`] the GPU pool uses, and runs the same [`BloomPlan`] step
/// sequence the GPU pass records. Intermediate targets stay inspectable
/// after a run.
#[derive(Debug)]
pub struct SoftwareBloom {
    layout: ChainLayout,
    plan: BloomPlan,
    downsample: Vec<CpuImage>,
    upsample: Vec<CpuImage>,
}

impl SoftwareBloom {
    /// Allocates the chain for a base resolution and depth.
    pub fn new(width: u32, height: u32, levels: u32) -> Result<Self> {
        let layout = ChainLayout::new(width, height, levels)?;
        Ok(Self::from_layout(layout))
    }

    /// Allocates the chain from an existing layout, without re-validating it.
    #[must_use]
    pub fn from_layout(layout: ChainLayout) -> Self {
        let plan = BloomPlan::build(layout.levels());
        let (downsample, upsample) = Self::allocate(&layout);
        Self {
            layout,
            plan,
            downsample,
            upsample,
        }
    }

    fn allocate(layout: &ChainLayout) -> (Vec<CpuImage>, Vec<CpuImage>) {
        let count = (layout.levels() + 1) as usize;
        let (base_w, base_h) = layout.base_extent();
        let mut downsample = Vec::with_capacity(count);
        let mut upsample = Vec::with_capacity(count);
        for level in 0..=layout.levels() {
            let w = crate::chain::scaled_extent(base_w, level);
            let h = crate::chain::scaled_extent(base_h, level);
            downsample.push(CpuImage::new(w, h));
            upsample.push(CpuImage::new(w, h));
        }
        (downsample, upsample)
    }

    #[must_use]
    pub fn layout(&self) -> &ChainLayout {
        &self.layout
    }

    #[must_use]
    pub fn plan(&self) -> &BloomPlan {
        &self.plan
    }

    /// Reallocates every chain image for a new base resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.layout.resize(width, height);
        let (downsample, upsample) = Self::allocate(&self.layout);
        self.downsample = downsample;
        self.upsample = upsample;
    }

    /// Borrows a chain target by reference, for inspection in tests.
    pub fn target(&self, target: TargetRef) -> Result<&CpuImage> {
        let chain = match target.role {
            ChainRole::Downsample => &self.downsample,
            ChainRole::Upsample => &self.upsample,
        };
        chain
            .get(target.level as usize)
            .ok_or(AfterglowError::ChainIndexOutOfRange {
                context: "software executor target lookup",
                level: target.level,
                levels: self.layout.levels(),
            })
    }

    /// Runs the full bloom sequence over `input`, returning the composited
    /// frame at the input's resolution.
    pub fn run(
        &mut self,
        input: &CpuImage,
        render: &RenderSettings,
        composite: &CompositeSettings,
    ) -> Result<CpuImage> {
        let steps: Vec<BloomStep> = self.plan.steps().to_vec();

        for step in steps {
            match step {
                BloomStep::Seed { dest } => {
                    let (w, h) = self.layout.extent_of(dest.level)?;
                    let result = kernels::blit(input, w, h);
                    self.store(dest, result)?;
                }
                BloomStep::Downsample {
                    source,
                    dest,
                    karis,
                    grade,
                } => {
                    let (w, h) = self.layout.extent_of(dest.level)?;
                    let matrix = if grade {
                        render.colour_matrix()
                    } else {
                        Mat4::IDENTITY
                    };
                    let result = kernels::downsample(
                        self.target(source)?,
                        w,
                        h,
                        render.down_radius,
                        karis,
                        matrix,
                    );
                    self.store(dest, result)?;
                }
                BloomStep::UpsampleSeed { source, dest } => {
                    let (w, h) = self.layout.extent_of(dest.level)?;
                    let result = kernels::blit(self.target(source)?, w, h);
                    self.store(dest, result)?;
                }
                BloomStep::Upsample { source, mip, dest } => {
                    let (w, h) = self.layout.extent_of(dest.level)?;
                    let result = kernels::upsample(
                        self.target(source)?,
                        self.target(mip)?,
                        w,
                        h,
                        render.up_radius,
                    );
                    self.store(dest, result)?;
                }
                BloomStep::Composite { bloom } => {
                    return Ok(kernels::composite(
                        input,
                        self.target(bloom)?,
                        composite.strength,
                        composite.mix_factor,
                    ));
                }
            }
        }

        // Plans always end with a composite step.
        Err(AfterglowError::TargetNotFound("composite output".to_string()))
    }

    fn store(&mut self, target: TargetRef, image: CpuImage) -> Result<()> {
        let levels = self.layout.levels();
        let chain = match target.role {
            ChainRole::Downsample => &mut self.downsample,
            ChainRole::Upsample => &mut self.upsample,
        };
        let slot =
            chain
                .get_mut(target.level as usize)
                .ok_or(AfterglowError::ChainIndexOutOfRange {
                    context: "software executor target store",
                    level: target.level,
                    levels,
                })?;
        *slot = image;
        Ok(())
    }
}
