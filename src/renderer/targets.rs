//! Named Render Target Pool
//!
//! Owns the GPU textures of the bloom chain, one per [`TargetRef`]. Unlike a
//! transient per-frame pool, these targets are persistent: allocated when the
//! composer is built, reallocated on resize, explicitly destroyed on dispose.
//!
//! All targets share one format ([`HDR_FORMAT`](crate::renderer::HDR_FORMAT)),
//! a single mip level and no depth. Samplers are owned by the passes that
//! read, not by the pool.

use rustc_hash::FxHashMap;

use crate::chain::{ChainLayout, TargetRef};
use crate::errors::{AfterglowError, Result};
use crate::renderer::{HDR_FORMAT, Tracked};

struct PooledTarget {
    texture: wgpu::Texture,
    view: Tracked<wgpu::TextureView>,
    width: u32,
    height: u32,
}

impl PooledTarget {
    fn new(device: &wgpu::Device, name: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = Tracked::new(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        Self {
            texture,
            view,
            width,
            height,
        }
    }
}

/// The bloom chain's target set, addressed by [`TargetRef`].
pub struct RenderTargetPool {
    targets: FxHashMap<TargetRef, PooledTarget>,
    layout: ChainLayout,
}

impl RenderTargetPool {
    /// Allocates every target the layout names.
    #[must_use]
    pub fn new(device: &wgpu::Device, layout: ChainLayout) -> Self {
        let mut targets = FxHashMap::default();
        for spec in layout.targets() {
            targets.insert(
                spec.target,
                PooledTarget::new(device, &spec.target.name(), spec.width, spec.height),
            );
        }

        let (base_w, base_h) = layout.base_extent();
        log::debug!(
            "Bloom target chain allocated: {}x{} base, {} levels, {} targets",
            base_w,
            base_h,
            layout.levels(),
            targets.len(),
        );

        Self { targets, layout }
    }

    #[must_use]
    pub fn layout(&self) -> &ChainLayout {
        &self.layout
    }

    /// The tracked view of a chain target.
    ///
    /// A lookup outside the chain is a configuration error and fails rather
    /// than silently skipping work.
    pub fn view(&self, target: TargetRef) -> Result<&Tracked<wgpu::TextureView>> {
        self.targets
            .get(&target)
            .map(|t| &t.view)
            .ok_or_else(|| AfterglowError::TargetNotFound(target.name()))
    }

    /// Current pixel extent of a chain target.
    pub fn extent(&self, target: TargetRef) -> Result<(u32, u32)> {
        self.targets
            .get(&target)
            .map(|t| (t.width, t.height))
            .ok_or_else(|| AfterglowError::TargetNotFound(target.name()))
    }

    /// Resizes the chain to a new base resolution.
    ///
    /// Only targets whose scaled extent actually changed are reallocated;
    /// deep chain levels bottom out at 1×1 and survive most resizes. New
    /// views carry new tracked ids, which invalidates downstream bind group
    /// caches.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.layout.resize(width, height);
        for spec in self.layout.targets() {
            let stale = self
                .targets
                .get(&spec.target)
                .is_none_or(|t| t.width != spec.width || t.height != spec.height);
            if stale {
                if let Some(old) = self.targets.insert(
                    spec.target,
                    PooledTarget::new(device, &spec.target.name(), spec.width, spec.height),
                ) {
                    old.texture.destroy();
                }
            }
        }
    }

    /// Destroys every target, releasing GPU memory immediately rather than
    /// waiting for handle drops to settle.
    pub fn dispose(self) {
        for target in self.targets.into_values() {
            target.texture.destroy();
        }
    }
}
