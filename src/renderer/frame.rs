//! Frame-Persistent Attachments
//!
//! [`FrameResources`] owns the full-resolution textures every frame renders
//! through: the HDR ping-pong colour pair the post-processing chain
//! alternates between, the scene depth attachment, and the resolved
//! view-space depth copy the forcefield pass samples.
//!
//! All of them are recreated together on resize; the [`Tracked`] wrapper
//! gives each new view a fresh id so pass-level bind group caches notice.

use crate::renderer::{DEPTH_COPY_FORMAT, DEPTH_FORMAT, HDR_FORMAT, Tracked};

pub struct FrameResources {
    /// HDR ping-pong pair. Which one is "input" and which is "output" at any
    /// moment is tracked by the prepare context, not here.
    pub scene_color_view: [Tracked<wgpu::TextureView>; 2],

    /// Scene depth attachment.
    pub depth_view: Tracked<wgpu::TextureView>,

    /// View-space distance per pixel, written by the depth resolve pass and
    /// sampled (unfiltered) by the forcefield shader.
    pub depth_copy_view: Tracked<wgpu::TextureView>,

    size: (u32, u32),
}

impl FrameResources {
    pub fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let size = (size.0.max(1), size.1.max(1));
        let (scene_color_view, depth_view, depth_copy_view) = Self::create_all(device, size);
        Self {
            scene_color_view,
            depth_view,
            depth_copy_view,
            size,
        }
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Recreates every attachment for a new size.
    ///
    /// Same-size and zero-size requests are ignored; zero sizes come from
    /// minimized windows and must not tear down live attachments.
    pub fn resize(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        if self.size == size || size.0 == 0 || size.1 == 0 {
            return;
        }
        self.size = size;

        let (scene_color_view, depth_view, depth_copy_view) = Self::create_all(device, size);
        self.scene_color_view = scene_color_view;
        self.depth_view = depth_view;
        self.depth_copy_view = depth_copy_view;
    }

    #[allow(clippy::type_complexity)]
    fn create_all(
        device: &wgpu::Device,
        size: (u32, u32),
    ) -> (
        [Tracked<wgpu::TextureView>; 2],
        Tracked<wgpu::TextureView>,
        Tracked<wgpu::TextureView>,
    ) {
        let attachment = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        let scene_color_view = [
            Tracked::new(Self::create_texture_view(
                device,
                size,
                HDR_FORMAT,
                attachment,
                "Ping-Pong Texture 0",
            )),
            Tracked::new(Self::create_texture_view(
                device,
                size,
                HDR_FORMAT,
                attachment,
                "Ping-Pong Texture 1",
            )),
        ];

        let depth_view = Tracked::new(Self::create_texture_view(
            device,
            size,
            DEPTH_FORMAT,
            attachment,
            "Scene Depth Texture",
        ));

        let depth_copy_view = Tracked::new(Self::create_texture_view(
            device,
            size,
            DEPTH_COPY_FORMAT,
            attachment,
            "Depth Copy Texture",
        ));

        (scene_color_view, depth_view, depth_copy_view)
    }

    fn create_texture_view(
        device: &wgpu::Device,
        size: (u32, u32),
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        label: &str,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}
