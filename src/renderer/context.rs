//! wgpu Context
//!
//! [`GpuContext`] holds the core GPU handles: adapter info, device and queue.
//! Surface management stays with the caller — the composer renders into any
//! `wgpu::TextureView` it is handed, so the same context drives a window
//! swapchain or a headless target.

use crate::errors::{AfterglowError, Result};

/// Core wgpu context holding GPU handles.
pub struct GpuContext {
    /// The wgpu device for resource creation.
    pub device: wgpu::Device,
    /// The command queue for submitting work.
    pub queue: wgpu::Queue,
    /// Adapter details, kept for diagnostics.
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Acquires an adapter and device.
    ///
    /// No surface is required; pass `compatible_surface` concerns on to the
    /// caller that owns the window.
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| AfterglowError::AdapterRequestFailed(e.to_string()))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using adapter: {} ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }

    /// Blocking variant of [`GpuContext::new`] for non-async callers.
    pub fn new_blocking() -> Result<Self> {
        pollster::block_on(Self::new())
    }
}
