//! Shader Module Cache
//!
//! Deduplicates compiled `wgpu::ShaderModule`s by hashing the WGSL source
//! with xxh3-128. Every pass embeds its WGSL via `include_str!` and compiles
//! through here, so a shader shared by two pipelines is compiled once.

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

/// Centralized shader module cache, owned by the composer.
pub struct ShaderCache {
    /// xxh3-128 of WGSL source → compiled module.
    module_cache: FxHashMap<u128, wgpu::ShaderModule>,
}

impl Default for ShaderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            module_cache: FxHashMap::default(),
        }
    }

    /// Compiles a WGSL string, or returns the cached module.
    pub fn get_or_compile(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
    ) -> &wgpu::ShaderModule {
        let hash = xxh3_128(source.as_bytes());
        self.module_cache.entry(hash).or_insert_with(|| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })
    }

    /// Returns the number of cached shader modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.module_cache.len()
    }
}
