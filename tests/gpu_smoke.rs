//! Compositor Smoke Tests
//!
//! End-to-end construction and frame submission against a real adapter.
//! Ignored by default: they need a GPU (or a software rasterizer such as
//! lavapipe) and are run explicitly with `cargo test -- --ignored`.
//!
//! Tests for:
//! - Composer construction and repeated frame submission
//! - Forcefield instancing over the scene pass
//! - Resizing between frames, including the 1x1 degenerate case
//! - Reconfiguration between frames (bloom off, vignette off, exposure)

use anyhow::Result;
use glam::Vec3;
use wgpu::{
    Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
    TextureViewDescriptor,
};

use afterglow::{
    ForcefieldInstance, FrameComposer, FrameSettings, GpuContext, NullPainter, VignetteConfig,
};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;
const OUTPUT_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Acquires a context, or `None` when the host has no usable adapter.
fn acquire_gpu() -> Option<GpuContext> {
    init_logging();
    match GpuContext::new_blocking() {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping: no GPU adapter available ({err})");
            None
        }
    }
}

fn headless_target(gpu: &GpuContext, width: u32, height: u32) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&TextureDescriptor {
        label: Some("Smoke Test Output"),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: OUTPUT_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&TextureViewDescriptor::default())
}

#[test]
#[ignore] // Ignore by default, run with --ignored or --include-ignored
fn composes_frames_headless() -> Result<()> {
    let Some(gpu) = acquire_gpu() else {
        return Ok(());
    };

    let mut composer =
        FrameComposer::new(&gpu, FrameSettings::default(), WIDTH, HEIGHT, OUTPUT_FORMAT)?;
    let output = headless_target(&gpu, WIDTH, HEIGHT);

    for _ in 0..3 {
        composer.render(&output, &NullPainter)?;
    }

    assert_eq!(composer.size(), (WIDTH, HEIGHT));
    composer.dispose();
    Ok(())
}

#[test]
#[ignore] // Ignore by default, run with --ignored or --include-ignored
fn renders_forcefields_over_the_scene() -> Result<()> {
    let Some(gpu) = acquire_gpu() else {
        return Ok(());
    };

    let mut composer =
        FrameComposer::new(&gpu, FrameSettings::default(), WIDTH, HEIGHT, OUTPUT_FORMAT)?;
    let output = headless_target(&gpu, WIDTH, HEIGHT);

    composer.forcefield_template_mut().pattern_tiling = 8.0;
    composer
        .forcefields_mut()
        .push(ForcefieldInstance::new(Vec3::new(0.0, 0.5, -3.0), 2.0));
    composer
        .forcefields_mut()
        .push(ForcefieldInstance::new(Vec3::new(1.5, 0.0, -4.0), 1.0));

    // Two frames so the pattern scroll advances and the instance buffer is
    // reused rather than freshly written.
    composer.render(&output, &NullPainter)?;
    composer.render(&output, &NullPainter)?;

    // Growing past the initial capacity reallocates the instance buffer.
    for x in 0..6 {
        composer
            .forcefields_mut()
            .push(ForcefieldInstance::new(Vec3::new(x as f32, 0.0, -5.0), 0.5));
    }
    composer.render(&output, &NullPainter)?;

    composer.dispose();
    Ok(())
}

#[test]
#[ignore] // Ignore by default, run with --ignored or --include-ignored
fn survives_resizes_between_frames() -> Result<()> {
    let Some(gpu) = acquire_gpu() else {
        return Ok(());
    };

    let mut composer =
        FrameComposer::new(&gpu, FrameSettings::default(), WIDTH, HEIGHT, OUTPUT_FORMAT)?;

    let output = headless_target(&gpu, WIDTH, HEIGHT);
    composer.render(&output, &NullPainter)?;

    // Odd dimensions exercise the ceil-division chain extents.
    composer.set_size(111, 77);
    let odd_output = headless_target(&gpu, 111, 77);
    composer.render(&odd_output, &NullPainter)?;
    assert_eq!(composer.size(), (111, 77));

    // A minimized surface degrades to 1x1 targets instead of failing.
    composer.set_size(0, 0);
    let tiny_output = headless_target(&gpu, 1, 1);
    composer.render(&tiny_output, &NullPainter)?;
    assert_eq!(composer.size(), (1, 1));

    composer.set_size(WIDTH, HEIGHT);
    composer.render(&output, &NullPainter)?;

    composer.dispose();
    Ok(())
}

#[test]
#[ignore] // Ignore by default, run with --ignored or --include-ignored
fn reconfigures_between_frames() -> Result<()> {
    let Some(gpu) = acquire_gpu() else {
        return Ok(());
    };

    let mut composer =
        FrameComposer::new(&gpu, FrameSettings::default(), WIDTH, HEIGHT, OUTPUT_FORMAT)?;
    let output = headless_target(&gpu, WIDTH, HEIGHT);
    composer.render(&output, &NullPainter)?;

    // Bloom off: the scene input passes straight through to the vignette.
    let mut bloom = composer.settings().bloom;
    bloom.enabled = false;
    composer.set_bloom_config(bloom);
    composer.render(&output, &NullPainter)?;

    // A different depth is pinned to the constructed chain with a warning.
    bloom.enabled = true;
    bloom.levels = 9;
    composer.set_bloom_config(bloom);
    assert_eq!(composer.settings().bloom.levels, 4);
    composer.render(&output, &NullPainter)?;

    composer.set_vignette_config(VignetteConfig {
        enabled: false,
        ..VignetteConfig::default()
    });
    composer.set_exposure(0.5);
    composer.render(&output, &NullPainter)?;

    composer.dispose();
    Ok(())
}
