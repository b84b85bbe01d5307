//! Software Bloom Reference Tests
//!
//! Tests for:
//! - The closed-form result of running the full chain over a uniform image
//! - Per-level chain contents and extents after a run
//! - Colour grading applying to the bloom contribution only
//! - Karis weighting suppressing single-texel fireflies
//! - The zero-depth degradation and the documented zero-strength darkening
//! - Resize reallocation and construction-time validation
//!
//! A uniform input makes every filter exact: the 13-tap downsample and the
//! tent both preserve a constant image, and each upsample step adds one mip
//! level on top. For depth `L` and value `g`, `upsample-i` holds
//! `(L - i + 1) * g` and the composite is
//! `(1 - mix) * g + mix * strength * L * g`.

use afterglow::chain::MAX_LEVELS;
use afterglow::cpu::kernels;
use afterglow::{
    AfterglowError, ChainLayout, CompositeSettings, CpuImage, RenderSettings, SoftwareBloom,
    TargetRef,
};
use glam::Mat4;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn assert_uniform_rgb(image: &CpuImage, expected: f32, context: &str) {
    for (i, texel) in image.texels().iter().enumerate() {
        for channel in 0..3 {
            assert!(
                approx(texel[channel], expected),
                "{context}: texel {i} channel {channel} expected {expected}, got {}",
                texel[channel]
            );
        }
    }
}

// ============================================================================
// Closed-Form Uniform Runs
// ============================================================================

#[test]
fn uniform_input_composites_to_the_closed_form() {
    let g = 0.5;
    let levels = 4;
    let mut bloom = SoftwareBloom::new(64, 64, levels).unwrap();
    let input = CpuImage::from_fill(64, 64, [g, g, g, 1.0]);

    let render = RenderSettings::default();
    let composite = CompositeSettings::default();
    let output = bloom.run(&input, &render, &composite).unwrap();

    assert_eq!(output.extent(), (64, 64));
    let expected =
        (1.0 - composite.mix_factor) * g + composite.mix_factor * composite.strength * levels as f32 * g;
    assert!(approx(expected, 0.545));
    assert_uniform_rgb(&output, expected, "composite");
}

#[test]
fn chain_targets_hold_the_accumulated_uniform_values() {
    let g = 0.5;
    let levels = 4;
    let mut bloom = SoftwareBloom::new(64, 64, levels).unwrap();
    let input = CpuImage::from_fill(64, 64, [g, g, g, 1.0]);
    bloom
        .run(&input, &RenderSettings::default(), &CompositeSettings::default())
        .unwrap();

    // Every downsample level preserves the constant.
    for level in 0..=levels {
        let target = bloom.target(TargetRef::downsample(level)).unwrap();
        assert_eq!(target.extent(), (64 >> level, 64 >> level));
        assert_uniform_rgb(target, g, &format!("downsample-{level}"));
    }

    // The upsample walk folds one level back in per step.
    for level in (0..=levels).rev() {
        let target = bloom.target(TargetRef::upsample(level)).unwrap();
        let expected = (levels - level + 1) as f32 * g;
        assert_uniform_rgb(target, expected, &format!("upsample-{level}"));
    }
}

#[test]
fn bloom_contribution_scales_with_strength() {
    let g = 0.5;
    let mut bloom = SoftwareBloom::new(32, 32, 3).unwrap();
    let input = CpuImage::from_fill(32, 32, [g, g, g, 1.0]);
    let render = RenderSettings::default();

    let composite = CompositeSettings {
        strength: 2.0,
        mix_factor: 0.1,
    };
    let output = bloom.run(&input, &render, &composite).unwrap();

    // bloom source is upsample-1 = 3 * g for a 3-level chain.
    let expected = 0.9 * g + 0.1 * 2.0 * 3.0 * g;
    assert_uniform_rgb(&output, expected, "strength 2");
}

#[test]
fn zero_strength_darkens_by_the_mix_factor() {
    // mix(frame, 0, mix) scales the frame down. Documented, not a bug.
    let mut bloom = SoftwareBloom::new(32, 32, 2).unwrap();
    let input = CpuImage::from_fill(32, 32, [0.8, 0.8, 0.8, 1.0]);
    let composite = CompositeSettings {
        strength: 0.0,
        mix_factor: 0.25,
    };
    let output = bloom
        .run(&input, &RenderSettings::default(), &composite)
        .unwrap();
    assert_uniform_rgb(&output, 0.6, "zero strength");
}

// ============================================================================
// Colour Grading
// ============================================================================

#[test]
fn default_grading_is_the_identity() {
    let matrix = RenderSettings::default().colour_matrix();
    assert!(matrix.abs_diff_eq(Mat4::IDENTITY, EPSILON));
}

#[test]
fn brightness_grades_only_the_bloom_contribution() {
    let g = 0.5;
    let levels = 4;
    let input = CpuImage::from_fill(64, 64, [g, g, g, 1.0]);
    let composite = CompositeSettings::default();

    let mut dimmed = RenderSettings::default();
    dimmed.set_brightness(0.5);

    let mut bloom = SoftwareBloom::new(64, 64, levels).unwrap();
    let output = bloom.run(&input, &dimmed, &composite).unwrap();

    // Grading runs once, at the finest downsample, so the whole accumulated
    // chain halves while the frame term stays untouched.
    let expected =
        (1.0 - composite.mix_factor) * g + composite.mix_factor * levels as f32 * 0.5 * g;
    assert_uniform_rgb(&output, expected, "brightness 0.5");
}

// ============================================================================
// Karis Weighting
// ============================================================================

#[test]
fn karis_weighting_suppresses_a_firefly() {
    let mut src = CpuImage::new(8, 8);
    src.set_texel(3, 3, [64.0, 64.0, 64.0, 1.0]);

    let plain = kernels::downsample(&src, 4, 4, 1.0, false, Mat4::IDENTITY);
    let weighted = kernels::downsample(&src, 4, 4, 1.0, true, Mat4::IDENTITY);

    let peak = |img: &CpuImage| {
        img.texels()
            .iter()
            .map(|t| t[0])
            .fold(0.0f32, f32::max)
    };

    let plain_peak = peak(&plain);
    let weighted_peak = peak(&weighted);
    assert!(
        weighted_peak < plain_peak * 0.5,
        "weighted peak {weighted_peak} should sit far below the plain peak {plain_peak}"
    );
}

// ============================================================================
// Degradation and Spread
// ============================================================================

#[test]
fn zero_depth_chain_passes_a_uniform_frame_through() {
    // Seed copy, upsample seed copy, composite: mix(g, g, mix) = g.
    let layout = ChainLayout::new_unchecked(32, 32, 0);
    let mut bloom = SoftwareBloom::from_layout(layout);
    let input = CpuImage::from_fill(32, 32, [0.5, 0.5, 0.5, 1.0]);
    let output = bloom
        .run(&input, &RenderSettings::default(), &CompositeSettings::default())
        .unwrap();
    assert_uniform_rgb(&output, 0.5, "zero depth");
}

#[test]
fn a_bright_spot_bleeds_into_its_neighbourhood() {
    let mut bloom = SoftwareBloom::new(64, 64, 4).unwrap();
    let input = CpuImage::from_fn(64, 64, |x, y| {
        if (30..34).contains(&x) && (30..34).contains(&y) {
            [10.0, 10.0, 10.0, 1.0]
        } else {
            [0.0; 4]
        }
    });

    let output = bloom
        .run(&input, &RenderSettings::default(), &CompositeSettings::default())
        .unwrap();

    // Outside the lit block the frame term is zero, so any light here came
    // through the chain.
    let halo = output.texel(40, 32);
    assert!(
        halo[0] > 1e-6,
        "expected bloom spill at (40, 32), got {}",
        halo[0]
    );

    // The block itself still dominates the halo.
    let centre = output.texel(32, 32);
    assert!(centre[0] > halo[0]);
}

// ============================================================================
// Allocation and Validation
// ============================================================================

#[test]
fn resize_reallocates_every_chain_target() {
    let mut bloom = SoftwareBloom::new(64, 64, 3).unwrap();
    bloom.resize(128, 96);

    assert_eq!(bloom.layout().base_extent(), (128, 96));
    let target = bloom.target(TargetRef::downsample(2)).unwrap();
    assert_eq!(target.extent(), (32, 24));

    let input = CpuImage::from_fill(128, 96, [0.25, 0.25, 0.25, 1.0]);
    let output = bloom
        .run(&input, &RenderSettings::default(), &CompositeSettings::default())
        .unwrap();
    assert_eq!(output.extent(), (128, 96));
}

#[test]
fn construction_validates_the_chain_depth() {
    assert!(matches!(
        SoftwareBloom::new(64, 64, 0),
        Err(AfterglowError::InvalidLevelCount { levels: 0, .. })
    ));
    assert!(matches!(
        SoftwareBloom::new(64, 64, MAX_LEVELS + 1),
        Err(AfterglowError::InvalidLevelCount { .. })
    ));
    assert!(SoftwareBloom::new(64, 64, MAX_LEVELS).is_ok());
}

#[test]
fn target_lookup_rejects_levels_past_the_chain() {
    let bloom = SoftwareBloom::new(64, 64, 2).unwrap();
    let err = bloom.target(TargetRef::upsample(9)).unwrap_err();
    assert!(matches!(
        err,
        AfterglowError::ChainIndexOutOfRange {
            level: 9,
            levels: 2,
            ..
        }
    ));
}
