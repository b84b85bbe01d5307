//! Configuration Tests
//!
//! Tests for:
//! - Default values for every tuning struct
//! - Setter clamping ranges
//! - Construction-time validation of the bloom chain depth
//! - Partial JSON deserialization filling in defaults
//! - The combined brightness/contrast/saturation grading matrix
//! - Forcefield template resolution and per-instance overrides

use glam::{Mat4, Vec3, Vec4};

use afterglow::{
    AfterglowError, BloomConfig, CompositeSettings, ForcefieldInstance, ForcefieldTemplate,
    FrameSettings, RenderSettings, VignetteConfig,
};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn grade(settings: &RenderSettings, rgb: Vec3) -> Vec3 {
    (settings.colour_matrix() * Vec4::new(rgb.x, rgb.y, rgb.z, 1.0)).truncate()
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn bloom_defaults_match_the_documented_values() {
    let config = BloomConfig::default();
    assert!(config.enabled);
    assert_eq!(config.levels, 4);
    assert!(approx(config.render.brightness, 1.0));
    assert!(approx(config.render.down_radius, 1.0));
    assert!(approx(config.composite.strength, 1.0));
    assert!(approx(config.composite.mix_factor, 0.03));
}

#[test]
fn vignette_defaults_match_the_documented_values() {
    let config = VignetteConfig::default();
    assert!(config.enabled);
    assert!(approx(config.intensity, 0.4));
    assert!(approx(config.dropoff, 0.25));
}

#[test]
fn frame_settings_start_with_no_forcefields_and_unit_exposure() {
    let settings = FrameSettings::default();
    assert!(settings.forcefields.is_empty());
    assert!(approx(settings.exposure, 1.0));
}

// ============================================================================
// Clamping and Validation
// ============================================================================

#[test]
fn setters_clamp_to_their_documented_ranges() {
    let mut render = RenderSettings::default();
    render.set_brightness(-2.0);
    assert!(approx(render.brightness, 0.0));

    let mut composite = CompositeSettings::default();
    composite.set_mix_factor(1.5);
    assert!(approx(composite.mix_factor, 1.0));
    composite.set_mix_factor(-0.5);
    assert!(approx(composite.mix_factor, 0.0));
    composite.set_strength(-3.0);
    assert!(approx(composite.strength, 0.0));

    let mut vignette = VignetteConfig::default();
    vignette.set_intensity(2.0);
    assert!(approx(vignette.intensity, 1.0));
    vignette.set_dropoff(-0.1);
    assert!(approx(vignette.dropoff, 0.0));
}

#[test]
fn validation_rejects_out_of_range_chain_depths() {
    assert!(BloomConfig::default().validate().is_ok());

    let zero = BloomConfig {
        levels: 0,
        ..BloomConfig::default()
    };
    let err = zero.validate().unwrap_err();
    assert!(matches!(err, AfterglowError::InvalidLevelCount { .. }));
    assert_eq!(
        err.to_string(),
        "Invalid bloom level count: 0 (must be 1..=16)"
    );

    let deep = BloomConfig {
        levels: 17,
        ..BloomConfig::default()
    };
    assert!(deep.validate().is_err());
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn partial_json_fills_in_defaults() {
    let config: BloomConfig =
        serde_json::from_str(r#"{"composite": {"mix_factor": 0.05}}"#).unwrap();
    assert!(config.enabled);
    assert_eq!(config.levels, 4);
    assert!(approx(config.composite.mix_factor, 0.05));
    assert!(approx(config.composite.strength, 1.0));
    assert_eq!(config.render, RenderSettings::default());
}

#[test]
fn empty_json_is_the_default_config() {
    let bloom: BloomConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(bloom, BloomConfig::default());

    let vignette: VignetteConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(vignette, VignetteConfig::default());
}

#[test]
fn configs_round_trip_through_json() {
    let config = BloomConfig {
        levels: 6,
        ..BloomConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: BloomConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

// ============================================================================
// Grading Matrix
// ============================================================================

#[test]
fn brightness_below_one_scales_and_above_one_lifts() {
    let mut settings = RenderSettings::default();

    settings.set_brightness(0.5);
    let scaled = grade(&settings, Vec3::splat(0.8));
    assert!(approx(scaled.x, 0.4));

    settings.set_brightness(1.5);
    let lifted = grade(&settings, Vec3::splat(0.8));
    assert!(approx(lifted.x, 1.3));
}

#[test]
fn contrast_pivots_around_mid_grey() {
    let mut settings = RenderSettings::default();
    settings.set_contrast(2.0);

    let pivot = grade(&settings, Vec3::splat(0.5));
    assert!(approx(pivot.x, 0.5), "mid-grey must stay fixed, got {}", pivot.x);

    let pushed = grade(&settings, Vec3::splat(0.75));
    assert!(approx(pushed.x, 1.0));
}

#[test]
fn zero_saturation_collapses_to_luminance() {
    let mut settings = RenderSettings::default();
    settings.set_saturation(0.0);

    let red = grade(&settings, Vec3::new(1.0, 0.0, 0.0));
    assert!(approx(red.x, 0.2126));
    assert!(approx(red.y, 0.2126));
    assert!(approx(red.z, 0.2126));
}

// ============================================================================
// Forcefield Resolution
// ============================================================================

#[test]
fn resolve_places_the_fade_band_at_the_top_of_the_volume() {
    let template = ForcefieldTemplate::default();
    let instance = ForcefieldInstance::new(Vec3::new(1.0, 2.0, 3.0), 4.0);
    let resolved = template.resolve(&instance);

    // Top face at centre_y + height / 2; band covers the top quarter.
    assert!(approx(resolved.fade_top, 4.0));
    assert!(approx(resolved.fade_bottom, 3.0));
    assert_eq!(resolved.color1, template.color1);
    assert_eq!(resolved.color2, template.color2);
}

#[test]
fn resolve_builds_a_translate_scale_model_matrix() {
    let template = ForcefieldTemplate::default();
    let position = Vec3::new(-2.0, 0.5, 7.0);
    let resolved = template.resolve(&ForcefieldInstance::new(position, 4.0));

    let centre = resolved.model.transform_point3(Vec3::ZERO);
    assert!(centre.abs_diff_eq(position, EPSILON));

    // A unit-cube corner lands half the edge length out on each axis.
    let corner = resolved.model.transform_point3(Vec3::splat(0.5));
    assert!(corner.abs_diff_eq(position + Vec3::splat(2.0), EPSILON));
}

#[test]
fn overrides_replace_only_the_fields_they_set() {
    let template = ForcefieldTemplate::default();
    let mut instance = ForcefieldInstance::new(Vec3::ZERO, 2.0);
    instance.overrides.color1 = Some(Vec3::new(0.0, 1.0, 0.0));
    instance.overrides.fade_fraction = Some(0.5);

    let resolved = template.resolve(&instance);
    assert_eq!(resolved.color1, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(resolved.color2, template.color2);
    assert!(approx(resolved.fade_top, 1.0));
    assert!(approx(resolved.fade_bottom, 0.0));
}

#[test]
fn fresh_instances_inherit_the_whole_template() {
    let instance = ForcefieldInstance::new(Vec3::ONE, 1.0);
    assert!(instance.overrides.color1.is_none());
    assert!(instance.overrides.color2.is_none());
    assert!(instance.overrides.fade_fraction.is_none());

    let mut template = ForcefieldTemplate::default();
    template.color1 = Vec3::new(1.0, 0.0, 1.0);
    let resolved = template.resolve(&instance);
    assert_eq!(resolved.color1, Vec3::new(1.0, 0.0, 1.0));
}
