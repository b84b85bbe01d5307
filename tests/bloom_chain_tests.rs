//! Bloom Chain Model Tests
//!
//! Tests for:
//! - Level scaling (ceil division, 1-texel floor)
//! - ChainLayout construction and validation
//! - Per-level extent lookup and out-of-range rejection
//! - Target naming and enumeration order
//! - BloomPlan step sequences, including the zero-depth degradation
//! - Composite source selection

use afterglow::chain::{scaled_extent, MAX_LEVELS};
use afterglow::{AfterglowError, BloomPlan, BloomStep, ChainLayout, ChainRole, TargetRef};

// ============================================================================
// Level Scaling
// ============================================================================

#[test]
fn level_zero_is_the_base_resolution() {
    assert_eq!(scaled_extent(1280, 0), 1280);
    assert_eq!(scaled_extent(720, 0), 720);
}

#[test]
fn each_level_halves_with_ceil_rounding() {
    assert_eq!(scaled_extent(1280, 1), 640);
    assert_eq!(scaled_extent(1281, 1), 641);
    assert_eq!(scaled_extent(720, 2), 180);
    assert_eq!(scaled_extent(719, 2), 180);
}

#[test]
fn deep_levels_floor_at_one_texel() {
    assert_eq!(scaled_extent(1, 10), 1);
    assert_eq!(scaled_extent(720, 16), 1);
}

// ============================================================================
// ChainLayout Construction
// ============================================================================

#[test]
fn layout_rejects_zero_levels() {
    let err = ChainLayout::new(1280, 720, 0).unwrap_err();
    assert!(
        matches!(err, AfterglowError::InvalidLevelCount { levels: 0, .. }),
        "expected InvalidLevelCount, got {err:?}"
    );
}

#[test]
fn layout_rejects_levels_beyond_the_maximum() {
    assert!(ChainLayout::new(1280, 720, MAX_LEVELS).is_ok());
    let err = ChainLayout::new(1280, 720, MAX_LEVELS + 1).unwrap_err();
    assert!(matches!(
        err,
        AfterglowError::InvalidLevelCount { max: MAX_LEVELS, .. }
    ));
}

#[test]
fn zero_base_dimensions_clamp_to_one() {
    // A minimized window must degrade to 1x1 targets, not fail.
    let layout = ChainLayout::new(0, 0, 4).unwrap();
    assert_eq!(layout.base_extent(), (1, 1));
    for level in 0..=4 {
        assert_eq!(layout.extent_of(level).unwrap(), (1, 1));
    }
}

// ============================================================================
// Extent Lookup
// ============================================================================

#[test]
fn extents_follow_the_mip_ladder() {
    let layout = ChainLayout::new(1280, 720, 4).unwrap();
    assert_eq!(layout.extent_of(0).unwrap(), (1280, 720));
    assert_eq!(layout.extent_of(1).unwrap(), (640, 360));
    assert_eq!(layout.extent_of(2).unwrap(), (320, 180));
    assert_eq!(layout.extent_of(3).unwrap(), (160, 90));
    assert_eq!(layout.extent_of(4).unwrap(), (80, 45));
}

#[test]
fn extent_lookup_past_the_depth_is_an_error() {
    let layout = ChainLayout::new(1280, 720, 4).unwrap();
    let err = layout.extent_of(5).unwrap_err();
    assert!(matches!(
        err,
        AfterglowError::ChainIndexOutOfRange {
            level: 5,
            levels: 4,
            ..
        }
    ));
}

#[test]
fn resize_updates_extents_but_never_the_depth() {
    let mut layout = ChainLayout::new(1280, 720, 3).unwrap();
    layout.resize(640, 480);
    assert_eq!(layout.levels(), 3);
    assert_eq!(layout.extent_of(0).unwrap(), (640, 480));
    assert_eq!(layout.extent_of(1).unwrap(), (320, 240));
}

// ============================================================================
// Target Naming and Enumeration
// ============================================================================

#[test]
fn target_names_combine_role_and_level() {
    assert_eq!(TargetRef::downsample(3).name(), "downsample-3");
    assert_eq!(TargetRef::upsample(0).name(), "upsample-0");
    assert_eq!(format!("{}", TargetRef::downsample(12)), "downsample-12");
}

#[test]
fn layout_enumerates_both_chains_in_level_order() {
    let layout = ChainLayout::new(256, 256, 2).unwrap();
    let specs = layout.targets();
    assert_eq!(specs.len() as u32, layout.target_count());
    assert_eq!(layout.target_count(), 6);

    // Downsample chain first, then upsample, each by ascending level.
    let names: Vec<String> = specs.iter().map(|s| s.target.name()).collect();
    assert_eq!(
        names,
        [
            "downsample-0",
            "downsample-1",
            "downsample-2",
            "upsample-0",
            "upsample-1",
            "upsample-2",
        ]
    );

    assert_eq!((specs[0].width, specs[0].height), (256, 256));
    assert_eq!((specs[2].width, specs[2].height), (64, 64));
    assert_eq!((specs[5].width, specs[5].height), (64, 64));
}

// ============================================================================
// BloomPlan Step Sequences
// ============================================================================

#[test]
fn plan_runs_seed_down_up_composite_in_order() {
    let plan = BloomPlan::build(4);
    let steps = plan.steps();
    assert_eq!(steps.len(), 11);

    assert_eq!(
        steps[0],
        BloomStep::Seed {
            dest: TargetRef::downsample(0)
        }
    );

    for i in 0..4u32 {
        assert_eq!(
            steps[1 + i as usize],
            BloomStep::Downsample {
                source: TargetRef::downsample(i),
                dest: TargetRef::downsample(i + 1),
                karis: i == 0,
                grade: i == 0,
            }
        );
    }

    assert_eq!(
        steps[5],
        BloomStep::UpsampleSeed {
            source: TargetRef::downsample(4),
            dest: TargetRef::upsample(4),
        }
    );

    // Upsample walks bottom-up, folding each downsample level back in.
    for (offset, i) in (0..4u32).rev().enumerate() {
        assert_eq!(
            steps[6 + offset],
            BloomStep::Upsample {
                source: TargetRef::upsample(i + 1),
                mip: TargetRef::downsample(i + 1),
                dest: TargetRef::upsample(i),
            }
        );
    }

    assert_eq!(
        steps[10],
        BloomStep::Composite {
            bloom: TargetRef::upsample(1)
        }
    );
}

#[test]
fn karis_and_grading_run_only_at_the_finest_level() {
    let plan = BloomPlan::build(6);
    let flagged: Vec<bool> = plan
        .steps()
        .iter()
        .filter_map(|step| match step {
            BloomStep::Downsample { karis, grade, .. } => Some(*karis && *grade),
            _ => None,
        })
        .collect();
    assert_eq!(flagged, [true, false, false, false, false, false]);
}

#[test]
fn composite_reads_upsample_one_for_any_real_depth() {
    for levels in 1..=MAX_LEVELS {
        assert_eq!(
            BloomPlan::composite_source(levels),
            TargetRef::upsample(1),
            "depth {levels}"
        );
    }
}

#[test]
fn zero_depth_plan_degrades_to_copies() {
    // Both filter loops vanish; the composite reads the seed copy.
    let plan = BloomPlan::build(0);
    assert_eq!(
        plan.steps(),
        [
            BloomStep::Seed {
                dest: TargetRef::downsample(0)
            },
            BloomStep::UpsampleSeed {
                source: TargetRef::downsample(0),
                dest: TargetRef::upsample(0),
            },
            BloomStep::Composite {
                bloom: TargetRef::upsample(0)
            },
        ]
    );
    assert_eq!(BloomPlan::composite_source(0), TargetRef::upsample(0));
}

#[test]
fn every_plan_ends_with_a_composite() {
    for levels in [0, 1, 2, 4, 8, MAX_LEVELS] {
        let plan = BloomPlan::build(levels);
        assert_eq!(plan.levels(), levels);
        assert!(
            matches!(plan.steps().last(), Some(BloomStep::Composite { .. })),
            "depth {levels}"
        );
    }
}

#[test]
fn chain_roles_expose_their_pool_prefixes() {
    assert_eq!(ChainRole::Downsample.prefix(), "downsample");
    assert_eq!(ChainRole::Upsample.prefix(), "upsample");
}
