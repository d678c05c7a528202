// tests/exposure_properties.rs
// End-to-end properties of the measurement and adaptation math on the
// CPU reference implementations.

use auto_exposure::adaptation::{adapt_channel, adapt_sample, blend_factor};
use auto_exposure::config::{ExposureConfig, LuminancePreset, TILE_SAMPLES};
use auto_exposure::luminance::{luminance, reduce_tile, ExposureSample};
use glam::Vec3;

fn uniform_tile(rgb: Vec3) -> Vec<Vec3> {
    vec![rgb; TILE_SAMPLES as usize]
}

/// Tile whose texel luminances ramp from `lo` to `hi`
fn ramp_tile(lo: f32, hi: f32) -> Vec<Vec3> {
    (0..TILE_SAMPLES)
        .map(|i| {
            let t = i as f32 / (TILE_SAMPLES - 1) as f32;
            Vec3::splat(lo + (hi - lo) * t)
        })
        .collect()
}

fn bt709_config() -> ExposureConfig {
    ExposureConfig {
        preset: LuminancePreset::Bt709,
        ..Default::default()
    }
}

#[test]
fn adaptation_settles_exactly_on_the_black_floor() {
    let config = bt709_config();
    let measured = reduce_tile(&uniform_tile(Vec3::ZERO), &config).unwrap();
    assert_eq!(measured.average, config.luminance_floor);

    let mut state = ExposureSample::splat(config.initial_luminance);
    for _ in 0..3000 {
        state = adapt_sample(&state, &measured, 1.0 / 60.0, &config);
    }
    assert!(
        (state.average - config.luminance_floor).abs() < 1e-9,
        "settled at {} instead of {}",
        state.average,
        config.luminance_floor
    );
}

#[test]
fn worked_example_of_the_legacy_kernels() {
    let config = ExposureConfig::default();
    let w = config.resolved_weights();
    let tile = uniform_tile(Vec3::splat(1.0 / (w.x + w.y + w.z)));

    let measured = reduce_tile(&tile, &config).unwrap();
    let floor = config.luminance_floor as f64;
    let expected = ((1.0f64 + floor).ln() + floor).exp() as f32;
    assert!(
        (measured.average - expected).abs() < 1e-6,
        "measured {} expected {}",
        measured.average,
        expected
    );

    // One adaptation step at 30 Hz blends two percent of the gap.
    let factor = blend_factor(config.decay, config.rate_scale, 1.0 / 30.0);
    let adapted = adapt_channel(0.5, measured.average, factor);
    assert!((adapted - 0.5100).abs() < 1e-4, "adapted {}", adapted);
}

#[test]
fn brightening_any_texel_is_monotone_under_both_presets() {
    for preset in [LuminancePreset::Legacy, LuminancePreset::Bt709] {
        let config = ExposureConfig {
            preset,
            ..Default::default()
        };
        let mut tile = ramp_tile(0.05, 2.0);
        let base = reduce_tile(&tile, &config).unwrap().average;

        for index in [0usize, 99, 255] {
            let mut brighter = tile.clone();
            brighter[index] += Vec3::splat(1.0);
            let measured = reduce_tile(&brighter, &config).unwrap().average;
            assert!(
                measured >= base,
                "{:?}: brightening texel {} lowered {} below {}",
                preset,
                index,
                measured,
                base
            );
        }

        tile[128] = Vec3::splat(100.0);
        assert!(reduce_tile(&tile, &config).unwrap().average >= base);
    }
}

#[test]
fn adaptation_is_frame_rate_independent() {
    let config = ExposureConfig::default();
    let target = ExposureSample::splat(3.0);
    let start = ExposureSample::splat(0.2);

    // Four 120 Hz frames must land where one 30 Hz frame does.
    let coarse = adapt_sample(&start, &target, 1.0 / 30.0, &config);
    let mut fine = start;
    for _ in 0..4 {
        fine = adapt_sample(&fine, &target, 1.0 / 120.0, &config);
    }
    assert!(
        (coarse.average - fine.average).abs() < 1e-5,
        "30 Hz step {} vs 4x 120 Hz {}",
        coarse.average,
        fine.average
    );
}

#[test]
fn full_loop_converges_to_a_steady_scene() {
    let config = bt709_config();
    let tile = ramp_tile(0.1, 0.9);
    let measured = reduce_tile(&tile, &config).unwrap();

    let mut state = ExposureSample::splat(config.initial_luminance);
    let mut previous_gap = (state.average - measured.average).abs();
    for frame in 0..1200 {
        state = adapt_sample(&state, &measured, 1.0 / 60.0, &config);
        let gap = (state.average - measured.average).abs();
        assert!(
            gap <= previous_gap,
            "gap grew at frame {}: {} > {}",
            frame,
            gap,
            previous_gap
        );
        previous_gap = gap;
    }
    assert!(
        (state.average - measured.average).abs() < 1e-4,
        "state {} never reached measurement {}",
        state.average,
        measured.average
    );
}

#[test]
fn range_ordering_survives_adaptation() {
    let config = ExposureConfig {
        preset: LuminancePreset::Bt709,
        track_range: true,
        ..Default::default()
    };
    let mut tile = ramp_tile(0.05, 1.5);
    tile[7] = Vec3::splat(6.0);
    tile[200] = Vec3::splat(0.002);

    let measured = reduce_tile(&tile, &config).unwrap();
    assert!(measured.minimum <= measured.average);
    assert!(measured.average <= measured.maximum);

    let mut state = ExposureSample::splat(config.initial_luminance);
    for _ in 0..240 {
        state = adapt_sample(&state, &measured, 1.0 / 60.0, &config);
        assert!(
            state.minimum <= state.average && state.average <= state.maximum,
            "ordering broke: {:?}",
            state
        );
    }
}

#[test]
fn presets_agree_closely_on_a_mid_grey_scene() {
    let legacy = ExposureConfig::default();
    let bt709 = bt709_config();
    let tile = uniform_tile(Vec3::splat(0.18));

    let a = reduce_tile(&tile, &legacy).unwrap().average;
    let b = reduce_tile(&tile, &bt709).unwrap().average;
    assert!(a > 0.0 && b > 0.0);
    assert!(
        (a - b).abs() / b < 1e-3,
        "legacy {} vs bt709 {} drifted apart",
        a,
        b
    );
}

#[test]
fn weighted_luminance_uses_the_configured_vector() {
    let config = bt709_config();
    let w = config.resolved_weights();
    let lum = luminance(Vec3::new(1.0, 0.0, 0.0), w);
    assert!((lum - 0.2126).abs() < 1e-6);

    let custom = ExposureConfig {
        weights: Some([1.0, 0.0, 0.0]),
        ..Default::default()
    };
    let tile = uniform_tile(Vec3::new(0.5, 9.0, 9.0));
    let measured = reduce_tile(&tile, &custom).unwrap();
    // Only the red channel contributes under the custom weights.
    assert!((measured.average - 0.5).abs() < 1e-3);
}
