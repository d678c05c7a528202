// src/adaptation.rs
// CPU reference for the temporal eye-adaptation blend
// RELEVANT FILES: shaders/luminance_adapt.wgsl

use crate::config::ExposureConfig;
use crate::luminance::ExposureSample;

/// Blend factor for one adaptation step over `dt` seconds.
///
/// `decay^(rate_scale * dt)` is the fraction of the previous state kept,
/// so the factor is frame-rate independent: two steps of `dt/2` compose
/// to one step of `dt`. `dt = 0` yields exactly 0 and the step becomes
/// the identity. Negative `dt` is undefined; callers clamp upstream.
pub fn blend_factor(decay: f32, rate_scale: f32, dt: f32) -> f32 {
    1.0 - decay.powf(rate_scale * dt)
}

/// Move one channel from `prev` toward `current` by `factor`
pub fn adapt_channel(prev: f32, current: f32, factor: f32) -> f32 {
    prev + (current - prev) * factor
}

/// Adapt a full exposure sample toward the current measurement.
///
/// The average, maximum and minimum channels blend independently with
/// the same factor, matching the GPU kernel.
pub fn adapt_sample(
    prev: &ExposureSample,
    current: &ExposureSample,
    dt: f32,
    config: &ExposureConfig,
) -> ExposureSample {
    let factor = blend_factor(config.decay, config.rate_scale, dt);
    ExposureSample {
        average: adapt_channel(prev.average, current.average, factor),
        maximum: adapt_channel(prev.maximum, current.maximum, factor),
        minimum: adapt_channel(prev.minimum, current.minimum, factor),
    }
}
