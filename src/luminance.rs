// src/luminance.rs
// CPU reference for the log-average luminance reduction
// RELEVANT FILES: shaders/luminance_reduce.wgsl

use glam::Vec3;

use crate::config::{ExposureConfig, LuminancePreset, TILE_SAMPLES};
use crate::error::{ExposureError, ExposureResult};

/// One measured or adapted exposure state: the log-average luminance of
/// the tile plus the tracked extremes. When range tracking is off the
/// maximum and minimum carry copies of the average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureSample {
    pub average: f32,
    pub maximum: f32,
    pub minimum: f32,
}

impl ExposureSample {
    /// Sample with all three channels set to the same value
    pub fn splat(value: f32) -> Self {
        Self {
            average: value,
            maximum: value,
            minimum: value,
        }
    }
}

/// Weighted luminance of one linear-light RGB texel
pub fn luminance(rgb: Vec3, weights: Vec3) -> f32 {
    rgb.dot(weights)
}

/// Reduce a full tile of linear-light RGB texels to one exposure sample.
///
/// Matches the GPU kernel: per-texel weighted luminance, mean of logs,
/// exponentiation, with the epsilon placement selected by the preset.
/// Accumulation runs in f64 so the uniform-tile and all-black identities
/// survive the final f32 cast.
///
/// Expects exactly one tile's worth of texels (256).
pub fn reduce_tile(texels: &[Vec3], config: &ExposureConfig) -> ExposureResult<ExposureSample> {
    if texels.len() != TILE_SAMPLES as usize {
        return Err(ExposureError::validation(format!(
            "reduce_tile expects {} texels, got {}",
            TILE_SAMPLES,
            texels.len()
        )));
    }

    let weights = config.resolved_weights();
    let floor = config.luminance_floor;

    let mut log_sum = 0.0f64;
    let mut maximum = f32::MIN;
    let mut minimum = f32::MAX;

    for texel in texels {
        let lum = luminance(*texel, weights);
        let guarded = match config.preset {
            LuminancePreset::Legacy => lum + floor,
            LuminancePreset::Bt709 => lum.max(floor),
        };
        log_sum += (guarded as f64).ln();
        maximum = maximum.max(guarded);
        minimum = minimum.min(guarded);
    }

    let mean = log_sum / TILE_SAMPLES as f64;
    let average = match config.preset {
        LuminancePreset::Legacy => (mean + floor as f64).exp() as f32,
        LuminancePreset::Bt709 => mean.exp() as f32,
    };

    Ok(ExposureSample {
        average,
        maximum,
        minimum,
    })
}
