//! Configuration and GPU uniform types for the exposure pipeline
//!
//! The config carries every tunable of the two kernels: luminance
//! weights, guard epsilon, decay rate and time scale. Uniform structs
//! here must match the WGSL struct layouts exactly.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ExposureError, ExposureResult};

/// Side length of the sampled tile, in texels.
pub const TILE_DIM: u32 = 16;

/// Number of texels reduced per measurement (16x16).
pub const TILE_SAMPLES: u32 = TILE_DIM * TILE_DIM;

/// Luminance weight vector and epsilon placement.
///
/// Two variants of the measurement are in circulation; both are exposed
/// as named presets rather than silently picking one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LuminancePreset {
    /// Weights (0.2125, 0.7154, 0.0721), the floor epsilon added inside
    /// the log and again before the final exponentiation. An all-black
    /// tile measures slightly above the floor.
    Legacy,
    /// Rec. 709 weights (0.2126, 0.7152, 0.0722); per-sample luminance is
    /// clamped to the floor before the log and the mean is exponentiated
    /// as-is. An all-black tile measures exactly the floor and a uniform
    /// tile measures its own luminance.
    Bt709,
}

impl Default for LuminancePreset {
    fn default() -> Self {
        LuminancePreset::Legacy
    }
}

impl LuminancePreset {
    /// Weight vector for the RGB dot product.
    pub fn weights(self) -> Vec3 {
        match self {
            LuminancePreset::Legacy => Vec3::new(0.2125, 0.7154, 0.0721),
            LuminancePreset::Bt709 => Vec3::new(0.2126, 0.7152, 0.0722),
        }
    }

    /// Convert to shader index
    pub fn as_index(self) -> u32 {
        match self {
            LuminancePreset::Legacy => 0,
            LuminancePreset::Bt709 => 1,
        }
    }
}

/// Exposure pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Weight/epsilon preset for the luminance measurement.
    pub preset: LuminancePreset,
    /// Optional custom weight vector, overriding the preset's weights.
    /// Must sum to 1 within 1e-3. Epsilon placement still follows the
    /// preset.
    pub weights: Option<[f32; 3]>,
    /// Per-tick retention of the previous adapted state.
    pub decay: f32,
    /// Adaptation ticks per second of wall time.
    pub rate_scale: f32,
    /// Guard epsilon for the log / luminance floor.
    pub luminance_floor: f32,
    /// Also track the true tile maximum and minimum luminance. When off,
    /// the max/min channels carry copies of the average.
    pub track_range: bool,
    /// Seed value for the state images. Defaults to 32/255, a middle
    /// luminance that keeps the first frames from adapting up from
    /// black.
    pub initial_luminance: f32,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            preset: LuminancePreset::Legacy,
            weights: None,
            decay: 0.98,
            rate_scale: 30.0,
            luminance_floor: 1e-5,
            track_range: false,
            initial_luminance: 32.0 / 255.0,
        }
    }
}

impl ExposureConfig {
    /// Effective weight vector: custom weights when set, else the preset's.
    pub fn resolved_weights(&self) -> Vec3 {
        match self.weights {
            Some(w) => Vec3::from_array(w),
            None => self.preset.weights(),
        }
    }

    /// Validate tunables before building GPU state.
    pub fn validate(&self) -> ExposureResult<()> {
        if let Some(w) = self.weights {
            if w.iter().any(|c| !c.is_finite() || *c < 0.0) {
                return Err(ExposureError::validation(format!(
                    "weights must be finite and non-negative, got {:?}",
                    w
                )));
            }
            let sum: f32 = w.iter().sum();
            if (sum - 1.0).abs() > 1e-3 {
                return Err(ExposureError::validation(format!(
                    "weights must sum to 1.0 within 1e-3, got sum {}",
                    sum
                )));
            }
        }
        if !self.decay.is_finite() || self.decay <= 0.0 || self.decay >= 1.0 {
            return Err(ExposureError::validation(format!(
                "decay must lie in (0, 1), got {}",
                self.decay
            )));
        }
        if !self.rate_scale.is_finite() || self.rate_scale <= 0.0 {
            return Err(ExposureError::validation(format!(
                "rate_scale must be positive, got {}",
                self.rate_scale
            )));
        }
        if !self.luminance_floor.is_finite() || self.luminance_floor <= 0.0 {
            return Err(ExposureError::validation(format!(
                "luminance_floor must be positive, got {}",
                self.luminance_floor
            )));
        }
        if !self.initial_luminance.is_finite() || self.initial_luminance < 0.0 {
            return Err(ExposureError::validation(format!(
                "initial_luminance must be non-negative, got {}",
                self.initial_luminance
            )));
        }
        Ok(())
    }
}

/// Uniforms for the reduce kernel. Must match ReduceParams in
/// luminance_reduce.wgsl.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ReduceUniforms {
    pub weights: [f32; 3],
    pub luminance_floor: f32,
    pub preset_index: u32,
    pub _pad: [u32; 3],
}

impl ReduceUniforms {
    /// Create uniforms from config
    pub fn from_config(config: &ExposureConfig) -> Self {
        Self {
            weights: config.resolved_weights().to_array(),
            luminance_floor: config.luminance_floor,
            preset_index: config.preset.as_index(),
            _pad: [0; 3],
        }
    }
}

/// Uniforms for the adapt kernel. Must match AdaptParams in
/// luminance_adapt.wgsl.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AdaptUniforms {
    pub delta_time: f32,
    pub decay: f32,
    pub rate_scale: f32,
    pub _pad: f32,
}

impl AdaptUniforms {
    /// Create uniforms from config and the frame's delta time
    pub fn from_config(config: &ExposureConfig, delta_time: f32) -> Self {
        Self {
            delta_time,
            decay: config.decay,
            rate_scale: config.rate_scale,
            _pad: 0.0,
        }
    }
}
