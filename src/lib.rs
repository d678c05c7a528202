//! Automatic exposure (eye adaptation) for HDR render pipelines.
//! Rust: wgpu 0.19. Measures log-average scene luminance on the GPU and
//! adapts a double-buffered 1x1 exposure state toward it over time.
//!
//! Per frame the pipeline reduces the top-left 16x16 tile of an HDR
//! source to one log-average luminance value, then blends the previous
//! adapted state toward that measurement with a frame-rate independent
//! factor. The orchestrator owns the frame loop: it records the passes,
//! submits, samples [`ExposurePipeline::adapted_view`] in its tone-map
//! pass and calls [`ExposurePipeline::swap`] once per frame.
//!
//! ```no_run
//! use auto_exposure::{ExposureConfig, ExposurePipeline, GpuContext};
//!
//! # fn demo(source_view: &wgpu::TextureView) -> auto_exposure::ExposureResult<()> {
//! let ctx = GpuContext::new()?;
//! let mut exposure = ExposurePipeline::new(&ctx.device, &ctx.queue, ExposureConfig::default())?;
//!
//! let mut encoder = ctx
//!     .device
//!     .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
//! exposure.measure(&ctx.device, &ctx.queue, &mut encoder, source_view, 1.0 / 60.0);
//! ctx.queue.submit(Some(encoder.finish()));
//! // ... tone map sampling exposure.adapted_view() ...
//! exposure.swap();
//! # Ok(())
//! # }
//! ```

pub mod adaptation;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod luminance;
pub mod pipeline;
pub mod readback;

pub use config::{ExposureConfig, LuminancePreset, TILE_DIM, TILE_SAMPLES};
pub use context::GpuContext;
pub use error::{ExposureError, ExposureResult};
pub use history::ExposureHistory;
pub use luminance::ExposureSample;
pub use pipeline::{validate_source_texture, ExposurePipeline};
pub use readback::read_exposure_sample;
