//! GPU exposure pipeline
//!
//! Builds the two compute kernels of the auto-exposure pass and records
//! them into the frame's command encoder: a luminance reduction of the
//! source's top-left 16x16 tile into the 1x1 current buffer, then the
//! temporal blend of the previous adapted state toward that measurement.
//! Recording both passes on one encoder orders the stages; compute pass
//! writes are visible to later passes on the same encoder.

use std::borrow::Cow;
use wgpu::*;

use crate::config::{AdaptUniforms, ExposureConfig, ReduceUniforms, TILE_DIM};
use crate::error::{ExposureError, ExposureResult};
use crate::history::{ExposureHistory, STATE_FORMAT};
use crate::luminance::ExposureSample;

/// Check that a source texture can feed the reducer.
///
/// The kernel loads the top-left 16x16 tile, so the source must be at
/// least one tile in each dimension and single-sampled.
pub fn validate_source_texture(texture: &Texture) -> ExposureResult<()> {
    if texture.width() < TILE_DIM || texture.height() < TILE_DIM {
        return Err(ExposureError::validation(format!(
            "exposure source must be at least {}x{}, got {}x{}",
            TILE_DIM,
            TILE_DIM,
            texture.width(),
            texture.height()
        )));
    }
    if texture.sample_count() != 1 {
        return Err(ExposureError::validation(format!(
            "exposure source must be single-sampled, got sample count {}",
            texture.sample_count()
        )));
    }
    Ok(())
}

/// Auto-exposure compute pipelines plus the owned measurement state
pub struct ExposurePipeline {
    config: ExposureConfig,
    history: ExposureHistory,

    reduce_pipeline: ComputePipeline,
    reduce_range_pipeline: ComputePipeline,
    adapt_pipeline: ComputePipeline,

    reduce_layout: BindGroupLayout,
    reduce_uniform_buffer: Buffer,
    adapt_uniform_buffer: Buffer,

    // One adapt bind group per ping-pong parity, indexed by the state
    // slot being written.
    adapt_bind_groups: [BindGroup; 2],
}

impl ExposurePipeline {
    /// Validate the config, create the 1x1 targets and build both kernels
    pub fn new(device: &Device, queue: &Queue, config: ExposureConfig) -> ExposureResult<Self> {
        config.validate()?;

        let history = ExposureHistory::new(device, queue, config.initial_luminance);

        let reduce_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("exposure_reduce_layout"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: false },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::StorageTexture {
                        access: StorageTextureAccess::WriteOnly,
                        format: STATE_FORMAT,
                        view_dimension: TextureViewDimension::D2,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let adapt_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("exposure_adapt_layout"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: false },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: false },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::StorageTexture {
                        access: StorageTextureAccess::WriteOnly,
                        format: STATE_FORMAT,
                        view_dimension: TextureViewDimension::D2,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 3,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let reduce_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("exposure_reduce_shader"),
            source: ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "shaders/luminance_reduce.wgsl"
            ))),
        });

        let adapt_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("exposure_adapt_shader"),
            source: ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/luminance_adapt.wgsl"))),
        });

        let reduce_pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("exposure_reduce_pipeline_layout"),
            bind_group_layouts: &[&reduce_layout],
            push_constant_ranges: &[],
        });

        let adapt_pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("exposure_adapt_pipeline_layout"),
            bind_group_layouts: &[&adapt_layout],
            push_constant_ranges: &[],
        });

        let reduce_pipeline = device.create_compute_pipeline(&ComputePipelineDescriptor {
            label: Some("exposure_reduce_pipeline"),
            layout: Some(&reduce_pipeline_layout),
            module: &reduce_shader,
            entry_point: "main",
        });

        let reduce_range_pipeline = device.create_compute_pipeline(&ComputePipelineDescriptor {
            label: Some("exposure_reduce_range_pipeline"),
            layout: Some(&reduce_pipeline_layout),
            module: &reduce_shader,
            entry_point: "main_range",
        });

        let adapt_pipeline = device.create_compute_pipeline(&ComputePipelineDescriptor {
            label: Some("exposure_adapt_pipeline"),
            layout: Some(&adapt_pipeline_layout),
            module: &adapt_shader,
            entry_point: "main",
        });

        let reduce_uniform_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("exposure_reduce_uniforms"),
            size: std::mem::size_of::<ReduceUniforms>() as BufferAddress,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let adapt_uniform_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("exposure_adapt_uniforms"),
            size: std::mem::size_of::<AdaptUniforms>() as BufferAddress,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        queue.write_buffer(
            &reduce_uniform_buffer,
            0,
            bytemuck::bytes_of(&ReduceUniforms::from_config(&config)),
        );
        queue.write_buffer(
            &adapt_uniform_buffer,
            0,
            bytemuck::bytes_of(&AdaptUniforms::from_config(&config, 0.0)),
        );

        let adapt_bind_groups = [
            create_adapt_bind_group(
                device,
                &adapt_layout,
                history.current_view(),
                history.state_view(1),
                history.state_view(0),
                &adapt_uniform_buffer,
                "exposure_adapt_bind_group_0",
            ),
            create_adapt_bind_group(
                device,
                &adapt_layout,
                history.current_view(),
                history.state_view(0),
                history.state_view(1),
                &adapt_uniform_buffer,
                "exposure_adapt_bind_group_1",
            ),
        ];

        log::info!(
            "exposure pipeline ready: preset {:?}, decay {}, rate scale {}, range tracking {}",
            config.preset,
            config.decay,
            config.rate_scale,
            config.track_range
        );

        Ok(Self {
            config,
            history,
            reduce_pipeline,
            reduce_range_pipeline,
            adapt_pipeline,
            reduce_layout,
            reduce_uniform_buffer,
            adapt_uniform_buffer,
            adapt_bind_groups,
        })
    }

    /// Current configuration
    pub fn config(&self) -> &ExposureConfig {
        &self.config
    }

    /// Owned measurement and state images
    pub fn history(&self) -> &ExposureHistory {
        &self.history
    }

    /// Replace the tunables and re-upload the measurement uniforms.
    ///
    /// A changed `initial_luminance` takes effect on the next `reset`.
    pub fn update_config(&mut self, queue: &Queue, config: ExposureConfig) -> ExposureResult<()> {
        config.validate()?;
        queue.write_buffer(
            &self.reduce_uniform_buffer,
            0,
            bytemuck::bytes_of(&ReduceUniforms::from_config(&config)),
        );
        self.history.set_initial_luminance(config.initial_luminance);
        self.config = config;
        Ok(())
    }

    /// Upload the frame's delta time (seconds since the previous step).
    ///
    /// A delta of zero leaves the adapted state untouched; negative
    /// deltas are undefined and must be clamped by the caller.
    pub fn update_delta_time(&self, queue: &Queue, delta_time: f32) {
        queue.write_buffer(
            &self.adapt_uniform_buffer,
            0,
            bytemuck::bytes_of(&AdaptUniforms::from_config(&self.config, delta_time)),
        );
    }

    /// Record the reduce and adapt passes for this frame.
    ///
    /// `source` is the HDR image whose top-left 16x16 tile is measured.
    /// The passes execute in submission order, so the adaptor sees this
    /// frame's measurement.
    pub fn record(&self, device: &Device, encoder: &mut CommandEncoder, source: &TextureView) {
        let reduce_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("exposure_reduce_bind_group"),
            layout: &self.reduce_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(source),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::TextureView(self.history.current_view()),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: self.reduce_uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let reduce_pipeline = if self.config.track_range {
            &self.reduce_range_pipeline
        } else {
            &self.reduce_pipeline
        };

        {
            let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
                label: Some("exposure_reduce_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(reduce_pipeline);
            pass.set_bind_group(0, &reduce_bind_group, &[]);
            pass.dispatch_workgroups(1, 1, 1);
        }

        {
            let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
                label: Some("exposure_adapt_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.adapt_pipeline);
            pass.set_bind_group(0, &self.adapt_bind_groups[self.history.write_index()], &[]);
            pass.dispatch_workgroups(1, 1, 1);
        }
    }

    /// Upload the delta time and record both passes in one call
    pub fn measure(
        &self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        source: &TextureView,
        delta_time: f32,
    ) {
        self.update_delta_time(queue, delta_time);
        self.record(device, encoder, source);
    }

    /// Exchange the state roles after the frame's passes have been
    /// submitted. Never called implicitly.
    pub fn swap(&mut self) {
        self.history.swap();
    }

    /// Re-seed the state images to the configured initial luminance
    pub fn reset(&mut self, queue: &Queue) {
        self.history.reset(queue);
    }

    /// View of the freshly adapted state for downstream tone mapping
    pub fn adapted_view(&self) -> &TextureView {
        self.history.adapted_view()
    }

    /// Blocking readback of the freshly adapted state
    pub fn read_adapted(&self, device: &Device, queue: &Queue) -> ExposureResult<ExposureSample> {
        crate::readback::read_exposure_sample(device, queue, self.history.adapted_texture())
    }

    /// Blocking readback of the frame's raw measurement
    pub fn read_current(&self, device: &Device, queue: &Queue) -> ExposureResult<ExposureSample> {
        crate::readback::read_exposure_sample(device, queue, self.history.current_texture())
    }
}

fn create_adapt_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    current: &TextureView,
    previous: &TextureView,
    target: &TextureView,
    uniforms: &Buffer,
    label: &str,
) -> BindGroup {
    device.create_bind_group(&BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(current),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::TextureView(previous),
            },
            BindGroupEntry {
                binding: 2,
                resource: BindingResource::TextureView(target),
            },
            BindGroupEntry {
                binding: 3,
                resource: uniforms.as_entire_binding(),
            },
        ],
    })
}
