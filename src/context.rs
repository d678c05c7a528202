//! GPU device acquisition for headless use
//!
//! The exposure pipeline itself borrows whatever device the renderer
//! already owns. This context exists for tools and tests that have no
//! renderer: it requests an adapter and device with default limits,
//! which comfortably cover the 1x1 targets and single-workgroup
//! dispatches used here.

use crate::error::{ExposureError, ExposureResult};

/// A self-contained wgpu device and queue
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Check whether any GPU adapter is available without creating a device
    pub fn is_available() -> bool {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        pollster::block_on(async {
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Create a context, blocking on adapter and device acquisition
    pub fn new() -> ExposureResult<Self> {
        pollster::block_on(Self::new_async())
    }

    /// Async version of context creation
    pub async fn new_async() -> ExposureResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| ExposureError::device("no suitable GPU adapter found"))?;

        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("auto_exposure_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await
            .map_err(|e| ExposureError::device(format!("device request failed: {}", e)))?;

        log::info!(
            "auto-exposure device: {} ({:?}, {:?})",
            adapter_info.name,
            adapter_info.device_type,
            adapter_info.backend
        );

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }

    /// Adapter details for the created device
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }
}
