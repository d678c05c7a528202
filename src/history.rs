//! Double-buffered adaptation state
//!
//! Owns the three 1x1 Rgba16Float images of the exposure pipeline: the
//! current-measurement buffer the reducer overwrites every frame, and the
//! two adaptation state slots in a ping-pong arrangement. Within a frame
//! the adaptor reads one slot and writes the other; the orchestrator calls
//! `swap` once per frame to exchange the roles. The swap is never implied
//! by recording a frame.

use half::f16;
use wgpu::{
    Device, Extent3d, ImageCopyTexture, ImageDataLayout, Origin3d, Queue, Texture,
    TextureAspect, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
    TextureView, TextureViewDescriptor,
};

/// Texel format shared by all exposure images.
pub const STATE_FORMAT: TextureFormat = TextureFormat::Rgba16Float;

/// One 1x1 luminance target with its default view.
struct LuminanceTarget {
    texture: Texture,
    view: TextureView,
}

impl LuminanceTarget {
    fn new(device: &Device, label: &str) -> Self {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(label),
            size: Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: STATE_FORMAT,
            usage: TextureUsages::TEXTURE_BINDING
                | TextureUsages::STORAGE_BINDING
                | TextureUsages::COPY_DST
                | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn seed(&self, queue: &Queue, value: f32) {
        let texel = seed_texel(value);
        queue.write_texture(
            ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            &texel,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(texel.len() as u32),
                rows_per_image: Some(1),
            },
            Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Encode one Rgba16Float texel with all four channels set to `value`
pub(crate) fn seed_texel(value: f32) -> [u8; 8] {
    let bytes = f16::from_f32(value).to_le_bytes();
    let mut texel = [0u8; 8];
    for channel in texel.chunks_exact_mut(2) {
        channel.copy_from_slice(&bytes);
    }
    texel
}

/// The current-measurement buffer plus the double-buffered adapted state
pub struct ExposureHistory {
    current: LuminanceTarget,
    states: [LuminanceTarget; 2],
    read_index: usize,
    write_index: usize,
    frame_count: u64,
    initial_luminance: f32,
}

impl ExposureHistory {
    /// Create the three images and seed them with `initial_luminance`.
    ///
    /// Seeding with a middle luminance instead of zero keeps the first
    /// frames from adapting up from black.
    pub fn new(device: &Device, queue: &Queue, initial_luminance: f32) -> Self {
        let history = Self {
            current: LuminanceTarget::new(device, "exposure_current_texture"),
            states: [
                LuminanceTarget::new(device, "exposure_state_texture_0"),
                LuminanceTarget::new(device, "exposure_state_texture_1"),
            ],
            read_index: 0,
            write_index: 1,
            frame_count: 0,
            initial_luminance,
        };
        history.seed_all(queue);
        history
    }

    fn seed_all(&self, queue: &Queue) {
        self.current.seed(queue, self.initial_luminance);
        for state in &self.states {
            state.seed(queue, self.initial_luminance);
        }
    }

    /// Re-seed all images and restart the ping-pong without reallocating
    pub fn reset(&mut self, queue: &Queue) {
        self.read_index = 0;
        self.write_index = 1;
        self.frame_count = 0;
        self.seed_all(queue);
        log::debug!(
            "exposure history reset to initial luminance {}",
            self.initial_luminance
        );
    }

    /// Exchange the state roles for the next frame (ping-pong)
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.read_index, &mut self.write_index);
        self.frame_count += 1;
    }

    /// Frames recorded since creation or the last reset
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Measurement buffer view (reduce output, adapt input)
    pub fn current_view(&self) -> &TextureView {
        &self.current.view
    }

    /// Measurement buffer texture, for readback
    pub fn current_texture(&self) -> &Texture {
        &self.current.texture
    }

    /// State the adaptor reads this frame
    pub fn previous_view(&self) -> &TextureView {
        &self.states[self.read_index].view
    }

    /// State the adaptor writes this frame. Downstream tone mapping
    /// samples this view after the frame's passes have run.
    pub fn adapted_view(&self) -> &TextureView {
        &self.states[self.write_index].view
    }

    /// Freshly adapted state texture, for readback
    pub fn adapted_texture(&self) -> &Texture {
        &self.states[self.write_index].texture
    }

    /// Index of the state slot the adaptor writes this frame
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// View of a state slot by fixed index, for prebuilt bind groups
    pub(crate) fn state_view(&self, index: usize) -> &TextureView {
        &self.states[index].view
    }

    pub(crate) fn set_initial_luminance(&mut self, value: f32) {
        self.initial_luminance = value;
    }
}
