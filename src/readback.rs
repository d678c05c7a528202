// src/readback.rs
// Blocking readback of the 1x1 exposure images
// RELEVANT FILES: src/history.rs, src/pipeline.rs

use wgpu::{
    BufferDescriptor, BufferUsages, Device, Extent3d, ImageCopyTexture, ImageDataLayout, Origin3d,
    Queue, Texture, TextureAspect,
};

use crate::error::{ExposureError, ExposureResult};
use crate::history::STATE_FORMAT;
use crate::luminance::ExposureSample;

/// Read one 1x1 Rgba16Float exposure image back to the CPU.
///
/// Blocks on the device until the copy and the buffer mapping complete.
/// Meant for tests and debugging, not the per-frame path.
pub fn read_exposure_sample(
    device: &Device,
    queue: &Queue,
    texture: &Texture,
) -> ExposureResult<ExposureSample> {
    if texture.format() != STATE_FORMAT {
        return Err(ExposureError::readback(format!(
            "expected {:?} exposure image, got {:?}",
            STATE_FORMAT,
            texture.format()
        )));
    }

    let unpadded_bytes_per_row = 8u32; // 4 channels * 2 bytes
    let padded_bytes_per_row = {
        let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        ((unpadded_bytes_per_row + alignment - 1) / alignment) * alignment
    };

    let staging_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("exposure_staging_buffer"),
        size: padded_bytes_per_row as u64,
        usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("exposure_readback_encoder"),
    });

    encoder.copy_texture_to_buffer(
        ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging_buffer,
            layout: ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(1),
            },
        },
        Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );

    queue.submit(Some(encoder.finish()));
    device.poll(wgpu::Maintain::Wait);

    let buffer_slice = staging_buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    receiver
        .recv()
        .map_err(|_| ExposureError::readback("map_async callback never ran"))?
        .map_err(|e| ExposureError::readback(format!("buffer mapping failed: {:?}", e)))?;

    let data = buffer_slice.get_mapped_range();
    let sample = decode_texel(&data[0..8]);
    drop(data);
    staging_buffer.unmap();

    log::debug!(
        "exposure readback: avg {} max {} min {}",
        sample.average,
        sample.maximum,
        sample.minimum
    );

    Ok(sample)
}

/// Decode the four f16 channels of one state texel
fn decode_texel(bytes: &[u8]) -> ExposureSample {
    let channel = |i: usize| half::f16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]).to_f32();
    ExposureSample {
        average: channel(0),
        maximum: channel(1),
        minimum: channel(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::seed_texel;

    #[test]
    fn decode_reads_the_first_three_channels() {
        let mut bytes = Vec::new();
        for value in [0.5f32, 2.0, 0.25, 0.5] {
            bytes.extend_from_slice(&half::f16::from_f32(value).to_le_bytes());
        }
        let sample = decode_texel(&bytes);
        assert_eq!(sample.average, 0.5);
        assert_eq!(sample.maximum, 2.0);
        assert_eq!(sample.minimum, 0.25);
    }

    #[test]
    fn decode_inverts_the_seed_encoding() {
        let texel = seed_texel(0.125);
        let sample = decode_texel(&texel);
        assert_eq!(sample.average, 0.125);
        assert_eq!(sample.maximum, 0.125);
        assert_eq!(sample.minimum, 0.125);
    }
}
