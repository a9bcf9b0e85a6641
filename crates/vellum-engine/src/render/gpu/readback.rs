use std::sync::mpsc;

use anyhow::{Context, Result, anyhow};

use crate::bitmap::Bitmap;
use crate::coords::Size;

/// Rows in the staging buffer are padded to the copy alignment.
fn padded_row_bytes(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Copies `texture` into a mappable buffer and blocks until the bytes are on the CPU.
///
/// Callers must submit pending work that writes `texture` first.
pub(super) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    size: Size,
) -> Result<Bitmap> {
    let row = padded_row_bytes(size.width);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("vellum readback"),
        size: u64::from(row) * u64::from(size.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("vellum readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(row),
                rows_per_image: Some(size.height),
            },
        },
        wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let (sender, receiver) = mpsc::channel();
    buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    loop {
        device.poll(wgpu::PollType::Poll).context("device poll failed during readback")?;
        match receiver.try_recv() {
            Ok(result) => {
                result.context("failed to map readback buffer")?;
                break;
            }
            Err(mpsc::TryRecvError::Empty) => std::thread::yield_now(),
            Err(mpsc::TryRecvError::Disconnected) => {
                return Err(anyhow!("readback callback dropped"));
            }
        }
    }

    let tight = (size.width * 4) as usize;
    let mut data = Vec::with_capacity(tight * size.height as usize);
    {
        let mapped = buffer.slice(..).get_mapped_range();
        for line in mapped.chunks_exact(row as usize) {
            data.extend_from_slice(&line[..tight]);
        }
    }
    buffer.unmap();

    Bitmap::from_rgba8(size, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_row_bytes(1), 256);
        assert_eq!(padded_row_bytes(64), 256);
        assert_eq!(padded_row_bytes(65), 512);
        assert_eq!(padded_row_bytes(640), 2560);
    }
}
