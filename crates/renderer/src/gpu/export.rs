use std::path::Path;
use std::sync::mpsc;

use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Rgba};

use crate::adapter::SurfaceSize;

use super::context::GpuContext;

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch rounded up to wgpu's copy alignment.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Copies the offscreen target into tightly packed RGBA8 rows.
pub(crate) fn read_target(context: &GpuContext) -> Result<Vec<u8>> {
    let size = context.target.size;
    let padded = padded_bytes_per_row(size.width);
    let buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("frame readback"),
        size: u64::from(padded) * u64::from(size.height),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = context
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame readback encoder"),
        });
    encoder.copy_texture_to_buffer(
        context.target.texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(size.height),
            },
        },
        wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
    );
    context.queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    context
        .device
        .poll(wgpu::PollType::Wait)
        .context("failed to wait for frame readback")?;
    receiver
        .recv()
        .map_err(|err| anyhow!("readback channel closed: {err}"))?
        .context("failed to map readback buffer")?;

    let pixels = {
        let mapped = slice.get_mapped_range();
        unpad_rows(&mapped, size, padded)
    };
    buffer.unmap();
    Ok(pixels)
}

fn unpad_rows(data: &[u8], size: SurfaceSize, padded: u32) -> Vec<u8> {
    let row_len = (size.width * BYTES_PER_PIXEL) as usize;
    let mut pixels = Vec::with_capacity(row_len * size.height as usize);
    for row in data.chunks(padded as usize).take(size.height as usize) {
        pixels.extend_from_slice(&row[..row_len]);
    }
    pixels
}

pub(crate) fn save_png(path: &Path, size: SurfaceSize, pixels: Vec<u8>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let image: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_raw(size.width, size.height, pixels)
        .ok_or_else(|| anyhow!("frame buffer does not match {size}"))?;
    image
        .save(path)
        .with_context(|| format!("failed to write PNG to {}", path.display()))
}
