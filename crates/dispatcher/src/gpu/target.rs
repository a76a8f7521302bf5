use anyhow::{anyhow, Context, Result};
use image::RgbaImage;

pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const BYTES_PER_PIXEL: u32 = 4;

/// Square storage texture the kernels write into.
pub(crate) struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub resolution: u32,
}

impl RenderTarget {
    pub fn new(device: &wgpu::Device, resolution: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("render target"),
            size: extent(resolution),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            resolution,
        }
    }

    /// Copies the texture back to host memory. This is the only place the host
    /// waits on the GPU.
    pub fn read(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<RgbaImage> {
        let unpadded_row = self.resolution * BYTES_PER_PIXEL;
        let padded_row = padded_bytes_per_row(unpadded_row);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("render target readback"),
            size: u64::from(padded_row) * u64::from(self.resolution),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render target readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(self.resolution),
                },
            },
            extent(self.resolution),
        );
        queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .context("failed to wait for render target readback")?;
        rx.recv()
            .context("readback callback dropped")?
            .map_err(|err| anyhow!("failed to map readback buffer: {err}"))?;

        let pixels = {
            let mapped = slice.get_mapped_range();
            strip_row_padding(&mapped, unpadded_row as usize, padded_row as usize)
        };
        staging.unmap();

        RgbaImage::from_raw(self.resolution, self.resolution, pixels)
            .ok_or_else(|| anyhow!("readback size does not match render target"))
    }
}

fn extent(resolution: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: resolution,
        height: resolution,
        depth_or_array_layers: 1,
    }
}

fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

fn strip_row_padding(data: &[u8], unpadded: usize, padded: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(data.len() / padded.max(1) * unpadded);
    for row in data.chunks(padded) {
        pixels.extend_from_slice(&row[..unpadded.min(row.len())]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pad_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(256 * 4), 1024);
        assert_eq!(padded_bytes_per_row(100 * 4), 512);
        assert_eq!(padded_bytes_per_row(4), 256);
    }

    #[test]
    fn padding_is_stripped_per_row() {
        let mut data = vec![0u8; 2 * 256];
        data[0..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        let pixels = strip_row_padding(&data, 8, 256);
        assert_eq!(pixels, (1..=16).collect::<Vec<u8>>());
    }
}
