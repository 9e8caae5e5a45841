//! GPU textures loaded from disk, with procedural fallbacks

use crate::error::RenderError;
use image::{Rgba, RgbaImage};
use std::path::Path;
use wgpu::util::DeviceExt;

pub const PAPER_TEXTURE_SIZE: u32 = 256;
pub const SPRITE_TEXTURE_SIZE: u32 = 64;

/// A GPU-resident texture with its view and sampler
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl GpuTexture {
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        format: wgpu::TextureFormat,
        address_mode: wgpu::AddressMode,
        label: &str,
    ) -> Self {
        let (width, height) = image.dimensions();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.as_raw(),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Load an image file from disk
    pub fn load_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        format: wgpu::TextureFormat,
        address_mode: wgpu::AddressMode,
        label: &str,
    ) -> Result<Self, RenderError> {
        let img = image::open(path).map_err(|e| {
            RenderError::Texture(format!("'{}': {}", path.display(), e))
        })?;
        Ok(Self::from_image(
            device,
            queue,
            &img.to_rgba8(),
            format,
            address_mode,
            label,
        ))
    }

    /// Load `path` when given, otherwise or on failure upload `fallback()`
    pub fn load_or_fallback(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: Option<&Path>,
        fallback: impl FnOnce() -> RgbaImage,
        format: wgpu::TextureFormat,
        address_mode: wgpu::AddressMode,
        label: &str,
    ) -> Self {
        if let Some(path) = path {
            match Self::load_file(device, queue, path, format, address_mode, label) {
                Ok(texture) => return texture,
                Err(e) => log::warn!("{}: {}. Using procedural texture", label, e),
            }
        }
        Self::from_image(device, queue, &fallback(), format, address_mode, label)
    }
}

fn hash(x: u32, y: u32) -> u32 {
    let mut h = x.wrapping_mul(0x8da6_b343) ^ y.wrapping_mul(0xd816_3841);
    h ^= h >> 13;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^ (h >> 16)
}

/// Off-white paper with a faint, tileable grain
pub fn paper_image(size: u32) -> RgbaImage {
    let size = size.max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        // Low-frequency fibers plus per-texel speckle
        let fiber = (hash(x / 4, y / 4) & 0x7) as u8;
        let speckle = (hash(x, y) & 0x3) as u8;
        let shade = 245 - fiber - speckle;
        Rgba([shade, shade, shade.saturating_sub(6), 255])
    })
}

/// White disc whose alpha falls off smoothly toward the rim
pub fn sprite_image(size: u32) -> RgbaImage {
    let size = size.max(1);
    let half = size as f32 / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = (x as f32 + 0.5 - half) / half;
        let dy = (y as f32 + 0.5 - half) / half;
        let falloff = (1.0 - (dx * dx + dy * dy)).clamp(0.0, 1.0);
        Rgba([255, 255, 255, (falloff * falloff * 255.0).round() as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_is_opaque_and_light() {
        let paper = paper_image(PAPER_TEXTURE_SIZE);
        assert_eq!(paper.dimensions(), (256, 256));
        for pixel in paper.pixels() {
            assert_eq!(pixel[3], 255);
            assert!(pixel[0] >= 230);
        }
        // Deterministic across calls
        assert_eq!(paper, paper_image(PAPER_TEXTURE_SIZE));
    }

    #[test]
    fn test_sprite_is_a_soft_disc() {
        let sprite = sprite_image(SPRITE_TEXTURE_SIZE);
        let center = sprite.get_pixel(32, 32)[3];
        let edge = sprite.get_pixel(0, 32)[3];
        let corner = sprite.get_pixel(0, 0)[3];
        assert!(center > 250);
        assert!(edge < 10);
        assert_eq!(corner, 0);
    }
}
