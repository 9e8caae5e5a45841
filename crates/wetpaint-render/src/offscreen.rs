//! An offscreen canvas: the same frame the window would show, read back as
//! an image

use crate::error::RenderError;
use crate::gpu;
use crate::material::MaterialDescriptors;
use crate::renderer::FluidRenderer;
use image::RgbaImage;
use wetpaint_core::GroupFlags;
use wetpaint_runtime::Viewport;

pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Bytes per row of a `width` pixel RGBA8 copy, padded to wgpu's alignment
pub fn padded_row_bytes(width: u32) -> u32 {
    wgpu::util::align_to(width * 4, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
}

/// Strip the row padding of a texture copy
pub fn unpad_rows(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let row = (width * 4) as usize;
    data.chunks(padded_row_bytes(width) as usize)
        .take(height as usize)
        .flat_map(|padded| &padded[..row])
        .copied()
        .collect()
}

/// A window-sized canvas target without a window
pub struct OffscreenCanvas {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    target: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    width: u32,
    height: u32,
}

impl OffscreenCanvas {
    pub async fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let (width, height) = (width.max(1), height.max(1));
        let (_, device, queue) =
            gpu::open_device(&gpu::instance(), None, "wetpaint Offscreen Device").await?;

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Canvas"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Offscreen Readback"),
            size: padded_row_bytes(width) as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Ok(Self {
            device,
            queue,
            target,
            view,
            readback,
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// A renderer built for this canvas' device and format
    pub fn renderer(
        &self,
        descriptors: &MaterialDescriptors,
        fluid_flags: GroupFlags,
    ) -> Result<FluidRenderer, RenderError> {
        FluidRenderer::new(
            &self.device,
            &self.queue,
            OFFSCREEN_FORMAT,
            descriptors,
            fluid_flags,
        )
    }

    /// Copy the last composited frame back to the CPU
    pub fn read_image(&self) -> Result<RgbaImage, RenderError> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            self.target.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &self.readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes(self.width)),
                    rows_per_image: Some(self.height),
                },
            },
            self.target.size(),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = self.readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result).ok();
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?;

        let pixels = unpad_rows(&slice.get_mapped_range(), self.width, self.height);
        self.readback.unmap();

        RgbaImage::from_raw(self.width, self.height, pixels).ok_or_else(|| {
            RenderError::BufferReadFailed("readback smaller than the canvas".into())
        })
    }
}
