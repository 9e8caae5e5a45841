//! The window surface the compositor presents to

use crate::error::RenderError;
use crate::gpu;
use std::sync::Arc;
use wetpaint_runtime::Viewport;
use winit::window::Window;

/// Result of asking the surface for the next frame
pub enum FrameAcquire {
    Ready(wgpu::SurfaceTexture),
    /// Nothing to draw into this time; try again next frame
    Skip,
    /// The surface is gone and every GPU resource built for it must be rebuilt
    Lost,
}

/// sRGB when the surface offers it, so the paper and ink colors are stored
/// as authored
pub fn preferred_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first().copied())
}

/// Window surface plus the device and queue every renderer resource lives on
pub struct RenderContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl RenderContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = gpu::instance();
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::SurfaceCreation(e.to_string()))?;
        let (adapter, device, queue) =
            gpu::open_device(&instance, Some(&surface), "wetpaint Device").await?;

        let caps = surface.get_capabilities(&adapter);
        let format = preferred_format(&caps.formats)
            .ok_or_else(|| RenderError::SurfaceCreation("surface reports no formats".into()))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("Presenting {}x{} as {:?}", config.width, config.height, format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// World mapping for the current surface size
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    /// Returns false when the size is degenerate and nothing changed
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// Next frame to draw into. A stale surface is reconfigured on the spot.
    pub fn acquire_frame(&mut self) -> FrameAcquire {
        match self.surface.get_current_texture() {
            Ok(frame) => FrameAcquire::Ready(frame),
            Err(wgpu::SurfaceError::Lost) => FrameAcquire::Lost,
            Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                FrameAcquire::Skip
            }
            Err(e) => {
                log::debug!("Skipping frame: {:?}", e);
                FrameAcquire::Skip
            }
        }
    }

    /// Configure the surface again after it was lost
    pub fn recover(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn test_prefers_srgb() {
        let formats = [TextureFormat::Bgra8Unorm, TextureFormat::Bgra8UnormSrgb];
        assert_eq!(preferred_format(&formats), Some(TextureFormat::Bgra8UnormSrgb));
    }

    #[test]
    fn test_falls_back_to_first_format() {
        let formats = [TextureFormat::Rgba16Float, TextureFormat::Bgra8Unorm];
        assert_eq!(preferred_format(&formats), Some(TextureFormat::Rgba16Float));
        assert_eq!(preferred_format(&[]), None);
    }
}
