//! wetpaint Render - wgpu fluid rendering
//!
//! Each frame the live particle buffers are copied into a `ParticleSnapshot`,
//! drawn as sprites into two offscreen surfaces (water and everything else),
//! blurred, and composited over a paper texture with an alpha threshold that
//! turns the blurred sprites into solid shapes.

mod blur;
mod compositor;
mod context;
mod error;
mod gpu;
mod material;
mod offscreen;
mod particle_pass;
mod renderer;
mod snapshot;
mod surface;
mod texture;

pub use blur::{gaussian_weights, BlurPass, BLUR_SIGMA};
pub use compositor::{paper_uv_scale, Compositor};
pub use context::{preferred_format, FrameAcquire, RenderContext};
pub use error::RenderError;
pub use material::{
    BlendFunction, ComponentType, MaterialBinding, MaterialDescriptors, PaperMaterialDesc,
    ScreenMaterialDesc, SpriteMaterialDesc, VertexAttributeBinding,
};
pub use offscreen::{OffscreenCanvas, OFFSCREEN_FORMAT};
pub use particle_pass::{point_size_pixels, sprite_half_extent, world_to_clip, ParticlePasses};
pub use renderer::FluidRenderer;
pub use snapshot::ParticleSnapshot;
pub use surface::{RenderSurface, BLUR_SURFACE_SIZE, PARTICLE_SURFACE_SIZE, SURFACE_FORMAT};
pub use texture::{paper_image, sprite_image, GpuTexture};
