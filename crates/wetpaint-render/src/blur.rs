//! Separable Gaussian blur of a particle surface
//!
//! The horizontal pass downsamples the surface into the blur intermediate;
//! the vertical pass writes the result back into the surface.

use crate::error::RenderError;
use crate::material::{BlendFunction, MaterialBinding};
use crate::surface::{self, RenderSurface, SURFACE_FORMAT};
use glam::Vec2;
use wgpu::util::DeviceExt;

pub const BLUR_SIGMA: f32 = 2.3;

/// Center, first and second tap weights of a 5-tap kernel, normalized so
/// `w0 + 2 * w1 + 2 * w2 == 1`
pub fn gaussian_weights(sigma: f32) -> [f32; 3] {
    let g = |x: f32| (-(x * x) / (2.0 * sigma * sigma)).exp();
    let raw = [g(0.0), g(1.0), g(2.0)];
    let total = raw[0] + 2.0 * (raw[1] + raw[2]);
    [raw[0] / total, raw[1] / total, raw[2] / total]
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurUniforms {
    texel_step: [f32; 2],
    _pad: [f32; 2],
    weights: [f32; 4],
}

impl BlurUniforms {
    fn new(texel_step: Vec2, weights: [f32; 3]) -> Self {
        Self {
            texel_step: texel_step.to_array(),
            _pad: [0.0; 2],
            weights: [weights[0], weights[1], weights[2], 0.0],
        }
    }
}

pub fn blur_binding() -> MaterialBinding {
    MaterialBinding::new("blur", BlendFunction::REPLACE).with_texture("source")
}

/// Blur pipelines plus the bind groups for each surface they read
pub struct BlurPass {
    pipeline: wgpu::RenderPipeline,
    horizontal_uniforms: wgpu::BindGroup,
    vertical_uniforms: wgpu::BindGroup,
    _uniform_buffers: [wgpu::Buffer; 2],
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    intermediate: RenderSurface,
    intermediate_bind_group: wgpu::BindGroup,
}

impl BlurPass {
    pub fn new(device: &wgpu::Device) -> Result<Self, RenderError> {
        let binding = blur_binding();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blur.wgsl").into()),
        });
        let uniform_layout = surface::uniform_layout(device, "Blur Uniform Layout");
        let texture_layout = surface::texture_layout(device, "Blur Texture Layout");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blur Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let pipeline = binding.with_vertex_layouts(|buffers| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Blur Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_blur"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: SURFACE_FORMAT,
                        blend: binding.blend.blend_state(),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        let intermediate = RenderSurface::blur(device, "Blur Intermediate");
        let texel = 1.0 / intermediate.width as f32;
        let weights = gaussian_weights(BLUR_SIGMA);
        let uniform_buffer = |label: &str, uniforms: BlurUniforms| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            })
        };
        let horizontal = uniform_buffer(
            "Blur Horizontal Uniforms",
            BlurUniforms::new(Vec2::new(texel, 0.0), weights),
        );
        let vertical = uniform_buffer(
            "Blur Vertical Uniforms",
            BlurUniforms::new(Vec2::new(0.0, texel), weights),
        );
        let horizontal_uniforms =
            surface::uniform_bind_group(device, &uniform_layout, &horizontal, "Blur Horizontal");
        let vertical_uniforms =
            surface::uniform_bind_group(device, &uniform_layout, &vertical, "Blur Vertical");

        let sampler = surface::surface_sampler(device);
        let intermediate_bind_group = surface::texture_bind_group(
            device,
            &texture_layout,
            &intermediate.view,
            &sampler,
            "Blur Intermediate Bind Group",
        );

        Ok(Self {
            pipeline,
            horizontal_uniforms,
            vertical_uniforms,
            _uniform_buffers: [horizontal, vertical],
            texture_layout,
            sampler,
            intermediate,
            intermediate_bind_group,
        })
    }

    /// Bind group that samples `surface` as the horizontal pass source
    pub fn source_bind_group(&self, device: &wgpu::Device, surface: &RenderSurface) -> wgpu::BindGroup {
        surface::texture_bind_group(
            device,
            &self.texture_layout,
            &surface.view,
            &self.sampler,
            "Blur Source Bind Group",
        )
    }

    /// Blur `target` in place. `source` must sample `target`.
    pub fn apply(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &RenderSurface,
        source: &wgpu::BindGroup,
    ) {
        {
            let mut pass = self
                .intermediate
                .begin_clear_pass(encoder, "Blur Horizontal Pass");
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.horizontal_uniforms, &[]);
            pass.set_bind_group(1, source, &[]);
            pass.draw(0..3, 0..1);
        }
        {
            let mut pass = target.begin_clear_pass(encoder, "Blur Vertical Pass");
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.vertical_uniforms, &[]);
            pass.set_bind_group(1, &self.intermediate_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_normalized() {
        let [w0, w1, w2] = gaussian_weights(BLUR_SIGMA);
        assert!((w0 + 2.0 * w1 + 2.0 * w2 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weights_fall_off_from_center() {
        let [w0, w1, w2] = gaussian_weights(BLUR_SIGMA);
        assert!(w0 > w1 && w1 > w2 && w2 > 0.0);
        // Wide sigma keeps the outer taps significant
        assert!(w2 / w0 > 0.6);
    }

    #[test]
    fn test_narrow_sigma_concentrates_weight() {
        let [w0, _, w2] = gaussian_weights(0.5);
        assert!(w0 > 0.7);
        assert!(w2 < 1e-3);
    }

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<BlurUniforms>(), 32);
        let uniforms = BlurUniforms::new(Vec2::new(0.5, 0.0), [0.4, 0.2, 0.1]);
        assert_eq!(uniforms.weights[3], 0.0);
    }
}
