//! Paper background plus thresholded particle surfaces onto the final target

use crate::error::RenderError;
use crate::material::{BlendFunction, MaterialBinding, MaterialDescriptors};
use crate::surface::{self, RenderSurface};
use crate::texture::{self, GpuTexture, PAPER_TEXTURE_SIZE};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ScreenUniforms {
    uv_scale: [f32; 2],
    alpha_threshold: f32,
    _pad: f32,
}

pub fn paper_binding() -> MaterialBinding {
    MaterialBinding::new("paper", BlendFunction::REPLACE).with_texture("diffuse")
}

pub fn threshold_binding(name: &'static str) -> MaterialBinding {
    MaterialBinding::new(name, BlendFunction::STRAIGHT_ALPHA).with_texture("surface")
}

/// Texture repeat count that keeps paper texels one screen pixel each
pub fn paper_uv_scale(target_width: u32, target_height: u32, paper: &GpuTexture) -> [f32; 2] {
    [
        target_width as f32 / paper.width.max(1) as f32,
        target_height as f32 / paper.height.max(1) as f32,
    ]
}

struct ScreenLayer {
    uniforms: wgpu::BindGroup,
    texture: wgpu::BindGroup,
    buffer: wgpu::Buffer,
}

pub struct Compositor {
    paper_pipeline: wgpu::RenderPipeline,
    threshold_pipeline: wgpu::RenderPipeline,
    paper: ScreenLayer,
    paper_texture: GpuTexture,
    water: ScreenLayer,
    other: ScreenLayer,
}

impl Compositor {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
        descriptors: &MaterialDescriptors,
        water_surface: &RenderSurface,
        other_surface: &RenderSurface,
    ) -> Result<Self, RenderError> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });
        let uniform_layout = surface::uniform_layout(device, "Screen Uniform Layout");
        let texture_layout = surface::texture_layout(device, "Screen Texture Layout");
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let create_pipeline = |binding: &MaterialBinding, fs_entry: &str| {
            binding.with_vertex_layouts(|buffers| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(binding.name),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_fullscreen"),
                        buffers,
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some(fs_entry),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: target_format,
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
            })
        };
        let paper_pipeline = create_pipeline(&paper_binding(), "fs_paper")?;
        // Both surfaces share one pipeline; only the threshold differs
        let threshold_pipeline = create_pipeline(&threshold_binding("particle to screen"), "fs_threshold")?;

        let paper_texture = GpuTexture::load_or_fallback(
            device,
            queue,
            descriptors.paper.diffuse_texture.as_deref(),
            || texture::paper_image(PAPER_TEXTURE_SIZE),
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::AddressMode::Repeat,
            "Paper Texture",
        );
        let surface_sampler = surface::surface_sampler(device);

        let layer = |label: &str, view: &wgpu::TextureView, sampler: &wgpu::Sampler, threshold: f32| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&ScreenUniforms {
                    uv_scale: [1.0, 1.0],
                    alpha_threshold: threshold,
                    _pad: 0.0,
                }),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            ScreenLayer {
                uniforms: surface::uniform_bind_group(device, &uniform_layout, &buffer, label),
                texture: surface::texture_bind_group(device, &texture_layout, view, sampler, label),
                buffer,
            }
        };
        let paper = layer("Paper Layer", &paper_texture.view, &paper_texture.sampler, 0.0);
        let water = layer(
            "Water Layer",
            &water_surface.view,
            &surface_sampler,
            descriptors.water_to_screen.alpha_threshold,
        );
        let other = layer(
            "Other Layer",
            &other_surface.view,
            &surface_sampler,
            descriptors.other_to_screen.alpha_threshold,
        );

        Ok(Self {
            paper_pipeline,
            threshold_pipeline,
            paper,
            paper_texture,
            water,
            other,
        })
    }

    /// Clear `target` to white, lay down the paper, then the water and other
    /// surfaces
    pub fn render(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        target_size: (u32, u32),
    ) {
        let uniforms = ScreenUniforms {
            uv_scale: paper_uv_scale(target_size.0, target_size.1, &self.paper_texture),
            alpha_threshold: 0.0,
            _pad: 0.0,
        };
        queue.write_buffer(&self.paper.buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.paper_pipeline);
        pass.set_bind_group(0, &self.paper.uniforms, &[]);
        pass.set_bind_group(1, &self.paper.texture, &[]);
        pass.draw(0..3, 0..1);

        pass.set_pipeline(&self.threshold_pipeline);
        for layer in [&self.water, &self.other] {
            pass.set_bind_group(0, &layer.uniforms, &[]);
            pass.set_bind_group(1, &layer.texture, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<ScreenUniforms>(), 16);
    }

    #[test]
    fn test_threshold_layers_blend_straight_alpha() {
        let binding = threshold_binding("water to screen");
        let state = binding.blend.blend_state().unwrap();
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert!(paper_binding().blend.blend_state().is_none());
    }
}
