//! Particle sprites into the offscreen surfaces
//!
//! Fluid groups go to one surface and every other group to the other. Each
//! particle is an instanced quad sized like a point sprite.

use crate::error::RenderError;
use crate::material::{
    BlendFunction, ComponentType, MaterialBinding, SpriteMaterialDesc, VertexAttributeBinding,
};
use crate::snapshot::ParticleSnapshot;
use crate::surface::{self, RenderSurface, SURFACE_FORMAT};
use crate::texture::{self, GpuTexture, SPRITE_TEXTURE_SIZE};
use bytemuck::Zeroable;
use glam::{Mat4, Vec2};
use std::ops::Range;
use wetpaint_core::{MAX_PARTICLE_COUNT, PARTICLE_RADIUS};
use wetpaint_runtime::Viewport;
use wgpu::util::DeviceExt;

/// Sprite diameter in pixels of a `target_width` wide surface
pub fn point_size_pixels(
    target_width: f32,
    world_width: f32,
    particle_radius: f32,
    size_scale: f32,
) -> f32 {
    (target_width * 2.0 * particle_radius / world_width).max(1.0) * size_scale
}

/// Half size of a sprite quad in clip space.
///
/// The quad stays round in world space when the surface is square but the
/// world is not.
pub fn sprite_half_extent(point_size: f32, target_width: f32, world: Vec2) -> Vec2 {
    Vec2::new(
        point_size / target_width,
        point_size * world.x / (target_width * world.y),
    )
}

/// World rectangle `[0, w] x [0, h]` onto clip space
pub fn world_to_clip(world: Vec2) -> Mat4 {
    Mat4::orthographic_rh(0.0, world.x, 0.0, world.y, -1.0, 1.0)
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SpriteUniforms {
    world_to_clip: [[f32; 4]; 4],
    half_extent: [f32; 2],
    weight_scale: f32,
    weight_range_shift: f32,
    weight_cutoff: f32,
    _pad0: f32,
    _pad1: [f32; 2],
}

pub fn water_binding() -> MaterialBinding {
    MaterialBinding::new("water particle", BlendFunction::PREMULTIPLIED)
        .with_attribute(VertexAttributeBinding::new("position", 2, ComponentType::Float32, 8))
        .with_attribute(VertexAttributeBinding::new("color", 4, ComponentType::Unorm8, 4))
        .with_attribute(VertexAttributeBinding::new("weight", 1, ComponentType::Float32, 4))
        .with_texture("diffuse")
}

pub fn other_binding() -> MaterialBinding {
    MaterialBinding::new("other particle", BlendFunction::PREMULTIPLIED)
        .with_attribute(VertexAttributeBinding::new("position", 2, ComponentType::Float32, 8))
        .with_attribute(VertexAttributeBinding::new("color", 4, ComponentType::Unorm8, 4))
        .with_texture("diffuse")
}

/// One particle class: its pipeline, uniforms and sprite texture
struct SpriteMaterial {
    binding: MaterialBinding,
    desc: SpriteMaterialDesc,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    _texture: GpuTexture,
}

pub struct ParticlePasses {
    water: SpriteMaterial,
    other: SpriteMaterial,
    position_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    weight_buffer: wgpu::Buffer,
}

impl ParticlePasses {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        water: &SpriteMaterialDesc,
        other: &SpriteMaterialDesc,
    ) -> Result<Self, RenderError> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particle.wgsl").into()),
        });
        let uniform_layout = surface::uniform_layout(device, "Sprite Uniform Layout");
        let texture_layout = surface::texture_layout(device, "Sprite Texture Layout");

        let water = SpriteMaterial::new(
            device,
            queue,
            &shader,
            &uniform_layout,
            &texture_layout,
            water_binding(),
            water.clone(),
            ("vs_fluid", "fs_fluid"),
        )?;
        let other = SpriteMaterial::new(
            device,
            queue,
            &shader,
            &uniform_layout,
            &texture_layout,
            other_binding(),
            other.clone(),
            ("vs_other", "fs_other"),
        )?;

        let vertex_buffer = |label: &str, stride: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: stride * MAX_PARTICLE_COUNT as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Ok(Self {
            water,
            other,
            position_buffer: vertex_buffer("Particle Position Buffer", 8),
            color_buffer: vertex_buffer("Particle Color Buffer", 4),
            weight_buffer: vertex_buffer("Particle Weight Buffer", 4),
        })
    }

    /// Upload the snapshot and draw both particle classes into their surfaces
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        snapshot: &ParticleSnapshot,
        viewport: &Viewport,
        water_surface: &RenderSurface,
        other_surface: &RenderSurface,
    ) {
        if !snapshot.is_empty() {
            queue.write_buffer(
                &self.position_buffer,
                0,
                bytemuck::cast_slice(snapshot.positions()),
            );
            queue.write_buffer(&self.color_buffer, 0, bytemuck::cast_slice(snapshot.colors()));
            queue.write_buffer(&self.weight_buffer, 0, bytemuck::cast_slice(snapshot.weights()));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Encoder"),
        });

        self.water.write_uniforms(queue, water_surface, viewport);
        self.other.write_uniforms(queue, other_surface, viewport);

        {
            let mut pass = water_surface.begin_clear_pass(&mut encoder, "Water Particle Pass");
            self.water.draw(
                &mut pass,
                &[&self.position_buffer, &self.color_buffer, &self.weight_buffer],
                snapshot.fluid_ranges(),
            );
        }
        {
            let mut pass = other_surface.begin_clear_pass(&mut encoder, "Other Particle Pass");
            self.other.draw(
                &mut pass,
                &[&self.position_buffer, &self.color_buffer],
                snapshot.other_ranges(),
            );
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

impl SpriteMaterial {
    #[allow(clippy::too_many_arguments)]
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shader: &wgpu::ShaderModule,
        uniform_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
        binding: MaterialBinding,
        desc: SpriteMaterialDesc,
        (vs_entry, fs_entry): (&str, &str),
    ) -> Result<Self, RenderError> {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(binding.name),
            bind_group_layouts: &[uniform_layout, texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = binding.with_vertex_layouts(|buffers| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(binding.name),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some(vs_entry),
                    buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some(fs_entry),
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

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sprite Uniform Buffer"),
            contents: bytemuck::bytes_of(&SpriteUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = surface::uniform_bind_group(
            device,
            uniform_layout,
            &uniform_buffer,
            "Sprite Uniform Bind Group",
        );

        let texture = GpuTexture::load_or_fallback(
            device,
            queue,
            desc.diffuse_texture.as_deref(),
            || texture::sprite_image(SPRITE_TEXTURE_SIZE),
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::AddressMode::ClampToEdge,
            "Sprite Texture",
        );
        let texture_bind_group = surface::texture_bind_group(
            device,
            texture_layout,
            &texture.view,
            &texture.sampler,
            "Sprite Texture Bind Group",
        );

        Ok(Self {
            binding,
            desc,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group,
            _texture: texture,
        })
    }

    fn write_uniforms(&self, queue: &wgpu::Queue, target: &RenderSurface, viewport: &Viewport) {
        let world = viewport.world_size();
        let width = target.width as f32;
        let size = point_size_pixels(
            width,
            world.x,
            PARTICLE_RADIUS,
            self.desc.particle_size_scale,
        );
        let uniforms = SpriteUniforms {
            world_to_clip: world_to_clip(world).to_cols_array_2d(),
            half_extent: sprite_half_extent(size, width, world).to_array(),
            weight_scale: self.desc.weight_scale,
            weight_range_shift: self.desc.weight_range_shift,
            weight_cutoff: self.desc.weight_cutoff,
            _pad0: 0.0,
            _pad1: [0.0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, buffers: &[&wgpu::Buffer], ranges: &[Range<u32>]) {
        debug_assert_eq!(buffers.len(), self.binding.attributes.len());
        if ranges.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, &self.texture_bind_group, &[]);
        for (slot, buffer) in buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        for range in ranges {
            pass.draw(0..6, range.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_size_scales_with_surface() {
        // 256 px across a 3 unit world: 0.12 * 256 / 3 = 10.24 px
        let size = point_size_pixels(256.0, 3.0, 0.06, 1.0);
        assert!((size - 10.24).abs() < 1e-4);
        assert!((point_size_pixels(256.0, 3.0, 0.06, 2.0) - 20.48).abs() < 1e-4);
    }

    #[test]
    fn test_point_size_never_below_one_pixel() {
        assert_eq!(point_size_pixels(16.0, 100.0, 0.06, 1.0), 1.0);
        assert_eq!(point_size_pixels(16.0, 100.0, 0.06, 3.0), 3.0);
    }

    #[test]
    fn test_sprites_round_in_world_space() {
        let world = Vec2::new(6.0, 3.0);
        let extent = sprite_half_extent(8.0, 256.0, world);
        // Clip units per world unit differ by axis: 2/6 across, 2/3 up
        let world_x = extent.x * world.x / 2.0;
        let world_y = extent.y * world.y / 2.0;
        assert!((world_x - world_y).abs() < 1e-6);
    }

    #[test]
    fn test_world_corners_map_to_clip_corners() {
        let m = world_to_clip(Vec2::new(4.0, 3.0));
        let low = m.project_point3(glam::Vec3::new(0.0, 0.0, 0.0));
        let high = m.project_point3(glam::Vec3::new(4.0, 3.0, 0.0));
        assert!((low.x + 1.0).abs() < 1e-6 && (low.y + 1.0).abs() < 1e-6);
        assert!((high.x - 1.0).abs() < 1e-6 && (high.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<SpriteUniforms>(), 96);
    }

    #[test]
    fn test_bindings_match_shader_locations() {
        let water = water_binding();
        assert_eq!(water.attribute_location("position"), Some(0));
        assert_eq!(water.attribute_location("color"), Some(1));
        assert_eq!(water.attribute_location("weight"), Some(2));
        assert_eq!(other_binding().attribute_location("weight"), None);
    }
}
