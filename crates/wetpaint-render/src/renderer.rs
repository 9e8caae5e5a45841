//! The whole frame: snapshot, particle passes, blur and composite

use crate::blur::BlurPass;
use crate::compositor::Compositor;
use crate::error::RenderError;
use crate::material::MaterialDescriptors;
use crate::particle_pass::ParticlePasses;
use crate::snapshot::ParticleSnapshot;
use crate::surface::RenderSurface;
use wetpaint_core::GroupFlags;
use wetpaint_physics::SimulationGate;
use wetpaint_runtime::Viewport;

/// Every GPU resource of the fluid pipeline for one device.
///
/// Built once per GPU context; when the context is lost the old renderer is
/// dropped and a new one constructed.
pub struct FluidRenderer {
    water_surface: RenderSurface,
    other_surface: RenderSurface,
    water_blur_source: wgpu::BindGroup,
    other_blur_source: wgpu::BindGroup,
    particles: ParticlePasses,
    blur: BlurPass,
    compositor: Compositor,
    snapshot: ParticleSnapshot,
    fluid_flags: GroupFlags,
}

impl FluidRenderer {
    /// Build surfaces, shaders and pipelines for `target_format`.
    ///
    /// `fluid_flags` are the group flags of fluid strokes; groups with
    /// exactly these flags are drawn as water.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
        descriptors: &MaterialDescriptors,
        fluid_flags: GroupFlags,
    ) -> Result<Self, RenderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let water_surface = RenderSurface::particle(device, "Water Surface");
        let other_surface = RenderSurface::particle(device, "Other Surface");
        let particles = ParticlePasses::new(
            device,
            queue,
            &descriptors.water_particle,
            &descriptors.other_particle,
        );
        let blur = BlurPass::new(device);
        let compositor = Compositor::new(
            device,
            queue,
            target_format,
            descriptors,
            &water_surface,
            &other_surface,
        );

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::PipelineCreation(error.to_string()));
        }
        let (particles, blur, compositor) = (particles?, blur?, compositor?);

        let water_blur_source = blur.source_bind_group(device, &water_surface);
        let other_blur_source = blur.source_bind_group(device, &other_surface);
        log::info!("Fluid renderer ready ({:?})", target_format);

        Ok(Self {
            water_surface,
            other_surface,
            water_blur_source,
            other_blur_source,
            particles,
            blur,
            compositor,
            snapshot: ParticleSnapshot::new(),
            fluid_flags,
        })
    }

    pub fn snapshot(&self) -> &ParticleSnapshot {
        &self.snapshot
    }

    /// Copy the particle buffers under one gate acquisition
    pub fn capture(&mut self, gate: &SimulationGate) {
        let world = gate.acquire();
        self.snapshot.capture(&*world, self.fluid_flags);
    }

    /// Draw the last captured snapshot into `target`
    pub fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        viewport: &Viewport,
        target: &wgpu::TextureView,
        target_size: (u32, u32),
    ) {
        self.particles.render(
            device,
            queue,
            &self.snapshot,
            viewport,
            &self.water_surface,
            &self.other_surface,
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Composite Encoder"),
        });
        self.blur
            .apply(&mut encoder, &self.water_surface, &self.water_blur_source);
        self.blur
            .apply(&mut encoder, &self.other_surface, &self.other_blur_source);
        self.compositor.render(queue, &mut encoder, target, target_size);
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Capture, then draw
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        gate: &SimulationGate,
        viewport: &Viewport,
        target: &wgpu::TextureView,
        target_size: (u32, u32),
    ) {
        self.capture(gate);
        self.draw(device, queue, viewport, target, target_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offscreen::OffscreenCanvas;
    use wetpaint_core::{Circle, ParticleColor, ParticleFlags, Vec2};
    use wetpaint_physics::{ParticleGroupDef, PhysicsWorld};

    const WATER: GroupFlags = GroupFlags::CAN_BE_EMPTY;

    fn canvas() -> Option<(OffscreenCanvas, FluidRenderer)> {
        let canvas = match pollster::block_on(OffscreenCanvas::new(192, 108)) {
            Ok(canvas) => canvas,
            Err(e) => {
                eprintln!("skipping GPU test: {}", e);
                return None;
            }
        };
        let renderer = canvas
            .renderer(&MaterialDescriptors::default(), WATER)
            .unwrap();
        Some((canvas, renderer))
    }

    fn painted_gate() -> SimulationGate {
        let gate = SimulationGate::new(PhysicsWorld::new());
        {
            let mut world = gate.acquire();
            world.create_boundary(16.0 / 3.0, 3.0);
            world.create_particle_group(&ParticleGroupDef {
                flags: ParticleFlags::WATER | ParticleFlags::COLOR_MIXING,
                group_flags: WATER,
                shapes: vec![Circle::new(Vec2::new(1.5, 1.5), 0.4)],
                linear_velocity: Vec2::ZERO,
                color: ParticleColor::new(20, 60, 220, 255),
            });
            world.create_particle_group(&ParticleGroupDef {
                flags: ParticleFlags::WALL | ParticleFlags::BARRIER,
                group_flags: GroupFlags::SOLID | GroupFlags::CAN_BE_EMPTY,
                shapes: vec![Circle::new(Vec2::new(3.5, 1.5), 0.3)],
                linear_velocity: Vec2::ZERO,
                color: ParticleColor::BLACK,
            });
        }
        gate
    }

    #[test]
    fn test_compositor_is_pixel_stable() {
        let Some((canvas, mut renderer)) = canvas() else { return };
        let gate = painted_gate();
        let viewport = canvas.viewport();

        renderer.render(&canvas.device, &canvas.queue, &gate, &viewport, canvas.view(), canvas.size());
        let first = canvas.read_image().unwrap();
        renderer.draw(&canvas.device, &canvas.queue, &viewport, canvas.view(), canvas.size());
        let second = canvas.read_image().unwrap();

        assert_eq!(first.dimensions(), canvas.size());
        assert_eq!(first, second);
    }

    #[test]
    fn test_water_shows_through_the_paper() {
        let Some((canvas, mut renderer)) = canvas() else { return };
        let viewport = canvas.viewport();
        renderer.render(
            &canvas.device,
            &canvas.queue,
            &painted_gate(),
            &viewport,
            canvas.view(),
            canvas.size(),
        );
        let image = canvas.read_image().unwrap();

        // World (1.5, 1.5) is the middle of the water blob
        let scale = canvas.size().1 as f32 / viewport.world_size().y;
        let x = (1.5 * scale) as u32;
        let y = canvas.size().1 - (1.5 * scale) as u32;
        let pixel = image.get_pixel(x, y);
        assert!(pixel[2] > pixel[0], "expected blue water, got {:?}", pixel);
    }

    #[test]
    fn test_snapshot_classifies_water() {
        let Some((_canvas, mut renderer)) = canvas() else { return };
        renderer.capture(&painted_gate());
        assert_eq!(renderer.snapshot().fluid_ranges().len(), 1);
        assert_eq!(renderer.snapshot().other_ranges().len(), 1);
    }

    #[test]
    fn test_empty_world_renders_paper() {
        let Some((canvas, mut renderer)) = canvas() else { return };
        let gate = SimulationGate::new(PhysicsWorld::new());
        renderer.render(
            &canvas.device,
            &canvas.queue,
            &gate,
            &canvas.viewport(),
            canvas.view(),
            canvas.size(),
        );
        let image = canvas.read_image().unwrap();
        for pixel in image.pixels() {
            assert_eq!(pixel[3], 255);
            assert!(pixel[0] > 200);
        }
    }
}
