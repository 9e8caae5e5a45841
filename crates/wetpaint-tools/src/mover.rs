//! Dragging particles with the pointer
//!
//! On pointer-down the particles under the brush are captured together with
//! their offset from the pointer. Every frame, before the step, each captured
//! particle gets the velocity that carries it to `pointer - offset` within
//! one step.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use wetpaint_core::{Circle, Vec2};
use wetpaint_physics::{ParticleHandle, ParticleWorld, SimulationGate};
use wetpaint_runtime::{FrameListener, PointerId};

/// Velocity that moves a particle at `position` onto `target - offset` in `dt`
pub fn capture_velocity(target: Vec2, offset: Vec2, position: Vec2, dt: f32) -> Vec2 {
    (target - offset - position) / dt
}

struct CapturedPointer {
    target: Vec2,
    particles: Vec<(ParticleHandle, Vec2)>,
}

/// Particles held by each active pointer of a mover tool
#[derive(Default)]
pub struct ParticleCapture {
    pointers: Mutex<HashMap<PointerId, CapturedPointer>>,
}

impl ParticleCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every particle within the bounding box of the brush at `point`
    pub fn begin(&self, gate: &SimulationGate, pointer: PointerId, point: Vec2, radius: f32) {
        let mut particles = Vec::new();
        {
            let world = gate.acquire();
            world.query_shape_aabb(&Circle::new(point, radius), &mut |handle, position| {
                particles.push((handle, point - position));
                true
            });
        }
        log::debug!(
            "Pointer {:?} captured {} particles",
            pointer,
            particles.len()
        );
        self.lock().insert(
            pointer,
            CapturedPointer {
                target: point,
                particles,
            },
        );
    }

    pub fn move_to(&self, pointer: PointerId, point: Vec2) {
        if let Some(captured) = self.lock().get_mut(&pointer) {
            captured.target = point;
        }
    }

    /// Let go of the particles held by `pointer`
    pub fn end(&self, pointer: PointerId) {
        self.lock().remove(&pointer);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn captured_count(&self, pointer: PointerId) -> usize {
        self.lock()
            .get(&pointer)
            .map(|c| c.particles.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PointerId, CapturedPointer>> {
        self.pointers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FrameListener for ParticleCapture {
    fn on_frame(&self, world: &mut dyn ParticleWorld, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        for captured in self.lock().values() {
            for (handle, offset) in &captured.particles {
                // Captured particles may have been erased since
                let Some(position) = world.particle_position(*handle) else {
                    continue;
                };
                world.set_particle_velocity(
                    *handle,
                    capture_velocity(captured.target, *offset, position, dt),
                );
            }
        }
    }

    fn name(&self) -> &str {
        "particle capture"
    }
}
