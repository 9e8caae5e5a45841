//! The particle world contract

use wetpaint_core::{Circle, GroupFlags, ParticleColor, ParticleFlags, Vec2};

/// Opaque, generation-checked handle to a single particle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParticleHandle(u64);

impl ParticleHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque handle to a particle group. Stale handles are ignored by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupHandle(u32);

impl GroupHandle {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Solver settings for one simulation step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepParams {
    pub dt: f32,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub particle_iterations: u32,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            velocity_iterations: 6,
            position_iterations: 2,
            particle_iterations: 5,
        }
    }
}

/// A single particle to create
#[derive(Clone, Copy, Debug)]
pub struct ParticleDef {
    pub flags: ParticleFlags,
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: ParticleColor,
}

/// A batch of particles filling the union of several circles
#[derive(Clone, Debug)]
pub struct ParticleGroupDef {
    pub flags: ParticleFlags,
    pub group_flags: GroupFlags,
    pub shapes: Vec<Circle>,
    pub linear_velocity: Vec2,
    pub color: ParticleColor,
}

/// A group as seen by the renderer: its flags and the contiguous slice of the
/// particle buffers it occupies
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleGroupInfo {
    pub handle: GroupHandle,
    pub group_flags: GroupFlags,
    pub buffer_index: usize,
    pub particle_count: usize,
}

/// Everything the canvas needs from a particle simulation.
///
/// Object safe so the gate can hold any implementation. Callers must hold the
/// `SimulationGate` for every call.
pub trait ParticleWorld {
    /// Advance the simulation by `params.dt`
    fn step(&mut self, params: &StepParams);

    /// Parameters passed to the most recent `step`
    fn last_step(&self) -> Option<StepParams>;

    /// Create one particle in its own group. `None` once the particle limit is reached.
    fn create_particle(&mut self, def: &ParticleDef) -> Option<ParticleHandle>;

    /// Fill the union of `def.shapes` with particles forming one new group
    fn create_particle_group(&mut self, def: &ParticleGroupDef) -> GroupHandle;

    /// Move every particle of `joined` into `target`; `joined` ceases to exist
    fn join_particle_groups(&mut self, target: GroupHandle, joined: GroupHandle);

    /// Destroy all particles inside `shape`, returning how many were removed
    fn destroy_particles_in_shape(&mut self, shape: &Circle) -> usize;

    /// Report every particle inside the bounding box of `shape` until the
    /// callback returns `false`
    fn query_shape_aabb(&self, shape: &Circle, callback: &mut dyn FnMut(ParticleHandle, Vec2) -> bool);

    fn particle_count(&self) -> usize;
    fn group_count(&self) -> usize;
    fn body_count(&self) -> usize;

    /// Copy positions `[start, start + count)` in group order into `out`.
    ///
    /// Panics if the range exceeds the live particle count or `out` is too small.
    fn copy_position_buffer(&self, start: usize, count: usize, out: &mut [Vec2]);

    /// Same contract as `copy_position_buffer`, for colors
    fn copy_color_buffer(&self, start: usize, count: usize, out: &mut [ParticleColor]);

    /// Same contract as `copy_position_buffer`, for contact weights
    fn copy_weight_buffer(&self, start: usize, count: usize, out: &mut [f32]);

    /// Groups in creation order
    fn particle_group_list(&self) -> Vec<ParticleGroupInfo>;

    /// Flags of a live group, `None` for stale handles
    fn group_flags(&self, group: GroupHandle) -> Option<GroupFlags>;

    fn particle_position(&self, particle: ParticleHandle) -> Option<Vec2>;
    fn set_particle_velocity(&mut self, particle: ParticleHandle, velocity: Vec2);

    fn gravity(&self) -> Vec2;
    fn set_gravity(&mut self, gravity: Vec2);

    /// Replace the static walls with four boxes framing `[0, width] x [0, height]`
    fn create_boundary(&mut self, width: f32, height: f32);

    /// Remove every body, particle and group. Gravity is kept.
    fn clear(&mut self);
}
