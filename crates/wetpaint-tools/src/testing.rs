//! A `ParticleWorld` that records every call, for tool tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use wetpaint_core::{Circle, GroupFlags, ParticleColor, Vec2};
use wetpaint_physics::{
    GroupHandle, ParticleDef, ParticleGroupDef, ParticleGroupInfo, ParticleHandle, ParticleWorld,
    StepParams,
};

#[derive(Default)]
pub struct Recorded {
    pub created: Vec<(GroupHandle, ParticleGroupDef)>,
    pub joins: Vec<(GroupHandle, GroupHandle)>,
    pub destroyed: Vec<Circle>,
    pub groups: Vec<(GroupHandle, GroupFlags)>,
    pub particles: Vec<(ParticleHandle, Vec2)>,
    pub velocities: HashMap<ParticleHandle, Vec2>,
    pub gravity: Vec2,
    pub boundaries: Vec<(f32, f32)>,
    pub clears: usize,
    next_id: u32,
}

/// Cloning shares the record, so a test can keep a handle after moving the
/// world into a gate
#[derive(Clone, Default)]
pub struct RecordingWorld {
    record: Arc<Mutex<Recorded>>,
}

impl RecordingWorld {
    pub fn record(&self) -> MutexGuard<'_, Recorded> {
        self.record.lock().unwrap()
    }

    pub fn add_particle(&self, position: Vec2) -> ParticleHandle {
        let mut record = self.record();
        let handle = ParticleHandle::from_raw(record.particles.len() as u64);
        record.particles.push((handle, position));
        handle
    }

    pub fn add_group(&self, flags: GroupFlags) -> GroupHandle {
        let mut record = self.record();
        let handle = GroupHandle::from_raw(record.next_id);
        record.next_id += 1;
        record.groups.push((handle, flags));
        handle
    }
}

impl ParticleWorld for RecordingWorld {
    fn step(&mut self, _params: &StepParams) {}

    fn last_step(&self) -> Option<StepParams> {
        None
    }

    fn create_particle(&mut self, def: &ParticleDef) -> Option<ParticleHandle> {
        Some(self.add_particle(def.position))
    }

    fn create_particle_group(&mut self, def: &ParticleGroupDef) -> GroupHandle {
        let handle = self.add_group(def.group_flags);
        self.record().created.push((handle, def.clone()));
        handle
    }

    fn join_particle_groups(&mut self, target: GroupHandle, joined: GroupHandle) {
        let mut record = self.record();
        record.joins.push((target, joined));
        record.groups.retain(|(handle, _)| *handle != joined);
    }

    fn destroy_particles_in_shape(&mut self, shape: &Circle) -> usize {
        self.record().destroyed.push(*shape);
        0
    }

    fn query_shape_aabb(
        &self,
        shape: &Circle,
        callback: &mut dyn FnMut(ParticleHandle, Vec2) -> bool,
    ) {
        let particles = self.record().particles.clone();
        for (handle, position) in particles {
            if shape.aabb_contains(position) && !callback(handle, position) {
                return;
            }
        }
    }

    fn particle_count(&self) -> usize {
        self.record().particles.len()
    }

    fn group_count(&self) -> usize {
        self.record().groups.len()
    }

    fn body_count(&self) -> usize {
        0
    }

    fn copy_position_buffer(&self, start: usize, count: usize, out: &mut [Vec2]) {
        let record = self.record();
        for (slot, (_, position)) in out.iter_mut().zip(&record.particles[start..start + count]) {
            *slot = *position;
        }
    }

    fn copy_color_buffer(&self, _start: usize, count: usize, out: &mut [ParticleColor]) {
        out[..count].fill(ParticleColor::WHITE);
    }

    fn copy_weight_buffer(&self, _start: usize, count: usize, out: &mut [f32]) {
        out[..count].fill(0.0);
    }

    fn particle_group_list(&self) -> Vec<ParticleGroupInfo> {
        self.record()
            .groups
            .iter()
            .map(|(handle, flags)| ParticleGroupInfo {
                handle: *handle,
                group_flags: *flags,
                buffer_index: 0,
                particle_count: 0,
            })
            .collect()
    }

    fn group_flags(&self, group: GroupHandle) -> Option<GroupFlags> {
        self.record()
            .groups
            .iter()
            .find(|(handle, _)| *handle == group)
            .map(|(_, flags)| *flags)
    }

    fn particle_position(&self, particle: ParticleHandle) -> Option<Vec2> {
        self.record()
            .particles
            .iter()
            .find(|(handle, _)| *handle == particle)
            .map(|(_, position)| *position)
    }

    fn set_particle_velocity(&mut self, particle: ParticleHandle, velocity: Vec2) {
        self.record().velocities.insert(particle, velocity);
    }

    fn gravity(&self) -> Vec2 {
        self.record().gravity
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.record().gravity = gravity;
    }

    fn create_boundary(&mut self, width: f32, height: f32) {
        self.record().boundaries.push((width, height));
    }

    fn clear(&mut self) {
        let mut record = self.record();
        record.clears += 1;
        record.created.clear();
        record.groups.clear();
        record.particles.clear();
    }
}
