//! Per-frame copy of the particle buffers
//!
//! Captured under one gate acquisition so every pass of a frame draws the
//! same particles, then read without the gate.

use std::ops::Range;
use wetpaint_core::{GroupFlags, ParticleColor, Vec2, MAX_PARTICLE_COUNT};
use wetpaint_physics::ParticleWorld;

pub struct ParticleSnapshot {
    positions: Vec<Vec2>,
    colors: Vec<ParticleColor>,
    color_bytes: Vec<[u8; 4]>,
    weights: Vec<f32>,
    count: usize,
    fluid: Vec<Range<u32>>,
    other: Vec<Range<u32>>,
}

impl Default for ParticleSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleSnapshot {
    pub fn new() -> Self {
        Self {
            positions: vec![Vec2::ZERO; MAX_PARTICLE_COUNT],
            colors: vec![ParticleColor::TRANSPARENT; MAX_PARTICLE_COUNT],
            color_bytes: vec![[0; 4]; MAX_PARTICLE_COUNT],
            weights: vec![0.0; MAX_PARTICLE_COUNT],
            count: 0,
            fluid: Vec::new(),
            other: Vec::new(),
        }
    }

    /// Copy every live particle (up to capacity) and sort the groups into
    /// fluid, whose flags equal `fluid_flags`, and everything else
    pub fn capture(&mut self, world: &dyn ParticleWorld, fluid_flags: GroupFlags) {
        let count = world.particle_count().min(MAX_PARTICLE_COUNT);
        world.copy_position_buffer(0, count, &mut self.positions[..count]);
        world.copy_color_buffer(0, count, &mut self.colors[..count]);
        world.copy_weight_buffer(0, count, &mut self.weights[..count]);
        for (bytes, color) in self.color_bytes[..count].iter_mut().zip(&self.colors[..count]) {
            *bytes = color.to_array();
        }
        self.count = count;

        self.fluid.clear();
        self.other.clear();
        for group in world.particle_group_list() {
            let start = group.buffer_index.min(count);
            let end = (group.buffer_index + group.particle_count).min(count);
            if start == end {
                continue;
            }
            let range = start as u32..end as u32;
            if group.group_flags == fluid_flags {
                self.fluid.push(range);
            } else {
                self.other.push(range);
            }
        }
    }

    /// Forget the previous capture
    pub fn clear(&mut self) {
        self.count = 0;
        self.fluid.clear();
        self.other.clear();
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions[..self.count]
    }

    /// RGBA bytes, one `[u8; 4]` per particle
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.color_bytes[..self.count]
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights[..self.count]
    }

    pub fn fluid_ranges(&self) -> &[Range<u32>] {
        &self.fluid
    }

    pub fn other_ranges(&self) -> &[Range<u32>] {
        &self.other
    }
}
