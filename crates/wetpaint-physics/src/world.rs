//! Particle world wrapping Rapier 2D
//!
//! Every particle is a ball collider. Free particles ride their own dynamic
//! body, wall particles a fixed body, and the particles of a rigid group share
//! one dynamic body. Groups keep their particles in insertion order so each
//! group occupies one contiguous slice of the exported buffers.

use crate::api::{
    GroupHandle, ParticleDef, ParticleGroupDef, ParticleGroupInfo, ParticleHandle, ParticleWorld,
    StepParams,
};
use crate::lattice::fill_circles;
use rapier2d::prelude::*;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use wetpaint_core::{
    Circle, GroupFlags, ParticleColor, ParticleFlags, Vec2, BOUNDARY_THICKNESS, DEFAULT_GRAVITY,
    MAX_PARTICLE_COUNT, PARTICLE_RADIUS,
};

/// Lattice spacing as a fraction of the particle diameter
const LATTICE_STRIDE: f32 = 0.75;

/// Fraction of the color difference exchanged per contact per step
const COLOR_MIXING_STRENGTH: f32 = 0.5;

/// Contact count that maps to a weight of 1.0 (hexagonal packing)
const WEIGHT_NEIGHBOURS: f32 = 6.0;

struct Particle {
    body: RigidBodyHandle,
    flags: ParticleFlags,
    color: ParticleColor,
    weight: f32,
}

struct Group {
    handle: GroupHandle,
    flags: GroupFlags,
    particles: Vec<ColliderHandle>,
    /// Shared body of a rigid group
    body: Option<RigidBodyHandle>,
}

/// Wraps Rapier's physics pipeline and body/collider sets, plus the particle
/// and group bookkeeping layered on top
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    particle_radius: f32,
    max_particles: usize,
    particles: HashMap<ColliderHandle, Particle>,
    groups: Vec<Group>,
    next_group: u32,
    boundary: Option<RigidBodyHandle>,
    last_step: Option<StepParams>,
    limit_warned: bool,
}

impl PhysicsWorld {
    /// Create a world with the standard particle radius, limit and gravity
    pub fn new() -> Self {
        Self::with_limits(PARTICLE_RADIUS, MAX_PARTICLE_COUNT)
    }

    /// Create a world with a custom particle radius and particle limit
    pub fn with_limits(particle_radius: f32, max_particles: usize) -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![DEFAULT_GRAVITY.x, DEFAULT_GRAVITY.y],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            particle_radius,
            max_particles,
            particles: HashMap::new(),
            groups: Vec::new(),
            next_group: 0,
            boundary: None,
            last_step: None,
            limit_warned: false,
        }
    }

    pub fn particle_radius(&self) -> f32 {
        self.particle_radius
    }

    /// Distance between neighbouring particles of a freshly created group
    pub fn lattice_spacing(&self) -> f32 {
        2.0 * self.particle_radius * LATTICE_STRIDE
    }

    /// Colliders are sized so lattice neighbours touch without overlapping
    fn collider_radius(&self) -> f32 {
        self.lattice_spacing() / 2.0
    }

    fn allocate_group(&mut self) -> GroupHandle {
        let handle = GroupHandle::from_raw(self.next_group);
        self.next_group = self.next_group.wrapping_add(1);
        handle
    }

    fn group_index(&self, handle: GroupHandle) -> Option<usize> {
        self.groups.iter().position(|g| g.handle == handle)
    }

    fn ordered_particles(&self) -> impl Iterator<Item = &ColliderHandle> {
        self.groups.iter().flat_map(|g| g.particles.iter())
    }

    fn collider_position(&self, collider: ColliderHandle) -> Option<Vec2> {
        self.collider_set.get(collider).map(|c| {
            let t = c.translation();
            Vec2::new(t.x, t.y)
        })
    }

    fn at_limit(&mut self) -> bool {
        if self.particles.len() < self.max_particles {
            return false;
        }
        if !self.limit_warned {
            log::warn!(
                "Particle limit of {} reached; further particles are dropped",
                self.max_particles
            );
            self.limit_warned = true;
        }
        true
    }

    /// Insert one particle collider, on `shared_body` if given or on a new body
    fn spawn_particle(
        &mut self,
        flags: ParticleFlags,
        position: Vec2,
        velocity: Vec2,
        color: ParticleColor,
        shared_body: Option<RigidBodyHandle>,
    ) -> Option<ColliderHandle> {
        if self.at_limit() {
            return None;
        }

        let radius = self.collider_radius();
        let (body, collider) = match shared_body {
            Some(body) => {
                let body_position = *self.rigid_body_set.get(body)?.position();
                let local = body_position.inverse_transform_point(&point![position.x, position.y]);
                let collider = ColliderBuilder::ball(radius)
                    .translation(vector![local.x, local.y])
                    .friction(0.1)
                    .build();
                (body, collider)
            }
            None => {
                let builder = if flags.contains(ParticleFlags::WALL) {
                    RigidBodyBuilder::fixed()
                } else {
                    RigidBodyBuilder::dynamic()
                        .linvel(vector![velocity.x, velocity.y])
                        .lock_rotations()
                };
                let body = self
                    .rigid_body_set
                    .insert(builder.translation(vector![position.x, position.y]).build());
                let collider = ColliderBuilder::ball(radius).friction(0.1).build();
                (body, collider)
            }
        };

        let handle = self
            .collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        self.particles.insert(
            handle,
            Particle {
                body,
                flags,
                color,
                weight: 0.0,
            },
        );
        Some(handle)
    }

    /// Remove a body once its last collider is gone
    fn remove_body_if_empty(&mut self, body: RigidBodyHandle) {
        let empty = self
            .rigid_body_set
            .get(body)
            .is_some_and(|b| b.colliders().is_empty());
        if empty {
            self.rigid_body_set.remove(
                body,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
        }
    }

    fn remove_particle(&mut self, handle: ColliderHandle) {
        let Some(particle) = self.particles.remove(&handle) else {
            return;
        };
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
        self.remove_body_if_empty(particle.body);
    }

    /// Drop groups that lost all particles unless they may stay empty
    fn prune_empty_groups(&mut self) {
        let before = self.groups.len();
        self.groups
            .retain(|g| !g.particles.is_empty() || g.flags.contains(GroupFlags::CAN_BE_EMPTY));
        let pruned = before - self.groups.len();
        if pruned > 0 {
            log::debug!("Pruned {} empty particle groups", pruned);
        }
    }

    /// Update contact weights and exchange color between touching mixers
    fn resolve_contacts(&mut self) {
        let mut contacts: HashMap<ColliderHandle, u32> = HashMap::new();
        let mut touching = Vec::new();
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            *contacts.entry(pair.collider1).or_default() += 1;
            *contacts.entry(pair.collider2).or_default() += 1;
            touching.push((pair.collider1, pair.collider2));
        }

        for (handle, particle) in self.particles.iter_mut() {
            particle.weight = contacts.get(handle).copied().unwrap_or(0) as f32 / WEIGHT_NEIGHBOURS;
        }

        for (a, b) in touching {
            let colors = match (self.particles.get(&a), self.particles.get(&b)) {
                (Some(pa), Some(pb))
                    if pa.flags.contains(ParticleFlags::COLOR_MIXING)
                        && pb.flags.contains(ParticleFlags::COLOR_MIXING) =>
                {
                    Some((pa.color, pb.color))
                }
                _ => None,
            };
            if let Some((mut ca, mut cb)) = colors {
                ca.mix(&mut cb, COLOR_MIXING_STRENGTH / 2.0);
                if let Some(pa) = self.particles.get_mut(&a) {
                    pa.color = ca;
                }
                if let Some(pb) = self.particles.get_mut(&b) {
                    pb.color = cb;
                }
            }
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn to_collider(handle: ParticleHandle) -> ColliderHandle {
    let raw = handle.raw();
    ColliderHandle::from_raw_parts(raw as u32, (raw >> 32) as u32)
}

fn to_particle(handle: ColliderHandle) -> ParticleHandle {
    let (index, generation) = handle.into_raw_parts();
    ParticleHandle::from_raw((generation as u64) << 32 | index as u64)
}

impl ParticleWorld for PhysicsWorld {
    fn step(&mut self, params: &StepParams) {
        self.integration_parameters.dt = params.dt;
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(params.velocity_iterations as usize).unwrap_or(NonZeroUsize::MIN);
        self.integration_parameters.num_internal_stabilization_iterations =
            params.position_iterations as usize;
        self.integration_parameters.num_internal_pgs_iterations =
            params.particle_iterations.max(1) as usize;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        self.resolve_contacts();
        self.last_step = Some(*params);
    }

    fn last_step(&self) -> Option<StepParams> {
        self.last_step
    }

    fn create_particle(&mut self, def: &ParticleDef) -> Option<ParticleHandle> {
        if self.at_limit() {
            return None;
        }
        let group = self.allocate_group();
        let collider =
            self.spawn_particle(def.flags, def.position, def.velocity, def.color, None)?;
        self.groups.push(Group {
            handle: group,
            flags: GroupFlags::empty(),
            particles: vec![collider],
            body: None,
        });
        Some(to_particle(collider))
    }

    fn create_particle_group(&mut self, def: &ParticleGroupDef) -> GroupHandle {
        let handle = self.allocate_group();
        let positions = fill_circles(&def.shapes, self.lattice_spacing());

        let body = if def.group_flags.contains(GroupFlags::RIGID) && !positions.is_empty() {
            let centroid = positions.iter().copied().sum::<Vec2>() / positions.len() as f32;
            let body = RigidBodyBuilder::dynamic()
                .translation(vector![centroid.x, centroid.y])
                .linvel(vector![def.linear_velocity.x, def.linear_velocity.y])
                .build();
            Some(self.rigid_body_set.insert(body))
        } else {
            None
        };

        let mut particles = Vec::with_capacity(positions.len());
        for position in positions {
            match self.spawn_particle(
                def.flags,
                position,
                def.linear_velocity,
                def.color,
                body,
            ) {
                Some(collider) => particles.push(collider),
                None => break,
            }
        }
        if let Some(body) = body {
            self.remove_body_if_empty(body);
        }

        log::debug!(
            "Created particle group {:?} with {} particles from {} shapes",
            handle,
            particles.len(),
            def.shapes.len()
        );
        self.groups.push(Group {
            handle,
            flags: def.group_flags,
            particles,
            body,
        });
        handle
    }

    fn join_particle_groups(&mut self, target: GroupHandle, joined: GroupHandle) {
        if target == joined {
            return;
        }
        let Some(joined_index) = self.group_index(joined) else {
            return;
        };
        if self.group_index(target).is_none() {
            return;
        }
        let joined_group = self.groups.remove(joined_index);
        let Some(target_index) = self.group_index(target) else {
            return;
        };

        let target_body = self.groups[target_index]
            .body
            .filter(|b| self.rigid_body_set.contains(*b));
        let target_position = target_body.and_then(|b| self.rigid_body_set.get(b).map(|b| *b.position()));

        for collider in &joined_group.particles {
            let Some(particle) = self.particles.get_mut(collider) else {
                continue;
            };
            if let (Some(body), Some(body_position)) = (target_body, target_position) {
                let old_body = particle.body;
                if old_body == body {
                    continue;
                }
                particle.body = body;
                let Some(world_position) = self.collider_set.get(*collider).map(|c| *c.position())
                else {
                    continue;
                };
                self.collider_set
                    .set_parent(*collider, Some(body), &mut self.rigid_body_set);
                if let Some(c) = self.collider_set.get_mut(*collider) {
                    c.set_position_wrt_parent(body_position.inverse() * world_position);
                }
                self.remove_body_if_empty(old_body);
            }
        }

        self.groups[target_index]
            .particles
            .extend(joined_group.particles);
    }

    fn destroy_particles_in_shape(&mut self, shape: &Circle) -> usize {
        let doomed: Vec<ColliderHandle> = self
            .particles
            .keys()
            .copied()
            .filter(|c| self.collider_position(*c).is_some_and(|p| shape.contains(p)))
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        for collider in &doomed {
            self.remove_particle(*collider);
        }
        let removed: HashSet<ColliderHandle> = doomed.iter().copied().collect();
        for group in &mut self.groups {
            group.particles.retain(|c| !removed.contains(c));
        }
        self.prune_empty_groups();
        doomed.len()
    }

    fn query_shape_aabb(
        &self,
        shape: &Circle,
        callback: &mut dyn FnMut(ParticleHandle, Vec2) -> bool,
    ) {
        for collider in self.ordered_particles() {
            let Some(position) = self.collider_position(*collider) else {
                continue;
            };
            if shape.aabb_contains(position) && !callback(to_particle(*collider), position) {
                return;
            }
        }
    }

    fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    fn copy_position_buffer(&self, start: usize, count: usize, out: &mut [Vec2]) {
        assert_buffer_range(start, count, self.particles.len(), out.len());
        for (slot, collider) in out.iter_mut().zip(self.ordered_particles().skip(start).take(count)) {
            *slot = self.collider_position(*collider).unwrap_or_default();
        }
    }

    fn copy_color_buffer(&self, start: usize, count: usize, out: &mut [ParticleColor]) {
        assert_buffer_range(start, count, self.particles.len(), out.len());
        for (slot, collider) in out.iter_mut().zip(self.ordered_particles().skip(start).take(count)) {
            *slot = self.particles.get(collider).map(|p| p.color).unwrap_or_default();
        }
    }

    fn copy_weight_buffer(&self, start: usize, count: usize, out: &mut [f32]) {
        assert_buffer_range(start, count, self.particles.len(), out.len());
        for (slot, collider) in out.iter_mut().zip(self.ordered_particles().skip(start).take(count)) {
            *slot = self.particles.get(collider).map(|p| p.weight).unwrap_or_default();
        }
    }

    fn particle_group_list(&self) -> Vec<ParticleGroupInfo> {
        let mut buffer_index = 0;
        self.groups
            .iter()
            .map(|g| {
                let info = ParticleGroupInfo {
                    handle: g.handle,
                    group_flags: g.flags,
                    buffer_index,
                    particle_count: g.particles.len(),
                };
                buffer_index += g.particles.len();
                info
            })
            .collect()
    }

    fn group_flags(&self, group: GroupHandle) -> Option<GroupFlags> {
        self.group_index(group).map(|i| self.groups[i].flags)
    }

    fn particle_position(&self, particle: ParticleHandle) -> Option<Vec2> {
        let collider = to_collider(particle);
        if !self.particles.contains_key(&collider) {
            return None;
        }
        self.collider_position(collider)
    }

    fn set_particle_velocity(&mut self, particle: ParticleHandle, velocity: Vec2) {
        let Some(body) = self.particles.get(&to_collider(particle)).map(|p| p.body) else {
            return;
        };
        if let Some(body) = self.rigid_body_set.get_mut(body) {
            if body.is_dynamic() {
                body.set_linvel(vector![velocity.x, velocity.y], true);
            }
        }
    }

    fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vector![gravity.x, gravity.y];
    }

    fn create_boundary(&mut self, width: f32, height: f32) {
        if let Some(old) = self.boundary.take() {
            self.rigid_body_set.remove(
                old,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
        }

        let t = BOUNDARY_THICKNESS;
        let body = self.rigid_body_set.insert(RigidBodyBuilder::fixed().build());
        let walls = [
            (width, t, width / 2.0, height + t),
            (width, t, width / 2.0, -t),
            (t, height, -t, height / 2.0),
            (t, height, width + t, height / 2.0),
        ];
        for (half_width, half_height, x, y) in walls {
            let collider = ColliderBuilder::cuboid(half_width, half_height)
                .translation(vector![x, y])
                .build();
            self.collider_set
                .insert_with_parent(collider, body, &mut self.rigid_body_set);
        }
        self.boundary = Some(body);
        log::debug!("Boundary rebuilt for a {:.2} x {:.2} world", width, height);
    }

    fn clear(&mut self) {
        let gravity = self.gravity;
        let (radius, limit, next_group) = (self.particle_radius, self.max_particles, self.next_group);
        *self = Self::with_limits(radius, limit);
        self.gravity = gravity;
        // Keep handing out fresh ids so handles from before the clear stay stale
        self.next_group = next_group;
    }
}

fn assert_buffer_range(start: usize, count: usize, live: usize, out_len: usize) {
    assert!(
        start.checked_add(count).is_some_and(|end| end <= live),
        "buffer range {}..{} exceeds {} live particles",
        start,
        start.saturating_add(count),
        live
    );
    assert!(
        out_len >= count,
        "output buffer holds {} entries, {} requested",
        out_len,
        count
    );
}
