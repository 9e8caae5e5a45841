//! World and brush constants shared by simulation, tools and rendering

use glam::Vec2;

/// Height of the playfield in world units. The width follows the aspect ratio.
pub const WORLD_HEIGHT: f32 = 3.0;

/// Radius of a single simulated particle in world units
pub const PARTICLE_RADIUS: f32 = 0.06;

/// Upper bound on live particles; also the size of the render snapshot
pub const MAX_PARTICLE_COUNT: usize = 5000;

/// Smallest allowed brush diameter in world units
pub const MINIMUM_BRUSH_SIZE: f32 = 0.18;

/// Thickness of the four boxes that frame the playfield
pub const BOUNDARY_THICKNESS: f32 = 20.0;

/// Gravity applied when nothing else has been configured
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, -10.0);
