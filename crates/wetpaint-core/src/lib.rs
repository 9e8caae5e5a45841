//! wetpaint Core - Foundational types for the wetpaint canvas
//!
//! This crate provides the types every other wetpaint crate depends on:
//! - `ParticleColor` - 8-bit RGBA particle color
//! - `ParticleFlags` / `GroupFlags` - simulation behavior bits
//! - `Circle` - the brush shape used by every tool
//! - World and brush constants
//! - Error types and Result alias

mod constants;
mod error;
mod flags;
mod types;

pub use constants::{
    BOUNDARY_THICKNESS, DEFAULT_GRAVITY, MAX_PARTICLE_COUNT, MINIMUM_BRUSH_SIZE, PARTICLE_RADIUS,
    WORLD_HEIGHT,
};
pub use error::{Result, WetpaintError};
pub use flags::{GroupFlags, ParticleFlags};
pub use glam::Vec2;
pub use types::{Circle, ParticleColor};
