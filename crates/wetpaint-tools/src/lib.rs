//! wetpaint Tools - turning pointer strokes into simulation commands
//!
//! - `StrokeSampler`: screen samples to clamped, interpolated world points
//! - `PointerStroke`: per-pointer bounded point buffer
//! - `BrushConfig` / `ToolKind`: what each tool does to the world
//! - `Tool`: the per-pointer state machine that batches and applies strokes
//! - `ParticleCapture`: the mover's per-frame velocity steering
//! - `ToolRegistry` / `Controller`: tool selection, color, gravity and reset

mod brush;
mod controller;
mod mover;
mod registry;
mod sampler;
mod stroke;
mod tool;

#[cfg(test)]
mod testing;

pub use brush::{BrushConfig, ToolKind};
pub use controller::Controller;
pub use mover::{capture_velocity, ParticleCapture};
pub use registry::ToolRegistry;
pub use sampler::{interpolate, lerp_fixed_interval, StrokeSampler};
pub use stroke::PointerStroke;
pub use tool::{FlushPolicy, StrokeSettings, Tool};
