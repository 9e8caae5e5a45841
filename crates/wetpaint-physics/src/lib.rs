//! wetpaint Physics - particle simulation behind a narrow trait
//!
//! - `ParticleWorld` - the contract tools, the orchestrator and the renderer use
//! - `PhysicsWorld` - the rapier2d-backed implementation
//! - `SimulationGate` - exclusive, cross-thread access to the one world

mod api;
mod gate;
mod lattice;
mod world;

pub use api::{
    GroupHandle, ParticleDef, ParticleGroupDef, ParticleGroupInfo, ParticleHandle, ParticleWorld,
    StepParams,
};
pub use gate::{SimulationGate, SimulationGuard};
pub use lattice::fill_circles;
pub use world::PhysicsWorld;
