//! Exclusive cross-thread access to the particle world
//!
//! The UI thread mutates the world from pointer input while the render thread
//! steps and reads it. Both go through one `SimulationGate`; the guard it
//! hands out is the only way to reach the world.

use crate::api::ParticleWorld;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

type BoxedWorld = Box<dyn ParticleWorld + Send>;

/// Owns the particle world and serializes access to it
pub struct SimulationGate {
    world: Mutex<BoxedWorld>,
    owner: Mutex<Option<ThreadId>>,
}

/// Exclusive access to the world; released on drop
pub struct SimulationGuard<'a> {
    gate: &'a SimulationGate,
    world: MutexGuard<'a, BoxedWorld>,
}

impl SimulationGate {
    pub fn new(world: impl ParticleWorld + Send + 'static) -> Self {
        Self {
            world: Mutex::new(Box::new(world)),
            owner: Mutex::new(None),
        }
    }

    /// Block until the world is free and take it.
    ///
    /// Panics when the calling thread already holds the gate.
    pub fn acquire(&self) -> SimulationGuard<'_> {
        let current = thread::current().id();
        assert!(
            *self.owner_slot() != Some(current),
            "simulation gate acquired twice on the same thread"
        );

        // A panic while holding the world leaves it usable; recover the guard
        let world = self
            .world
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *self.owner_slot() = Some(current);
        SimulationGuard { gate: self, world }
    }

    /// Take the world only if nobody holds it
    pub fn try_acquire(&self) -> Option<SimulationGuard<'_>> {
        let world = match self.world.try_lock() {
            Ok(world) => world,
            Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(std::sync::TryLockError::WouldBlock) => return None,
        };
        *self.owner_slot() = Some(thread::current().id());
        Some(SimulationGuard { gate: self, world })
    }

    /// Give the world back. Equivalent to dropping the guard.
    pub fn release(&self, guard: SimulationGuard<'_>) {
        assert!(
            std::ptr::eq(guard.gate, self),
            "guard released on a gate that did not issue it"
        );
        drop(guard);
    }

    /// Whether the calling thread currently holds the gate
    pub fn is_held_by_current_thread(&self) -> bool {
        *self.owner_slot() == Some(thread::current().id())
    }

    fn owner_slot(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.owner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Deref for SimulationGuard<'_> {
    type Target = dyn ParticleWorld + Send;

    fn deref(&self) -> &Self::Target {
        self.world.as_ref()
    }
}

impl DerefMut for SimulationGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.world.as_mut()
    }
}

impl Drop for SimulationGuard<'_> {
    fn drop(&mut self) {
        // Clear ownership before the world mutex itself unlocks
        *self.gate.owner_slot() = None;
    }
}
