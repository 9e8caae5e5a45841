//! Per-frame listener registration

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use wetpaint_physics::ParticleWorld;

/// Called once per simulated frame, before the step, while the gate is held.
///
/// Implementations must not touch the `SimulationGate` themselves; the world
/// they need is passed in.
pub trait FrameListener: Send + Sync {
    fn on_frame(&self, world: &mut dyn ParticleWorld, dt: f32);

    fn name(&self) -> &str {
        "listener"
    }
}

/// Token returned by `register`, used to unregister
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of frame listeners, shared between the UI and render threads
#[derive(Default)]
pub struct UpdateDispatcher {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn FrameListener>)>>,
    next_id: AtomicU64,
}

impl UpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn FrameListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        log::debug!("Registered frame listener '{}' as {:?}", listener.name(), id);
        self.lock().push((id, listener));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        before != listeners.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run every listener in registration order.
    ///
    /// The list is snapshotted first so listeners may register or unregister
    /// without deadlocking.
    pub fn notify(&self, world: &mut dyn ParticleWorld, dt: f32) {
        let listeners: Vec<Arc<dyn FrameListener>> =
            self.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener.on_frame(world, dt);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Arc<dyn FrameListener>)>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
