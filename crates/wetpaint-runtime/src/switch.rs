//! Shared pause/resume flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether the simulation advances. Cloned freely between the UI and render threads.
#[derive(Clone, Debug)]
pub struct SimulationSwitch {
    running: Arc<AtomicBool>,
}

impl Default for SimulationSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationSwitch {
    /// A switch that starts in the running state
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn pause(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            log::debug!("Simulation paused");
        }
    }

    pub fn resume(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            log::debug!("Simulation resumed");
        }
    }

    /// Flip the state, returning the new running value
    pub fn toggle(&self) -> bool {
        !self.running.fetch_xor(true, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let switch = SimulationSwitch::new();
        let other = switch.clone();
        assert!(other.is_running());

        switch.pause();
        assert!(!other.is_running());

        assert!(other.toggle());
        assert!(switch.is_running());
    }
}
