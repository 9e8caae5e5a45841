//! Per-frame driver: listeners, simulation step, then rendering

use crate::clock::FrameClock;
use crate::dispatcher::UpdateDispatcher;
use crate::switch::SimulationSwitch;
use std::sync::Arc;
use wetpaint_core::Vec2;
use wetpaint_physics::{SimulationGate, StepParams};

/// Snapshot of simulation load, refreshed once per FPS window
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub fps: f64,
    pub particle_count: usize,
    pub group_count: usize,
    pub body_count: usize,
}

/// Drives one frame at a time on the render thread
pub struct FrameOrchestrator {
    gate: Arc<SimulationGate>,
    dispatcher: Arc<UpdateDispatcher>,
    switch: SimulationSwitch,
    step: StepParams,
    clock: FrameClock,
    stats: FrameStats,
}

impl FrameOrchestrator {
    pub fn new(
        gate: Arc<SimulationGate>,
        dispatcher: Arc<UpdateDispatcher>,
        switch: SimulationSwitch,
    ) -> Self {
        Self {
            gate,
            dispatcher,
            switch,
            step: StepParams::default(),
            clock: FrameClock::new(),
            stats: FrameStats::default(),
        }
    }

    pub fn with_step_params(mut self, step: StepParams) -> Self {
        self.step = step;
        self
    }

    pub fn step_params(&self) -> StepParams {
        self.step
    }

    pub fn gate(&self) -> &Arc<SimulationGate> {
        &self.gate
    }

    pub fn switch(&self) -> &SimulationSwitch {
        &self.switch
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Notify listeners and step the world under one gate acquisition.
    ///
    /// Returns false without touching the world while paused.
    pub fn advance(&mut self) -> bool {
        if !self.switch.is_running() {
            return false;
        }
        let mut world = self.gate.acquire();
        self.dispatcher.notify(&mut *world, self.step.dt);
        world.step(&self.step);
        true
    }

    /// Advance the simulation, then hand the gate to `render`.
    ///
    /// The gate is not held while `render` runs; it acquires it for as long
    /// as it needs to snapshot particle data.
    pub fn run_frame<R>(&mut self, render: impl FnOnce(&SimulationGate) -> R) -> R {
        self.advance();
        let rendered = render(&self.gate);

        if self.clock.tick() {
            self.refresh_stats();
        }
        rendered
    }

    fn refresh_stats(&mut self) {
        let world = self.gate.acquire();
        self.stats = FrameStats {
            fps: self.clock.fps,
            particle_count: world.particle_count(),
            group_count: world.group_count(),
            body_count: world.body_count(),
        };
        drop(world);
        log::debug!(
            "fps {:.1} | particles {} | groups {} | bodies {}",
            self.stats.fps,
            self.stats.particle_count,
            self.stats.group_count,
            self.stats.body_count
        );
    }

    /// Rebuild the walls for a new playfield size
    pub fn resize_world(&self, world_size: Vec2) {
        self.gate
            .acquire()
            .create_boundary(world_size.x, world_size.y);
    }

    /// Tear the world down, rebuild its walls and resume stepping
    pub fn restart(&self, world_size: Vec2) {
        restart_world(&self.gate, world_size);
        self.switch.resume();
    }
}

/// Remove every body, particle and group, then frame the playfield again
pub fn restart_world(gate: &SimulationGate, world_size: Vec2) {
    let mut world = gate.acquire();
    world.clear();
    world.create_boundary(world_size.x, world_size.y);
    log::info!(
        "World restarted ({:.2} x {:.2})",
        world_size.x,
        world_size.y
    );
}
