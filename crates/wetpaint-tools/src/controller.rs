//! UI-thread entry point: routes pointer input to the active tool and
//! applies tool, color, gravity and reset requests

use crate::brush::ToolKind;
use crate::registry::ToolRegistry;
use crate::sampler::StrokeSampler;
use crate::tool::StrokeSettings;
use std::sync::Arc;
use wetpaint_core::{ParticleColor, Vec2};
use wetpaint_physics::SimulationGate;
use wetpaint_runtime::{restart_world, PointerEvent, SimulationSwitch, UpdateDispatcher, Viewport};

pub struct Controller {
    registry: ToolRegistry,
    active: ToolKind,
    sampler: StrokeSampler,
    gate: Arc<SimulationGate>,
    dispatcher: Arc<UpdateDispatcher>,
    switch: SimulationSwitch,
}

impl Controller {
    pub fn new(
        gate: Arc<SimulationGate>,
        dispatcher: Arc<UpdateDispatcher>,
        switch: SimulationSwitch,
        viewport: Viewport,
        settings: StrokeSettings,
        initial_tool: ToolKind,
    ) -> Self {
        let mut registry = ToolRegistry::new(settings);
        if let Some(tool) = registry.get_mut(initial_tool) {
            tool.activate(&dispatcher);
        }
        Self {
            registry,
            active: initial_tool,
            sampler: StrokeSampler::new(viewport),
            gate,
            dispatcher,
            switch,
        }
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn switch(&self) -> &SimulationSwitch {
        &self.switch
    }

    pub fn viewport(&self) -> &Viewport {
        self.sampler.viewport()
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        if let Some(tool) = self.registry.get_mut(self.active) {
            tool.handle_pointer(event, &self.sampler, &self.gate, &self.switch);
        }
    }

    /// Switch tools. The old tool drops its strokes and frame listener.
    pub fn select_tool(&mut self, kind: ToolKind) {
        if kind == self.active {
            return;
        }
        if let Some(old) = self.registry.get_mut(self.active) {
            old.deactivate(&self.dispatcher, &self.switch);
        }
        if let Some(new) = self.registry.get_mut(kind) {
            new.activate(&self.dispatcher);
        }
        log::info!("Tool: {}", kind);
        self.active = kind;
    }

    pub fn set_color(&mut self, color: ParticleColor) {
        self.registry.set_color(color);
        log::info!("Color: {}", color);
    }

    /// Set the paint color from a packed ABGR integer
    pub fn set_color_abgr(&mut self, packed: u32) {
        self.set_color(ParticleColor::from_abgr(packed));
    }

    pub fn set_gravity(&self, gravity: Vec2) {
        self.gate.acquire().set_gravity(gravity);
    }

    pub fn gravity(&self) -> Vec2 {
        self.gate.acquire().gravity()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.sampler.set_viewport(viewport);
    }

    /// Clear the canvas. Refused while any pointer is still drawing.
    pub fn reset(&mut self) -> bool {
        if self.registry.is_drawing() {
            log::debug!("Reset ignored while drawing");
            return false;
        }
        self.registry.reset_all();
        restart_world(&self.gate, self.viewport().world_size());
        self.switch.resume();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingWorld;
    use wetpaint_runtime::{PointerId, PointerPhase};

    fn controller(initial: ToolKind) -> (Controller, RecordingWorld, Arc<UpdateDispatcher>) {
        let world = RecordingWorld::default();
        let dispatcher = Arc::new(UpdateDispatcher::new());
        let controller = Controller::new(
            Arc::new(SimulationGate::new(world.clone())),
            dispatcher.clone(),
            SimulationSwitch::new(),
            Viewport::new(500, 300),
            StrokeSettings::default(),
            initial,
        );
        (controller, world, dispatcher)
    }

    #[test]
    fn test_tool_switch_moves_the_listener() {
        let (mut controller, _world, dispatcher) = controller(ToolKind::Move);
        assert_eq!(dispatcher.len(), 1);

        controller.select_tool(ToolKind::Fluid);
        assert_eq!(controller.active_tool(), ToolKind::Fluid);
        assert!(dispatcher.is_empty());

        controller.select_tool(ToolKind::Move);
        assert_eq!(dispatcher.len(), 1);
    }

    #[test]
    fn test_color_from_abgr() {
        let (mut controller, _world, _) = controller(ToolKind::Fluid);
        controller.set_color_abgr(0xFF00_00FF);
        let brush = controller.registry().get(ToolKind::Fluid).unwrap().brush();
        assert_eq!(brush.color, ParticleColor::new(255, 0, 0, 255));
    }

    #[test]
    fn test_reset_refused_while_drawing() {
        let (mut controller, world, _) = controller(ToolKind::Fluid);
        let down = PointerEvent::new(PointerId(1), PointerPhase::Down, Vec2::new(100.0, 100.0));
        controller.handle_pointer(&down);
        assert!(!controller.reset());
        assert_eq!(world.record().clears, 0);

        let up = PointerEvent::new(PointerId(1), PointerPhase::Up, Vec2::new(100.0, 100.0));
        controller.handle_pointer(&up);
        assert!(controller.reset());

        let record = world.record();
        assert_eq!(record.clears, 1);
        assert_eq!(record.boundaries.len(), 1);
        let (width, height) = record.boundaries[0];
        assert!((width - 5.0).abs() < 1e-5 && (height - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_gravity_passes_through() {
        let (controller, _world, _) = controller(ToolKind::Fluid);
        controller.set_gravity(Vec2::new(10.0, 0.0));
        assert_eq!(controller.gravity(), Vec2::new(10.0, 0.0));
    }
}
