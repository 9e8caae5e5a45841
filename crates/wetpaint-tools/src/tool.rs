//! The per-pointer drawing state machine
//!
//! Each pointer goes INACTIVE -> ACTIVE (buffering) on down, flushes a full
//! buffer into the world on move, and returns to INACTIVE on up or cancel.
//! A flush is a single gate acquisition: destroy under every buffered point,
//! then create one group from all of them and fold it into the stroke's
//! existing group when their flags match.

use crate::brush::{BrushConfig, ToolKind};
use crate::mover::ParticleCapture;
use crate::sampler::StrokeSampler;
use crate::stroke::PointerStroke;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use wetpaint_core::{Circle, Vec2};
use wetpaint_physics::{GroupHandle, ParticleGroupDef, SimulationGate};
use wetpaint_runtime::{
    ListenerId, PointerEvent, PointerId, PointerPhase, SimulationSwitch, UpdateDispatcher,
};

/// Default number of points a stroke buffers before flushing
pub const DEFAULT_STROKE_CAPACITY: usize = 256;

/// What happens to points still buffered when a pointer lifts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Only full buffers are applied; the remainder is dropped on release
    #[default]
    WhenFull,
    /// Full buffers are applied, and whatever remains is applied on release
    WhenFullOrReleased,
}

/// Buffering behavior shared by every tool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrokeSettings {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub flush_policy: FlushPolicy,
}

fn default_capacity() -> usize {
    DEFAULT_STROKE_CAPACITY
}

impl Default for StrokeSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_STROKE_CAPACITY,
            flush_policy: FlushPolicy::WhenFull,
        }
    }
}

/// One drawing tool and the strokes of the pointers currently using it
pub struct Tool {
    kind: ToolKind,
    brush: BrushConfig,
    settings: StrokeSettings,
    strokes: HashMap<PointerId, PointerStroke>,
    session_group: Option<GroupHandle>,
    capture: Option<Arc<ParticleCapture>>,
    listener: Option<ListenerId>,
    /// The simulation was running when this tool paused it
    resume_on_release: bool,
}

impl Tool {
    pub fn new(kind: ToolKind, settings: StrokeSettings) -> Self {
        let brush = BrushConfig::for_tool(kind);
        let capture = brush
            .captures_particles
            .then(|| Arc::new(ParticleCapture::new()));
        Self {
            kind,
            brush,
            settings,
            strokes: HashMap::new(),
            session_group: None,
            capture,
            listener: None,
            resume_on_release: false,
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn brush(&self) -> &BrushConfig {
        &self.brush
    }

    pub fn brush_mut(&mut self) -> &mut BrushConfig {
        &mut self.brush
    }

    pub fn settings(&self) -> StrokeSettings {
        self.settings
    }

    /// Pointers currently drawing with this tool
    pub fn active_pointers(&self) -> usize {
        self.strokes.len()
    }

    pub fn stroke(&self, pointer: PointerId) -> Option<&PointerStroke> {
        self.strokes.get(&pointer)
    }

    /// Group every stroke of this session merges into, for persistent tools
    pub fn session_group(&self) -> Option<GroupHandle> {
        self.session_group
    }

    /// Start receiving frame callbacks, for tools that need them
    pub fn activate(&mut self, dispatcher: &UpdateDispatcher) {
        if let (Some(capture), None) = (&self.capture, self.listener) {
            self.listener = Some(dispatcher.register(capture.clone()));
        }
        log::debug!("Activated {} tool", self.kind);
    }

    /// Stop receiving frame callbacks and abandon in-flight strokes
    pub fn deactivate(&mut self, dispatcher: &UpdateDispatcher, switch: &SimulationSwitch) {
        if let Some(id) = self.listener.take() {
            dispatcher.unregister(id);
        }
        self.cancel_all(switch);
        log::debug!("Deactivated {} tool", self.kind);
    }

    /// Forget all pointer state and the session group
    pub fn reset(&mut self) {
        self.strokes.clear();
        self.session_group = None;
        if let Some(capture) = &self.capture {
            capture.clear();
        }
    }

    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        sampler: &StrokeSampler,
        gate: &SimulationGate,
        switch: &SimulationSwitch,
    ) {
        match event.phase {
            PointerPhase::Down => self.pointer_down(event, sampler, gate, switch),
            PointerPhase::Move => self.pointer_move(event, sampler, gate),
            PointerPhase::Up => self.pointer_up(event, sampler, gate, switch),
            PointerPhase::Cancel => self.cancel_all(switch),
        }
    }

    fn pointer_down(
        &mut self,
        event: &PointerEvent,
        sampler: &StrokeSampler,
        gate: &SimulationGate,
        switch: &SimulationSwitch,
    ) {
        if self.brush.pauses_simulation && self.strokes.is_empty() {
            self.resume_on_release = switch.is_running();
            switch.pause();
        }

        let mut stroke = PointerStroke::new(event.pointer, self.settings.capacity);
        if self.brush.persistent_group {
            stroke.set_group(self.session_group);
        }
        let points = sampler.sample(&mut stroke, event, &self.brush);

        if let (Some(capture), Some(point)) = (&self.capture, stroke.last_point()) {
            capture.begin(gate, event.pointer, point, self.brush.radius());
        }

        if self.strokes.contains_key(&event.pointer) {
            log::warn!("Pointer {:?} went down twice; restarting its stroke", event.pointer);
        }
        self.feed(&mut stroke, points, gate);
        self.strokes.insert(event.pointer, stroke);
    }

    fn pointer_move(&mut self, event: &PointerEvent, sampler: &StrokeSampler, gate: &SimulationGate) {
        let Some(mut stroke) = self.strokes.remove(&event.pointer) else {
            log::debug!("Ignoring move of unknown pointer {:?}", event.pointer);
            return;
        };
        let points = sampler.sample(&mut stroke, event, &self.brush);

        if let (Some(capture), Some(point)) = (&self.capture, stroke.last_point()) {
            capture.move_to(event.pointer, point);
        }

        self.feed(&mut stroke, points, gate);
        self.strokes.insert(event.pointer, stroke);
    }

    /// The release sample is drawn like a move before the stroke ends
    fn pointer_up(
        &mut self,
        event: &PointerEvent,
        sampler: &StrokeSampler,
        gate: &SimulationGate,
        switch: &SimulationSwitch,
    ) {
        let pointer = event.pointer;
        if let Some(mut stroke) = self.strokes.remove(&pointer) {
            let points = sampler.sample(&mut stroke, event, &self.brush);
            if let (Some(capture), Some(point)) = (&self.capture, stroke.last_point()) {
                capture.move_to(pointer, point);
            }
            self.feed(&mut stroke, points, gate);

            if self.settings.flush_policy == FlushPolicy::WhenFullOrReleased && !stroke.is_empty() {
                self.apply(&mut stroke, gate);
            }
        }
        if let Some(capture) = &self.capture {
            capture.end(pointer);
        }
        if self.strokes.is_empty() {
            self.release_pause(switch);
        }
    }

    /// Drop every stroke without applying buffered points
    fn cancel_all(&mut self, switch: &SimulationSwitch) {
        self.strokes.clear();
        if let Some(capture) = &self.capture {
            capture.clear();
        }
        self.release_pause(switch);
    }

    /// Undo a pause taken at pointer down, leaving a user pause in place
    fn release_pause(&mut self, switch: &SimulationSwitch) {
        if std::mem::take(&mut self.resume_on_release) {
            switch.resume();
        }
    }

    /// Buffer points, flushing every time the buffer fills
    fn feed(&mut self, stroke: &mut PointerStroke, points: Vec<Vec2>, gate: &SimulationGate) {
        if !self.brush.modifies_world() {
            return;
        }
        for point in points {
            if stroke.push(point) {
                self.apply(stroke, gate);
            }
        }
    }

    /// Apply the buffered points to the world and empty the buffer
    fn apply(&mut self, stroke: &mut PointerStroke, gate: &SimulationGate) {
        if self.brush.persistent_group && self.session_group.is_some() {
            stroke.set_group(self.session_group);
        }

        let radius = self.brush.radius();
        let shapes: Vec<Circle> = stroke
            .points()
            .iter()
            .map(|p| Circle::new(*p, radius))
            .collect();

        let mut world = gate.acquire();
        if self.brush.destroy {
            for shape in &shapes {
                world.destroy_particles_in_shape(shape);
            }
        }
        if self.brush.create {
            let def = ParticleGroupDef {
                flags: self.brush.particle_flags,
                group_flags: self.brush.group_flags,
                shapes,
                linear_velocity: self.brush.velocity,
                color: self.brush.color,
            };
            let created = world.create_particle_group(&def);
            let existing = stroke
                .group()
                .filter(|group| world.group_flags(*group) == Some(def.group_flags));
            match existing {
                Some(group) => world.join_particle_groups(group, created),
                None => stroke.set_group(Some(created)),
            }
        }
        drop(world);

        if self.brush.persistent_group {
            self.session_group = stroke.group();
        }
        stroke.clear_points();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingWorld;
    use wetpaint_core::GroupFlags;
    use wetpaint_runtime::Viewport;

    struct Rig {
        world: RecordingWorld,
        gate: SimulationGate,
        sampler: StrokeSampler,
        switch: SimulationSwitch,
    }

    fn rig() -> Rig {
        let world = RecordingWorld::default();
        Rig {
            gate: SimulationGate::new(world.clone()),
            world,
            // 100 pixels per world unit
            sampler: StrokeSampler::new(Viewport::new(500, 300)),
            switch: SimulationSwitch::new(),
        }
    }

    fn tool(kind: ToolKind, capacity: usize, flush_policy: FlushPolicy) -> Tool {
        let mut tool = Tool::new(
            kind,
            StrokeSettings {
                capacity,
                flush_policy,
            },
        );
        // Keep sampling simple: one point per event
        tool.brush_mut().interpolate = false;
        tool
    }

    fn event(phase: PointerPhase, x: f32) -> PointerEvent {
        PointerEvent::new(PointerId(0), phase, Vec2::new(x, 150.0))
    }

    fn drag(tool: &mut Tool, rig: &Rig, moves: usize) {
        tool.handle_pointer(&event(PointerPhase::Down, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        for i in 0..moves {
            let x = 100.0 + (i + 1) as f32 * 2.0;
            tool.handle_pointer(&event(PointerPhase::Move, x), &rig.sampler, &rig.gate, &rig.switch);
        }
    }

    #[test]
    fn test_tap_without_moves_creates_nothing() {
        let rig = rig();
        let mut tool = tool(ToolKind::Fluid, 256, FlushPolicy::WhenFull);
        tool.handle_pointer(&event(PointerPhase::Down, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        tool.handle_pointer(&event(PointerPhase::Up, 100.0), &rig.sampler, &rig.gate, &rig.switch);

        assert!(rig.world.record().created.is_empty());
        assert_eq!(tool.active_pointers(), 0);
    }

    #[test]
    fn test_one_create_per_full_batch() {
        let rig = rig();
        let mut tool = tool(ToolKind::Fluid, 4, FlushPolicy::WhenFull);
        // 1 down + 9 moves = 10 points: two full batches and 2 left over
        drag(&mut tool, &rig, 9);

        {
            let record = rig.world.record();
            assert_eq!(record.created.len(), 2);
            assert!(record.created.iter().all(|(_, def)| def.shapes.len() == 4));
            let radius = tool.brush().radius();
            assert!(record.created[0].1.shapes.iter().all(|s| s.radius == radius));
            // Destroy runs under every point of each batch
            assert_eq!(record.destroyed.len(), 8);
        }
        assert_eq!(tool.stroke(PointerId(0)).unwrap().len(), 2);

        tool.handle_pointer(&event(PointerPhase::Up, 0.0), &rig.sampler, &rig.gate, &rig.switch);
        assert_eq!(rig.world.record().created.len(), 2);
    }

    #[test]
    fn test_release_flushes_remainder_when_configured() {
        let rig = rig();
        let mut tool = tool(ToolKind::Fluid, 4, FlushPolicy::WhenFullOrReleased);
        drag(&mut tool, &rig, 9);
        tool.handle_pointer(&event(PointerPhase::Up, 0.0), &rig.sampler, &rig.gate, &rig.switch);

        // Two left over from the drag plus the release sample
        let record = rig.world.record();
        assert_eq!(record.created.len(), 3);
        assert_eq!(record.created[2].1.shapes.len(), 3);
        assert_eq!(record.created[2].1.shapes[2].center.x, tool.brush().radius());
    }

    #[test]
    fn test_release_sample_can_fill_the_buffer() {
        let rig = rig();
        let mut tool = tool(ToolKind::Fluid, 2, FlushPolicy::WhenFull);
        tool.handle_pointer(&event(PointerPhase::Down, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        assert!(rig.world.record().created.is_empty());
        tool.handle_pointer(&event(PointerPhase::Up, 102.0), &rig.sampler, &rig.gate, &rig.switch);

        let record = rig.world.record();
        assert_eq!(record.created.len(), 1);
        let shapes = &record.created[0].1.shapes;
        assert_eq!(shapes.len(), 2);
        assert!((shapes[1].center.x - 1.02).abs() < 1e-5);
        drop(record);
        assert_eq!(tool.active_pointers(), 0);
    }

    #[test]
    fn test_release_applies_interpolated_tail() {
        let rig = rig();
        let mut tool = Tool::new(
            ToolKind::Fluid,
            StrokeSettings {
                capacity: 256,
                flush_policy: FlushPolicy::WhenFullOrReleased,
            },
        );
        tool.handle_pointer(&event(PointerPhase::Down, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        tool.handle_pointer(&event(PointerPhase::Move, 110.0), &rig.sampler, &rig.gate, &rig.switch);
        let before_release = tool.stroke(PointerId(0)).unwrap().len();
        tool.handle_pointer(&event(PointerPhase::Up, 300.0), &rig.sampler, &rig.gate, &rig.switch);

        let record = rig.world.record();
        assert_eq!(record.created.len(), 1);
        let shapes = &record.created[0].1.shapes;
        // The jump to the release point is filled in, ending at the release point
        assert!(shapes.len() > before_release + 1);
        let last = shapes[shapes.len() - 1].center;
        assert!((last.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_buffer_never_exceeds_capacity() {
        let rig = rig();
        let mut tool = Tool::new(
            ToolKind::Fluid,
            StrokeSettings {
                capacity: 3,
                flush_policy: FlushPolicy::WhenFull,
            },
        );
        // Interpolation on: long jumps produce many points per event
        tool.handle_pointer(&event(PointerPhase::Down, 10.0), &rig.sampler, &rig.gate, &rig.switch);
        tool.handle_pointer(&event(PointerPhase::Move, 490.0), &rig.sampler, &rig.gate, &rig.switch);
        assert!(tool.stroke(PointerId(0)).unwrap().len() < 3);
        assert!(rig
            .world
            .record()
            .created
            .iter()
            .all(|(_, def)| def.shapes.len() == 3));
    }

    #[test]
    fn test_later_batches_join_the_stroke_group() {
        let rig = rig();
        let mut tool = tool(ToolKind::Fluid, 2, FlushPolicy::WhenFull);
        drag(&mut tool, &rig, 5);

        let record = rig.world.record();
        assert_eq!(record.created.len(), 3);
        let first = record.created[0].0;
        assert_eq!(
            record.joins,
            vec![(first, record.created[1].0), (first, record.created[2].0)]
        );
    }

    #[test]
    fn test_mismatched_flags_start_a_new_group() {
        let rig = rig();
        let mut tool = tool(ToolKind::Fluid, 2, FlushPolicy::WhenFull);
        let foreign = rig.world.add_group(GroupFlags::RIGID);
        tool.handle_pointer(&event(PointerPhase::Down, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        tool.strokes
            .get_mut(&PointerId(0))
            .unwrap()
            .set_group(Some(foreign));
        tool.handle_pointer(&event(PointerPhase::Move, 102.0), &rig.sampler, &rig.gate, &rig.switch);

        let record = rig.world.record();
        assert!(record.joins.is_empty());
        let created = record.created[0].0;
        drop(record);
        assert_eq!(tool.stroke(PointerId(0)).unwrap().group(), Some(created));
    }

    #[test]
    fn test_ink_merges_across_strokes() {
        let rig = rig();
        let mut tool = tool(ToolKind::Ink, 2, FlushPolicy::WhenFull);
        drag(&mut tool, &rig, 1);
        tool.handle_pointer(&event(PointerPhase::Up, 0.0), &rig.sampler, &rig.gate, &rig.switch);
        let session = tool.session_group();
        assert!(session.is_some());

        drag(&mut tool, &rig, 1);
        let record = rig.world.record();
        assert_eq!(record.joins, vec![(session.unwrap(), record.created[1].0)]);
    }

    #[test]
    fn test_eraser_only_destroys() {
        let rig = rig();
        let mut tool = tool(ToolKind::Eraser, 2, FlushPolicy::WhenFull);
        drag(&mut tool, &rig, 1);

        let record = rig.world.record();
        assert!(record.created.is_empty());
        assert_eq!(record.destroyed.len(), 2);
        assert!((record.destroyed[0].radius - tool.brush().radius()).abs() < 1e-6);
    }

    #[test]
    fn test_cancel_drops_buffered_points() {
        let rig = rig();
        let mut tool = tool(ToolKind::Fluid, 256, FlushPolicy::WhenFullOrReleased);
        drag(&mut tool, &rig, 5);
        tool.handle_pointer(&PointerEvent::cancel(), &rig.sampler, &rig.gate, &rig.switch);

        assert_eq!(tool.active_pointers(), 0);
        assert!(rig.world.record().created.is_empty());
    }

    #[test]
    fn test_rigid_pauses_while_drawing() {
        let rig = rig();
        let mut tool = tool(ToolKind::Rigid, 256, FlushPolicy::WhenFull);
        tool.handle_pointer(&event(PointerPhase::Down, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        assert!(!rig.switch.is_running());
        tool.handle_pointer(&event(PointerPhase::Up, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        assert!(rig.switch.is_running());
    }

    #[test]
    fn test_rigid_keeps_a_user_pause() {
        let rig = rig();
        let mut tool = tool(ToolKind::Rigid, 256, FlushPolicy::WhenFull);
        rig.switch.pause();
        tool.handle_pointer(&event(PointerPhase::Down, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        tool.handle_pointer(&event(PointerPhase::Up, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        assert!(!rig.switch.is_running());

        rig.switch.resume();
        tool.handle_pointer(&event(PointerPhase::Down, 100.0), &rig.sampler, &rig.gate, &rig.switch);
        tool.handle_pointer(&PointerEvent::cancel(), &rig.sampler, &rig.gate, &rig.switch);
        assert!(rig.switch.is_running());
    }

    #[test]
    fn test_mover_registers_listener_while_active() {
        let rig = rig();
        let dispatcher = UpdateDispatcher::new();
        let mut tool = Tool::new(ToolKind::Move, StrokeSettings::default());

        tool.activate(&dispatcher);
        tool.activate(&dispatcher);
        assert_eq!(dispatcher.len(), 1);

        drag(&mut tool, &rig, 3);
        assert!(rig.world.record().created.is_empty());
        assert!(rig.world.record().destroyed.is_empty());

        tool.deactivate(&dispatcher, &rig.switch);
        assert!(dispatcher.is_empty());
        assert_eq!(tool.active_pointers(), 0);
    }

    #[test]
    fn test_settings_from_toml() {
        let settings: StrokeSettings = toml::from_str("flush_policy = \"when_full_or_released\"").unwrap();
        assert_eq!(settings.capacity, DEFAULT_STROKE_CAPACITY);
        assert_eq!(settings.flush_policy, FlushPolicy::WhenFullOrReleased);
    }
}
