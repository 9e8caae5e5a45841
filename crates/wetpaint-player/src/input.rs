//! winit input to pointer events and canvas commands

use wetpaint_core::Vec2;
use wetpaint_runtime::{PointerEvent, PointerId, PointerPhase};
use wetpaint_tools::ToolKind;
use winit::event::{Touch, TouchPhase};
use winit::keyboard::KeyCode;

pub const MOUSE_POINTER: PointerId = PointerId(0);

/// Turns left-button drags into pointer events.
///
/// Cursor motion between two frames is coalesced into one move event whose
/// history carries the earlier samples.
#[derive(Debug, Default)]
pub struct MouseTracker {
    position: Vec2,
    pressed: bool,
    pending: Vec<Vec2>,
}

impl MouseTracker {
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn moved(&mut self, position: Vec2) {
        self.position = position;
        if self.pressed {
            self.pending.push(position);
        }
    }

    pub fn press(&mut self) -> Option<PointerEvent> {
        if self.pressed {
            return None;
        }
        self.pressed = true;
        self.pending.clear();
        Some(PointerEvent::new(MOUSE_POINTER, PointerPhase::Down, self.position))
    }

    /// Pending motion first, then the lift
    pub fn release(&mut self) -> Vec<PointerEvent> {
        if !self.pressed {
            return Vec::new();
        }
        let mut events: Vec<PointerEvent> = self.take_moves().into_iter().collect();
        self.pressed = false;
        events.push(PointerEvent::new(MOUSE_POINTER, PointerPhase::Up, self.position));
        events
    }

    /// Motion gathered since the last call, as one event
    pub fn take_moves(&mut self) -> Option<PointerEvent> {
        let last = self.pending.pop()?;
        let history = std::mem::take(&mut self.pending);
        Some(PointerEvent::new(MOUSE_POINTER, PointerPhase::Move, last).with_history(history))
    }
}

pub fn touch_phase(phase: TouchPhase) -> PointerPhase {
    match phase {
        TouchPhase::Started => PointerPhase::Down,
        TouchPhase::Moved => PointerPhase::Move,
        TouchPhase::Ended => PointerPhase::Up,
        TouchPhase::Cancelled => PointerPhase::Cancel,
    }
}

/// Fingers get ids after the mouse
pub fn touch_event(touch: &Touch) -> PointerEvent {
    let phase = touch_phase(touch.phase);
    if phase == PointerPhase::Cancel {
        return PointerEvent::cancel();
    }
    PointerEvent::new(
        PointerId(touch.id + 1),
        phase,
        Vec2::new(touch.location.x as f32, touch.location.y as f32),
    )
}

/// Number keys pick tools in their listed order
pub fn tool_for_key(key: KeyCode) -> Option<ToolKind> {
    let index = match key {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        _ => return None,
    };
    ToolKind::ALL.get(index).copied()
}

/// Arrow keys point gravity at a screen edge, keeping its strength
pub fn gravity_for_key(key: KeyCode, current: Vec2) -> Option<Vec2> {
    let magnitude = current.length();
    let direction = match key {
        KeyCode::ArrowDown => Vec2::NEG_Y,
        KeyCode::ArrowUp => Vec2::Y,
        KeyCode::ArrowLeft => Vec2::NEG_X,
        KeyCode::ArrowRight => Vec2::X,
        _ => return None,
    };
    Some(direction * magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_is_down_moves_up() {
        let mut mouse = MouseTracker::default();
        mouse.moved(Vec2::new(5.0, 5.0));
        assert!(mouse.take_moves().is_none());

        let down = mouse.press().unwrap();
        assert_eq!(down.phase, PointerPhase::Down);
        assert_eq!(down.position, Vec2::new(5.0, 5.0));
        assert!(mouse.press().is_none());

        mouse.moved(Vec2::new(6.0, 5.0));
        mouse.moved(Vec2::new(7.0, 5.0));
        mouse.moved(Vec2::new(8.0, 5.0));
        let moved = mouse.take_moves().unwrap();
        assert_eq!(moved.position, Vec2::new(8.0, 5.0));
        assert_eq!(moved.history, vec![Vec2::new(6.0, 5.0), Vec2::new(7.0, 5.0)]);
        assert!(mouse.take_moves().is_none());

        mouse.moved(Vec2::new(9.0, 5.0));
        let events = mouse.release();
        let phases: Vec<PointerPhase> = events.iter().map(|e| e.phase).collect();
        assert_eq!(phases, vec![PointerPhase::Move, PointerPhase::Up]);
        assert!(!mouse.is_pressed());
        assert!(mouse.release().is_empty());
    }

    #[test]
    fn test_touch_phases() {
        assert_eq!(touch_phase(TouchPhase::Started), PointerPhase::Down);
        assert_eq!(touch_phase(TouchPhase::Ended), PointerPhase::Up);
        assert_eq!(touch_phase(TouchPhase::Cancelled), PointerPhase::Cancel);
    }

    #[test]
    fn test_number_keys_select_tools() {
        assert_eq!(tool_for_key(KeyCode::Digit1), Some(ToolKind::ALL[0]));
        assert_eq!(tool_for_key(KeyCode::Digit5), Some(ToolKind::ALL[4]));
        assert_eq!(tool_for_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_arrows_rotate_gravity() {
        let g = Vec2::new(0.0, -10.0);
        assert_eq!(gravity_for_key(KeyCode::ArrowLeft, g), Some(Vec2::new(-10.0, 0.0)));
        assert_eq!(gravity_for_key(KeyCode::ArrowUp, g), Some(Vec2::new(0.0, 10.0)));
        assert_eq!(gravity_for_key(KeyCode::Space, g), None);
    }
}
