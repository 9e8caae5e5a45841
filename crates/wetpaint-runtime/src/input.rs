//! Pointer samples delivered by the host shell

use wetpaint_core::Vec2;

/// Identifies one finger or the mouse for the duration of a stroke
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u64);

/// Where a pointer is in its down/move/up lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The shell abandoned every active pointer
    Cancel,
}

/// One pointer sample in screen pixels (origin top-left, y down)
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub phase: PointerPhase,
    pub position: Vec2,
    /// Samples coalesced since the previous event, oldest first
    pub history: Vec<Vec2>,
}

impl PointerEvent {
    pub fn new(pointer: PointerId, phase: PointerPhase, position: Vec2) -> Self {
        Self {
            pointer,
            phase,
            position,
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<Vec2>) -> Self {
        self.history = history;
        self
    }

    pub fn cancel() -> Self {
        Self::new(PointerId(0), PointerPhase::Cancel, Vec2::ZERO)
    }

    /// Samples in processing order: history when requested, then the current position
    pub fn samples(&self, include_history: bool) -> impl Iterator<Item = Vec2> + '_ {
        let history: &[Vec2] = if include_history { &self.history } else { &[] };
        history.iter().copied().chain(std::iter::once(self.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_put_history_first() {
        let event = PointerEvent::new(PointerId(1), PointerPhase::Move, Vec2::new(3.0, 0.0))
            .with_history(vec![Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)]);

        let xs: Vec<f32> = event.samples(true).map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);

        let current: Vec<f32> = event.samples(false).map(|p| p.x).collect();
        assert_eq!(current, vec![3.0]);
    }
}
