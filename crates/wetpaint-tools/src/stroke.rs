//! Per-pointer stroke state

use wetpaint_core::Vec2;
use wetpaint_physics::GroupHandle;
use wetpaint_runtime::PointerId;

/// The points a pointer has produced since the last flush, plus the group
/// its earlier flushes created
#[derive(Clone, Debug)]
pub struct PointerStroke {
    pointer: PointerId,
    last_point: Option<Vec2>,
    points: Vec<Vec2>,
    capacity: usize,
    group: Option<GroupHandle>,
}

impl PointerStroke {
    pub fn new(pointer: PointerId, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pointer,
            last_point: None,
            points: Vec::with_capacity(capacity),
            capacity,
            group: None,
        }
    }

    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    /// Newest world point seen, whether or not it is still buffered
    pub fn last_point(&self) -> Option<Vec2> {
        self.last_point
    }

    pub fn set_last_point(&mut self, point: Vec2) {
        self.last_point = Some(point);
    }

    /// Buffer a point. Returns true once the buffer is full and must be flushed.
    ///
    /// Panics if called on a full buffer.
    pub fn push(&mut self, point: Vec2) -> bool {
        assert!(
            self.points.len() < self.capacity,
            "stroke buffer overflow ({} points)",
            self.capacity
        );
        self.points.push(point);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.points.len() >= self.capacity
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    pub fn group(&self) -> Option<GroupHandle> {
        self.group
    }

    pub fn set_group(&mut self, group: Option<GroupHandle>) {
        self.group = group;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_reports_full() {
        let mut stroke = PointerStroke::new(PointerId(0), 3);
        assert!(!stroke.push(Vec2::ZERO));
        assert!(!stroke.push(Vec2::ONE));
        assert!(stroke.push(Vec2::X));
        assert_eq!(stroke.len(), 3);

        stroke.clear_points();
        assert!(stroke.is_empty());
        assert_eq!(stroke.capacity(), 3);
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn test_push_past_capacity_panics() {
        let mut stroke = PointerStroke::new(PointerId(0), 1);
        stroke.push(Vec2::ZERO);
        stroke.push(Vec2::ZERO);
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let stroke = PointerStroke::new(PointerId(0), 0);
        assert_eq!(stroke.capacity(), 1);
    }
}
