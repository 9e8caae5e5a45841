//! Pointer samples to world-space stroke points

use crate::brush::BrushConfig;
use crate::stroke::PointerStroke;
use wetpaint_core::Vec2;
use wetpaint_runtime::{PointerEvent, Viewport};

/// Point `index` of `count` evenly weighted points strictly between `from`
/// and `to`: `(from * (index + 1) + to * (count - index)) / (count + 1)`
pub fn lerp_fixed_interval(from: Vec2, to: Vec2, index: usize, count: usize) -> Vec2 {
    (from * (index + 1) as f32 + to * (count - index) as f32) / (count + 1) as f32
}

/// Interior points between `from` and `to`, one per `spacing` of distance
pub fn interpolate(from: Vec2, to: Vec2, spacing: f32) -> impl Iterator<Item = Vec2> {
    let count = if spacing > 0.0 {
        (from.distance(to) / spacing) as usize
    } else {
        0
    };
    (0..count).map(move |index| lerp_fixed_interval(from, to, index, count))
}

/// Converts raw pointer samples into world points for one brush
#[derive(Clone, Copy, Debug)]
pub struct StrokeSampler {
    viewport: Viewport,
}

impl StrokeSampler {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Screen position to a world point kept one brush radius inside the walls
    pub fn to_world(&self, screen: Vec2, brush: &BrushConfig) -> Vec2 {
        self.viewport
            .clamp_to_world(self.viewport.screen_to_world(screen), brush.radius())
    }

    /// World points for every sample of `event`, in order.
    ///
    /// Each sample contributes the interpolated points from the stroke's
    /// previous point (when the brush interpolates) followed by the sample
    /// itself, which becomes the stroke's new last point.
    pub fn sample(
        &self,
        stroke: &mut PointerStroke,
        event: &PointerEvent,
        brush: &BrushConfig,
    ) -> Vec<Vec2> {
        let mut points = Vec::new();
        for screen in event.samples(brush.use_history) {
            let world = self.to_world(screen, brush);
            if brush.interpolate {
                if let Some(last) = stroke.last_point() {
                    points.extend(interpolate(last, world, brush.radius()));
                }
            }
            points.push(world);
            stroke.set_last_point(world);
        }
        points
    }
}
