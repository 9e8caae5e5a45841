//! Mapping between screen pixels and world units

use wetpaint_core::{Vec2, WORLD_HEIGHT};

/// The visible playfield. World height is fixed; world width follows the
/// screen's aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub screen_width: f32,
    pub screen_height: f32,
    pub world_width: f32,
    pub world_height: f32,
}

impl Viewport {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        let screen_width = screen_width.max(1) as f32;
        let screen_height = screen_height.max(1) as f32;
        Self {
            screen_width,
            screen_height,
            world_width: screen_width * WORLD_HEIGHT / screen_height,
            world_height: WORLD_HEIGHT,
        }
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world_width, self.world_height)
    }

    /// Screen pixels (y down) to world units (y up)
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            self.world_width * screen.x / self.screen_width,
            self.world_height * (self.screen_height - screen.y) / self.screen_height,
        )
    }

    /// Keep a point at least `margin` away from every world edge
    pub fn clamp_to_world(&self, point: Vec2, margin: f32) -> Vec2 {
        let min = Vec2::splat(margin);
        let max = (self.world_size() - Vec2::splat(margin)).max(min);
        point.clamp(min, max)
    }
}
