//! Tool kinds and the brush settings behind them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wetpaint_core::{
    GroupFlags, ParticleColor, ParticleFlags, Vec2, WetpaintError, MINIMUM_BRUSH_SIZE,
};

/// The drawing tools offered by the canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Move,
    Eraser,
    Fluid,
    Ink,
    Rigid,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Move,
        ToolKind::Eraser,
        ToolKind::Fluid,
        ToolKind::Ink,
        ToolKind::Rigid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Move => "move",
            ToolKind::Eraser => "eraser",
            ToolKind::Fluid => "fluid",
            ToolKind::Ink => "ink",
            ToolKind::Rigid => "rigid",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = WetpaintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| WetpaintError::UnknownTool(s.to_string()))
    }
}

/// Everything that distinguishes one tool from another
#[derive(Clone, Debug, PartialEq)]
pub struct BrushConfig {
    pub particle_flags: ParticleFlags,
    pub group_flags: GroupFlags,
    diameter: f32,
    pub create: bool,
    pub destroy: bool,
    pub color: ParticleColor,
    pub velocity: Vec2,
    /// Merge every stroke into one group for the whole session
    pub persistent_group: bool,
    /// Drag particles under the pointer instead of painting
    pub captures_particles: bool,
    /// Freeze the simulation while any pointer of this tool is down
    pub pauses_simulation: bool,
    pub use_history: bool,
    pub interpolate: bool,
}

impl BrushConfig {
    fn base(diameter: f32) -> Self {
        Self {
            particle_flags: ParticleFlags::WATER,
            group_flags: GroupFlags::empty(),
            diameter: diameter.max(MINIMUM_BRUSH_SIZE),
            create: false,
            destroy: false,
            color: ParticleColor::WHITE,
            velocity: Vec2::ZERO,
            persistent_group: false,
            captures_particles: false,
            pauses_simulation: false,
            use_history: true,
            interpolate: true,
        }
    }

    pub fn for_tool(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Ink => Self {
                particle_flags: ParticleFlags::WALL | ParticleFlags::BARRIER,
                group_flags: GroupFlags::SOLID | GroupFlags::CAN_BE_EMPTY,
                create: true,
                destroy: true,
                persistent_group: true,
                ..Self::base(MINIMUM_BRUSH_SIZE)
            },
            ToolKind::Fluid => Self {
                particle_flags: ParticleFlags::WATER | ParticleFlags::COLOR_MIXING,
                group_flags: GroupFlags::CAN_BE_EMPTY,
                create: true,
                destroy: true,
                ..Self::base(MINIMUM_BRUSH_SIZE)
            },
            ToolKind::Eraser => Self {
                destroy: true,
                ..Self::base(MINIMUM_BRUSH_SIZE * 1.25)
            },
            ToolKind::Move => Self {
                captures_particles: true,
                use_history: false,
                interpolate: false,
                ..Self::base(MINIMUM_BRUSH_SIZE * 1.5)
            },
            ToolKind::Rigid => Self {
                group_flags: GroupFlags::RIGID | GroupFlags::SOLID,
                create: true,
                destroy: true,
                pauses_simulation: true,
                ..Self::base(MINIMUM_BRUSH_SIZE)
            },
        }
    }

    pub fn diameter(&self) -> f32 {
        self.diameter
    }

    pub fn radius(&self) -> f32 {
        self.diameter / 2.0
    }

    /// Set the brush diameter, never going below the minimum brush size
    pub fn set_diameter(&mut self, diameter: f32) {
        self.diameter = diameter.max(MINIMUM_BRUSH_SIZE);
    }

    /// Whether flushing a stroke touches the world at all
    pub fn modifies_world(&self) -> bool {
        self.create || self.destroy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_table() {
        let ink = BrushConfig::for_tool(ToolKind::Ink);
        assert!(ink.create && ink.destroy && ink.persistent_group);
        assert_eq!(ink.diameter(), MINIMUM_BRUSH_SIZE);

        let fluid = BrushConfig::for_tool(ToolKind::Fluid);
        assert!(fluid.create && fluid.destroy && !fluid.persistent_group);
        assert_eq!(fluid.group_flags, GroupFlags::CAN_BE_EMPTY);

        let eraser = BrushConfig::for_tool(ToolKind::Eraser);
        assert!(!eraser.create && eraser.destroy);
        assert!((eraser.diameter() - MINIMUM_BRUSH_SIZE * 1.25).abs() < 1e-6);

        let mover = BrushConfig::for_tool(ToolKind::Move);
        assert!(!mover.modifies_world());
        assert!(mover.captures_particles && !mover.interpolate && !mover.use_history);
        assert!((mover.diameter() - MINIMUM_BRUSH_SIZE * 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_diameter_never_below_minimum() {
        let mut brush = BrushConfig::for_tool(ToolKind::Fluid);
        brush.set_diameter(0.01);
        assert_eq!(brush.diameter(), MINIMUM_BRUSH_SIZE);
        brush.set_diameter(0.5);
        assert_eq!(brush.radius(), 0.25);
    }

    #[test]
    fn test_tool_kind_parsing() {
        assert_eq!("Fluid".parse::<ToolKind>().unwrap(), ToolKind::Fluid);
        assert!(matches!(
            "brush".parse::<ToolKind>(),
            Err(WetpaintError::UnknownTool(_))
        ));
    }
}
