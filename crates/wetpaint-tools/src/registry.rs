//! The set of tools owned by one controller

use crate::brush::ToolKind;
use crate::tool::{StrokeSettings, Tool};
use std::collections::BTreeMap;
use wetpaint_core::ParticleColor;

/// One instance of every tool, each with its own pointer table
pub struct ToolRegistry {
    tools: BTreeMap<ToolKind, Tool>,
}

impl ToolRegistry {
    pub fn new(settings: StrokeSettings) -> Self {
        let tools = ToolKind::ALL
            .into_iter()
            .map(|kind| (kind, Tool::new(kind, settings)))
            .collect();
        Self { tools }
    }

    pub fn get(&self, kind: ToolKind) -> Option<&Tool> {
        self.tools.get(&kind)
    }

    pub fn get_mut(&mut self, kind: ToolKind) -> Option<&mut Tool> {
        self.tools.get_mut(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    /// Paint color for every tool that creates particles
    pub fn set_color(&mut self, color: ParticleColor) {
        for tool in self.tools.values_mut() {
            tool.brush_mut().color = color;
        }
    }

    pub fn reset_all(&mut self) {
        for tool in self.tools.values_mut() {
            tool.reset();
        }
    }

    /// Whether any tool still has a pointer down
    pub fn is_drawing(&self) -> bool {
        self.tools.values().any(|tool| tool.active_pointers() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_registered() {
        let registry = ToolRegistry::new(StrokeSettings::default());
        for kind in ToolKind::ALL {
            assert_eq!(registry.get(kind).unwrap().kind(), kind);
        }
        assert!(!registry.is_drawing());
    }

    #[test]
    fn test_color_reaches_every_tool() {
        let mut registry = ToolRegistry::new(StrokeSettings::default());
        let red = ParticleColor::new(255, 0, 0, 255);
        registry.set_color(red);
        assert!(registry.iter().all(|tool| tool.brush().color == red));
    }
}
