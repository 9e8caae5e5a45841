//! Material descriptors and shader bindings
//!
//! A `MaterialBinding` names the vertex attributes and textures a shader
//! expects and the blend function it draws with. Attribute and texture
//! positions in the binding are their shader locations and bind slots.
//!
//! Tunable values live in a JSON descriptor file so they can be adjusted
//! without a rebuild. Every field is optional.

use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Float32,
    /// Unsigned bytes read back as 0..1 floats
    Unorm8,
}

impl ComponentType {
    pub fn size(self) -> u64 {
        match self {
            Self::Float32 => 4,
            Self::Unorm8 => 1,
        }
    }
}

/// One named per-instance vertex stream
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttributeBinding {
    pub name: &'static str,
    pub components: u32,
    pub component_type: ComponentType,
    pub stride: u64,
}

impl VertexAttributeBinding {
    pub const fn new(
        name: &'static str,
        components: u32,
        component_type: ComponentType,
        stride: u64,
    ) -> Self {
        Self {
            name,
            components,
            component_type,
            stride,
        }
    }

    pub fn format(&self) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;
        match (self.component_type, self.components) {
            (ComponentType::Float32, 1) => Some(F::Float32),
            (ComponentType::Float32, 2) => Some(F::Float32x2),
            (ComponentType::Float32, 3) => Some(F::Float32x3),
            (ComponentType::Float32, 4) => Some(F::Float32x4),
            (ComponentType::Unorm8, 2) => Some(F::Unorm8x2),
            (ComponentType::Unorm8, 4) => Some(F::Unorm8x4),
            _ => None,
        }
    }
}

/// Source and destination factors applied to color and alpha alike
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendFunction {
    pub src: wgpu::BlendFactor,
    pub dst: wgpu::BlendFactor,
}

impl BlendFunction {
    pub const REPLACE: Self = Self {
        src: wgpu::BlendFactor::One,
        dst: wgpu::BlendFactor::Zero,
    };
    pub const PREMULTIPLIED: Self = Self {
        src: wgpu::BlendFactor::One,
        dst: wgpu::BlendFactor::OneMinusSrcAlpha,
    };
    pub const STRAIGHT_ALPHA: Self = Self {
        src: wgpu::BlendFactor::SrcAlpha,
        dst: wgpu::BlendFactor::OneMinusSrcAlpha,
    };

    /// `None` when the function simply replaces the target
    pub fn blend_state(&self) -> Option<wgpu::BlendState> {
        if *self == Self::REPLACE {
            return None;
        }
        let component = wgpu::BlendComponent {
            src_factor: self.src,
            dst_factor: self.dst,
            operation: wgpu::BlendOperation::Add,
        };
        Some(wgpu::BlendState {
            color: component,
            alpha: component,
        })
    }
}

/// What a shader consumes, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialBinding {
    pub name: &'static str,
    pub attributes: Vec<VertexAttributeBinding>,
    pub textures: Vec<&'static str>,
    pub blend: BlendFunction,
}

impl MaterialBinding {
    pub fn new(name: &'static str, blend: BlendFunction) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            textures: Vec::new(),
            blend,
        }
    }

    pub fn with_attribute(mut self, attribute: VertexAttributeBinding) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_texture(mut self, name: &'static str) -> Self {
        self.textures.push(name);
        self
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .position(|a| a.name == name)
            .map(|i| i as u32)
    }

    pub fn texture_slot(&self, name: &str) -> Option<u32> {
        self.textures
            .iter()
            .position(|t| *t == name)
            .map(|i| i as u32)
    }

    /// Build one instance-stepped vertex buffer layout per attribute and
    /// hand them to `f`
    pub fn with_vertex_layouts<R>(
        &self,
        f: impl FnOnce(&[wgpu::VertexBufferLayout<'_>]) -> R,
    ) -> Result<R, RenderError> {
        let mut attributes = Vec::with_capacity(self.attributes.len());
        for (location, binding) in self.attributes.iter().enumerate() {
            let format = binding.format().ok_or_else(|| RenderError::Material {
                material: self.name.to_string(),
                reason: format!(
                    "attribute '{}' has unsupported layout {} x {:?}",
                    binding.name, binding.components, binding.component_type
                ),
            })?;
            let size = binding.component_type.size() * binding.components as u64;
            if binding.stride < size {
                return Err(RenderError::Material {
                    material: self.name.to_string(),
                    reason: format!(
                        "attribute '{}' stride {} is smaller than its size {}",
                        binding.name, binding.stride, size
                    ),
                });
            }
            attributes.push([wgpu::VertexAttribute {
                format,
                offset: 0,
                shader_location: location as u32,
            }]);
        }

        let layouts: Vec<wgpu::VertexBufferLayout<'_>> = self
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(binding, attribute)| wgpu::VertexBufferLayout {
                array_stride: binding.stride,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: attribute,
            })
            .collect();
        Ok(f(&layouts))
    }
}

fn default_one() -> f32 {
    1.0
}

/// Point sprite parameters for one particle class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteMaterialDesc {
    #[serde(default = "default_one")]
    pub particle_size_scale: f32,
    #[serde(default = "default_one")]
    pub weight_scale: f32,
    #[serde(default)]
    pub weight_range_shift: f32,
    #[serde(default = "default_one")]
    pub weight_cutoff: f32,
    #[serde(default)]
    pub diffuse_texture: Option<PathBuf>,
}

impl Default for SpriteMaterialDesc {
    fn default() -> Self {
        Self {
            particle_size_scale: 1.0,
            weight_scale: 1.0,
            weight_range_shift: 0.0,
            weight_cutoff: 1.0,
            diffuse_texture: None,
        }
    }
}

/// Threshold applied when a particle surface is drawn to the screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenMaterialDesc {
    #[serde(default)]
    pub alpha_threshold: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperMaterialDesc {
    #[serde(default)]
    pub diffuse_texture: Option<PathBuf>,
}

/// Every tunable material the renderer uses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescriptors {
    #[serde(default)]
    pub water_particle: SpriteMaterialDesc,
    #[serde(default)]
    pub other_particle: SpriteMaterialDesc,
    #[serde(default)]
    pub water_to_screen: ScreenMaterialDesc,
    #[serde(default)]
    pub other_to_screen: ScreenMaterialDesc,
    #[serde(default)]
    pub paper: PaperMaterialDesc,
}

impl MaterialDescriptors {
    pub fn from_json_str(json: &str) -> wetpaint_core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load descriptors from `path`, falling back to defaults when the file
    /// is missing or malformed. Texture paths are resolved against the
    /// file's directory.
    pub fn load_or_default(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!(
                    "Material descriptors {} unavailable ({}), using defaults",
                    path.display(),
                    e
                );
                return Self::default();
            }
        };
        match Self::from_json_str(&json) {
            Ok(mut descriptors) => {
                if let Some(dir) = path.parent() {
                    descriptors.resolve_paths(dir);
                }
                log::info!("Loaded material descriptors from {}", path.display());
                descriptors
            }
            Err(e) => {
                log::error!(
                    "Malformed material descriptors {}: {}. Using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        for texture in [
            &mut self.water_particle.diffuse_texture,
            &mut self.other_particle.diffuse_texture,
            &mut self.paper.diffuse_texture,
        ] {
            if let Some(path) = texture {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let descriptors = MaterialDescriptors::from_json_str("{}").unwrap();
        assert_eq!(descriptors, MaterialDescriptors::default());
        assert_eq!(descriptors.water_particle.particle_size_scale, 1.0);
        assert_eq!(descriptors.water_particle.weight_cutoff, 1.0);
        assert_eq!(descriptors.water_to_screen.alpha_threshold, 0.0);
        assert!(descriptors.paper.diffuse_texture.is_none());
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let json = r#"{
            "water_particle": { "particle_size_scale": 2.5 },
            "water_to_screen": { "alpha_threshold": 0.3 }
        }"#;
        let descriptors = MaterialDescriptors::from_json_str(json).unwrap();
        assert_eq!(descriptors.water_particle.particle_size_scale, 2.5);
        assert_eq!(descriptors.water_particle.weight_scale, 1.0);
        assert_eq!(descriptors.water_to_screen.alpha_threshold, 0.3);
        assert_eq!(descriptors.other_particle, SpriteMaterialDesc::default());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(MaterialDescriptors::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let descriptors =
            MaterialDescriptors::load_or_default(Path::new("/nonexistent/materials.json"));
        assert_eq!(descriptors, MaterialDescriptors::default());
    }

    #[test]
    fn test_relative_textures_resolve_against_file() {
        let mut descriptors = MaterialDescriptors::default();
        descriptors.paper.diffuse_texture = Some(PathBuf::from("paper.png"));
        descriptors.other_particle.diffuse_texture = Some(PathBuf::from("/abs/dot.png"));
        descriptors.resolve_paths(Path::new("assets"));
        assert_eq!(
            descriptors.paper.diffuse_texture,
            Some(PathBuf::from("assets/paper.png"))
        );
        assert_eq!(
            descriptors.other_particle.diffuse_texture,
            Some(PathBuf::from("/abs/dot.png"))
        );
    }

    #[test]
    fn test_binding_lookup() {
        let binding = MaterialBinding::new("sprite", BlendFunction::PREMULTIPLIED)
            .with_attribute(VertexAttributeBinding::new("position", 2, ComponentType::Float32, 8))
            .with_attribute(VertexAttributeBinding::new("color", 4, ComponentType::Unorm8, 4))
            .with_texture("diffuse");
        assert_eq!(binding.attribute_location("color"), Some(1));
        assert_eq!(binding.attribute_location("weight"), None);
        assert_eq!(binding.texture_slot("diffuse"), Some(0));

        let formats = binding
            .with_vertex_layouts(|layouts| {
                layouts
                    .iter()
                    .map(|l| (l.array_stride, l.attributes[0].format, l.attributes[0].shader_location))
                    .collect::<Vec<_>>()
            })
            .unwrap();
        assert_eq!(
            formats,
            vec![
                (8, wgpu::VertexFormat::Float32x2, 0),
                (4, wgpu::VertexFormat::Unorm8x4, 1)
            ]
        );
    }

    #[test]
    fn test_unsupported_attribute_rejected() {
        let binding = MaterialBinding::new("broken", BlendFunction::REPLACE)
            .with_attribute(VertexAttributeBinding::new("color", 3, ComponentType::Unorm8, 3));
        assert!(matches!(
            binding.with_vertex_layouts(|_| ()),
            Err(RenderError::Material { .. })
        ));

        let narrow = MaterialBinding::new("narrow", BlendFunction::REPLACE)
            .with_attribute(VertexAttributeBinding::new("position", 2, ComponentType::Float32, 4));
        assert!(narrow.with_vertex_layouts(|_| ()).is_err());
    }

    #[test]
    fn test_blend_states() {
        assert!(BlendFunction::REPLACE.blend_state().is_none());
        let state = BlendFunction::STRAIGHT_ALPHA.blend_state().unwrap();
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.alpha.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }
}
