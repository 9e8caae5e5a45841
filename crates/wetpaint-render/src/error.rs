//! Render error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),
    #[error("No GPU adapter available")]
    AdapterNotFound,
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),
    #[error("Failed to read back frame: {0}")]
    BufferReadFailed(String),
    #[error("Failed to build render pipelines: {0}")]
    PipelineCreation(String),
    #[error("Invalid material binding '{material}': {reason}")]
    Material { material: String, reason: String },
    #[error("Failed to load texture: {0}")]
    Texture(String),
}
