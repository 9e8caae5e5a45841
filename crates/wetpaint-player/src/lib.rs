//! wetpaint Player - the interactive canvas
//!
//! The winit UI thread owns the tool `Controller` and turns mouse, touch and
//! keyboard input into canvas commands. A dedicated render thread steps the
//! simulation and draws every frame.

mod app;
pub mod config;
pub mod input;
mod render_thread;

pub use app::WetpaintApp;
pub use config::PlayerConfig;
pub use render_thread::{RenderCommand, RenderThread, RendererSetup};
