//! wetpaint - paint with water, ink and rigid shapes on a live particle canvas
//!
//! Usage:
//!   wetpaint [--config <wetpaint.toml>] [--materials <materials.json>] [--tool <name>]

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use wetpaint_player::config::LOCAL_CONFIG_FILE;
use wetpaint_player::{PlayerConfig, WetpaintApp};
use wetpaint_tools::{FlushPolicy, ToolKind};
use winit::event_loop::{ControlFlow, EventLoop};

#[derive(Parser)]
#[command(name = "wetpaint")]
#[command(about = "Paint with water, ink and rigid shapes on a live particle canvas")]
struct Args {
    /// Project config layered over the global config
    #[arg(long, default_value = LOCAL_CONFIG_FILE)]
    config: PathBuf,

    /// Material descriptor JSON
    #[arg(long)]
    materials: Option<PathBuf>,

    /// Tool selected at startup (move, eraser, fluid, ink, rigid)
    #[arg(long)]
    tool: Option<ToolKind>,

    /// Window width in logical pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in logical pixels
    #[arg(long)]
    height: Option<u32>,

    /// Launch in fullscreen mode
    #[arg(long)]
    fullscreen: bool,

    /// Start with the simulation paused
    #[arg(long)]
    paused: bool,

    /// Apply leftover stroke points when the pointer lifts
    #[arg(long)]
    flush_on_release: bool,
}

impl Args {
    fn apply(&self, config: &mut PlayerConfig) {
        if let Some(materials) = &self.materials {
            config.materials = materials.clone();
        }
        if let Some(tool) = self.tool {
            config.initial_tool = tool;
        }
        if let Some(width) = self.width {
            config.window.width = width.max(1);
        }
        if let Some(height) = self.height {
            config.window.height = height.max(1);
        }
        config.window.fullscreen |= self.fullscreen;
        config.simulation.start_paused |= self.paused;
        if self.flush_on_release {
            config.strokes.flush_policy = FlushPolicy::WhenFullOrReleased;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = PlayerConfig::load(&args.config);
    args.apply(&mut config);

    println!("Controls:");
    println!("  Left drag  - Use the current tool");
    println!("  1-5        - Move / Eraser / Fluid / Ink / Rigid");
    println!("  C          - Next color");
    println!("  Arrows     - Point gravity");
    println!("  Space      - Pause / resume");
    println!("  R          - Clear the canvas");
    println!("  F11        - Toggle fullscreen");
    println!("  Escape     - Exit");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = WetpaintApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.take_startup_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
