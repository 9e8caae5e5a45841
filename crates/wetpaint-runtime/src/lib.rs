//! wetpaint Runtime - frame loop infrastructure
//!
//! Provides the building blocks the render thread runs every frame:
//! - `FrameClock`: frame timing and once-per-second FPS measurement
//! - `PointerEvent`: pointer samples delivered by the host shell
//! - `Viewport`: screen to world mapping
//! - `UpdateDispatcher` / `FrameListener`: per-frame callbacks run under the gate
//! - `SimulationSwitch`: shared pause/resume flag
//! - `FrameOrchestrator`: notify, step, render

mod clock;
mod dispatcher;
mod input;
mod orchestrator;
mod switch;
mod viewport;

pub use clock::FrameClock;
pub use dispatcher::{FrameListener, ListenerId, UpdateDispatcher};
pub use input::{PointerEvent, PointerId, PointerPhase};
pub use orchestrator::{restart_world, FrameOrchestrator, FrameStats};
pub use switch::SimulationSwitch;
pub use viewport::Viewport;
