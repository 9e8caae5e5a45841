//! The render thread: simulation step, snapshot and every GPU call
//!
//! The UI thread talks to it only through a command channel and reads back
//! the latest `FrameStats`.

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use wetpaint_core::GroupFlags;
use wetpaint_render::{FluidRenderer, FrameAcquire, MaterialDescriptors, RenderContext};
use wetpaint_runtime::{FrameOrchestrator, FrameStats, Viewport};
use winit::dpi::PhysicalSize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderCommand {
    Resize(PhysicalSize<u32>),
    Shutdown,
}

/// What the renderer needs to be rebuilt from scratch
#[derive(Debug, Clone)]
pub struct RendererSetup {
    pub descriptors: MaterialDescriptors,
    pub fluid_flags: GroupFlags,
}

impl RendererSetup {
    fn build(&self, context: &RenderContext) -> Result<FluidRenderer, wetpaint_render::RenderError> {
        FluidRenderer::new(
            &context.device,
            &context.queue,
            context.format(),
            &self.descriptors,
            self.fluid_flags,
        )
    }
}

pub struct RenderThread {
    commands: Sender<RenderCommand>,
    stats: Arc<Mutex<FrameStats>>,
    handle: Option<JoinHandle<()>>,
}

impl RenderThread {
    /// Build the renderer on the calling thread, then hand everything to a
    /// new render thread
    pub fn spawn(
        context: RenderContext,
        orchestrator: FrameOrchestrator,
        setup: RendererSetup,
    ) -> Result<Self> {
        let renderer = setup
            .build(&context)
            .context("Failed to build fluid renderer")?;
        let viewport = context.viewport();
        let (commands, receiver) = channel::unbounded();
        let stats = Arc::new(Mutex::new(FrameStats::default()));

        let render_loop = RenderLoop {
            context,
            orchestrator,
            renderer,
            setup,
            viewport,
            stats: stats.clone(),
        };
        let handle = std::thread::Builder::new()
            .name("wetpaint-render".into())
            .spawn(move || render_loop.run(receiver))
            .context("Failed to spawn render thread")?;

        Ok(Self {
            commands,
            stats,
            handle: Some(handle),
        })
    }

    pub fn resize(&self, size: PhysicalSize<u32>) {
        if self.commands.send(RenderCommand::Resize(size)).is_err() {
            log::warn!("Render thread is gone; resize dropped");
        }
    }

    pub fn stats(&self) -> FrameStats {
        *self
            .stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stop the thread and wait for it
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        request_shutdown(&self.commands);
        if handle.join().is_err() {
            log::error!("Render thread panicked");
        }
    }
}

/// Ask the render loop to stop. False when it has already exited.
fn request_shutdown(commands: &Sender<RenderCommand>) -> bool {
    let delivered = commands.send(RenderCommand::Shutdown).is_ok();
    if !delivered {
        log::debug!("Render thread already stopped");
    }
    delivered
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct RenderLoop {
    context: RenderContext,
    orchestrator: FrameOrchestrator,
    renderer: FluidRenderer,
    setup: RendererSetup,
    viewport: Viewport,
    stats: Arc<Mutex<FrameStats>>,
}

enum FrameOutcome {
    Presented,
    Skipped,
    SurfaceLost,
}

impl RenderLoop {
    fn run(mut self, commands: Receiver<RenderCommand>) {
        log::info!("Render thread started");
        loop {
            loop {
                match commands.try_recv() {
                    Ok(RenderCommand::Resize(size)) => self.resize(size),
                    Ok(RenderCommand::Shutdown) | Err(TryRecvError::Disconnected) => {
                        log::info!("Render thread stopping");
                        return;
                    }
                    Err(TryRecvError::Empty) => break,
                }
            }

            if let FrameOutcome::SurfaceLost = self.frame() {
                self.rebuild();
            }
            *self
                .stats
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = self.orchestrator.stats();
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if !self.context.resize(size.width, size.height) {
            return;
        }
        self.viewport = self.context.viewport();
        self.orchestrator.resize_world(self.viewport.world_size());
        log::debug!("Resized to {}x{}", size.width, size.height);
    }

    fn frame(&mut self) -> FrameOutcome {
        let RenderLoop {
            context,
            orchestrator,
            renderer,
            viewport,
            ..
        } = self;

        orchestrator.run_frame(|gate| {
            let output = match context.acquire_frame() {
                FrameAcquire::Ready(output) => output,
                FrameAcquire::Skip => return FrameOutcome::Skipped,
                FrameAcquire::Lost => return FrameOutcome::SurfaceLost,
            };

            let view = output
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            renderer.render(
                &context.device,
                &context.queue,
                gate,
                viewport,
                &view,
                context.size(),
            );
            output.present();
            FrameOutcome::Presented
        })
    }

    /// Reconfigure the surface and rebuild every GPU resource of the
    /// renderer. The old snapshot goes with it.
    fn rebuild(&mut self) {
        log::warn!("Surface lost, rebuilding renderer");
        self.context.recover();
        match self.setup.build(&self.context) {
            Ok(renderer) => self.renderer = renderer,
            Err(e) => log::error!("Renderer rebuild failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_reaches_a_live_loop() {
        let (commands, receiver) = channel::unbounded();
        assert!(request_shutdown(&commands));
        assert_eq!(receiver.try_recv(), Ok(RenderCommand::Shutdown));
    }

    #[test]
    fn test_shutdown_after_loop_exit_is_reported() {
        let (commands, receiver) = channel::unbounded::<RenderCommand>();
        drop(receiver);
        assert!(!request_shutdown(&commands));
    }
}
