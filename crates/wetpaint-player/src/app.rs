//! The UI thread: window, input and the tool controller

use crate::config::PlayerConfig;
use crate::input::{self, MouseTracker};
use crate::render_thread::{RenderThread, RendererSetup};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wetpaint_core::Vec2;
use wetpaint_physics::{ParticleWorld, PhysicsWorld, SimulationGate};
use wetpaint_render::{MaterialDescriptors, RenderContext};
use wetpaint_runtime::{
    restart_world, FrameOrchestrator, PointerEvent, SimulationSwitch, UpdateDispatcher, Viewport,
};
use wetpaint_tools::{BrushConfig, Controller, ToolKind};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

const TITLE_REFRESH: Duration = Duration::from_millis(250);

pub struct WetpaintApp {
    config: PlayerConfig,
    gate: Arc<SimulationGate>,
    dispatcher: Arc<UpdateDispatcher>,
    switch: SimulationSwitch,
    window: Option<Arc<Window>>,
    controller: Option<Controller>,
    render_thread: Option<RenderThread>,
    mouse: MouseTracker,
    palette_index: usize,
    title: String,
    startup_error: Option<anyhow::Error>,
}

impl WetpaintApp {
    pub fn new(config: PlayerConfig) -> Self {
        let mut world = PhysicsWorld::new();
        world.set_gravity(config.simulation.gravity());
        let switch = SimulationSwitch::new();
        if config.simulation.start_paused {
            switch.pause();
        }

        Self {
            config,
            gate: Arc::new(SimulationGate::new(world)),
            dispatcher: Arc::new(UpdateDispatcher::new()),
            switch,
            window: None,
            controller: None,
            render_thread: None,
            mouse: MouseTracker::default(),
            palette_index: 0,
            title: String::new(),
            startup_error: None,
        }
    }

    /// The error that stopped startup, if any
    pub fn take_startup_error(&mut self) -> Option<anyhow::Error> {
        self.startup_error.take()
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_config = &self.config.window;
        let mut attributes = Window::default_attributes()
            .with_title(&window_config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                window_config.width,
                window_config.height,
            ));
        if window_config.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );

        let context = pollster::block_on(RenderContext::new(window.clone()))
            .context("Failed to initialize GPU")?;
        let viewport = context.viewport();
        restart_world(&self.gate, viewport.world_size());

        let mut controller = Controller::new(
            self.gate.clone(),
            self.dispatcher.clone(),
            self.switch.clone(),
            viewport,
            self.config.strokes,
            self.config.initial_tool,
        );
        if let Some(color) = self.config.palette.first() {
            controller.set_color(*color);
        }

        let orchestrator = FrameOrchestrator::new(
            self.gate.clone(),
            self.dispatcher.clone(),
            self.switch.clone(),
        )
        .with_step_params(self.config.simulation.step_params());
        let setup = RendererSetup {
            descriptors: MaterialDescriptors::load_or_default(&self.config.materials),
            fluid_flags: BrushConfig::for_tool(ToolKind::Fluid).group_flags,
        };
        let render_thread = RenderThread::spawn(context, orchestrator, setup)?;

        self.window = Some(window);
        self.controller = Some(controller);
        self.render_thread = Some(render_thread);
        Ok(())
    }

    fn dispatch(&mut self, event: PointerEvent) {
        if let Some(controller) = &mut self.controller {
            controller.handle_pointer(&event);
        }
    }

    fn key_pressed(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        if key == KeyCode::Escape {
            event_loop.exit();
            return;
        }
        if key == KeyCode::F11 {
            if let Some(window) = &self.window {
                if window.fullscreen().is_some() {
                    window.set_fullscreen(None);
                } else {
                    window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                }
            }
            return;
        }

        let Some(controller) = &mut self.controller else {
            return;
        };
        if let Some(tool) = input::tool_for_key(key) {
            controller.select_tool(tool);
        } else if let Some(gravity) = input::gravity_for_key(key, controller.gravity()) {
            controller.set_gravity(gravity);
            log::info!("Gravity: ({:.1}, {:.1})", gravity.x, gravity.y);
        } else {
            match key {
                KeyCode::KeyC => {
                    self.palette_index = (self.palette_index + 1) % self.config.palette.len().max(1);
                    if let Some(color) = self.config.palette.get(self.palette_index) {
                        controller.set_color(*color);
                    }
                }
                KeyCode::KeyR => {
                    controller.reset();
                }
                KeyCode::Space => {
                    controller.switch().toggle();
                }
                _ => {}
            }
        }
    }

    fn refresh_title(&mut self) {
        let (Some(window), Some(controller), Some(render_thread)) =
            (&self.window, &self.controller, &self.render_thread)
        else {
            return;
        };
        let stats = render_thread.stats();
        let paused = if self.switch.is_running() { "" } else { " | paused" };
        let title = format!(
            "{} | {} | {:.0} fps | {} particles{}",
            self.config.window.title,
            controller.active_tool(),
            stats.fps,
            stats.particle_count,
            paused
        );
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }
}

impl ApplicationHandler for WetpaintApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.initialize(event_loop) {
            log::error!("{:#}", e);
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if new_size.width == 0 || new_size.height == 0 {
                    return;
                }
                if let Some(render_thread) = &self.render_thread {
                    render_thread.resize(new_size);
                }
                if let Some(controller) = &mut self.controller {
                    controller.set_viewport(Viewport::new(new_size.width, new_size.height));
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.mouse
                    .moved(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    if let Some(event) = self.mouse.press() {
                        self.dispatch(event);
                    }
                }
                ElementState::Released => {
                    for event in self.mouse.release() {
                        self.dispatch(event);
                    }
                }
            },

            WindowEvent::CursorLeft { .. } => {
                for event in self.mouse.release() {
                    self.dispatch(event);
                }
            }

            WindowEvent::Touch(touch) => {
                self.dispatch(input::touch_event(&touch));
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(key_code) = event.physical_key {
                        self.key_pressed(event_loop, key_code);
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(event) = self.mouse.take_moves() {
            self.dispatch(event);
        }
        self.refresh_title();
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + TITLE_REFRESH));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut render_thread) = self.render_thread.take() {
            render_thread.shutdown();
        }
        log::info!("Goodbye");
    }
}
