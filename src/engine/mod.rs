pub mod button;
pub mod canvas;
pub mod compositor;
pub mod core;
pub mod error;
pub mod events;
pub mod game_loop;
pub mod geometry;
pub mod particle;
pub mod platform;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod stage;
pub mod timer;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use self::core::EngineConfig;
use game_loop::{Command, GameLoop, LoopHandle};
use platform::{PlatformLayer, ShellEvent, WindowDisplay};
use renderer::Renderer;
use resources::ResourceManager;
use stage::Stage;
use wgpu::SurfaceError;
use winit::{
    dpi::{LogicalPosition, LogicalSize},
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoopBuilder,
    window::WindowBuilder,
};

use crate::games::Game;

/// The window shell: owns the native window and presenter, forwards input to
/// the tick thread, and shows whatever frame it last published.
pub struct EngineApp {
    config: EngineConfig,
    platform: PlatformLayer,
    resources: ResourceManager,
    game: Box<dyn Game>,
}

impl EngineApp {
    pub fn new(config: EngineConfig, game: impl Game + 'static) -> Self {
        Self {
            platform: PlatformLayer::new(),
            resources: ResourceManager::default(),
            game: Box::new(game),
            config,
        }
    }

    pub fn run(self) -> Result<()> {
        let EngineApp {
            config,
            platform: mut input,
            mut resources,
            game,
        } = self;
        config.validate()?;
        tracing::info!(
            target: "engine",
            app = %config.app_name,
            game = %game.name(),
            "Engine starting"
        );

        let background = config
            .background
            .load(&mut resources)
            .context("unable to set up the background")?;
        let bounds = config.bounds;
        let mut stage = Stage::new(bounds.width, bounds.height, background);
        if let Some(seed) = config.seed {
            stage = stage.with_seed(seed);
        }
        stage.set_refresh_per_second(config.refresh_per_second);

        let event_loop = EventLoopBuilder::<ShellEvent>::with_user_event()
            .build()
            .context("failed to create event loop")?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(format!("{} - {}", config.app_name, game.name()))
                .with_resizable(false)
                .with_visible(config.visible)
                .with_position(LogicalPosition::new(bounds.x, bounds.y))
                .with_inner_size(LogicalSize::new(bounds.width as f64, bounds.height as f64))
                .build(&event_loop)
                .context("failed to create window")?,
        );

        let display = WindowDisplay::new(event_loop.create_proxy());
        let mut handle = GameLoop::boxed(game, stage, display)
            .confirm_exit(config.confirm_exit)
            .start()?;
        let mut renderer: Option<Renderer> = None;

        event_loop
            .run(move |event, target| match event {
                Event::Resumed => {
                    if renderer.is_none() {
                        match pollster::block_on(Renderer::new(window.clone())) {
                            Ok(new_renderer) => {
                                tracing::info!(target: "engine", "renderer initialized");
                                renderer = Some(new_renderer);
                            }
                            Err(err) => {
                                tracing::error!(target: "engine", %err, "failed to initialize renderer");
                                handle.stop();
                                target.exit();
                            }
                        }
                    }
                }
                Event::UserEvent(ShellEvent::Repaint) => window.request_redraw(),
                Event::UserEvent(ShellEvent::Exit) => {
                    tracing::info!(target: "engine", uptime = ?input.uptime(), "exiting");
                    handle.stop();
                    target.exit();
                }
                Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                    WindowEvent::CloseRequested => {
                        tracing::info!(target: "engine", "window close requested");
                        if !handle.send(Command::Close) {
                            target.exit();
                        }
                    }
                    WindowEvent::Focused(focused) => {
                        handle.send(Command::Focus(focused));
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let position = position.to_logical::<f64>(window.scale_factor());
                        input.cursor_moved(position.x, position.y);
                    }
                    WindowEvent::CursorEntered { .. } => {
                        handle.send(Command::Mouse(input.cursor_entered()));
                    }
                    WindowEvent::CursorLeft { .. } => {
                        handle.send(Command::Mouse(input.cursor_left()));
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        let pressed = state == ElementState::Pressed;
                        for event in input.mouse_button(pressed, platform::mouse_button(button)) {
                            handle.send(Command::Mouse(event));
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        for event in input.keyboard(&event) {
                            handle.send(Command::Key(event));
                        }
                    }
                    WindowEvent::Resized(size) => {
                        if let Some(renderer) = renderer.as_mut() {
                            renderer.resize(size);
                        }
                    }
                    WindowEvent::ScaleFactorChanged {
                        mut inner_size_writer,
                        ..
                    } => {
                        let new_size = window.inner_size();
                        let _ = inner_size_writer.request_inner_size(new_size);
                        if let Some(renderer) = renderer.as_mut() {
                            renderer.resize(new_size);
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Some(renderer) = renderer.as_mut() {
                            present(renderer, &handle, &window, target);
                        }
                    }
                    _ => {}
                },
                _ => {}
            })
            .map_err(|err| anyhow!(err))?;

        tracing::info!(target: "engine", "Engine shutdown complete");
        Ok(())
    }
}

fn present(
    renderer: &mut Renderer,
    handle: &LoopHandle,
    window: &winit::window::Window,
    target: &winit::event_loop::EventLoopWindowTarget<ShellEvent>,
) {
    let frame = handle.frames().latest();
    match renderer.render(&frame) {
        Ok(()) => {
            tracing::trace!(target: "paint", presented = renderer.presented(), "frame presented");
        }
        Err(SurfaceError::Lost | SurfaceError::Outdated) => {
            renderer.resize(window.inner_size());
        }
        Err(SurfaceError::OutOfMemory) => {
            tracing::error!(target: "engine", "GPU out of memory, shutting down engine");
            target.exit();
        }
        Err(SurfaceError::Timeout) => {
            tracing::warn!(target: "engine", "surface timeout, retrying next frame");
        }
    }
}
