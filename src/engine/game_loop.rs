use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};

use super::compositor::{Compositor, FrameStore};
use super::error::EngineError;
use super::events::{KeyEvent, MouseEvent, MouseKind};
use super::resources::Resource;
use super::stage::Stage;
use crate::games::Game;

pub const DEFAULT_REFRESH_PER_SECOND: u32 = 60;

/// Window side of the loop. Both calls must return immediately; the actual
/// repaint or exit happens on the window's own thread.
pub trait Display: Send {
    fn request_repaint(&self);
    fn request_exit(&self);
}

/// Flags shared between the tick thread and everyone else.
#[derive(Debug)]
pub struct LoopControl {
    paused: AtomicBool,
    stopped: AtomicBool,
    refresh_per_second: AtomicU32,
}

impl Default for LoopControl {
    fn default() -> Self {
        Self {
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            refresh_per_second: AtomicU32::new(DEFAULT_REFRESH_PER_SECOND),
        }
    }
}

impl LoopControl {
    pub fn pause(&self) {
        if !self.paused.swap(true, Ordering::SeqCst) {
            tracing::debug!(target: "tick", "paused");
        }
    }

    pub fn resume(&self) {
        if self.paused.swap(false, Ordering::SeqCst) {
            tracing::debug!(target: "tick", "resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Takes effect at the next loop check; never interrupts a frame.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn set_refresh_per_second(&self, refresh: u32) {
        self.refresh_per_second.store(refresh.max(1), Ordering::SeqCst);
    }

    pub fn refresh_per_second(&self) -> u32 {
        self.refresh_per_second.load(Ordering::SeqCst)
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_per_second().max(1) as f64)
    }
}

pub type StageEdit = Box<dyn FnOnce(&mut Stage) + Send>;

/// Requests marshalled onto the tick thread, applied in arrival order at the
/// start of each iteration.
pub enum Command {
    Mouse(MouseEvent),
    Key(KeyEvent),
    Focus(bool),
    Close,
    Edit(StageEdit),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Mouse(event) => f.debug_tuple("Mouse").field(event).finish(),
            Command::Key(event) => f.debug_tuple("Key").field(event).finish(),
            Command::Focus(focused) => f.debug_tuple("Focus").field(focused).finish(),
            Command::Close => f.write_str("Close"),
            Command::Edit(_) => f.write_str("Edit"),
        }
    }
}

/// Runs user code, turning a returned error or a panic into a log line.
pub(crate) fn guarded<T>(what: &str, f: impl FnOnce() -> Result<T>) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            tracing::warn!(target: "tick", hook = what, error = ?err, "hook failed");
            None
        }
        Err(payload) => {
            tracing::error!(target: "tick", hook = what, panic = panic_message(&*payload), "hook panicked");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// The tick thread's state. Build it, then [`GameLoop::start`] it.
pub struct GameLoop {
    game: Box<dyn Game>,
    stage: Stage,
    compositor: Compositor,
    control: Arc<LoopControl>,
    display: Box<dyn Display>,
    confirm_exit: bool,
    commands: Option<Receiver<Command>>,
    last_paint: Instant,
}

impl GameLoop {
    pub fn new(game: impl Game + 'static, stage: Stage, display: impl Display + 'static) -> Self {
        Self::boxed(Box::new(game), stage, display)
    }

    pub fn boxed(game: Box<dyn Game>, stage: Stage, display: impl Display + 'static) -> Self {
        let compositor = Compositor::new(stage.width(), stage.height());
        Self {
            game,
            control: stage.control().clone(),
            stage,
            compositor,
            display: Box::new(display),
            confirm_exit: true,
            commands: None,
            last_paint: Instant::now(),
        }
    }

    /// When false, a close request exits without asking the game.
    pub fn confirm_exit(mut self, confirm: bool) -> Self {
        self.confirm_exit = confirm;
        self
    }

    /// Runs `on_init`, then spawns the tick thread.
    pub fn start(mut self) -> Result<LoopHandle> {
        let name = self.game.name().to_string();
        self.game
            .on_init(&mut self.stage)
            .with_context(|| format!("`{name}` failed to initialize"))?;

        let (sender, receiver) = unbounded();
        self.commands = Some(receiver);
        self.last_paint = Instant::now();
        let control = self.control.clone();
        let frames = self.compositor.frames().clone();

        let thread = thread::Builder::new()
            .name("sprig-tick".into())
            .spawn(move || self.run())
            .map_err(EngineError::LoopSpawn)?;

        tracing::info!(target: "engine", game = %name, refresh = control.refresh_per_second(), "engine start");
        Ok(LoopHandle {
            control,
            commands: sender,
            frames,
            thread: Some(thread),
        })
    }

    fn run(mut self) {
        tracing::debug!(target: "tick", "tick thread running");
        while !self.control.is_stopped() {
            thread::sleep(self.control.period());
            self.drain_commands();
            if self.control.is_stopped() {
                break;
            }
            if self.control.is_paused() {
                self.last_paint = Instant::now();
                continue;
            }
            self.tick();
        }
        tracing::debug!(target: "tick", "tick thread finished");
    }

    fn tick(&mut self) {
        guarded("on_refresh", || self.game.on_refresh(&mut self.stage));
        self.stage.check_time_listeners(Instant::now());

        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_paint);
        self.last_paint = now;
        let (compositor, stage) = (&mut self.compositor, &mut self.stage);
        if guarded("paint", || Ok(compositor.paint(stage, dt))).is_some() {
            self.display.request_repaint();
        }
    }

    fn drain_commands(&mut self) {
        let Some(commands) = self.commands.take() else {
            return;
        };
        while let Ok(command) = commands.try_recv() {
            self.apply(command);
        }
        self.commands = Some(commands);
    }

    fn apply(&mut self, command: Command) {
        let game = &mut self.game;
        let stage = &mut self.stage;
        match command {
            Command::Mouse(event) => match event.kind {
                MouseKind::Pressed | MouseKind::Released => {
                    let fired = stage.touch(&event);
                    tracing::trace!(target: "input", kind = ?event.kind, x = event.x, y = event.y, fired, "touch");
                    guarded("on_mouse", || {
                        game.on_mouse(stage, &event);
                        Ok(())
                    });
                }
                MouseKind::Clicked => {
                    guarded("on_click", || {
                        game.on_click(stage, &event);
                        Ok(())
                    });
                }
                MouseKind::Entered | MouseKind::Exited => {
                    guarded("on_mouse", || {
                        game.on_mouse(stage, &event);
                        Ok(())
                    });
                }
            },
            Command::Key(event) => {
                guarded("on_key", || {
                    stage.dispatch_key(&event);
                    game.on_key(stage, &event);
                    Ok(())
                });
            }
            Command::Focus(true) => {
                guarded("on_focus", || {
                    game.on_focus(stage);
                    Ok(())
                });
            }
            Command::Focus(false) => {
                guarded("on_lose_focus", || {
                    game.on_lose_focus(stage);
                    Ok(())
                });
            }
            Command::Close => {
                let confirmed = !self.confirm_exit || guarded("on_exit", || Ok(game.on_exit(stage))).unwrap_or(true);
                if confirmed {
                    tracing::info!(target: "engine", "exit confirmed");
                    self.control.stop();
                    self.display.request_exit();
                } else {
                    tracing::info!(target: "engine", "exit declined");
                }
            }
            Command::Edit(edit) => {
                guarded("stage edit", || {
                    edit(stage);
                    Ok(())
                });
            }
        }
    }
}

/// Owner's side of a running loop. Dropping it stops the thread.
#[derive(Debug)]
pub struct LoopHandle {
    control: Arc<LoopControl>,
    commands: Sender<Command>,
    frames: FrameStore,
    thread: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Returns false once the tick thread has gone away.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn edit(&self, edit: impl FnOnce(&mut Stage) + Send + 'static) -> bool {
        self.send(Command::Edit(Box::new(edit)))
    }

    pub fn control(&self) -> &Arc<LoopControl> {
        &self.control
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn screen_cut(&self) -> Resource {
        self.frames.screen_cut()
    }

    /// Signals the thread and waits for its current iteration to end.
    pub fn stop(&mut self) {
        self.control.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!(target: "engine", "tick thread panicked");
            }
        }
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
