use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use sprig::engine::events::{KeyEvent, KeyKind, MouseEvent, MouseKind};
use sprig::engine::game_loop::{Command, Display, GameLoop, LoopHandle};
use sprig::engine::resources::{Color, Resource};
use sprig::engine::scene::{CollideHandler, ObjectId, SceneObject};
use sprig::engine::stage::Stage;
use sprig::engine::timer::TimeListener;
use sprig::games::Game;

const FAST: u32 = 500;

#[derive(Default, Clone)]
struct Recorder {
    repaints: Arc<AtomicUsize>,
    exits: Arc<AtomicUsize>,
}

impl Display for Recorder {
    fn request_repaint(&self) {
        self.repaints.fetch_add(1, Ordering::SeqCst);
    }

    fn request_exit(&self) {
        self.exits.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Failure {
    None,
    Error,
    Panic,
}

struct Probe {
    refreshes: Arc<AtomicUsize>,
    clicks: Arc<AtomicUsize>,
    keys: Arc<AtomicUsize>,
    failure: Failure,
    allow_exit: bool,
    fail_init: bool,
}

impl Probe {
    fn new() -> Self {
        Self {
            refreshes: Arc::new(AtomicUsize::new(0)),
            clicks: Arc::new(AtomicUsize::new(0)),
            keys: Arc::new(AtomicUsize::new(0)),
            failure: Failure::None,
            allow_exit: true,
            fail_init: false,
        }
    }
}

impl Game for Probe {
    fn name(&self) -> &str {
        "probe"
    }

    fn on_init(&mut self, _stage: &mut Stage) -> Result<()> {
        if self.fail_init {
            bail!("no assets");
        }
        Ok(())
    }

    fn on_refresh(&mut self, _stage: &mut Stage) -> Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Failure::None => Ok(()),
            Failure::Error => bail!("refresh failed"),
            Failure::Panic => panic!("refresh exploded"),
        }
    }

    fn on_click(&mut self, _stage: &mut Stage, _event: &MouseEvent) {
        self.clicks.fetch_add(1, Ordering::SeqCst);
    }

    fn on_key(&mut self, _stage: &mut Stage, _event: &KeyEvent) {
        self.keys.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exit(&mut self, _stage: &mut Stage) -> bool {
        self.allow_exit
    }
}

fn fast_stage() -> Stage {
    let stage = Stage::new(32, 32, Color::BLACK);
    stage.set_refresh_per_second(FAST);
    stage
}

fn start(game: Probe, display: Recorder) -> LoopHandle {
    GameLoop::new(game, fast_stage(), display).start().unwrap()
}

fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn ticks_paint_and_request_repaints() {
    let game = Probe::new();
    let refreshes = game.refreshes.clone();
    let display = Recorder::default();
    let handle = start(game, display.clone());

    wait_until("three ticks", || refreshes.load(Ordering::SeqCst) >= 3);
    wait_until("repaints", || display.repaints.load(Ordering::SeqCst) >= 3);
    assert!(handle.frames().frame_number() >= 1);
    assert!(handle.is_running());
}

#[test]
fn pause_suspends_hooks_but_keeps_the_thread() {
    let game = Probe::new();
    let refreshes = game.refreshes.clone();
    let handle = start(game, Recorder::default());
    wait_until("first tick", || refreshes.load(Ordering::SeqCst) >= 1);

    handle.pause();
    // let any iteration already past the pause check finish
    thread::sleep(Duration::from_millis(50));
    let frozen = refreshes.load(Ordering::SeqCst);
    let frame = handle.frames().frame_number();
    thread::sleep(Duration::from_millis(100));

    assert_eq!(refreshes.load(Ordering::SeqCst), frozen);
    assert_eq!(handle.frames().frame_number(), frame);
    assert!(handle.is_running());
    assert!(handle.is_paused());

    handle.resume();
    wait_until("ticks after resume", || refreshes.load(Ordering::SeqCst) > frozen);
}

#[test]
fn paused_loop_skips_time_listeners() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    let mut stage = fast_stage();
    stage.add_time_listener(TimeListener::every(Duration::ZERO, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    stage.pause();
    let handle = GameLoop::new(Probe::new(), stage, Recorder::default()).start().unwrap();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    handle.resume();
    wait_until("listener after resume", || fired.load(Ordering::SeqCst) >= 1);
}

#[test]
fn failing_hook_does_not_stop_the_loop() {
    for failure in [Failure::Error, Failure::Panic] {
        let mut game = Probe::new();
        game.failure = failure;
        let refreshes = game.refreshes.clone();
        let handle = start(game, Recorder::default());

        wait_until("repeated failing ticks", || refreshes.load(Ordering::SeqCst) >= 5);
        assert!(handle.is_running());
        assert!(handle.frames().frame_number() >= 4);
    }
}

#[test]
fn panicking_collision_handler_does_not_stop_the_loop() {
    let game = Probe::new();
    let refreshes = game.refreshes.clone();
    let handle = start(game, Recorder::default());
    let added = Arc::new(AtomicBool::new(false));
    let flag = added.clone();

    handle.edit(move |stage| {
        let wall = SceneObject::rectangle(Color::BLUE, 0.0, 0.0, 20.0, 20.0);
        let on_hit: CollideHandler = Arc::new(|_: ObjectId, _: ObjectId| panic!("collision failure"));
        let mut crate_box = SceneObject::rectangle(Color::RED, 5.0, 5.0, 10.0, 10.0);
        crate_box.add_collision_target(wall.id(), Some(on_hit));
        stage.add(wall);
        stage.add(crate_box);
        flag.store(true, Ordering::SeqCst);
    });
    wait_until("colliding objects", || added.load(Ordering::SeqCst));
    let seen = refreshes.load(Ordering::SeqCst);
    let frame = handle.frames().frame_number();

    wait_until("ticks after the failing handler", || refreshes.load(Ordering::SeqCst) > seen + 3);
    assert!(handle.is_running());
    assert!(handle.frames().frame_number() > frame);
}

#[test]
fn edits_are_applied_on_the_tick_thread() {
    let handle = start(Probe::new(), Recorder::default());
    let applied = Arc::new(AtomicBool::new(false));
    let flag = applied.clone();

    assert!(handle.edit(move |stage| {
        stage.add(SceneObject::rectangle(Color::RED, 0.0, 0.0, 32.0, 32.0));
        flag.store(true, Ordering::SeqCst);
    }));
    wait_until("edit", || applied.load(Ordering::SeqCst));
    let after_edit = handle.frames().frame_number();
    wait_until("a paint after the edit", || handle.frames().frame_number() > after_edit);

    match handle.screen_cut() {
        Resource::RasterImage(image) => assert!(image.pixels().all(|p| *p == Color::RED.to_rgba())),
        other => panic!("unexpected screen cut {other:?}"),
    }
}

#[test]
fn input_commands_reach_the_game() {
    let game = Probe::new();
    let (clicks, keys) = (game.clicks.clone(), game.keys.clone());
    let handle = start(game, Recorder::default());

    handle.send(Command::Mouse(MouseEvent::new(MouseKind::Clicked, 3.0, 4.0)));
    handle.send(Command::Key(KeyEvent::new(KeyKind::Pressed, "Space")));

    wait_until("click", || clicks.load(Ordering::SeqCst) == 1);
    wait_until("key", || keys.load(Ordering::SeqCst) == 1);
}

#[test]
fn losing_focus_pauses_by_default() {
    let handle = start(Probe::new(), Recorder::default());

    handle.send(Command::Focus(false));
    wait_until("pause", || handle.is_paused());
    handle.send(Command::Focus(true));
    wait_until("resume", || !handle.is_paused());
}

#[test]
fn confirmed_close_stops_and_requests_exit() {
    let display = Recorder::default();
    let handle = start(Probe::new(), display.clone());

    handle.send(Command::Close);

    wait_until("thread exit", || !handle.is_running());
    assert!(handle.control().is_stopped());
    assert_eq!(display.exits.load(Ordering::SeqCst), 1);
}

#[test]
fn declined_close_keeps_running() {
    let mut game = Probe::new();
    game.allow_exit = false;
    let refreshes = game.refreshes.clone();
    let display = Recorder::default();
    let handle = start(game, display.clone());

    handle.send(Command::Close);
    let seen = refreshes.load(Ordering::SeqCst);
    wait_until("ticks after close", || refreshes.load(Ordering::SeqCst) > seen + 2);

    assert!(handle.is_running());
    assert_eq!(display.exits.load(Ordering::SeqCst), 0);
}

#[test]
fn close_without_confirmation_skips_the_game() {
    let mut game = Probe::new();
    game.allow_exit = false;
    let display = Recorder::default();
    let handle = GameLoop::new(game, fast_stage(), display.clone())
        .confirm_exit(false)
        .start()
        .unwrap();

    handle.send(Command::Close);

    wait_until("thread exit", || !handle.is_running());
    assert_eq!(display.exits.load(Ordering::SeqCst), 1);
}

#[test]
fn stop_joins_the_thread() {
    let mut handle = start(Probe::new(), Recorder::default());
    handle.stop();

    assert!(!handle.is_running());
    assert!(!handle.send(Command::Close));
}

#[test]
fn failed_init_does_not_start() {
    let mut game = Probe::new();
    game.fail_init = true;

    let err = GameLoop::new(game, fast_stage(), Recorder::default()).start().unwrap_err();
    assert!(format!("{err:#}").contains("no assets"));
}
