pub mod start_window;
pub mod states;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::Rng;

use crate::engine::events::{KeyEvent, KeyKind, MouseEvent};
use crate::engine::particle::{ParticleEffect, ParticleResource};
use crate::engine::resources::Color;
use crate::engine::scene::{Animation, CollideHandler, Motion, ObjectId, SceneObject};
use crate::engine::stage::Stage;
use crate::engine::timer::{ListenerId, TimeListener};
use crate::games::Game;
use start_window::StartWindow;
use states::{GameState, MenuAction};

const GRAVITY: f64 = 600.0;
const BALL_SIZE: f64 = 24.0;
const FLOOR_HEIGHT: f64 = 20.0;
const BOUNCE_DAMPING: f64 = 0.8;

/// Bouncing balls: a title menu, then balls dropping onto a floor every
/// 700ms. Space pauses, Escape returns to the menu, C clears the balls.
#[derive(Debug)]
pub struct SandboxGame {
    pub state: GameState,
    start_window: StartWindow,
    actions: Sender<MenuAction>,
    pending: Receiver<MenuAction>,
    menu: Vec<ObjectId>,
    floor: Option<ObjectId>,
    spawner: Option<ListenerId>,
    bounces: Arc<AtomicU32>,
}

impl SandboxGame {
    pub fn new() -> Self {
        let (actions, pending) = unbounded();
        Self {
            state: GameState::Title,
            start_window: StartWindow::default(),
            actions,
            pending,
            menu: Vec::new(),
            floor: None,
            spawner: None,
            bounces: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn bounces(&self) -> u32 {
        self.bounces.load(Ordering::Relaxed)
    }

    fn show_menu(&mut self, stage: &mut Stage) {
        let buttons = self.start_window.buttons(stage.width(), stage.height(), &self.actions);
        self.menu = buttons.iter().map(|b| b.id()).collect();
        stage.add_all(buttons);
        self.state = GameState::Title;
        tracing::info!(
            target: "sandbox",
            title = self.start_window.title,
            subtitle = self.start_window.subtitle,
            "start window presented"
        );
    }

    fn start_round(&mut self, stage: &mut Stage) {
        stage.remove_all(self.menu.drain(..));
        stage.clear_objects();

        let (width, height) = (stage.width() as f64, stage.height() as f64);
        let floor = SceneObject::rectangle(Color::DARK_GRAY, 0.0, height - FLOOR_HEIGHT, width, FLOOR_HEIGHT);
        let floor_id = stage.add(floor);
        self.floor = Some(floor_id);
        stage.add(ParticleEffect::spawn(
            ParticleResource::new(width as u32, 6, Color::ORANGE, Color::DARK_GRAY, 0.15),
            0.0,
            height - FLOOR_HEIGHT - 6.0,
        ));

        let bounces = self.bounces.clone();
        if let Some(spawner) = self.spawner.take() {
            stage.remove_time_listener(spawner);
        }
        self.spawner = Some(stage.add_time_listener(
            TimeListener::every(Duration::from_millis(700), move |stage: &mut Stage| {
                spawn_ball(stage, floor_id, bounces.clone());
            })
            .times(12),
        ));
        self.state = GameState::Playing;
        tracing::info!(target: "sandbox", "round started");
    }

    fn reset(&mut self, stage: &mut Stage) {
        stage.clear_objects();
        stage.remove_all(self.menu.drain(..));
        self.floor = None;
        if let Some(spawner) = self.spawner.take() {
            stage.remove_time_listener(spawner);
        }
        self.bounces.store(0, Ordering::Relaxed);
        self.show_menu(stage);
    }

    fn bounce_balls(&self, stage: &mut Stage) {
        let Some(floor) = self.floor else {
            return;
        };
        let Some(floor_top) = stage.object(floor).map(|f| f.body.y) else {
            return;
        };
        let width = stage.width() as f64;
        for ball in stage.objects_mut() {
            if ball.id() == floor || ball.is_particle() {
                continue;
            }
            if ball.body.x > width || ball.body.right() < 0.0 {
                ball.alive = false;
                continue;
            }
            let falling = ball.animations().first().map(|a| a.motion());
            if let (true, Some(Motion::Accelerate { vx, vy, .. })) = (ball.is_colliding(), falling) {
                if vy > 0.0 {
                    ball.clear_animations();
                    ball.add_animation(Animation::new(Motion::Accelerate {
                        vx,
                        vy: -vy * BOUNCE_DAMPING,
                        ax: 0.0,
                        ay: GRAVITY,
                    }));
                    ball.body.y = floor_top - ball.body.height;
                }
            }
        }
        stage.remove_dead();
    }
}

fn spawn_ball(stage: &mut Stage, floor: ObjectId, bounces: Arc<AtomicU32>) {
    let width = stage.width() as f64;
    let rng = stage.rng();
    let x = rng.gen_range(0.0..(width - BALL_SIZE).max(1.0));
    let vx = rng.gen_range(-120.0..120.0);
    let color = Color::rgb(rng.gen(), rng.gen(), rng.gen());

    let mut ball = SceneObject::oval(color, x, 0.0, BALL_SIZE, BALL_SIZE).with_animation(Animation::new(Motion::Accelerate {
        vx,
        vy: 0.0,
        ax: 0.0,
        ay: GRAVITY,
    }));
    let on_bounce: CollideHandler = Arc::new(move |_: ObjectId, _: ObjectId| {
        bounces.fetch_add(1, Ordering::Relaxed);
    });
    ball.add_collision_target(floor, Some(on_bounce));
    stage.add(ball);
}

impl Default for SandboxGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for SandboxGame {
    fn name(&self) -> &str {
        "Sandbox"
    }

    fn on_init(&mut self, stage: &mut Stage) -> Result<()> {
        self.show_menu(stage);
        Ok(())
    }

    fn on_refresh(&mut self, stage: &mut Stage) -> Result<()> {
        while let Ok(action) = self.pending.try_recv() {
            match action {
                MenuAction::Start => self.start_round(stage),
                MenuAction::Reset => self.reset(stage),
            }
        }
        if self.state == GameState::Playing {
            self.bounce_balls(stage);
        }
        Ok(())
    }

    fn on_click(&mut self, _stage: &mut Stage, event: &MouseEvent) {
        tracing::debug!(target: "sandbox", x = event.x, y = event.y, state = ?self.state, "click");
    }

    fn on_key(&mut self, stage: &mut Stage, event: &KeyEvent) {
        if event.kind != KeyKind::Pressed {
            return;
        }
        if event.is("Space") {
            if stage.is_paused() {
                stage.resume();
            } else {
                stage.pause();
            }
        } else if event.is("Escape") {
            self.reset(stage);
        } else if event.is("c") && self.state == GameState::Playing {
            let floor = self.floor;
            for obj in stage.objects_mut() {
                if Some(obj.id()) != floor && !obj.is_particle() {
                    obj.alive = false;
                }
            }
            stage.remove_dead();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::MouseKind;

    fn press_and_release(stage: &Stage, x: f64, y: f64) {
        stage.touch(&MouseEvent::new(MouseKind::Pressed, x, y));
        stage.touch(&MouseEvent::new(MouseKind::Released, x, y));
    }

    #[test]
    fn start_button_begins_a_round() {
        let mut stage = Stage::new(400, 300, Color::BLACK).with_seed(3);
        let mut game = SandboxGame::new();
        game.on_init(&mut stage).unwrap();
        assert_eq!(stage.buttons().len(), 2);

        let start = stage.buttons()[0].bounds;
        press_and_release(&stage, start.x + 1.0, start.y + 1.0);
        game.on_refresh(&mut stage).unwrap();

        assert_eq!(game.state, GameState::Playing);
        assert!(stage.buttons().is_empty());
        assert_eq!(stage.time_listener_count(), 1);
        // floor and particle strip
        assert_eq!(stage.objects().len(), 2);
    }

    #[test]
    fn escape_returns_to_menu() {
        let mut stage = Stage::new(400, 300, Color::BLACK);
        let mut game = SandboxGame::new();
        game.on_init(&mut stage).unwrap();
        game.start_round(&mut stage);

        game.on_key(&mut stage, &KeyEvent::new(KeyKind::Pressed, "Escape"));

        assert_eq!(game.state, GameState::Title);
        assert!(stage.objects().is_empty());
        assert_eq!(stage.buttons().len(), 2);
        assert_eq!(stage.time_listener_count(), 0);
    }
}
