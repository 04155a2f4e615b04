use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::button::{Button, Clickable};
use super::events::{KeyEvent, KeyListener, MouseEvent};
use super::game_loop::{guarded, LoopControl};
use super::resources::{Color, Resource};
use super::scene::{Collidable, ObjectId, SceneObject};
use super::timer::{ListenerId, TimeListener};

/// Anything `Stage::add` accepts; buttons go to their own layer.
#[derive(Debug, Clone)]
pub enum Entity {
    Object(SceneObject),
    Button(Button),
}

impl From<SceneObject> for Entity {
    fn from(obj: SceneObject) -> Self {
        Entity::Object(obj)
    }
}

impl From<Button> for Entity {
    fn from(button: Button) -> Self {
        Entity::Button(button)
    }
}

/// Everything a paint pass reads: objects, buttons, listeners, background.
/// Owned by the tick thread once the loop is started.
#[derive(Debug)]
pub struct Stage {
    width: u32,
    height: u32,
    background: Resource,
    objects: Vec<SceneObject>,
    buttons: Vec<Button>,
    time_listeners: Vec<TimeListener>,
    key_listeners: Vec<KeyListener>,
    control: Arc<LoopControl>,
    rng: StdRng,
}

impl Stage {
    pub fn new(width: u32, height: u32, background: impl Into<Resource>) -> Self {
        Self {
            width,
            height,
            background: background.into(),
            objects: Vec::new(),
            buttons: Vec::new(),
            time_listeners: Vec::new(),
            key_listeners: Vec::new(),
            control: Arc::new(LoopControl::default()),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn background(&self) -> &Resource {
        &self.background
    }

    pub fn set_background(&mut self, background: impl Into<Resource>) {
        self.background = background.into();
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
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

    pub fn set_refresh_per_second(&self, refresh: u32) {
        self.control.set_refresh_per_second(refresh);
    }

    pub fn add(&mut self, entity: impl Into<Entity>) -> ObjectId {
        match entity.into() {
            Entity::Object(obj) => {
                let id = obj.id();
                tracing::trace!(target: "engine", %id, "object added");
                self.objects.push(obj);
                id
            }
            Entity::Button(button) => {
                let id = button.id();
                tracing::trace!(target: "engine", %id, "button added");
                self.buttons.push(button);
                id
            }
        }
    }

    pub fn add_all<I>(&mut self, entities: I)
    where
        I: IntoIterator,
        I::Item: Into<Entity>,
    {
        for entity in entities {
            self.add(entity);
        }
    }

    /// Removes the first object or button with this id from whichever layer
    /// holds it. Returns whether anything was removed.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        if let Some(index) = self.objects.iter().position(|o| o.id() == id) {
            self.objects.remove(index);
            return true;
        }
        if let Some(index) = self.buttons.iter().position(|b| b.id() == id) {
            self.buttons.remove(index);
            return true;
        }
        false
    }

    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = ObjectId>) -> usize {
        ids.into_iter().filter(|id| self.remove(*id)).count()
    }

    /// Empties the plain-object layer only.
    pub fn clear_objects(&mut self) {
        self.objects.clear();
    }

    pub fn remove_dead(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| o.alive);
        before - self.objects.len()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.objects.iter_mut()
    }

    pub fn button_mut(&mut self, id: ObjectId) -> Option<&mut Button> {
        self.buttons.iter_mut().find(|b| b.id() == id)
    }

    pub fn add_time_listener(&mut self, listener: TimeListener) -> ListenerId {
        let id = listener.id();
        self.time_listeners.push(listener);
        id
    }

    pub fn add_time_listeners(&mut self, listeners: impl IntoIterator<Item = TimeListener>) {
        self.time_listeners.extend(listeners);
    }

    pub fn remove_time_listener(&mut self, id: ListenerId) -> bool {
        let before = self.time_listeners.len();
        self.time_listeners.retain(|l| l.id() != id);
        before != self.time_listeners.len()
    }

    pub fn remove_time_listeners(&mut self, ids: &[ListenerId]) {
        self.time_listeners.retain(|l| !ids.contains(&l.id()));
    }

    pub fn time_listener_count(&self) -> usize {
        self.time_listeners.len()
    }

    pub fn add_key_listener(&mut self, listener: KeyListener) {
        self.key_listeners.push(listener);
    }

    /// Checks every time listener against `now`. Listeners may edit the
    /// stage, including registering more listeners; those are kept and first
    /// checked on the next tick.
    pub fn check_time_listeners(&mut self, now: Instant) -> usize {
        let mut listeners = std::mem::take(&mut self.time_listeners);
        let mut fired = 0;
        for listener in &mut listeners {
            let id = listener.id();
            if guarded("time listener", || Ok(listener.check(now, self))) == Some(true) {
                tracing::trace!(target: "tick", ?id, "time listener fired");
                fired += 1;
            }
        }
        listeners.retain(|l| !l.is_exhausted());
        listeners.append(&mut self.time_listeners);
        self.time_listeners = listeners;
        fired
    }

    /// Offers a press/release to every button, overlapping ones included.
    /// A panicking handler is logged and the remaining buttons still get the
    /// event. Returns how many fired.
    pub fn touch(&self, event: &MouseEvent) -> usize {
        if !event.is_touch() {
            return 0;
        }
        self.buttons
            .iter()
            .filter(|button| guarded("button", || Ok(button.touch(event))) == Some(true))
            .count()
    }

    pub fn dispatch_key(&mut self, event: &KeyEvent) {
        for listener in &mut self.key_listeners {
            listener.dispatch(event);
        }
    }

    /// Two passes over the live objects: every animation advances first, then
    /// every collision check runs against the resulting positions.
    pub fn update_objects(&mut self, dt: Duration) {
        for obj in self.objects.iter_mut().filter(|o| o.alive) {
            obj.advance_animation(dt);
        }
        let peers: Vec<_> = self
            .objects
            .iter()
            .filter(|o| o.alive)
            .map(|o| (o.id(), o.collide_box()))
            .collect();
        for obj in self.objects.iter_mut().filter(|o| o.alive) {
            obj.check_collision(&peers);
        }
        let rng = &mut self.rng;
        for obj in self.objects.iter_mut().filter(|o| o.alive) {
            obj.refresh_particles(rng);
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::new(640, 480, Color::LIGHT_GRAY)
    }
}
