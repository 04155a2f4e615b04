use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::game_loop::guarded;
use super::geometry::{CollideBox, Rect, Shape};
use super::particle::ParticleResource;
use super::resources::{Color, Resource};

/// Identity of an object or button. Clones keep the id, so a cloned object
/// compares equal to the one it was cloned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ObjectId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position and size; shared by plain objects and buttons.
pub trait Bounded {
    fn bounds(&self) -> Rect;

    fn contains(&self, x: f64, y: f64) -> bool {
        self.bounds().contains(x, y)
    }
}

pub trait Collidable: Bounded {
    fn collide_box(&self) -> CollideBox;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Pixels per second.
    Move { vx: f64, vy: f64 },
    /// Pixels per second squared, starting from the given velocity.
    Accelerate { vx: f64, vy: f64, ax: f64, ay: f64 },
    /// Width/height change per second.
    Scale { dw: f64, dh: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    motion: Motion,
    lifetime: Option<Duration>,
    elapsed: Duration,
}

impl Animation {
    pub fn new(motion: Motion) -> Self {
        Self {
            motion,
            lifetime: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn moving(vx: f64, vy: f64) -> Self {
        Self::new(Motion::Move { vx, vy })
    }

    pub fn accelerating(ax: f64, ay: f64) -> Self {
        Self::new(Motion::Accelerate { vx: 0.0, vy: 0.0, ax, ay })
    }

    pub fn scaling(dw: f64, dh: f64) -> Self {
        Self::new(Motion::Scale { dw, dh })
    }

    pub fn lasting(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn is_finished(&self) -> bool {
        self.lifetime.is_some_and(|limit| self.elapsed >= limit)
    }

    fn step(&mut self, dt: Duration, body: &mut Rect) {
        let dt = match self.lifetime {
            Some(limit) => dt.min(limit.saturating_sub(self.elapsed)),
            None => dt,
        };
        self.elapsed += dt;
        let secs = dt.as_secs_f64();
        match &mut self.motion {
            Motion::Move { vx, vy } => {
                body.x += *vx * secs;
                body.y += *vy * secs;
            }
            Motion::Accelerate { vx, vy, ax, ay } => {
                body.x += *vx * secs + 0.5 * *ax * secs * secs;
                body.y += *vy * secs + 0.5 * *ay * secs * secs;
                *vx += *ax * secs;
                *vy += *ay * secs;
            }
            Motion::Scale { dw, dh } => {
                body.width = (body.width + *dw * secs).max(0.0);
                body.height = (body.height + *dh * secs).max(0.0);
            }
        }
    }
}

pub type CollideHandler = Arc<dyn Fn(ObjectId, ObjectId) + Send + Sync>;

#[derive(Clone)]
pub struct CollisionTarget {
    pub target: ObjectId,
    pub on_collide: Option<CollideHandler>,
}

impl fmt::Debug for CollisionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionTarget")
            .field("target", &self.target)
            .field("on_collide", &self.on_collide.is_some())
            .finish()
    }
}

/// A drawable entity of the plain-object layer.
#[derive(Debug, Clone)]
pub struct SceneObject {
    id: ObjectId,
    pub body: Rect,
    pub shape: Shape,
    pub resource: Resource,
    pub(crate) particles: Option<ParticleResource>,
    animations: Vec<Animation>,
    targets: Vec<CollisionTarget>,
    colliding: Vec<ObjectId>,
    pub alive: bool,
}

impl SceneObject {
    pub fn new(resource: impl Into<Resource>, shape: Shape, body: Rect) -> Self {
        Self {
            id: ObjectId::next(),
            body,
            shape,
            resource: resource.into(),
            particles: None,
            animations: Vec::new(),
            targets: Vec::new(),
            colliding: Vec::new(),
            alive: true,
        }
    }

    pub fn rectangle(color: Color, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(color, Shape::Rectangle, Rect::new(x, y, width, height))
    }

    pub fn oval(color: Color, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(color, Shape::Oval, Rect::new(x, y, width, height))
    }

    /// Image object sized to its raster.
    pub fn image(image: Arc<image::RgbaImage>, x: f64, y: f64) -> Self {
        let body = Rect::new(x, y, image.width() as f64, image.height() as f64);
        Self::new(Resource::RasterImage(image), Shape::Rectangle, body)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn is_particle(&self) -> bool {
        self.particles.is_some()
    }

    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animations.push(animation);
        self
    }

    pub fn add_animation(&mut self, animation: Animation) {
        self.animations.push(animation);
    }

    pub fn clear_animations(&mut self) {
        self.animations.clear();
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn add_collision_target(&mut self, target: ObjectId, on_collide: Option<CollideHandler>) {
        self.targets.push(CollisionTarget { target, on_collide });
    }

    pub fn with_collision_target(mut self, target: ObjectId) -> Self {
        self.add_collision_target(target, None);
        self
    }

    /// Targets this object overlapped during the last check.
    pub fn colliding_with(&self) -> &[ObjectId] {
        &self.colliding
    }

    pub fn is_colliding(&self) -> bool {
        !self.colliding.is_empty()
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.body.x += dx;
        self.body.y += dy;
    }

    /// Advances every in-flight animation by `dt`; finished ones are dropped.
    pub fn advance_animation(&mut self, dt: Duration) {
        if self.animations.is_empty() {
            return;
        }
        for animation in &mut self.animations {
            animation.step(dt, &mut self.body);
        }
        self.animations.retain(|animation| !animation.is_finished());
    }

    /// Tests against `peers`, which must hold the current pass's boxes.
    pub fn check_collision(&mut self, peers: &[(ObjectId, CollideBox)]) {
        self.colliding.clear();
        if self.targets.is_empty() {
            return;
        }
        let own = self.collide_box();
        for target in &self.targets {
            for (peer_id, peer_box) in peers {
                if *peer_id != target.target || *peer_id == self.id {
                    continue;
                }
                if own.collides(peer_box) {
                    if !self.colliding.contains(peer_id) {
                        self.colliding.push(*peer_id);
                    }
                    if let Some(handler) = &target.on_collide {
                        let (own_id, peer_id) = (self.id, *peer_id);
                        guarded("collision handler", || {
                            handler(own_id, peer_id);
                            Ok(())
                        });
                    }
                }
            }
        }
    }
}

impl Bounded for SceneObject {
    fn bounds(&self) -> Rect {
        self.body
    }
}

impl Collidable for SceneObject {
    fn collide_box(&self) -> CollideBox {
        CollideBox::new(self.shape, self.body)
    }
}

impl PartialEq for SceneObject {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
