use image::RgbaImage;
use rand::Rng;

use super::geometry::{Rect, Shape};
use super::resources::{Color, Resource};
use super::scene::SceneObject;

/// Random field of `fore` pixels over `back`, regenerated every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleResource {
    pub width: u32,
    pub height: u32,
    pub fore: Color,
    pub back: Color,
    density: f64,
}

impl ParticleResource {
    pub fn new(width: u32, height: u32, fore: Color, back: Color, density: f64) -> Self {
        Self {
            width,
            height,
            fore,
            back,
            density: if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) },
        }
    }

    /// Share of pixels drawn in `fore`, always in `0.0..=1.0`.
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn generate(&self, rng: &mut impl Rng) -> RgbaImage {
        let fore = self.fore.to_rgba();
        let back = self.back.to_rgba();
        RgbaImage::from_fn(self.width, self.height, |_, _| {
            if rng.gen_bool(self.density) {
                fore
            } else {
                back
            }
        })
    }
}

pub struct ParticleEffect;

impl ParticleEffect {
    /// A plain object whose resource is replaced by a fresh particle frame on
    /// every paint pass.
    pub fn spawn(particles: ParticleResource, x: f64, y: f64) -> SceneObject {
        let body = Rect::new(x, y, particles.width as f64, particles.height as f64);
        let mut obj = SceneObject::new(Resource::SolidColor(particles.back), Shape::Rectangle, body);
        obj.particles = Some(particles);
        obj
    }
}

impl SceneObject {
    /// Re-rolls the particle frame. No-op for ordinary objects.
    pub fn refresh_particles(&mut self, rng: &mut impl Rng) {
        if let Some(particles) = &self.particles {
            self.resource = Resource::image(particles.generate(rng));
        }
    }
}
