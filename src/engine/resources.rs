use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    u8::MAX
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const LIGHT_GRAY: Color = Color::rgb(192, 192, 192);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const DARK_GRAY: Color = Color::rgb(64, 64, 64);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const ORANGE: Color = Color::rgb(255, 200, 0);
    pub const PINK: Color = Color::rgb(255, 175, 175);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: u8::MAX }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self { r, g, b, a }
    }
}

/// Drawable content. Cheap to clone: images are shared behind an [`Arc`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    SolidColor(Color),
    RasterImage(Arc<RgbaImage>),
}

impl Resource {
    pub fn color(color: Color) -> Self {
        Resource::SolidColor(color)
    }

    pub fn image(image: RgbaImage) -> Self {
        Resource::RasterImage(Arc::new(image))
    }

    pub fn load_image(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| EngineError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), width = image.width(), height = image.height(), "image loaded");
        Ok(Resource::image(image.to_rgba8()))
    }

    pub fn as_image(&self) -> Option<&Arc<RgbaImage>> {
        match self {
            Resource::RasterImage(image) => Some(image),
            Resource::SolidColor(_) => None,
        }
    }
}

impl From<Color> for Resource {
    fn from(color: Color) -> Self {
        Resource::SolidColor(color)
    }
}

/// Keyed image cache so the same file is decoded once.
#[derive(Default, Debug)]
pub struct ResourceManager {
    images: HashMap<String, Resource>,
}

impl ResourceManager {
    pub fn load_image(&mut self, key: impl Into<String>, path: impl AsRef<Path>) -> EngineResult<Resource> {
        let key = key.into();
        if let Some(resource) = self.images.get(&key) {
            return Ok(resource.clone());
        }
        let resource = Resource::load_image(path)?;
        tracing::debug!(%key, "registering image");
        self.images.insert(key, resource.clone());
        Ok(resource)
    }

    pub fn insert(&mut self, key: impl Into<String>, resource: Resource) {
        self.images.insert(key.into(), resource);
    }

    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.images.get(key)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_is_a_load_error() {
        let err = Resource::load_image("does/not/exist.png").unwrap_err();
        assert!(matches!(err, EngineError::ImageLoad { .. }));
    }

    #[test]
    fn manager_returns_cached_resource() {
        let mut manager = ResourceManager::default();
        manager.insert("dot", Resource::image(RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255]))));

        let cached = manager.load_image("dot", "never/read.png").unwrap();
        let image = cached.as_image().unwrap();
        assert_eq!(Color::from(*image.get_pixel(0, 0)), Color::rgb(1, 2, 3));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn color_parses_without_alpha() {
        let color: Color = ron::from_str("(r: 10, g: 20, b: 30)").unwrap();
        assert_eq!(color, Color::rgb(10, 20, 30));
    }
}
