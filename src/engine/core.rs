use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use super::game_loop::DEFAULT_REFRESH_PER_SECOND;
use super::resources::{Color, Resource, ResourceManager};

/// Window position and size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowBounds {
    pub const SMALL_PHONE: WindowBounds = WindowBounds::new(100, 100, 480, 800);
    pub const BIG_PHONE: WindowBounds = WindowBounds::new(100, 100, 720, 1200);
    pub const HUGE_PHONE: WindowBounds = WindowBounds::new(100, 100, 1080, 1920);
    pub const SMALL_SQUARE: WindowBounds = WindowBounds::new(100, 100, 400, 400);
    pub const BIG_SQUARE: WindowBounds = WindowBounds::new(100, 100, 800, 800);

    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Same origin, width and height swapped.
    pub const fn turned(self) -> Self {
        Self::new(self.x, self.y, self.height, self.width)
    }
}

impl Default for WindowBounds {
    fn default() -> Self {
        WindowBounds::new(200, 200, 640, 480)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackgroundConfig {
    Color(Color),
    Image(PathBuf),
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        BackgroundConfig::Color(Color::LIGHT_GRAY)
    }
}

impl BackgroundConfig {
    /// An image that cannot be loaded is a configuration error.
    pub fn load(&self, resources: &mut ResourceManager) -> EngineResult<Resource> {
        match self {
            BackgroundConfig::Color(color) => Ok(Resource::SolidColor(*color)),
            BackgroundConfig::Image(path) => resources.load_image("background", path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub app_name: String,
    pub bounds: WindowBounds,
    pub refresh_per_second: u32,
    pub background: BackgroundConfig,
    pub visible: bool,
    pub confirm_exit: bool,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "Sprig".to_string(),
            bounds: WindowBounds::default(),
            refresh_per_second: DEFAULT_REFRESH_PER_SECOND,
            background: BackgroundConfig::default(),
            visible: true,
            confirm_exit: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig = ron::from_str(&text).map_err(|source| EngineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(target: "engine", path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.refresh_per_second == 0 {
            return Err(EngineError::InvalidConfig("refresh_per_second must be positive".into()));
        }
        if self.bounds.width == 0 || self.bounds.height == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "window bounds {}x{} are empty",
                self.bounds.width, self.bounds.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: EngineConfig = ron::from_str(
            r#"(
                app_name: "demo",
                bounds: (x: 0, y: 0, width: 400, height: 400),
                background: Color((r: 0, g: 0, b: 0)),
            )"#,
        )
        .unwrap();

        assert_eq!(config.app_name, "demo");
        assert_eq!(config.bounds, WindowBounds::new(0, 0, 400, 400));
        assert_eq!(config.background, BackgroundConfig::Color(Color::BLACK));
        assert_eq!(config.refresh_per_second, DEFAULT_REFRESH_PER_SECOND);
        assert!(config.confirm_exit);
    }

    #[test]
    fn zero_refresh_rate_is_rejected() {
        let config = EngineConfig {
            refresh_per_second: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn missing_background_image_is_fatal() {
        let mut resources = ResourceManager::default();
        let background = BackgroundConfig::Image("missing/background.png".into());
        assert!(background.load(&mut resources).is_err());
    }

    #[test]
    fn turned_swaps_size() {
        assert_eq!(WindowBounds::SMALL_PHONE.turned(), WindowBounds::new(100, 100, 800, 480));
    }
}
