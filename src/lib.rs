pub mod engine;
pub mod games;

pub use engine::core::EngineConfig;
pub use engine::EngineApp;
