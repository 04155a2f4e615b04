use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load image `{path}`")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read config `{path}`")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config `{path}`")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn tick thread")]
    LoopSpawn(#[source] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
