use std::path::PathBuf;

use puncover_core::CoreError;
use thiserror::Error;

use crate::enhancers::Field;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid collector config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Pass '{pass}' runs before anything produces {missing:?}")]
    PipelineOrder { pass: &'static str, missing: Field },
    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, CollectorError>;
