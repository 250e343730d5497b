use thiserror::Error;

use crate::geo::GeoError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid location: {0}")]
    Location(#[from] GeoError),
    #[error("criteria[{index}]: {message}")]
    Criterion { index: usize, message: String },
    #[error("{0}")]
    Invalid(String),
}
