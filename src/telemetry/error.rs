use log::Level;
use thiserror::Error;

use crate::geo::GeoError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("invalid position: {0}")]
    Position(#[from] GeoError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// Incomplete reports are dropped without an error line.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ReportError::NotAnObject | ReportError::MissingField(_))
    }

    /// Level the processor logs this rejection at.
    pub fn level(&self) -> Level {
        if self.is_incomplete() {
            Level::Debug
        } else {
            Level::Warn
        }
    }
}
