//! Error types for event reconstruction

use pfcore::algorithm::correction::CurveError;
use thiserror::Error;

/// Result type for reconstruction operations
pub type RecoResult<T> = Result<T, RecoError>;

/// Errors that abort the processing of an event or a job.
///
/// Regions without an eligible hit and tracks without a calorimeter match are not errors;
/// they only change the shape of the produced collections.
#[derive(Error, Debug)]
pub enum RecoError {
    #[error("missing input collection '{name}' (pass '{pass}')")]
    MissingInputCollection { name: String, pass: String },

    #[error("collection '{name}' exists in more than one pass, specify a pass name")]
    AmbiguousCollection { name: String },

    #[error("collection '{name}' does not hold {expected}")]
    CollectionType { name: String, expected: &'static str },

    #[error("collection '{name}' already exists in pass '{pass}'")]
    DuplicateCollection { name: String, pass: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid correction curve: {0}")]
    Curve(#[from] CurveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecoError {
    pub fn missing(name: &str, pass: &str) -> Self {
        RecoError::MissingInputCollection {
            name: name.to_string(),
            pass: pass.to_string(),
        }
    }
}
