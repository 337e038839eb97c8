//! Error types for GeoPipes

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeopipesError {
    /// Requested an element past the end of a pipeline. Expected and
    /// recoverable; see [`GeopipesError::is_exhausted`].
    #[error("Pipeline exhausted: no more flows")]
    Exhausted,

    // Filter expression errors
    #[error("CQL syntax error at position {position} in '{expression}': {reason}")]
    CqlSyntax {
        expression: String,
        position: usize,
        reason: String,
    },

    // Geometry errors
    #[error("Unsupported geometry for {operation}: {reason}")]
    UnsupportedGeometry { operation: String, reason: String },

    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("Invalid argument for {operation}: {reason}")]
    InvalidArgument { operation: String, reason: String },

    #[error("WKT parse error: {0}")]
    WktParse(String),

    // Layer and store errors
    #[error("Layer not found: {name}")]
    LayerNotFound { name: String },

    #[error("Layer already exists: {name}")]
    LayerExists { name: String },

    #[error("Record not found: {id}")]
    RecordNotFound { id: u64 },

    #[error("Property names and values differ in length ({names} names, {values} values)")]
    PropertyMismatch { names: usize, values: usize },

    #[error("Store error: {reason}")]
    Store { reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeopipesError {
    /// True for the end-of-sequence condition raised by `Pipeline::next`.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, GeopipesError::Exhausted)
    }

    pub fn unsupported(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        GeopipesError::UnsupportedGeometry { operation: operation.into(), reason: reason.into() }
    }

    pub fn invalid_argument(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        GeopipesError::InvalidArgument { operation: operation.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, GeopipesError>;
