//! Error types for the type engine.
//!
//! Validation failures are data ([`Violation`]) and are returned in vectors.
//! This enum covers everything that aborts an operation instead.

use thiserror::Error;

use crate::types::Type;
use crate::violation::Violation;

/// Result type for fallible operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A mutation or type binding that the bound type rejects.
    #[error("{0}")]
    Violation(#[from] Violation),

    #[error("type {0} does not describe maps")]
    NotAMapType(Type),

    #[error("parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("document root is not a map: {0}")]
    NotAMap(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        Error::Parse { offset, message: message.into() }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json(error.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::Yaml(error.to_string())
    }
}
