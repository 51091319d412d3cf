//! Error types for catalog mirroring

use std::fmt;

use thiserror::Error;

/// Result type alias using the crate's error type
pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Malformed RDF document: {reason}")]
    MalformedDocument { reason: String },

    #[error("Invalid IRI '{0}'")]
    InvalidIri(String),

    #[error("Failed to fetch from {endpoint}: {reason}")]
    Fetch { endpoint: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Dataset '{part}' cannot become a part of '{parent}': series would contain a cycle")]
    SeriesCycle { parent: String, part: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CatalogError {
    pub(crate) fn malformed(reason: impl fmt::Display) -> Self {
        CatalogError::MalformedDocument {
            reason: reason.to_string(),
        }
    }
}

/// Displays an error followed by every `source()` below it, joined with `: `
pub struct ErrorChain<'a>(pub &'a (dyn std::error::Error + 'static));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, ": {}", cause)?;
            source = cause.source();
        }
        Ok(())
    }
}
