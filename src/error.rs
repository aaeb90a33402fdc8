//! Error types for mapping construction and record extraction

use thiserror::Error;

/// Errors surfaced by the extraction engine.
///
/// Missing optional fields and unparsable numbers are not errors: they
/// degrade to zero values. Only structural and configuration failures
/// show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The mapping's root selector matched nothing in the document
    #[error("root selector '{selector}' matched nothing")]
    RootNotFound { selector: String },

    /// A selector in the mapping could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The mapping declaration is inconsistent or could not be deserialized
    #[error("invalid mapping: {0}")]
    InvalidMapping(String),
}

impl From<serde_json::Error> for ExtractError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidMapping(e.to_string())
    }
}
