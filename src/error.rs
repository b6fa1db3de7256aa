//! Error types for template interpretation, validation and submission

use thiserror::Error;

/// Errors raised by the engine.
///
/// Every variant aborts the current test immediately. Deferrable validation
/// failures are not errors: they travel inside
/// [`ValidatedFormProperty`](crate::domain::property::ValidatedFormProperty)
/// until submission, where a mismatch surfaces as [`HalError::ExpectedClientError`].
#[derive(Debug, Error)]
pub enum HalError {
    /// Caller passed an argument violating a container invariant
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Property is not declared by the template
    #[error("No property '{0}' found.")]
    UndeclaredProperty(String),

    /// Property is declared read-only by the template
    #[error("Cannot set value for read-only property '{0}'")]
    ReadOnlyProperty(String),

    /// Validation failure that the server cannot be expected to reject
    #[error("{0}")]
    Validation(String),

    /// Template document could not be interpreted
    #[error("Malformed HAL-FORMS template: {0}")]
    MalformedTemplate(String),

    /// Document carries no `_links.self.href`
    #[error("_links.self is missing from the HAL forms representation")]
    MissingSelfLink,

    /// No template under the given key
    #[error("No template found for key '{0}'")]
    TemplateNotFound(String),

    /// Relation absent from the `_links` of a traversed resource
    #[error("Could not find relation '{relation}' at URI {uri}")]
    RelationNotFound { relation: String, uri: String },

    /// Template content type cannot be produced by the form builder
    #[error("Expected content type is '{content_type}'. For now, the only supported content type is 'application/json'.")]
    UnsupportedContentType { content_type: String },

    /// Response content type is not a hypermedia type
    #[error("Response of {uri} has content type {content_type:?} which is not compatible with {expected}")]
    IncompatibleContentType {
        uri: String,
        content_type: Option<String>,
        expected: String,
    },

    /// Response status did not satisfy the expectation of the operation
    #[error("{method} on {uri} failed with code {status} and body '{body}'")]
    UnexpectedResponse {
        method: String,
        uri: String,
        status: u16,
        body: String,
    },

    /// Client-side validation predicted a 4xx that the server did not return
    #[error(
        "An http status code 400 was expected because of the following reasons: [{}]. Got http status code {} instead.",
        .reasons.join(","),
        .status
    )]
    ExpectedClientError { reasons: Vec<String>, status: u16 },

    /// Creation response lacks a `Location` header
    #[error("No header 'Location' found")]
    MissingLocation,

    /// Template regex does not compile
    #[error("Invalid regex '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// URI could not be parsed or resolved
    #[error("Invalid URI '{0}'")]
    InvalidUri(String),

    /// Settings error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HalError {
    /// True for the submission-time reconciliation failure
    pub fn is_expected_client_error(&self) -> bool {
        matches!(self, Self::ExpectedClientError { .. })
    }
}

/// Result type alias for engine operations
pub type HalResult<T> = Result<T, HalError>;
