//! Core error types for eventos.
//!
//! [`EventosError`] covers HTTP-level conditions, persistence failures,
//! validation, configuration, template and serialization errors. Every
//! variant maps to an HTTP status code via [`EventosError::status_code`].

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// A validation error with optional per-field errors.
///
/// Simple errors carry a single message; compound errors carry a map from
/// field name to the messages produced for that field.
///
/// # Examples
///
/// ```
/// use eventos_core::error::ValidationError;
///
/// let err = ValidationError::new("This field is required.", "required");
/// assert_eq!(err.to_string(), "This field is required.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
    /// Per-field error messages, keyed by field name.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            message: String::new(),
            code: "invalid".to_string(),
            field_errors,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            return write!(f, "{}", self.message);
        }
        let mut first = true;
        for (field, errors) in &self.field_errors {
            for error in errors {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {error}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for eventos.
#[derive(Error, Debug)]
pub enum EventosError {
    // ── HTTP errors ──────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 405 Method Not Allowed.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    // ── Persistence errors ───────────────────────────────────────────

    /// A lookup expected exactly one record but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// An operational database error (connection failure, worker panic, ...).
    #[error("Operational error: {0}")]
    OperationalError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Templates ────────────────────────────────────────────────────

    /// A template failed to load or render.
    #[error("Template error: {0}")]
    TemplateError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ── Security ─────────────────────────────────────────────────────

    /// A signed value was tampered with or malformed.
    #[error("Suspicious operation: {0}")]
    SuspiciousOperation(String),
}

impl EventosError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest`, `ValidationError` -> 400
    /// - `SuspiciousOperation` -> 403
    /// - `NotFound`, `DoesNotExist` -> 404
    /// - `MethodNotAllowed` -> 405
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) => 400,
            Self::SuspiciousOperation(_) => 403,
            Self::NotFound(_) | Self::DoesNotExist(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::DatabaseError(_)
            | Self::OperationalError(_)
            | Self::ConfigurationError(_)
            | Self::TemplateError(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns `true` for errors that mean "no such record".
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::DoesNotExist(_))
    }
}

impl From<serde_json::Error> for EventosError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, EventosError>`.
pub type EventosResult<T> = Result<T, EventosError>;
