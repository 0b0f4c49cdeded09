use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The base error type for all VacationStay errors.
///
/// Each crate extends this by implementing `From<SpecificError> for VacationStayError`.
#[derive(Error, Debug)]
pub enum VacationStayError {
    /// Error occurred while parsing request data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    AuthError(String),

    /// Authenticated, but not allowed to touch the resource
    #[error("{0}")]
    ForbiddenError(String),

    /// A single validation failure
    #[error("{0}")]
    ValidationError(String),

    /// Validation failures keyed by field name
    #[error("{message}")]
    FieldErrors {
        message: String,
        details: BTreeMap<String, String>,
    },

    /// Error occurred during a database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred due to a conflict (e.g. dates already booked)
    #[error("{0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("{0}")]
    NotFoundError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for VacationStayError {
    fn status_code(&self) -> u16 {
        match self {
            VacationStayError::ParseError(_) => 400,
            VacationStayError::ConfigError(_) => 500,
            VacationStayError::AuthError(_) => 401,
            VacationStayError::ForbiddenError(_) => 403,
            VacationStayError::ValidationError(_) => 400,
            VacationStayError::FieldErrors { .. } => 400,
            VacationStayError::DatabaseError(_) => 500,
            VacationStayError::ConflictError(_) => 409,
            VacationStayError::NotFoundError(_) => 404,
            VacationStayError::InternalError(_) => 500,
        }
    }
}

impl VacationStayError {
    /// Field-level details, if this is a [`VacationStayError::FieldErrors`].
    pub fn details(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            VacationStayError::FieldErrors { details, .. } => Some(details),
            _ => None,
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, VacationStayError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, VacationStayError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, VacationStayError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| VacationStayError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, VacationStayError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| VacationStayError::InternalError(format!("{}: {}", f(), error)))
    }
}

impl From<serde_json::Error> for VacationStayError {
    fn from(err: serde_json::Error) -> Self {
        VacationStayError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for VacationStayError {
    fn from(err: std::io::Error) -> Self {
        VacationStayError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> VacationStayError {
    VacationStayError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> VacationStayError {
    VacationStayError::ValidationError(message.to_string())
}

pub fn unauthorized<T: fmt::Display>(message: T) -> VacationStayError {
    VacationStayError::AuthError(message.to_string())
}

pub fn forbidden<T: fmt::Display>(message: T) -> VacationStayError {
    VacationStayError::ForbiddenError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> VacationStayError {
    VacationStayError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> VacationStayError {
    VacationStayError::ConflictError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> VacationStayError {
    VacationStayError::InternalError(message.to_string())
}
