use thiserror::Error;
use vacationstay_common::VacationStayError;

/// Failures while authenticating a request or managing credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailTaken,

    #[error("Failed to hash password")]
    Hashing,

    #[error("Authentication is not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to issue token: {0}")]
    TokenCreation(String),
}

impl From<AuthError> for VacationStayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::InvalidCredentials => {
                VacationStayError::AuthError(err.to_string())
            }
            AuthError::EmailTaken => VacationStayError::ValidationError(err.to_string()),
            AuthError::NotConfigured(msg) => VacationStayError::ConfigError(msg),
            AuthError::Hashing | AuthError::TokenCreation(_) => {
                VacationStayError::InternalError(err.to_string())
            }
        }
    }
}
