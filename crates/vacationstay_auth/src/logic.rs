// --- File: crates/vacationstay_auth/src/logic.rs ---

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vacationstay_common::{FieldErrors, VacationStayError};
use vacationstay_db::{Role, User};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_NAME_LEN: usize = 100;

// --- Request/response types ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub image_url: Option<String>,
}

/// Public view of an account; never includes the password hash.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image_url: Option<String>,
    pub provider: String,
    pub roles: Vec<Role>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image_url: user.image_url,
            provider: user.provider,
            roles: user.roles.into_iter().collect(),
            created_at: user.created_at,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub user: UserResponse,
    /// Token lifetime in milliseconds.
    pub expires_in: i64,
}

// --- Validation ---

/// Lower-cased, trimmed e-mail used as the account key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose shape check: one `@`, something before it, a dot in the domain.
pub fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Validated registration fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_registration(req: &RegisterRequest) -> Result<Registration, VacationStayError> {
    let name = req.name.as_deref().unwrap_or("").trim().to_string();
    let email = normalize_email(req.email.as_deref().unwrap_or(""));
    let password = req.password.clone().unwrap_or_default();

    let mut errors = FieldErrors::new();
    errors
        .require(Some(&name), "name", "Name is required")
        .check(name.chars().count() > MAX_NAME_LEN, "name", "Name is too long")
        .require(Some(&email), "email", "Email is required")
        .check(!looks_like_email(&email), "email", "Email should be valid")
        .check(
            password.chars().count() < MIN_PASSWORD_LEN,
            "password",
            "Password must be at least 6 characters",
        );
    errors.into_result()?;

    Ok(Registration {
        name,
        email,
        password,
    })
}

pub fn validate_profile_update(req: &UpdateProfileRequest) -> Result<(), VacationStayError> {
    let mut errors = FieldErrors::new();
    if let Some(name) = &req.name {
        errors
            .require(Some(name), "name", "Name must not be blank")
            .check(name.trim().chars().count() > MAX_NAME_LEN, "name", "Name is too long");
    }
    if let Some(password) = &req.password {
        errors.check(
            password.chars().count() < MIN_PASSWORD_LEN,
            "password",
            "Password must be at least 6 characters",
        );
    }
    errors.into_result()
}
