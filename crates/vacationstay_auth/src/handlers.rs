// --- File: crates/vacationstay_auth/src/handlers.rs ---

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::info;
use vacationstay_common::{not_found, validation_error, VacationStayError};
use vacationstay_db::{
    DbError, NewUser, Role, SqlUserRepository, User, UserChanges, UserRepository, LOCAL_PROVIDER,
};

use crate::error::AuthError;
use crate::extractor::{AuthUser, JwtProvider};
use crate::jwt::JwtKeys;
use crate::logic::{
    normalize_email, validate_profile_update, validate_registration, AuthResponse, LoginRequest,
    RegisterRequest, UpdateProfileRequest, UserResponse,
};
use crate::password::PasswordHasher;

// Shared state for the account routes
#[derive(Clone)]
pub struct AuthState {
    pub users: SqlUserRepository,
    pub jwt: Arc<JwtKeys>,
    pub hasher: PasswordHasher,
}

impl JwtProvider for AuthState {
    fn jwt_keys(&self) -> &JwtKeys {
        &self.jwt
    }
}

impl AuthState {
    fn auth_response(&self, user: User, message: Option<&str>) -> Result<AuthResponse, AuthError> {
        let token = self.jwt.issue(&user)?;
        Ok(AuthResponse {
            message: message.map(str::to_string),
            token,
            token_type: "Bearer".to_string(),
            user: user.into(),
            expires_in: self.jwt.expiration_ms(),
        })
    }
}

/// Create a local account and sign it in.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid fields or e-mail already in use", body = vacationstay_common::ErrorResponse)
    ),
    tag = "Auth"
))]
pub async fn register_handler(
    State(state): State<Arc<AuthState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), VacationStayError> {
    let registration = validate_registration(&payload)?;

    if state.users.exists_by_email(&registration.email).await? {
        return Err(AuthError::EmailTaken.into());
    }

    let password_hash = state.hasher.hash(&registration.password)?;
    let user = state
        .users
        .create(NewUser {
            name: registration.name,
            email: registration.email,
            password_hash: Some(password_hash),
            image_url: None,
            provider: LOCAL_PROVIDER.to_string(),
            provider_id: None,
            roles: BTreeSet::from([Role::User]),
        })
        .await
        .map_err(|e| match e {
            DbError::Conflict(_) => AuthError::EmailTaken.into(),
            other => VacationStayError::from(other),
        })?;

    info!("Registered user {} ({})", user.id, user.email);
    let response = state.auth_response(user, Some("User registered successfully"))?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange e-mail and password for a bearer token.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = vacationstay_common::ErrorResponse)
    ),
    tag = "Auth"
))]
pub async fn login_handler(
    State(state): State<Arc<AuthState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, VacationStayError> {
    let email = normalize_email(&payload.email);

    // Unknown e-mail, external account and wrong password all look the same,
    // and all cost one key derivation.
    let user = state.users.find_by_email(&email).await?;
    let verified = match user.as_ref().and_then(|user| user.password_hash.as_deref()) {
        Some(stored) => state.hasher.verify(&payload.password, stored),
        None => state.hasher.verify_missing(&payload.password),
    };
    let user = user
        .filter(|_| verified)
        .ok_or(AuthError::InvalidCredentials)?;

    info!("User {} signed in", user.id);
    Ok(Json(state.auth_response(user, None)?))
}

/// The signed-in user's profile.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
))]
pub async fn me_handler(
    State(state): State<Arc<AuthState>>,
    caller: AuthUser,
) -> Result<Json<UserResponse>, VacationStayError> {
    let user = state
        .users
        .find_by_id(caller.id)
        .await?
        .ok_or_else(|| not_found("User not found"))?;
    Ok(Json(user.into()))
}

/// Change name, picture or (local accounts only) password.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid fields", body = vacationstay_common::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
))]
pub async fn update_me_handler(
    State(state): State<Arc<AuthState>>,
    caller: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, VacationStayError> {
    validate_profile_update(&payload)?;

    let user = state
        .users
        .find_by_id(caller.id)
        .await?
        .ok_or_else(|| not_found("User not found"))?;

    let password_hash = match payload.password.as_deref() {
        Some(_) if !user.is_local() => {
            return Err(validation_error(
                "Password can only be changed for e-mail accounts",
            ));
        }
        Some(password) => Some(state.hasher.hash(password)?),
        None => None,
    };

    let changes = UserChanges {
        name: payload.name.map(|name| name.trim().to_string()),
        password_hash,
        image_url: payload.image_url,
    };
    let updated = state
        .users
        .update(user.id, changes)
        .await?
        .ok_or_else(|| not_found("User not found"))?;

    info!("Updated profile of user {}", updated.id);
    Ok(Json(updated.into()))
}
