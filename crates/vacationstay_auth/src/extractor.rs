//! The session accessor: who is calling.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use vacationstay_common::{forbidden, VacationStayError};
use vacationstay_db::Role;

use crate::error::AuthError;
use crate::jwt::JwtKeys;

/// Router states that can verify bearer tokens.
pub trait JwtProvider {
    fn jwt_keys(&self) -> &JwtKeys;
}

impl<T: JwtProvider + ?Sized> JwtProvider for Arc<T> {
    fn jwt_keys(&self) -> &JwtKeys {
        (**self).jwt_keys()
    }
}

/// The authenticated caller, taken from `Authorization: Bearer <token>`.
///
/// Use it as a handler argument to require a signed-in user; requests without
/// a valid token are answered with 401.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub roles: Vec<Role>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    /// Ok when the caller is `user_id` or an admin.
    pub fn ensure_self_or_admin(&self, user_id: i64) -> Result<(), VacationStayError> {
        if self.id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(forbidden("You do not have permission to access this resource"))
        }
    }

    /// Ok when the caller is one of `allowed` or an admin.
    pub fn ensure_any_of_or_admin(&self, allowed: &[i64]) -> Result<(), VacationStayError> {
        if allowed.contains(&self.id) || self.is_admin() {
            Ok(())
        } else {
            Err(forbidden("You do not have permission to access this resource"))
        }
    }

    pub fn ensure_admin(&self) -> Result<(), VacationStayError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(forbidden("Administrator role required"))
        }
    }
}

/// The token part of a `Bearer` authorization header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: JwtProvider + Send + Sync,
{
    type Rejection = VacationStayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let claims = state.jwt_keys().verify(token)?;

        Ok(AuthUser {
            id: claims.uid,
            email: claims.sub,
            roles: claims.roles,
        })
    }
}
