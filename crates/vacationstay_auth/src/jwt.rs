//! HS256 bearer tokens.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vacationstay_config::{env_vars::SECRET_MARKER, AppConfig};
use vacationstay_db::{Role, User};

use crate::error::AuthError;

const MIN_SECRET_LEN: usize = 32;

/// Token claims. `sub` is the account e-mail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: i64,
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiration_ms: i64,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("expiration_ms", &self.expiration_ms)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    pub fn new(secret: &[u8], expiration_ms: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            expiration_ms,
        }
    }

    /// Keys from the `[auth]` config section.
    ///
    /// A missing section, an empty secret or an unresolved `secret_from_env`
    /// marker is an error; a short secret only warns.
    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        let auth = config
            .auth
            .as_ref()
            .ok_or_else(|| AuthError::NotConfigured("missing [auth] section".to_string()))?;

        let secret = auth.jwt_secret.trim();
        if secret.is_empty() || secret == SECRET_MARKER {
            return Err(AuthError::NotConfigured(
                "auth.jwt_secret is not set (JWT_SECRET)".to_string(),
            ));
        }
        if secret.len() < MIN_SECRET_LEN {
            warn!(
                "auth.jwt_secret is shorter than {} bytes; use a longer random value",
                MIN_SECRET_LEN
            );
        }

        Ok(Self::new(secret.as_bytes(), auth.jwt_expiration_ms))
    }

    /// Token lifetime in milliseconds.
    pub fn expiration_ms(&self) -> i64 {
        self.expiration_ms
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id,
            roles: user.roles.iter().copied().collect(),
            iat: now,
            exp: now + self.expiration_ms / 1000,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use vacationstay_config::AuthConfig;

    fn user() -> User {
        User {
            id: 42,
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            password_hash: None,
            image_url: None,
            provider: "local".to_string(),
            provider_id: None,
            roles: BTreeSet::from([Role::User, Role::Admin]),
            created_at: None,
        }
    }

    fn keys() -> JwtKeys {
        JwtKeys::new(b"test-secret-that-is-long-enough-for-hs256", 3_600_000)
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys();
        let token = keys.issue(&user()).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, "dana@example.com");
        assert_eq!(claims.uid, 42);
        assert_eq!(claims.roles, vec![Role::User, Role::Admin]);
        assert_eq!(claims.exp - claims.iat, 3_600);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = JwtKeys::new(b"another-secret-another-secret-xx", 60_000)
            .issue(&user())
            .unwrap();
        assert!(matches!(keys().verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default 60 second leeway.
        let keys = JwtKeys::new(b"test-secret-that-is-long-enough-for-hs256", -120_000);
        let token = keys.issue(&user()).unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(keys().verify("not.a.token").is_err());
    }

    #[test]
    fn unresolved_secret_marker_is_a_config_error() {
        let mut config = AppConfig::default();
        assert!(JwtKeys::from_config(&config).is_err());

        config.auth = Some(AuthConfig {
            jwt_secret: SECRET_MARKER.to_string(),
            jwt_expiration_ms: 1_000,
        });
        assert!(matches!(
            JwtKeys::from_config(&config),
            Err(AuthError::NotConfigured(_))
        ));

        config.auth = Some(AuthConfig {
            jwt_secret: "a-configured-secret-of-sufficient-length".to_string(),
            jwt_expiration_ms: 1_000,
        });
        assert_eq!(JwtKeys::from_config(&config).unwrap().expiration_ms(), 1_000);
    }
}
