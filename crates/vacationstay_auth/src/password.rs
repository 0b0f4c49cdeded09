//! Password hashing with PBKDF2-HMAC-SHA256.
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt>$<hash>` with standard
//! base64 for salt and hash. The iteration count travels with the hash, so it
//! can be raised later without invalidating existing accounts.

use std::num::NonZeroU32;

use base64::{engine::general_purpose, Engine as _};
use constant_time_eq::constant_time_eq;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::AuthError;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
pub const DEFAULT_ITERATIONS: u32 = 100_000;

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    /// A hasher using `iterations` rounds (at least one).
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
            rng: SystemRandom::new(),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng.fill(&mut salt).map_err(|_| AuthError::Hashing)?;

        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(ALGORITHM, self.iterations, &salt, password.as_bytes(), &mut hash);

        Ok(format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            general_purpose::STANDARD.encode(salt),
            general_purpose::STANDARD.encode(hash)
        ))
    }

    /// `true` iff `password` matches `stored`. Malformed hashes never match.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let mut parts = stored.split('$');
        let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };

        let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (
            general_purpose::STANDARD.decode(salt),
            general_purpose::STANDARD.decode(expected),
        ) else {
            return false;
        };
        if expected.len() != HASH_LEN {
            return false;
        }

        let mut derived = [0u8; HASH_LEN];
        pbkdf2::derive(ALGORITHM, iterations, &salt, password.as_bytes(), &mut derived);
        constant_time_eq(&derived, &expected)
    }

    /// Does the work of [`verify`](Self::verify) for an account that has no
    /// password, so callers cannot tell it apart by timing. Never matches.
    pub fn verify_missing(&self, password: &str) -> bool {
        let mut derived = [0u8; HASH_LEN];
        pbkdf2::derive(
            ALGORITHM,
            self.iterations,
            &[0u8; SALT_LEN],
            password.as_bytes(),
            &mut derived,
        );
        std::hint::black_box(derived);
        false
    }
}
