// --- File: crates/vacationstay_auth/src/lib.rs ---
//! Accounts and sessions for VacationStay.
//!
//! Local e-mail/password accounts with PBKDF2 hashes, HS256 bearer tokens,
//! and the [`AuthUser`] extractor other crates use to find out who is calling.

pub mod doc;
pub mod error;
pub mod extractor;
pub mod handlers;
pub mod jwt;
pub mod logic;
pub mod password;
pub mod routes;

pub use error::AuthError;
pub use extractor::{bearer_token, AuthUser, JwtProvider};
pub use handlers::AuthState;
pub use jwt::{Claims, JwtKeys};
pub use password::PasswordHasher;
