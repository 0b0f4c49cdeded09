//! Repository for user accounts

use crate::error::DbError;
use crate::models::{NewUser, User, UserChanges};

/// Storage for user accounts. E-mail addresses are unique.
pub trait UserRepository {
    /// Create the `users` table if it doesn't exist
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Store a new account
    ///
    /// Fails with [`DbError::Conflict`] when the e-mail is already taken.
    fn create(&self, user: NewUser)
        -> impl std::future::Future<Output = Result<User, DbError>> + Send;

    fn find_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<User>, DbError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, DbError>> + Send;

    fn exists_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;

    /// Apply a partial profile update
    ///
    /// Returns `None` when no account has this id.
    fn update(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> impl std::future::Future<Output = Result<Option<User>, DbError>> + Send;
}
