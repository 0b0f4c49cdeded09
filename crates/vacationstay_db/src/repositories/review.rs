//! Repository for guest reviews

use crate::error::DbError;
use crate::models::{NewReview, Review, ReviewWithAuthor};

/// Storage for guest reviews
pub trait ReviewRepository {
    /// Create the `reviews` table if it doesn't exist
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    fn create(
        &self,
        review: NewReview,
    ) -> impl std::future::Future<Output = Result<Review, DbError>> + Send;

    fn find_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Review>, DbError>> + Send;

    /// Reviews of a property with their authors' names, newest first
    fn find_by_property(
        &self,
        property_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ReviewWithAuthor>, DbError>> + Send;

    fn find_by_user(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Review>, DbError>> + Send;

    /// All star ratings given to a property
    fn ratings_for_property(
        &self,
        property_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<i64>, DbError>> + Send;

    /// Replace rating and comment. `None` when the review doesn't exist.
    fn update(
        &self,
        id: i64,
        rating: i64,
        comment: Option<String>,
    ) -> impl std::future::Future<Output = Result<Option<Review>, DbError>> + Send;

    fn delete(&self, id: i64) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}
