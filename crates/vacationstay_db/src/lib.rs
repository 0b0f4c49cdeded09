//! Database access for VacationStay
//!
//! A database-agnostic client built on SQLx's `Any` driver, a small table
//! query builder, and one repository per entity (users, properties,
//! bookings, reviews).
//!
//! # Example
//!
//! ```rust,no_run
//! use vacationstay_db::{init_all_schemas, DbClient, PropertyRepository};
//!
//! async fn listings() -> Result<(), vacationstay_db::DbError> {
//!     let db_client = DbClient::from_url("sqlite:data/vacationstay.db").await?;
//!     let repos = init_all_schemas(&db_client).await?;
//!     let all = repos.properties.find_all().await?;
//!     println!("{} listings", all.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod query;
pub mod repositories;
mod row;

#[cfg(test)]
mod repositories_test;

pub use client::{DbClient, DbTransaction, LockedConnection};
pub use error::DbError;
pub use models::*;
pub use repositories::{
    init_all_schemas, BookingRepository, PropertyRepository, Repositories, ReviewRepository,
    SqlBookingRepository, SqlPropertyRepository, SqlReviewRepository, SqlUserRepository,
    UserRepository,
};
