//! Entity repositories
//!
//! Each entity has a trait describing its storage operations and an `Sql*`
//! implementation on top of [`DbClient`].

pub mod booking;
pub mod booking_sql;
pub mod property;
pub mod property_sql;
pub mod review;
pub mod review_sql;
pub mod user;
pub mod user_sql;

pub use booking::BookingRepository;
pub use booking_sql::SqlBookingRepository;
pub use property::PropertyRepository;
pub use property_sql::SqlPropertyRepository;
pub use review::ReviewRepository;
pub use review_sql::SqlReviewRepository;
pub use user::UserRepository;
pub use user_sql::SqlUserRepository;

use tracing::info;

use crate::error::DbError;
use crate::DbClient;

/// The SQL repositories of every entity, sharing one pool.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub users: SqlUserRepository,
    pub properties: SqlPropertyRepository,
    pub bookings: SqlBookingRepository,
    pub reviews: SqlReviewRepository,
}

impl Repositories {
    pub fn new(db_client: DbClient) -> Self {
        Self {
            users: SqlUserRepository::new(db_client.clone()),
            properties: SqlPropertyRepository::new(db_client.clone()),
            bookings: SqlBookingRepository::new(db_client.clone()),
            reviews: SqlReviewRepository::new(db_client),
        }
    }

    /// Create every table. Safe to run on each start.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        // Referenced tables first.
        self.users.init_schema().await?;
        self.properties.init_schema().await?;
        self.bookings.init_schema().await?;
        self.reviews.init_schema().await?;
        info!("Database schema ready");
        Ok(())
    }
}

/// Creates the schema on `db_client` and returns the repositories.
pub async fn init_all_schemas(db_client: &DbClient) -> Result<Repositories, DbError> {
    let repositories = Repositories::new(db_client.clone());
    repositories.init_schema().await?;
    Ok(repositories)
}
