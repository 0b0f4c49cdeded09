//! SQL implementation of the review repository

use sqlx::any::AnyRow;
use tracing::{debug, error, info};

use crate::error::DbError;
use crate::models::{NewReview, Review, ReviewWithAuthor};
use crate::query::{InsertQuery, Order, TableQuery, UpdateQuery};
use crate::repositories::review::ReviewRepository;
use crate::row::{get_i64, get_opt_string, get_timestamp, now_timestamp};
use crate::DbClient;

const TABLE: &str = "reviews";

const COLUMNS: &[&str] = &[
    "id",
    "property_id",
    "user_id",
    "rating",
    "comment",
    "created_at",
];

/// SQL implementation of the review repository
#[derive(Debug, Clone)]
pub struct SqlReviewRepository {
    db_client: DbClient,
}

impl SqlReviewRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn review_from_row(row: &AnyRow) -> Result<Review, DbError> {
    Ok(Review {
        id: get_i64(row, TABLE, "id")?,
        property_id: get_i64(row, TABLE, "property_id")?,
        user_id: get_i64(row, TABLE, "user_id")?,
        rating: get_i64(row, TABLE, "rating")?,
        comment: get_opt_string(row, "comment"),
        created_at: get_timestamp(row, "created_at"),
    })
}

impl ReviewRepository for SqlReviewRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing review schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                property_id INTEGER NOT NULL REFERENCES properties(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment TEXT,
                created_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;
        self.db_client
            .execute("CREATE INDEX IF NOT EXISTS idx_reviews_property ON reviews(property_id)")
            .await?;

        info!("Review schema initialized successfully");
        Ok(())
    }

    async fn create(&self, review: NewReview) -> Result<Review, DbError> {
        debug!(
            "User {} reviewing property {}",
            review.user_id, review.property_id
        );

        let row = InsertQuery::insert_into(TABLE)
            .value("property_id", review.property_id)
            .value("user_id", review.user_id)
            .value("rating", review.rating)
            .value("comment", review.comment)
            .value("created_at", now_timestamp())
            .returning(COLUMNS)
            .fetch_one(&self.db_client)
            .await?;

        review_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Review>, DbError> {
        TableQuery::select(TABLE)
            .columns(COLUMNS)
            .eq("id", id)
            .fetch_optional(&self.db_client)
            .await?
            .map(|row| review_from_row(&row))
            .transpose()
    }

    async fn find_by_property(&self, property_id: i64) -> Result<Vec<ReviewWithAuthor>, DbError> {
        // Joins are outside the table builder.
        let query = r#"
            SELECT r.id, r.property_id, r.user_id, r.rating, r.comment, r.created_at,
                   COALESCE(u.name, 'Anonymous') AS user_name
            FROM reviews r
            LEFT JOIN users u ON u.id = r.user_id
            WHERE r.property_id = $1
            ORDER BY r.created_at DESC, r.id DESC
        "#;

        let rows = sqlx::query(query)
            .bind(property_id)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load reviews of property {}: {}", property_id, e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter()
            .map(|row| {
                Ok(ReviewWithAuthor {
                    review: review_from_row(row)?,
                    user_name: get_opt_string(row, "user_name")
                        .unwrap_or_else(|| "Anonymous".to_string()),
                })
            })
            .collect()
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Review>, DbError> {
        let rows = TableQuery::select(TABLE)
            .columns(COLUMNS)
            .eq("user_id", user_id)
            .order_by("id", Order::Desc)
            .fetch_all(&self.db_client)
            .await?;
        rows.iter().map(review_from_row).collect()
    }

    async fn ratings_for_property(&self, property_id: i64) -> Result<Vec<i64>, DbError> {
        let rows = TableQuery::select(TABLE)
            .columns(&["rating"])
            .eq("property_id", property_id)
            .fetch_all(&self.db_client)
            .await?;
        rows.iter().map(|row| get_i64(row, TABLE, "rating")).collect()
    }

    async fn update(
        &self,
        id: i64,
        rating: i64,
        comment: Option<String>,
    ) -> Result<Option<Review>, DbError> {
        UpdateQuery::table(TABLE)
            .set("rating", rating)
            .set("comment", comment)
            .eq("id", id)
            .returning(COLUMNS)
            .fetch_optional(&self.db_client)
            .await?
            .map(|row| review_from_row(&row))
            .transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete review {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}
