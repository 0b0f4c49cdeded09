//! SQL implementation of the property repository

use sqlx::any::AnyRow;
use tracing::{debug, error, info};

use crate::error::DbError;
use crate::models::{Property, PropertyDraft, PropertyFilter};
use crate::query::{InsertQuery, Order, TableQuery, UpdateQuery};
use crate::repositories::property::{PropertyRepository, TABLE};
use crate::row::{
    encode_string_list, get_i64, get_opt_i64, get_string, get_string_list, get_timestamp,
    now_timestamp,
};
use crate::DbClient;

const COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "location",
    "price",
    "bedrooms",
    "bathrooms",
    "max_guests",
    "amenities",
    "images",
    "owner_id",
    "created_at",
    "updated_at",
];

/// SQL implementation of the property repository
#[derive(Debug, Clone)]
pub struct SqlPropertyRepository {
    db_client: DbClient,
}

impl SqlPropertyRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

pub(crate) fn property_from_row(row: &AnyRow) -> Result<Property, DbError> {
    Ok(Property {
        id: get_i64(row, TABLE, "id")?,
        title: get_string(row, TABLE, "title")?,
        description: get_string(row, TABLE, "description")?,
        location: get_string(row, TABLE, "location")?,
        price: get_i64(row, TABLE, "price")?,
        bedrooms: get_i64(row, TABLE, "bedrooms")?,
        bathrooms: get_i64(row, TABLE, "bathrooms")?,
        max_guests: get_i64(row, TABLE, "max_guests")?,
        amenities: get_string_list(row, "amenities"),
        images: get_string_list(row, "images"),
        owner_id: get_opt_i64(row, "owner_id"),
        created_at: get_timestamp(row, "created_at"),
        updated_at: get_timestamp(row, "updated_at"),
    })
}

fn properties_from_rows(rows: Vec<AnyRow>) -> Result<Vec<Property>, DbError> {
    rows.iter().map(property_from_row).collect()
}

impl PropertyRepository for SqlPropertyRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing property schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS properties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                location TEXT NOT NULL,
                price INTEGER NOT NULL,
                bedrooms INTEGER NOT NULL DEFAULT 0,
                bathrooms INTEGER NOT NULL DEFAULT 0,
                max_guests INTEGER NOT NULL DEFAULT 0,
                amenities TEXT NOT NULL DEFAULT '[]',
                images TEXT NOT NULL DEFAULT '[]',
                owner_id INTEGER REFERENCES users(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;
        self.db_client
            .execute("CREATE INDEX IF NOT EXISTS idx_properties_owner ON properties(owner_id)")
            .await?;

        info!("Property schema initialized successfully");
        Ok(())
    }

    async fn create(
        &self,
        owner_id: Option<i64>,
        draft: PropertyDraft,
    ) -> Result<Property, DbError> {
        debug!("Creating property '{}' for owner {:?}", draft.title, owner_id);
        let now = now_timestamp();

        let row = InsertQuery::insert_into(TABLE)
            .value("title", draft.title)
            .value("description", draft.description)
            .value("location", draft.location)
            .value("price", draft.price)
            .value("bedrooms", draft.bedrooms)
            .value("bathrooms", draft.bathrooms)
            .value("max_guests", draft.max_guests)
            .value("amenities", encode_string_list(&draft.amenities)?)
            .value("images", encode_string_list(&draft.images)?)
            .value("owner_id", owner_id)
            .value("created_at", now.clone())
            .value("updated_at", now)
            .returning(COLUMNS)
            .fetch_one(&self.db_client)
            .await?;

        let created = property_from_row(&row)?;
        info!("Property {} created", created.id);
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Property>, DbError> {
        TableQuery::select(TABLE)
            .columns(COLUMNS)
            .eq("id", id)
            .fetch_optional(&self.db_client)
            .await?
            .map(|row| property_from_row(&row))
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Property>, DbError> {
        let rows = TableQuery::select(TABLE)
            .columns(COLUMNS)
            .order_by("id", Order::Asc)
            .fetch_all(&self.db_client)
            .await?;
        properties_from_rows(rows)
    }

    async fn search(&self, filter: &PropertyFilter) -> Result<Vec<Property>, DbError> {
        debug!("Searching properties with {:?}", filter);
        let rows = filter
            .to_query()
            .columns(COLUMNS)
            .fetch_all(&self.db_client)
            .await?;
        properties_from_rows(rows)
    }

    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Property>, DbError> {
        let filter = PropertyFilter {
            owner_id: Some(owner_id),
            ..Default::default()
        };
        self.search(&filter).await
    }

    async fn update(&self, id: i64, draft: PropertyDraft) -> Result<Option<Property>, DbError> {
        debug!("Updating property {}", id);

        UpdateQuery::table(TABLE)
            .set("title", draft.title)
            .set("description", draft.description)
            .set("location", draft.location)
            .set("price", draft.price)
            .set("bedrooms", draft.bedrooms)
            .set("bathrooms", draft.bathrooms)
            .set("max_guests", draft.max_guests)
            .set("amenities", encode_string_list(&draft.amenities)?)
            .set("images", encode_string_list(&draft.images)?)
            .set("updated_at", now_timestamp())
            .eq("id", id)
            .returning(COLUMNS)
            .fetch_optional(&self.db_client)
            .await?
            .map(|row| property_from_row(&row))
            .transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, DbError> {
        debug!("Deleting property {} with its bookings and reviews", id);

        let mut tx = self.db_client.begin().await?;

        for dependent in [
            "DELETE FROM reviews WHERE property_id = $1",
            "DELETE FROM bookings WHERE property_id = $1",
        ] {
            sqlx::query(dependent)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!("Failed to delete dependents of property {}: {}", id, e);
                    DbError::QueryError(e.to_string())
                })?;
        }

        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to delete property {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
