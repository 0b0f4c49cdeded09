//! SQL implementation of the booking repository

use chrono::NaiveDate;
use sqlx::any::AnyRow;
use sqlx::AnyConnection;
use tracing::{debug, error, info};

use crate::error::{map_lock_error, DbError};
use crate::models::{Booking, BookingStatus, NewBooking};
use crate::query::{bind_values, InsertQuery, Order, TableQuery, UpdateQuery};
use crate::repositories::booking::BookingRepository;
use crate::row::{format_date, get_date, get_i64, get_string, get_timestamp, now_timestamp};
use crate::DbClient;

const TABLE: &str = "bookings";
const PROPERTIES_TABLE: &str = "properties";

const COLUMNS: &[&str] = &[
    "id",
    "property_id",
    "user_id",
    "start_date",
    "end_date",
    "total_price",
    "status",
    "created_at",
    "updated_at",
];

/// SQL implementation of the booking repository
#[derive(Debug, Clone)]
pub struct SqlBookingRepository {
    db_client: DbClient,
}

impl SqlBookingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    async fn fetch_many(&self, query: TableQuery) -> Result<Vec<Booking>, DbError> {
        let rows = query.columns(COLUMNS).fetch_all(&self.db_client).await?;
        rows.iter().map(booking_from_row).collect()
    }
}

fn booking_from_row(row: &AnyRow) -> Result<Booking, DbError> {
    let status = get_string(row, TABLE, "status")?;
    Ok(Booking {
        id: get_i64(row, TABLE, "id")?,
        property_id: get_i64(row, TABLE, "property_id")?,
        user_id: get_i64(row, TABLE, "user_id")?,
        start_date: get_date(row, TABLE, "start_date")?,
        end_date: get_date(row, TABLE, "end_date")?,
        total_price: get_i64(row, TABLE, "total_price")?,
        status: status
            .parse()
            .map_err(|message| DbError::DecodeError { table: TABLE, message })?,
        created_at: get_timestamp(row, "created_at"),
        updated_at: get_timestamp(row, "updated_at"),
    })
}

/// Confirmed bookings of `property_id` read on the locked connection, minus `exclude_id`.
async fn active_locked(
    conn: &mut AnyConnection,
    property_id: i64,
    exclude_id: Option<i64>,
) -> Result<Vec<Booking>, DbError> {
    let (sql, values) = TableQuery::select(TABLE)
        .columns(COLUMNS)
        .eq("property_id", property_id)
        .eq("status", BookingStatus::Confirmed.as_str())
        .build()?;

    let rows = bind_values(sqlx::query(&sql), &values)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            error!("Failed to load bookings of property {}: {}", property_id, e);
            map_lock_error(e)
        })?;

    rows.iter()
        .map(booking_from_row)
        .filter(|b| match (b, exclude_id) {
            (Ok(b), Some(excluded)) => b.id != excluded,
            _ => true,
        })
        .collect()
}

impl BookingRepository for SqlBookingRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                property_id INTEGER NOT NULL REFERENCES properties(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                total_price INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'confirmed',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;
        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_bookings_property ON bookings(property_id, status)",
            )
            .await?;
        self.db_client
            .execute("CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id)")
            .await?;

        info!("Booking schema initialized successfully");
        Ok(())
    }

    async fn create_if<F>(&self, booking: NewBooking, accept: F) -> Result<Option<Booking>, DbError>
    where
        F: FnOnce(&[Booking]) -> bool + Send,
    {
        debug!(
            "Booking property {} from {} to {} for user {}",
            booking.property_id, booking.start_date, booking.end_date, booking.user_id
        );

        // Writers of the same listing queue here, so `existing` stays accurate
        // until the insert commits.
        let mut locked = self
            .db_client
            .begin_locked(PROPERTIES_TABLE, booking.property_id)
            .await?;
        let existing = active_locked(locked.connection()?, booking.property_id, None).await?;
        if !accept(&existing) {
            debug!("Booking rejected against {} existing bookings", existing.len());
            locked.rollback().await?;
            return Ok(None);
        }

        let now = now_timestamp();
        let (sql, values) = InsertQuery::insert_into(TABLE)
            .value("property_id", booking.property_id)
            .value("user_id", booking.user_id)
            .value("start_date", format_date(booking.start_date))
            .value("end_date", format_date(booking.end_date))
            .value("total_price", booking.total_price)
            .value("status", BookingStatus::Confirmed.as_str())
            .value("created_at", now.clone())
            .value("updated_at", now)
            .returning(COLUMNS)
            .build()?;

        let row = bind_values(sqlx::query(&sql), &values)
            .fetch_one(locked.connection()?)
            .await
            .map_err(|e| {
                error!("Failed to insert booking: {}", e);
                map_lock_error(e)
            })?;
        let created = booking_from_row(&row)?;
        locked.commit().await?;

        info!("Booking {} created", created.id);
        Ok(Some(created))
    }

    async fn reschedule_if<F>(
        &self,
        id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_price: i64,
        accept: F,
    ) -> Result<Option<Booking>, DbError>
    where
        F: FnOnce(&[Booking]) -> bool + Send,
    {
        debug!("Rescheduling booking {} to {} - {}", id, start_date, end_date);

        // A booking never changes listing, so its property can be read before locking.
        let row = TableQuery::select(TABLE)
            .columns(&["property_id"])
            .eq("id", id)
            .fetch_optional(&self.db_client)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Booking not found with id: {}", id)))?;
        let property_id = get_i64(&row, TABLE, "property_id")?;

        let mut locked = self.db_client.begin_locked(PROPERTIES_TABLE, property_id).await?;
        let others = active_locked(locked.connection()?, property_id, Some(id)).await?;
        if !accept(&others) {
            locked.rollback().await?;
            return Ok(None);
        }

        let (sql, values) = UpdateQuery::table(TABLE)
            .set("start_date", format_date(start_date))
            .set("end_date", format_date(end_date))
            .set("total_price", total_price)
            .set("updated_at", now_timestamp())
            .eq("id", id)
            .returning(COLUMNS)
            .build()?;
        let row = bind_values(sqlx::query(&sql), &values)
            .fetch_optional(locked.connection()?)
            .await
            .map_err(|e| {
                error!("Failed to reschedule booking {}: {}", id, e);
                map_lock_error(e)
            })?;
        let Some(row) = row else {
            locked.rollback().await?;
            return Err(DbError::NotFound(format!("Booking not found with id: {}", id)));
        };
        let updated = booking_from_row(&row)?;
        locked.commit().await?;

        info!("Booking {} rescheduled", id);
        Ok(Some(updated))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>, DbError> {
        TableQuery::select(TABLE)
            .columns(COLUMNS)
            .eq("id", id)
            .fetch_optional(&self.db_client)
            .await?
            .map(|row| booking_from_row(&row))
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Booking>, DbError> {
        self.fetch_many(TableQuery::select(TABLE).order_by("id", Order::Asc))
            .await
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Booking>, DbError> {
        self.fetch_many(
            TableQuery::select(TABLE)
                .eq("user_id", user_id)
                .order_by("start_date", Order::Desc),
        )
        .await
    }

    async fn find_by_property(&self, property_id: i64) -> Result<Vec<Booking>, DbError> {
        self.fetch_many(
            TableQuery::select(TABLE)
                .eq("property_id", property_id)
                .order_by("start_date", Order::Asc),
        )
        .await
    }

    async fn find_active_by_property(&self, property_id: i64) -> Result<Vec<Booking>, DbError> {
        self.fetch_many(
            TableQuery::select(TABLE)
                .eq("property_id", property_id)
                .eq("status", BookingStatus::Confirmed.as_str())
                .order_by("start_date", Order::Asc),
        )
        .await
    }

    async fn update_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> Result<Option<Booking>, DbError> {
        debug!("Setting booking {} to {}", id, status);

        UpdateQuery::table(TABLE)
            .set("status", status.as_str())
            .set("updated_at", now_timestamp())
            .eq("id", id)
            .returning(COLUMNS)
            .fetch_optional(&self.db_client)
            .await?
            .map(|row| booking_from_row(&row))
            .transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, DbError> {
        debug!("Deleting booking {}", id);

        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete booking {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}
