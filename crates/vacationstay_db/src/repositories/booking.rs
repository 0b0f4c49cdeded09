//! Repository for bookings

use chrono::NaiveDate;

use crate::error::DbError;
use crate::models::{Booking, BookingStatus, NewBooking};

/// Storage for bookings
///
/// The `*_if` methods load the property's confirmed bookings and write only
/// when `accept` approves the new dates, inside one transaction, so two
/// concurrent requests cannot both take the same nights.
pub trait BookingRepository {
    /// Create the `bookings` table if it doesn't exist
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Insert `booking` as confirmed if `accept` approves it against the
    /// property's other confirmed bookings. `None` when rejected.
    fn create_if<F>(
        &self,
        booking: NewBooking,
        accept: F,
    ) -> impl std::future::Future<Output = Result<Option<Booking>, DbError>> + Send
    where
        F: FnOnce(&[Booking]) -> bool + Send;

    /// Move a booking to new dates and price if `accept` approves them against
    /// the property's other confirmed bookings. `Ok(None)` when rejected;
    /// [`DbError::NotFound`] when the booking doesn't exist.
    fn reschedule_if<F>(
        &self,
        id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_price: i64,
        accept: F,
    ) -> impl std::future::Future<Output = Result<Option<Booking>, DbError>> + Send
    where
        F: FnOnce(&[Booking]) -> bool + Send;

    fn find_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Booking>, DbError>> + Send;

    fn find_all(&self) -> impl std::future::Future<Output = Result<Vec<Booking>, DbError>> + Send;

    fn find_by_user(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Booking>, DbError>> + Send;

    fn find_by_property(
        &self,
        property_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Booking>, DbError>> + Send;

    /// Confirmed bookings of a property, ordered by start date
    fn find_active_by_property(
        &self,
        property_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Booking>, DbError>> + Send;

    fn update_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> impl std::future::Future<Output = Result<Option<Booking>, DbError>> + Send;

    fn delete(&self, id: i64) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}
