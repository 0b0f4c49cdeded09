// --- File: crates/vacationstay_bookings/src/logic.rs ---
//! Availability and pricing.
//!
//! Booked intervals are closed: a stay from the 1st to the 5th blocks both
//! the 1st and the 5th. A date is disabled when it lies before `today` or
//! inside any booked interval. Nothing in here touches the database, so the
//! same rules drive the date picker, the quote and the write path.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vacationstay_common::VacationStayError;
use vacationstay_db::{Booking, BookingStatus, Property};

/// Longest window the calendar endpoint will expand into single dates.
pub const MAX_CALENDAR_DAYS: i64 = 366;
/// Calendar window used when the caller gives no end date.
pub const DEFAULT_CALENDAR_DAYS: i64 = 90;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BookingError {
    #[error("Invalid {field} '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("Check-in date cannot be in the past")]
    StartInPast,

    #[error("Check-out date must be after check-in date")]
    EmptyRange,

    #[error("Total price is too large")]
    PriceOverflow,

    #[error("Calendar window cannot exceed {0} days")]
    WindowTooLarge(i64),

    #[error("Property is not available for the selected dates")]
    Unavailable,

    #[error("Booking is {0}; only confirmed bookings can be cancelled")]
    NotCancellable(BookingStatus),

    #[error("Booking is {0}; only confirmed bookings can be changed")]
    NotModifiable(BookingStatus),
}

impl From<BookingError> for VacationStayError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Unavailable
            | BookingError::NotCancellable(_)
            | BookingError::NotModifiable(_) => {
                VacationStayError::ConflictError(err.to_string())
            }
            _ => VacationStayError::ValidationError(err.to_string()),
        }
    }
}

// --- Core types ---

/// An existing booking's dates, both ends inclusive.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BookedInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Closed overlap test. An inverted interval overlaps nothing.
    pub fn overlaps(&self, range: &DateRange) -> bool {
        self.start <= self.end && self.start <= range.end && self.end >= range.start
    }
}

impl From<&Booking> for BookedInterval {
    fn from(booking: &Booking) -> Self {
        Self::new(booking.start_date, booking.end_date)
    }
}

/// Intervals of the bookings that still hold their dates.
pub fn booked_intervals(bookings: &[Booking]) -> Vec<BookedInterval> {
    bookings
        .iter()
        .filter(|b| b.is_active())
        .map(BookedInterval::from)
        .collect()
}

/// A requested stay: check-in `start`, check-out `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn nights(&self) -> i64 {
        nights_between(self.start, self.end)
    }
}

/// Price of a stay in minor currency units.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub nights: i64,
    pub nightly_rate: i64,
    pub total_price: i64,
}

// --- Rules ---

pub fn is_date_disabled(date: NaiveDate, today: NaiveDate, booked: &[BookedInterval]) -> bool {
    date < today || booked.iter().any(|interval| interval.contains(date))
}

/// Disabled dates in the closed window `[from, to]`, ascending.
pub fn disabled_dates(
    from: NaiveDate,
    to: NaiveDate,
    today: NaiveDate,
    booked: &[BookedInterval],
) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|date| *date <= to)
        .filter(|date| is_date_disabled(*date, today, booked))
        .collect()
}

pub fn nights_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn total_price(nights: i64, nightly_rate: i64) -> Result<i64, BookingError> {
    nights
        .checked_mul(nightly_rate)
        .ok_or(BookingError::PriceOverflow)
}

/// Check-in today or later, and at least one night.
pub fn validate_range(range: &DateRange, today: NaiveDate) -> Result<(), BookingError> {
    if range.start < today {
        return Err(BookingError::StartInPast);
    }
    if range.end <= range.start {
        return Err(BookingError::EmptyRange);
    }
    Ok(())
}

/// `true` iff the range is valid and no date in `[start, end]` is disabled.
pub fn is_range_available(range: &DateRange, today: NaiveDate, booked: &[BookedInterval]) -> bool {
    validate_range(range, today).is_ok() && !booked.iter().any(|interval| interval.overlaps(range))
}

pub fn quote(
    range: &DateRange,
    nightly_rate: i64,
    today: NaiveDate,
) -> Result<Quote, BookingError> {
    validate_range(range, today)?;
    let nights = range.nights();
    Ok(Quote {
        nights,
        nightly_rate,
        total_price: total_price(nights, nightly_rate)?,
    })
}

pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| BookingError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

pub fn parse_range(start: &str, end: &str) -> Result<DateRange, BookingError> {
    Ok(DateRange::new(
        parse_date("startDate", start)?,
        parse_date("endDate", end)?,
    ))
}

/// Resolves the calendar window, defaulting to `today` and a 90 day span.
pub fn calendar_window(
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), BookingError> {
    let from = match from {
        Some(value) => parse_date("from", value)?,
        None => today,
    };
    let to = match to {
        Some(value) => parse_date("to", value)?,
        None => from
            .checked_add_signed(Duration::days(DEFAULT_CALENDAR_DAYS - 1))
            .unwrap_or(NaiveDate::MAX),
    };
    if nights_between(from, to) >= MAX_CALENDAR_DAYS {
        return Err(BookingError::WindowTooLarge(MAX_CALENDAR_DAYS));
    }
    Ok((from, to))
}

pub fn ensure_cancellable(booking: &Booking) -> Result<(), BookingError> {
    if booking.is_active() {
        Ok(())
    } else {
        Err(BookingError::NotCancellable(booking.status))
    }
}

pub fn ensure_modifiable(booking: &Booking) -> Result<(), BookingError> {
    if booking.is_active() {
        Ok(())
    } else {
        Err(BookingError::NotModifiable(booking.status))
    }
}

// --- Request/response types ---

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct StayQuery {
    /// Check-in date in YYYY-MM-DD format
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2026-07-01"))]
    pub start_date: String,

    /// Check-out date in YYYY-MM-DD format
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2026-07-05"))]
    pub end_date: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct CalendarQuery {
    /// First date of the window (default: today)
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2026-07-01"))]
    pub from: Option<String>,

    /// Last date of the window (default: 90 days from `from`)
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2026-09-28"))]
    pub to: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

/// Date picker data for one property.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    pub property_id: i64,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub today: NaiveDate,
    pub booked: Vec<BookedInterval>,
    pub disabled_dates: Vec<NaiveDate>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub property_id: i64,
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2026-07-01"))]
    pub start_date: String,
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2026-07-05"))]
    pub end_date: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub start_date: String,
    pub end_date: String,
}

/// A booking as shown on the guest's dashboard.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub property_title: Option<String>,
    pub property_location: Option<String>,
    pub property_image: Option<String>,
    pub can_cancel: bool,
}

impl DashboardBooking {
    /// `property` is `None` when the listing is gone.
    pub fn new(booking: Booking, property: Option<&Property>) -> Self {
        Self {
            can_cancel: booking.is_active(),
            property_title: property.map(|p| p.title.clone()),
            property_location: property.map(|p| p.location.clone()),
            property_image: property.and_then(|p| p.images.first().cloned()),
            booking,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub bookings: Vec<DashboardBooking>,
    pub properties: Vec<Property>,
}
