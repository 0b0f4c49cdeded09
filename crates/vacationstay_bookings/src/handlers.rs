// --- File: crates/vacationstay_bookings/src/handlers.rs ---

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{info, warn};
use vacationstay_auth::{AuthUser, JwtKeys, JwtProvider};
use vacationstay_common::{not_found, time::today_in, validation_error, VacationStayError};
use vacationstay_db::{
    Booking, BookingRepository, BookingStatus, NewBooking, Property, PropertyRepository,
    SqlBookingRepository, SqlPropertyRepository,
};

use crate::logic::{
    booked_intervals, calendar_window, disabled_dates, ensure_cancellable, ensure_modifiable,
    is_range_available, parse_range, quote, AvailabilityResponse, BookedInterval, BookingError,
    CalendarQuery, CalendarResponse, CreateBookingRequest, DashboardBooking, DashboardResponse,
    Quote, RescheduleRequest, StayQuery,
};

// Shared state for the booking routes
#[derive(Clone)]
pub struct BookingsState {
    pub bookings: SqlBookingRepository,
    pub properties: SqlPropertyRepository,
    pub jwt: Arc<JwtKeys>,
    /// Zone in which "today" is decided.
    pub time_zone: Tz,
}

impl JwtProvider for BookingsState {
    fn jwt_keys(&self) -> &JwtKeys {
        &self.jwt
    }
}

impl BookingsState {
    pub fn today(&self) -> NaiveDate {
        today_in(self.time_zone)
    }

    async fn property_or_404(&self, id: i64) -> Result<Property, VacationStayError> {
        if id <= 0 {
            return Err(validation_error("Invalid property id"));
        }
        self.properties
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(format!("Property not found with id: {}", id)))
    }

    async fn booking_or_404(&self, id: i64) -> Result<Booking, VacationStayError> {
        if id <= 0 {
            return Err(validation_error("Invalid booking id"));
        }
        self.bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(format!("Booking not found with id: {}", id)))
    }

    async fn intervals_of(
        &self,
        property_id: i64,
    ) -> Result<Vec<BookedInterval>, VacationStayError> {
        let active = self.bookings.find_active_by_property(property_id).await?;
        Ok(booked_intervals(&active))
    }

    /// The guest, the listing's owner, or an admin.
    async fn ensure_party(
        &self,
        caller: &AuthUser,
        booking: &Booking,
    ) -> Result<(), VacationStayError> {
        if caller.ensure_self_or_admin(booking.user_id).is_ok() {
            return Ok(());
        }
        let owner = self
            .properties
            .find_by_id(booking.property_id)
            .await?
            .and_then(|p| p.owner_id);
        match owner {
            Some(owner_id) => caller.ensure_any_of_or_admin(&[booking.user_id, owner_id]),
            None => caller.ensure_self_or_admin(booking.user_id),
        }
    }
}

// --- Public ---

/// Whether a stay can still be booked.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/bookings/property/{property_id}/availability",
    params(("property_id" = i64, Path, description = "Property id"), StayQuery),
    responses(
        (status = 200, description = "Availability of the stay", body = AvailabilityResponse),
        (status = 400, description = "Malformed dates", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse)
    ),
    tag = "Bookings"
))]
pub async fn availability_handler(
    State(state): State<Arc<BookingsState>>,
    Path(property_id): Path<i64>,
    Query(query): Query<StayQuery>,
) -> Result<Json<AvailabilityResponse>, VacationStayError> {
    let property = state.property_or_404(property_id).await?;
    let range = parse_range(&query.start_date, &query.end_date)?;
    let booked = state.intervals_of(property.id).await?;

    let available = is_range_available(&range, state.today(), &booked);
    Ok(Json(AvailabilityResponse { available }))
}

/// Booked intervals and disabled dates for the date picker.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/bookings/property/{property_id}/calendar",
    params(("property_id" = i64, Path, description = "Property id"), CalendarQuery),
    responses(
        (status = 200, description = "Calendar window", body = CalendarResponse),
        (status = 400, description = "Malformed or oversized window", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse)
    ),
    tag = "Bookings"
))]
pub async fn calendar_handler(
    State(state): State<Arc<BookingsState>>,
    Path(property_id): Path<i64>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, VacationStayError> {
    let property = state.property_or_404(property_id).await?;
    let today = state.today();
    let (from, to) = calendar_window(query.from.as_deref(), query.to.as_deref(), today)?;

    let booked: Vec<BookedInterval> = state
        .intervals_of(property.id)
        .await?
        .into_iter()
        .filter(|interval| interval.start <= to && interval.end >= from)
        .collect();
    let disabled_dates = disabled_dates(from, to, today, &booked);

    Ok(Json(CalendarResponse {
        property_id: property.id,
        from,
        to,
        today,
        booked,
        disabled_dates,
    }))
}

/// Price of a stay at the listing's nightly rate.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/bookings/property/{property_id}/quote",
    params(("property_id" = i64, Path, description = "Property id"), StayQuery),
    responses(
        (status = 200, description = "Nights and total price", body = Quote),
        (status = 400, description = "Invalid stay", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse)
    ),
    tag = "Bookings"
))]
pub async fn quote_handler(
    State(state): State<Arc<BookingsState>>,
    Path(property_id): Path<i64>,
    Query(query): Query<StayQuery>,
) -> Result<Json<Quote>, VacationStayError> {
    let property = state.property_or_404(property_id).await?;
    let range = parse_range(&query.start_date, &query.end_date)?;
    Ok(Json(quote(&range, property.price, state.today())?))
}

// --- Booking lifecycle ---

/// Book a stay. The price is computed from the listing's nightly rate.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking confirmed", body = Booking),
        (status = 400, description = "Invalid stay", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse),
        (status = 409, description = "Dates already taken", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
))]
pub async fn create_booking_handler(
    State(state): State<Arc<BookingsState>>,
    caller: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), VacationStayError> {
    let property = state.property_or_404(payload.property_id).await?;
    let range = parse_range(&payload.start_date, &payload.end_date)?;
    let today = state.today();
    let priced = quote(&range, property.price, today)?;

    let booking = state
        .bookings
        .create_if(
            NewBooking {
                property_id: property.id,
                user_id: caller.id,
                start_date: range.start,
                end_date: range.end,
                total_price: priced.total_price,
            },
            |existing| is_range_available(&range, today, &booked_intervals(existing)),
        )
        .await?
        .ok_or_else(|| {
            warn!(
                "User {} lost dates {} - {} on property {}",
                caller.id, range.start, range.end, property.id
            );
            BookingError::Unavailable
        })?;

    info!(
        "User {} booked property {} for {} nights (booking {})",
        caller.id, property.id, priced.nights, booking.id
    );
    Ok((StatusCode::CREATED, Json(booking)))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/bookings",
    responses(
        (status = 200, description = "Every booking", body = [Booking]),
        (status = 403, description = "Not an admin", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
))]
pub async fn list_bookings_handler(
    State(state): State<Arc<BookingsState>>,
    caller: AuthUser,
) -> Result<Json<Vec<Booking>>, VacationStayError> {
    caller.ensure_admin()?;
    Ok(Json(state.bookings.find_all().await?))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "The booking", body = Booking),
        (status = 403, description = "Neither guest, owner nor admin", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such booking", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
))]
pub async fn get_booking_handler(
    State(state): State<Arc<BookingsState>>,
    Path(id): Path<i64>,
    caller: AuthUser,
) -> Result<Json<Booking>, VacationStayError> {
    let booking = state.booking_or_404(id).await?;
    state.ensure_party(&caller, &booking).await?;
    Ok(Json(booking))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/bookings/user/{user_id}",
    params(("user_id" = i64, Path, description = "Guest user id")),
    responses(
        (status = 200, description = "The guest's bookings, latest check-in first", body = [Booking]),
        (status = 403, description = "Someone else's bookings", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
))]
pub async fn user_bookings_handler(
    State(state): State<Arc<BookingsState>>,
    Path(user_id): Path<i64>,
    caller: AuthUser,
) -> Result<Json<Vec<Booking>>, VacationStayError> {
    caller.ensure_self_or_admin(user_id)?;
    Ok(Json(state.bookings.find_by_user(user_id).await?))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/bookings/property/{property_id}",
    params(("property_id" = i64, Path, description = "Property id")),
    responses(
        (status = 200, description = "The listing's bookings by check-in", body = [Booking]),
        (status = 403, description = "Not the owner", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
))]
pub async fn property_bookings_handler(
    State(state): State<Arc<BookingsState>>,
    Path(property_id): Path<i64>,
    caller: AuthUser,
) -> Result<Json<Vec<Booking>>, VacationStayError> {
    let property = state.property_or_404(property_id).await?;
    match property.owner_id {
        Some(owner_id) => caller.ensure_self_or_admin(owner_id)?,
        None => caller.ensure_admin()?,
    }
    Ok(Json(state.bookings.find_by_property(property.id).await?))
}

/// Move a confirmed booking to new dates and reprice it.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/bookings/{id}",
    params(("id" = i64, Path, description = "Booking id")),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Booking moved", body = Booking),
        (status = 400, description = "Invalid stay", body = vacationstay_common::ErrorResponse),
        (status = 403, description = "Not the guest", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such booking", body = vacationstay_common::ErrorResponse),
        (status = 409, description = "Dates taken or booking cancelled", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
))]
pub async fn reschedule_booking_handler(
    State(state): State<Arc<BookingsState>>,
    Path(id): Path<i64>,
    caller: AuthUser,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<Booking>, VacationStayError> {
    let booking = state.booking_or_404(id).await?;
    caller.ensure_self_or_admin(booking.user_id)?;
    ensure_modifiable(&booking)?;

    let property = state.property_or_404(booking.property_id).await?;
    let range = parse_range(&payload.start_date, &payload.end_date)?;
    let today = state.today();
    let priced = quote(&range, property.price, today)?;

    let moved = state
        .bookings
        .reschedule_if(
            booking.id,
            range.start,
            range.end,
            priced.total_price,
            |others| is_range_available(&range, today, &booked_intervals(others)),
        )
        .await?
        .ok_or(BookingError::Unavailable)?;

    info!("User {} moved booking {} to {} - {}", caller.id, id, range.start, range.end);
    Ok(Json(moved))
}

/// Cancel a confirmed booking, freeing its dates.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    patch,
    path = "/bookings/{id}/cancel",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 403, description = "Neither guest, owner nor admin", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such booking", body = vacationstay_common::ErrorResponse),
        (status = 409, description = "Already cancelled", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
))]
pub async fn cancel_booking_handler(
    State(state): State<Arc<BookingsState>>,
    Path(id): Path<i64>,
    caller: AuthUser,
) -> Result<Json<Booking>, VacationStayError> {
    let booking = state.booking_or_404(id).await?;
    state.ensure_party(&caller, &booking).await?;
    ensure_cancellable(&booking)?;

    let cancelled = state
        .bookings
        .update_status(booking.id, BookingStatus::Cancelled)
        .await?
        .ok_or_else(|| not_found(format!("Booking not found with id: {}", id)))?;

    info!("User {} cancelled booking {}", caller.id, id);
    Ok(Json(cancelled))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/bookings/{id}",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 403, description = "Not the guest", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such booking", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
))]
pub async fn delete_booking_handler(
    State(state): State<Arc<BookingsState>>,
    Path(id): Path<i64>,
    caller: AuthUser,
) -> Result<StatusCode, VacationStayError> {
    let booking = state.booking_or_404(id).await?;
    caller.ensure_self_or_admin(booking.user_id)?;
    state.bookings.delete(booking.id).await?;
    info!("User {} deleted booking {}", caller.id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's trips and listings.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Bookings with listing summary, and own listings", body = DashboardResponse),
        (status = 401, description = "Not signed in", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
))]
pub async fn dashboard_handler(
    State(state): State<Arc<BookingsState>>,
    caller: AuthUser,
) -> Result<Json<DashboardResponse>, VacationStayError> {
    let bookings = state.bookings.find_by_user(caller.id).await?;

    let mut listings: HashMap<i64, Option<Property>> = HashMap::new();
    for booking in &bookings {
        if !listings.contains_key(&booking.property_id) {
            let property = state.properties.find_by_id(booking.property_id).await?;
            listings.insert(booking.property_id, property);
        }
    }

    let bookings = bookings
        .into_iter()
        .map(|booking| {
            let property = listings.get(&booking.property_id).and_then(Option::as_ref);
            DashboardBooking::new(booking, property)
        })
        .collect();
    let properties = state.properties.find_by_owner(caller.id).await?;

    Ok(Json(DashboardResponse {
        bookings,
        properties,
    }))
}
