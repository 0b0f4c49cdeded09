// --- File: crates/vacationstay_bookings/src/routes.rs ---

use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::handlers::{
    availability_handler, calendar_handler, cancel_booking_handler, create_booking_handler,
    dashboard_handler, delete_booking_handler, get_booking_handler, list_bookings_handler,
    property_bookings_handler, quote_handler, reschedule_booking_handler, user_bookings_handler,
    BookingsState,
};

/// Availability, booking and dashboard routes, relative to `/api`.
pub fn routes(state: Arc<BookingsState>) -> Router {
    Router::new()
        // Public
        .route(
            "/bookings/property/{property_id}/availability",
            get(availability_handler),
        )
        .route(
            "/bookings/property/{property_id}/calendar",
            get(calendar_handler),
        )
        .route("/bookings/property/{property_id}/quote", get(quote_handler))
        // Signed in
        .route(
            "/bookings",
            get(list_bookings_handler).post(create_booking_handler),
        )
        .route(
            "/bookings/{id}",
            get(get_booking_handler)
                .put(reschedule_booking_handler)
                .delete(delete_booking_handler),
        )
        .route("/bookings/{id}/cancel", patch(cancel_booking_handler))
        .route("/bookings/user/{user_id}", get(user_bookings_handler))
        .route(
            "/bookings/property/{property_id}",
            get(property_bookings_handler),
        )
        .route("/dashboard", get(dashboard_handler))
        .with_state(state)
}
