// --- File: crates/vacationstay_bookings/src/doc.rs ---
#![cfg(feature = "openapi")]

use utoipa::OpenApi;
use vacationstay_db::{Booking, BookingStatus};

use crate::logic::{
    AvailabilityResponse, BookedInterval, CalendarQuery, CalendarResponse, CreateBookingRequest,
    DashboardBooking, DashboardResponse, Quote, RescheduleRequest, StayQuery,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::availability_handler,
        crate::handlers::calendar_handler,
        crate::handlers::quote_handler,
        crate::handlers::create_booking_handler,
        crate::handlers::list_bookings_handler,
        crate::handlers::get_booking_handler,
        crate::handlers::user_bookings_handler,
        crate::handlers::property_bookings_handler,
        crate::handlers::reschedule_booking_handler,
        crate::handlers::cancel_booking_handler,
        crate::handlers::delete_booking_handler,
        crate::handlers::dashboard_handler
    ),
    components(
        schemas(
            Booking,
            BookingStatus,
            BookedInterval,
            Quote,
            StayQuery,
            CalendarQuery,
            AvailabilityResponse,
            CalendarResponse,
            CreateBookingRequest,
            RescheduleRequest,
            DashboardBooking,
            DashboardResponse
        )
    ),
    tags(
        (name = "Bookings", description = "Availability, booking lifecycle and dashboard")
    ),
    servers(
        (url = "/api", description = "VacationStay API")
    )
)]
pub struct BookingsApiDoc;
