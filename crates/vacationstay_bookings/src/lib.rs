// --- File: crates/vacationstay_bookings/src/lib.rs ---
//! Bookings for VacationStay.
//!
//! [`logic`] holds the availability and pricing rules as pure functions; the
//! handlers apply them to stored bookings, and re-apply them inside the write
//! transaction when a booking is created or moved.

pub mod doc;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
#[cfg(test)]
mod logic_test;
pub mod routes;

pub use handlers::BookingsState;
pub use logic::BookingError;
