// --- File: crates/vacationstay_properties/src/lib.rs ---
//! Listings for VacationStay: search, detail pages, owner management and
//! guest reviews.

pub mod doc;
pub mod handlers;
pub mod logic;
pub mod routes;

pub use handlers::PropertiesState;
