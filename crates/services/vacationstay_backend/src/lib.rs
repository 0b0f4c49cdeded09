// --- File: crates/services/vacationstay_backend/src/lib.rs ---
//! Composition root of the VacationStay server.

pub mod app;
pub mod app_state;

pub use app::build_app;
pub use app_state::{AppState, AppStateBuilder};
