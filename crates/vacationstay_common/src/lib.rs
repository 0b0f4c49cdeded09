//! Building blocks shared by every VacationStay crate: the error type and its
//! HTTP rendering, field validation, time zone helpers and logging bootstrap.

pub mod error;
pub mod http;
pub mod logging;
pub mod time;
pub mod validation;

pub use error::{
    config_error, conflict, forbidden, internal_error, not_found, unauthorized, validation_error,
    Context, HttpStatusCode, VacationStayError,
};
pub use http::{ErrorResponse, IntoHttpResponse, MessageResponse};
pub use validation::FieldErrors;
