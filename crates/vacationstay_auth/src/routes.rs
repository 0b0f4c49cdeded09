// --- File: crates/vacationstay_auth/src/routes.rs ---

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{login_handler, me_handler, register_handler, update_me_handler, AuthState};

/// Account routes, relative to `/api`.
pub fn routes(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/me", get(me_handler).put(update_me_handler))
        .with_state(state)
}
