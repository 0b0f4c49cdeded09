// --- File: crates/vacationstay_properties/src/routes.rs ---

use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::{
    create_property_handler, create_review_handler, delete_property_handler,
    delete_review_handler, get_property_handler, list_properties_handler, list_reviews_handler,
    owner_properties_handler, update_property_handler, update_review_handler, PropertiesState,
};

/// Listing and review routes, relative to `/api`.
pub fn routes(state: Arc<PropertiesState>) -> Router {
    Router::new()
        .route(
            "/properties",
            get(list_properties_handler).post(create_property_handler),
        )
        .route(
            "/properties/{id}",
            get(get_property_handler)
                .put(update_property_handler)
                .delete(delete_property_handler),
        )
        .route("/properties/owner/{owner_id}", get(owner_properties_handler))
        .route(
            "/properties/{id}/reviews",
            get(list_reviews_handler).post(create_review_handler),
        )
        .route(
            "/reviews/{id}",
            put(update_review_handler).delete(delete_review_handler),
        )
        .with_state(state)
}
