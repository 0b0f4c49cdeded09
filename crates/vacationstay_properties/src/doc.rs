// --- File: crates/vacationstay_properties/src/doc.rs ---
#![cfg(feature = "openapi")]

use utoipa::OpenApi;
use vacationstay_db::{Property, Review, ReviewWithAuthor};

use crate::logic::{PropertyDetail, PropertyRequest, ReviewRequest, SearchParams};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::list_properties_handler,
        crate::handlers::get_property_handler,
        crate::handlers::create_property_handler,
        crate::handlers::update_property_handler,
        crate::handlers::delete_property_handler,
        crate::handlers::owner_properties_handler,
        crate::handlers::list_reviews_handler,
        crate::handlers::create_review_handler,
        crate::handlers::update_review_handler,
        crate::handlers::delete_review_handler
    ),
    components(
        schemas(
            Property,
            PropertyDetail,
            PropertyRequest,
            SearchParams,
            Review,
            ReviewWithAuthor,
            ReviewRequest
        )
    ),
    tags(
        (name = "Properties", description = "Listings and search"),
        (name = "Reviews", description = "Guest reviews of listings")
    ),
    servers(
        (url = "/api", description = "VacationStay API")
    )
)]
pub struct PropertiesApiDoc;
