// --- File: crates/vacationstay_properties/src/handlers.rs ---

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;
use vacationstay_auth::{AuthUser, JwtKeys, JwtProvider};
use vacationstay_common::{not_found, VacationStayError};
use vacationstay_db::{
    NewReview, Property, PropertyRepository, Review, ReviewRepository, ReviewWithAuthor,
    SqlPropertyRepository, SqlReviewRepository,
};

use crate::logic::{
    check_id, validate_property, validate_review, PropertyDetail, PropertyRequest, ReviewRequest,
    SearchParams,
};

// Shared state for the listing and review routes
#[derive(Clone)]
pub struct PropertiesState {
    pub properties: SqlPropertyRepository,
    pub reviews: SqlReviewRepository,
    pub jwt: Arc<JwtKeys>,
}

impl JwtProvider for PropertiesState {
    fn jwt_keys(&self) -> &JwtKeys {
        &self.jwt
    }
}

impl PropertiesState {
    async fn property_or_404(&self, id: i64) -> Result<Property, VacationStayError> {
        self.properties
            .find_by_id(check_id(id, "property")?)
            .await?
            .ok_or_else(|| not_found(format!("Property not found with id: {}", id)))
    }

    async fn review_or_404(&self, id: i64) -> Result<Review, VacationStayError> {
        self.reviews
            .find_by_id(check_id(id, "review")?)
            .await?
            .ok_or_else(|| not_found(format!("Review not found with id: {}", id)))
    }
}

/// Listings without an owner can only be changed by an admin.
fn ensure_can_edit(caller: &AuthUser, property: &Property) -> Result<(), VacationStayError> {
    match property.owner_id {
        Some(owner_id) => caller.ensure_self_or_admin(owner_id),
        None => caller.ensure_admin(),
    }
}

/// Search listings.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/properties",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching listings ordered by id", body = [Property]),
        (status = 400, description = "Malformed query string")
    ),
    tag = "Properties"
))]
pub async fn list_properties_handler(
    State(state): State<Arc<PropertiesState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Property>>, VacationStayError> {
    let filter = params.to_filter();
    let properties = state.properties.search(&filter).await?;
    info!("Search {:?} matched {} listings", filter, properties.len());
    Ok(Json(properties))
}

/// Listing detail with its review summary.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/properties/{id}",
    params(("id" = i64, Path, description = "Property id")),
    responses(
        (status = 200, description = "Listing detail", body = PropertyDetail),
        (status = 400, description = "Invalid id", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse)
    ),
    tag = "Properties"
))]
pub async fn get_property_handler(
    State(state): State<Arc<PropertiesState>>,
    Path(id): Path<i64>,
) -> Result<Json<PropertyDetail>, VacationStayError> {
    let property = state.property_or_404(id).await?;
    let ratings = state.reviews.ratings_for_property(property.id).await?;
    Ok(Json(PropertyDetail::new(property, &ratings)))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/properties",
    request_body = PropertyRequest,
    responses(
        (status = 201, description = "Listing created", body = Property),
        (status = 400, description = "Invalid fields", body = vacationstay_common::ErrorResponse),
        (status = 401, description = "Not signed in", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Properties"
))]
pub async fn create_property_handler(
    State(state): State<Arc<PropertiesState>>,
    caller: AuthUser,
    Json(payload): Json<PropertyRequest>,
) -> Result<(StatusCode, Json<Property>), VacationStayError> {
    let draft = validate_property(&payload)?;
    let property = state.properties.create(Some(caller.id), draft).await?;
    info!("User {} listed property {}", caller.id, property.id);
    Ok((StatusCode::CREATED, Json(property)))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/properties/{id}",
    params(("id" = i64, Path, description = "Property id")),
    request_body = PropertyRequest,
    responses(
        (status = 200, description = "Listing updated", body = Property),
        (status = 400, description = "Invalid fields", body = vacationstay_common::ErrorResponse),
        (status = 403, description = "Not the owner", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Properties"
))]
pub async fn update_property_handler(
    State(state): State<Arc<PropertiesState>>,
    Path(id): Path<i64>,
    caller: AuthUser,
    Json(payload): Json<PropertyRequest>,
) -> Result<Json<Property>, VacationStayError> {
    let existing = state.property_or_404(id).await?;
    ensure_can_edit(&caller, &existing)?;
    let draft = validate_property(&payload)?;

    let updated = state
        .properties
        .update(existing.id, draft)
        .await?
        .ok_or_else(|| not_found(format!("Property not found with id: {}", id)))?;
    info!("User {} updated property {}", caller.id, updated.id);
    Ok(Json(updated))
}

/// Delete a listing with its bookings and reviews.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/properties/{id}",
    params(("id" = i64, Path, description = "Property id")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 403, description = "Not the owner", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Properties"
))]
pub async fn delete_property_handler(
    State(state): State<Arc<PropertiesState>>,
    Path(id): Path<i64>,
    caller: AuthUser,
) -> Result<StatusCode, VacationStayError> {
    let existing = state.property_or_404(id).await?;
    ensure_can_edit(&caller, &existing)?;

    if !state.properties.delete(existing.id).await? {
        return Err(not_found(format!("Property not found with id: {}", id)));
    }
    info!("User {} deleted property {}", caller.id, existing.id);
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/properties/owner/{owner_id}",
    params(("owner_id" = i64, Path, description = "Owner user id")),
    responses(
        (status = 200, description = "The owner's listings", body = [Property])
    ),
    tag = "Properties"
))]
pub async fn owner_properties_handler(
    State(state): State<Arc<PropertiesState>>,
    Path(owner_id): Path<i64>,
) -> Result<Json<Vec<Property>>, VacationStayError> {
    let owner_id = check_id(owner_id, "owner")?;
    Ok(Json(state.properties.find_by_owner(owner_id).await?))
}

// --- Reviews ---

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/properties/{id}/reviews",
    params(("id" = i64, Path, description = "Property id")),
    responses(
        (status = 200, description = "Reviews, newest first", body = [ReviewWithAuthor]),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse)
    ),
    tag = "Reviews"
))]
pub async fn list_reviews_handler(
    State(state): State<Arc<PropertiesState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ReviewWithAuthor>>, VacationStayError> {
    let property = state.property_or_404(id).await?;
    Ok(Json(state.reviews.find_by_property(property.id).await?))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/properties/{id}/reviews",
    params(("id" = i64, Path, description = "Property id")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = Review),
        (status = 400, description = "Invalid rating or comment", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such listing", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
))]
pub async fn create_review_handler(
    State(state): State<Arc<PropertiesState>>,
    Path(id): Path<i64>,
    caller: AuthUser,
    Json(payload): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>), VacationStayError> {
    let property = state.property_or_404(id).await?;
    let (rating, comment) = validate_review(&payload)?;

    let review = state
        .reviews
        .create(NewReview {
            property_id: property.id,
            user_id: caller.id,
            rating,
            comment,
        })
        .await?;
    info!("User {} reviewed property {} ({} stars)", caller.id, property.id, rating);
    Ok((StatusCode::CREATED, Json(review)))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/reviews/{id}",
    params(("id" = i64, Path, description = "Review id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 403, description = "Not the author", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such review", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
))]
pub async fn update_review_handler(
    State(state): State<Arc<PropertiesState>>,
    Path(id): Path<i64>,
    caller: AuthUser,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<Review>, VacationStayError> {
    let existing = state.review_or_404(id).await?;
    caller.ensure_self_or_admin(existing.user_id)?;
    let (rating, comment) = validate_review(&payload)?;

    let updated = state
        .reviews
        .update(existing.id, rating, comment)
        .await?
        .ok_or_else(|| not_found(format!("Review not found with id: {}", id)))?;
    Ok(Json(updated))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/reviews/{id}",
    params(("id" = i64, Path, description = "Review id")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Not the author", body = vacationstay_common::ErrorResponse),
        (status = 404, description = "No such review", body = vacationstay_common::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
))]
pub async fn delete_review_handler(
    State(state): State<Arc<PropertiesState>>,
    Path(id): Path<i64>,
    caller: AuthUser,
) -> Result<StatusCode, VacationStayError> {
    let existing = state.review_or_404(id).await?;
    caller.ensure_self_or_admin(existing.user_id)?;
    state.reviews.delete(existing.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
