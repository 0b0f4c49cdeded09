// --- File: crates/vacationstay_properties/src/logic.rs ---

use serde::{Deserialize, Serialize};
use vacationstay_common::{validation_error, FieldErrors, VacationStayError};
use vacationstay_db::{Property, PropertyDraft, PropertyFilter};

pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_COMMENT_LEN: usize = 1000;

// --- Search ---

/// Query string of the listing search page.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Case-insensitive substring of the location
    #[cfg_attr(feature = "openapi", schema(example = "Zermatt"))]
    pub location: Option<String>,

    /// Nightly rate must be above this (minor units)
    pub min_price: Option<i64>,

    /// Nightly rate must be below this (minor units)
    pub max_price: Option<i64>,

    /// Minimum number of bedrooms
    pub bedrooms: Option<i64>,

    /// Minimum number of bathrooms
    pub bathrooms: Option<i64>,

    /// Number of guests the property must hold
    pub guests: Option<i64>,

    /// Maximum number of results
    pub limit: Option<u32>,
}

impl SearchParams {
    pub fn to_filter(&self) -> PropertyFilter {
        PropertyFilter {
            location: self
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            min_price: self.min_price,
            max_price: self.max_price,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            guests: self.guests,
            owner_id: None,
            limit: self.limit,
        }
    }
}

// --- Listings ---

/// Body of create and update. Every field is checked before anything is stored.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Nightly rate in minor currency units
    pub price: Option<i64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub max_guests: Option<i64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

pub fn validate_property(req: &PropertyRequest) -> Result<PropertyDraft, VacationStayError> {
    let title = trimmed(&req.title);
    let description = trimmed(&req.description);
    let location = trimmed(&req.location);

    let mut errors = FieldErrors::new();
    errors
        .require(Some(&title), "title", "Title is required")
        .require(Some(&description), "description", "Description is required")
        .check(
            description.chars().count() > MAX_DESCRIPTION_LEN,
            "description",
            "Description cannot exceed 2000 characters",
        )
        .require(Some(&location), "location", "Location is required")
        .check(req.price.is_none(), "price", "Price is required")
        .check(req.price.is_some_and(|p| p <= 0), "price", "Price must be greater than 0")
        .check(req.bedrooms.is_none(), "bedrooms", "Number of bedrooms is required")
        .check(
            req.bedrooms.is_some_and(|n| n < 0),
            "bedrooms",
            "Number of bedrooms cannot be negative",
        )
        .check(req.bathrooms.is_none(), "bathrooms", "Number of bathrooms is required")
        .check(
            req.bathrooms.is_some_and(|n| n < 0),
            "bathrooms",
            "Number of bathrooms cannot be negative",
        )
        .check(req.max_guests.is_none(), "maxGuests", "Maximum guests is required")
        .check(
            req.max_guests.is_some_and(|n| n <= 0),
            "maxGuests",
            "Maximum guests must be greater than 0",
        );
    errors.into_result()?;

    Ok(PropertyDraft {
        title,
        description,
        location,
        price: req.price.unwrap_or_default(),
        bedrooms: req.bedrooms.unwrap_or_default(),
        bathrooms: req.bathrooms.unwrap_or_default(),
        max_guests: req.max_guests.unwrap_or_default(),
        amenities: non_blank(&req.amenities),
        images: non_blank(&req.images),
    })
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().unwrap_or("").trim().to_string()
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Path ids are positive.
pub fn check_id(id: i64, what: &str) -> Result<i64, VacationStayError> {
    if id > 0 {
        Ok(id)
    } else {
        Err(validation_error(format!("Invalid {} id", what)))
    }
}

/// Detail page payload: the listing plus its review summary.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    pub average_rating: f64,
    pub review_count: usize,
}

impl PropertyDetail {
    pub fn new(property: Property, ratings: &[i64]) -> Self {
        Self {
            property,
            average_rating: average_rating(ratings),
            review_count: ratings.len(),
        }
    }
}

/// Mean star rating rounded to one decimal; 0.0 without ratings.
pub fn average_rating(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let mean = ratings.iter().sum::<i64>() as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

// --- Reviews ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReviewRequest {
    /// 1 to 5 stars
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

/// Validated rating and comment; a blank comment becomes `None`.
pub fn validate_review(req: &ReviewRequest) -> Result<(i64, Option<String>), VacationStayError> {
    let comment = req
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let mut errors = FieldErrors::new();
    errors
        .check(req.rating.is_none(), "rating", "Rating is required")
        .check(
            req.rating.is_some_and(|r| !(1..=5).contains(&r)),
            "rating",
            "Rating must be between 1 and 5",
        )
        .check(
            comment.as_ref().is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN),
            "comment",
            "Comment cannot exceed 1000 characters",
        );
    errors.into_result()?;

    Ok((req.rating.unwrap_or_default(), comment))
}
