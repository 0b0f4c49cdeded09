//! Domain records stored by the repositories.
//!
//! Prices are integers in the minor unit of the configured currency
//! (e.g. cents). Booking dates are calendar dates without a time zone.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// --- Users ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A stored account. `password_hash` is `None` for accounts created through an
/// external identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub image_url: Option<String>,
    pub provider: String,
    pub provider_id: Option<String>,
    pub roles: BTreeSet<Role>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn is_local(&self) -> bool {
        self.provider == LOCAL_PROVIDER
    }
}

pub const LOCAL_PROVIDER: &str = "local";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub image_url: Option<String>,
    pub provider: String,
    pub provider_id: Option<String>,
    pub roles: BTreeSet<Role>,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub image_url: Option<String>,
}

// --- Properties ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Nightly rate in minor currency units.
    pub price: i64,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub max_guests: i64,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub owner_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Listing fields supplied by the owner, used for both create and full update.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: i64,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub max_guests: i64,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
}

/// Search criteria for listings. Every `None` is ignored.
///
/// `min_price` and `max_price` are exclusive bounds; `bedrooms`, `bathrooms`
/// and `guests` are inclusive minimums.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    pub location: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub guests: Option<i64>,
    pub owner_id: Option<i64>,
    pub limit: Option<u32>,
}

// --- Bookings ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub property_id: i64,
    pub user_id: i64,
    /// Check-in date.
    pub start_date: NaiveDate,
    /// Check-out date.
    pub end_date: NaiveDate,
    pub total_price: i64,
    pub status: BookingStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub property_id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: i64,
}

// --- Reviews ---

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub property_id: i64,
    pub user_id: i64,
    /// 1 to 5 stars.
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A review joined with its author's display name.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub property_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
}
