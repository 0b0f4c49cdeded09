//! Repository for listings

use crate::error::DbError;
use crate::models::{Property, PropertyDraft, PropertyFilter};
use crate::query::{Order, TableQuery};

pub(crate) const TABLE: &str = "properties";

impl PropertyFilter {
    /// The select behind a listing search.
    ///
    /// `location` matches case-insensitively anywhere in the column. Blank
    /// locations are ignored. Results come back in id order.
    pub fn to_query(&self) -> TableQuery {
        let mut query = TableQuery::select(TABLE);

        if let Some(location) = self.location.as_deref().map(str::trim) {
            if !location.is_empty() {
                query = query.like("location", format!("%{}%", location));
            }
        }
        if let Some(min_price) = self.min_price {
            query = query.gt("price", min_price);
        }
        if let Some(max_price) = self.max_price {
            query = query.lt("price", max_price);
        }
        if let Some(bedrooms) = self.bedrooms {
            query = query.gte("bedrooms", bedrooms);
        }
        if let Some(bathrooms) = self.bathrooms {
            query = query.gte("bathrooms", bathrooms);
        }
        if let Some(guests) = self.guests {
            query = query.gte("max_guests", guests);
        }
        if let Some(owner_id) = self.owner_id {
            query = query.eq("owner_id", owner_id);
        }

        query = query.order_by("id", Order::Asc);
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}

/// Storage for listings
pub trait PropertyRepository {
    /// Create the `properties` table if it doesn't exist
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    fn create(
        &self,
        owner_id: Option<i64>,
        draft: PropertyDraft,
    ) -> impl std::future::Future<Output = Result<Property, DbError>> + Send;

    fn find_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Property>, DbError>> + Send;

    fn find_all(&self) -> impl std::future::Future<Output = Result<Vec<Property>, DbError>> + Send;

    /// Listings matching every criterion set in `filter`
    fn search(
        &self,
        filter: &PropertyFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Property>, DbError>> + Send;

    fn find_by_owner(
        &self,
        owner_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Property>, DbError>> + Send;

    /// Replace the owner-editable fields. `None` when the listing doesn't exist.
    fn update(
        &self,
        id: i64,
        draft: PropertyDraft,
    ) -> impl std::future::Future<Output = Result<Option<Property>, DbError>> + Send;

    /// Delete a listing together with its bookings and reviews
    ///
    /// `false` if no listing had this id.
    fn delete(&self, id: i64) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}
