//! Storage port: repository trait for listing persistence.

use std::future::Future;

use propdesk_domain::error::PropdeskError;
use propdesk_domain::id::ListingId;
use propdesk_domain::listing::Listing;
use propdesk_domain::query::{ListQuery, Page};
use propdesk_domain::schema::EntityKind;

/// Persistence backend for every entity kind.
///
/// Implementations own durability, uniqueness, and referential integrity.
/// Each mutating method must be a single atomic write.
pub trait ListingRepository {
    /// Insert a new listing.
    fn create(
        &self,
        listing: Listing,
    ) -> impl Future<Output = Result<Listing, PropdeskError>> + Send;

    /// Fetch one listing of `kind` by id.
    fn get_by_id(
        &self,
        kind: EntityKind,
        id: ListingId,
    ) -> impl Future<Output = Result<Option<Listing>, PropdeskError>> + Send;

    /// Fetch every listing of `kind` whose id is in `ids`, in any order.
    fn find_by_ids(
        &self,
        kind: EntityKind,
        ids: Vec<ListingId>,
    ) -> impl Future<Output = Result<Vec<Listing>, PropdeskError>> + Send;

    /// Run a resolved query: filter, order (with the `id` tiebreak), then
    /// window. `total` counts matches before the window is applied.
    fn find_many(
        &self,
        kind: EntityKind,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Listing>, PropdeskError>> + Send;

    /// Replace the stored fields and `updated_at` of an existing listing.
    /// Returns `None` when no row with that id exists.
    fn update(
        &self,
        listing: Listing,
    ) -> impl Future<Output = Result<Option<Listing>, PropdeskError>> + Send;

    /// Hard-delete a listing. Returns whether a row was removed.
    fn delete(
        &self,
        kind: EntityKind,
        id: ListingId,
    ) -> impl Future<Output = Result<bool, PropdeskError>> + Send;
}

impl<T: ListingRepository + Send + Sync> ListingRepository for std::sync::Arc<T> {
    fn create(
        &self,
        listing: Listing,
    ) -> impl Future<Output = Result<Listing, PropdeskError>> + Send {
        (**self).create(listing)
    }

    fn get_by_id(
        &self,
        kind: EntityKind,
        id: ListingId,
    ) -> impl Future<Output = Result<Option<Listing>, PropdeskError>> + Send {
        (**self).get_by_id(kind, id)
    }

    fn find_by_ids(
        &self,
        kind: EntityKind,
        ids: Vec<ListingId>,
    ) -> impl Future<Output = Result<Vec<Listing>, PropdeskError>> + Send {
        (**self).find_by_ids(kind, ids)
    }

    fn find_many(
        &self,
        kind: EntityKind,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Listing>, PropdeskError>> + Send {
        (**self).find_many(kind, query)
    }

    fn update(
        &self,
        listing: Listing,
    ) -> impl Future<Output = Result<Option<Listing>, PropdeskError>> + Send {
        (**self).update(listing)
    }

    fn delete(
        &self,
        kind: EntityKind,
        id: ListingId,
    ) -> impl Future<Output = Result<bool, PropdeskError>> + Send {
        (**self).delete(kind, id)
    }
}
