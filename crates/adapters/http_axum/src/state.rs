//! Shared application state for axum handlers.

use std::sync::Arc;

use propdesk_app::ports::{ListingRepository, Notifier};
use propdesk_app::services::listing_service::ListingService;

/// Application state shared across all axum handlers.
///
/// Generic over the repository and notifier to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`: only the `Arc` wrappers are cloned.
pub struct AppState<R, N> {
    /// Listing query and CRUD service.
    pub listing_service: Arc<ListingService<R>>,
    /// Receives a message after each create of a notifying kind.
    pub notifier: Arc<N>,
}

impl<R, N> Clone for AppState<R, N> {
    fn clone(&self) -> Self {
        Self {
            listing_service: Arc::clone(&self.listing_service),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<R, N> AppState<R, N>
where
    R: ListingRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(listing_service: ListingService<R>, notifier: N) -> Self {
        Self {
            listing_service: Arc::new(listing_service),
            notifier: Arc::new(notifier),
        }
    }
}
