//! Notification port: tells the outside world about new records.

use std::future::Future;

use propdesk_domain::listing::Listing;

/// Delivery failure reported by a [`Notifier`]. Never fatal to the caller.
#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed")]
pub struct NotificationError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

/// Sends confirmation or alert messages after a successful create of a kind
/// whose schema sets `notify_on_create`.
pub trait Notifier {
    fn listing_created(
        &self,
        listing: &Listing,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

impl<T: Notifier + Send + Sync> Notifier for std::sync::Arc<T> {
    fn listing_created(
        &self,
        listing: &Listing,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send {
        (**self).listing_created(listing)
    }
}
