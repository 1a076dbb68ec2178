//! Log-only [`Notifier`] used until a mail or chat transport is configured.

use propdesk_app::ports::{NotificationError, Notifier};
use propdesk_domain::listing::Listing;

/// Writes one structured log line per created listing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn listing_created(&self, listing: &Listing) -> Result<(), NotificationError> {
        let contact = listing
            .field("email")
            .and_then(|value| value.as_str())
            .unwrap_or("-");
        tracing::info!(
            kind = %listing.kind,
            id = %listing.id,
            contact,
            "new submission received"
        );
        Ok(())
    }
}
