//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod listings;

use axum::Router;
use axum::routing::get;

use propdesk_app::ports::{ListingRepository, Notifier};

use crate::state::AppState;

/// Build the `/api` sub-router.
///
/// `{collection}` is the plural or singular name of an entity kind.
pub fn routes<R, N>() -> Router<AppState<R, N>>
where
    R: ListingRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/{collection}",
            get(listings::list::<R, N>).post(listings::create::<R, N>),
        )
        .route(
            "/{collection}/{id}",
            get(listings::get::<R, N>)
                .patch(listings::update::<R, N>)
                .delete(listings::delete::<R, N>),
        )
}
