//! JSON REST handlers for every entity kind.

use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use propdesk_app::ports::{ListingRepository, Notifier};
use propdesk_domain::error::ValidationError;
use propdesk_domain::id::ListingId;
use propdesk_domain::listing::Listing;
use propdesk_domain::query::{ListRequest, Page};
use propdesk_domain::schema::EntityKind;
use propdesk_domain::value::Fields;

use crate::error::ApiError;
use crate::state::AppState;

type Params = Result<Query<Vec<(String, String)>>, QueryRejection>;
type Body = Result<Json<Fields>, JsonRejection>;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Page<Listing>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<Listing>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Listing>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn parse_target(collection: &str, id: &str) -> Result<(EntityKind, ListingId), ValidationError> {
    let kind = EntityKind::from_str(collection)?;
    let id = ListingId::from_str(id).map_err(|_| ValidationError::InvalidId(id.to_string()))?;
    Ok((kind, id))
}

/// Collect `expand` values, accepting both repeated keys and comma lists.
fn expand_paths(params: &[(String, String)]) -> Vec<String> {
    params
        .iter()
        .filter(|(key, _)| key == "expand")
        .flat_map(|(_, value)| value.split(','))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// `GET /api/{collection}`
pub async fn list<R, N>(
    State(state): State<AppState<R, N>>,
    Path(collection): Path<String>,
    params: Params,
) -> Result<ListResponse, ApiError>
where
    R: ListingRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let kind = EntityKind::from_str(&collection)?;
    let Query(params) = params?;
    let request = ListRequest::from_params(kind.schema(), params)?;
    let page = state.listing_service.list(kind, &request).await?;
    Ok(ListResponse::Ok(Json(page)))
}

/// `GET /api/{collection}/{id}`
pub async fn get<R, N>(
    State(state): State<AppState<R, N>>,
    Path((collection, id)): Path<(String, String)>,
    params: Params,
) -> Result<GetResponse, ApiError>
where
    R: ListingRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let (kind, id) = parse_target(&collection, &id)?;
    let Query(params) = params?;
    let expand = expand_paths(&params);
    let listing = state
        .listing_service
        .get(kind, id, expand.as_slice())
        .await?;
    Ok(GetResponse::Ok(Json(listing)))
}

/// `POST /api/{collection}`
pub async fn create<R, N>(
    State(state): State<AppState<R, N>>,
    Path(collection): Path<String>,
    body: Body,
) -> Result<CreateResponse, ApiError>
where
    R: ListingRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let kind = EntityKind::from_str(&collection)?;
    let Json(fields) = body?;
    let created = state.listing_service.create(kind, fields).await?;

    if kind.schema().notify_on_create
        && let Err(err) = state.notifier.listing_created(&created).await
    {
        tracing::warn!(%kind, id = %created.id, error = %err, "create notification failed");
    }

    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/{collection}/{id}`
pub async fn update<R, N>(
    State(state): State<AppState<R, N>>,
    Path((collection, id)): Path<(String, String)>,
    body: Body,
) -> Result<GetResponse, ApiError>
where
    R: ListingRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let (kind, id) = parse_target(&collection, &id)?;
    let Json(patch) = body?;
    let updated = state.listing_service.update(kind, id, patch).await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /api/{collection}/{id}`
pub async fn delete<R, N>(
    State(state): State<AppState<R, N>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<DeleteResponse, ApiError>
where
    R: ListingRepository + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let (kind, id) = parse_target(&collection, &id)?;
    state.listing_service.delete(kind, id).await?;
    Ok(DeleteResponse::NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_merge_repeated_and_comma_separated_expand_params() {
        let params = vec![
            ("expand".to_string(), "agent, agent.profile".to_string()),
            ("expand".to_string(), "property".to_string()),
            ("limit".to_string(), "5".to_string()),
        ];
        assert_eq!(
            expand_paths(&params),
            vec!["agent", "agent.profile", "property"]
        );
    }

    #[test]
    fn should_reject_malformed_id() {
        let result = parse_target("properties", "not-a-uuid");
        assert_eq!(
            result,
            Err(ValidationError::InvalidId("not-a-uuid".to_string()))
        );
    }

    #[test]
    fn should_reject_unknown_collection() {
        let result = parse_target("castles", &ListingId::new().to_string());
        assert!(matches!(result, Err(ValidationError::UnknownEntityType(_))));
    }
}
