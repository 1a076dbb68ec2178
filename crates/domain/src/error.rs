//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`PropdeskError`] via `From`. Messages of [`ValidationError`] and
//! [`NotFoundError`] are written to be shown to callers as-is; storage
//! failures never are.

use crate::id::CorrelationId;
use crate::schema::EntityKind;

/// Top-level error returned by application services.
#[derive(Debug, thiserror::Error)]
pub enum PropdeskError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// Raw failure reported by a persistence adapter.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A storage failure that has been logged under the given correlation id.
    #[error("operation failed (correlation id {0})")]
    Backend(CorrelationId),
}

/// Caller-side input problems. Never worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown entity type `{0}`")]
    UnknownEntityType(String),

    #[error("{kind} has no field `{field}`")]
    UnknownField { kind: EntityKind, field: String },

    #[error("field `{field}` of {kind} is derived and cannot be written")]
    ReadOnlyField { kind: EntityKind, field: String },

    #[error("{kind} requires field `{field}`")]
    MissingField {
        kind: EntityKind,
        field: &'static str,
    },

    #[error("field `{field}` expects {expected}")]
    InvalidValue {
        field: String,
        expected: &'static str,
    },

    #[error("field `{field}` does not support {filter} filters")]
    UnsupportedFilter {
        field: String,
        filter: &'static str,
    },

    #[error("{kind} cannot be sorted by `{field}`")]
    UnknownSortField { kind: EntityKind, field: String },

    #[error("sort order must be `asc` or `desc`, got `{0}`")]
    InvalidSortOrder(String),

    #[error("{kind} has no relation `{path}`")]
    UnknownExpansion { kind: EntityKind, path: String },

    #[error("expansion `{0}` is nested too deeply")]
    ExpansionTooDeep(String),

    #[error("`{param}` must be a non-negative integer, got `{value}`")]
    InvalidPagination { param: &'static str, value: String },

    #[error("`limit` must be at least 1")]
    ZeroLimit,

    #[error("`{0}` is not a valid identifier")]
    InvalidId(String),

    #[error("field `{field}` does not produce a usable slug")]
    EmptySlug { field: &'static str },
}

/// The requested record does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} `{id}` not found")]
pub struct NotFoundError {
    pub kind: EntityKind,
    pub id: String,
}

/// Reserved for optimistic concurrency; nothing produces it yet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} `{id}` was modified concurrently")]
pub struct ConflictError {
    pub kind: EntityKind,
    pub id: String,
}
