//! `SQLite` implementation of [`ListingRepository`].
//!
//! Every kind shares the `listings` table. Field values are stored as one
//! JSON document per row and filtered with `json_extract` / `json_each`, so
//! a scalar field and a list field answer the same filter SQL: `json_each`
//! yields a single row for a scalar and one row per element for an array.
//!
//! `SQLite`'s `lower()` only folds ASCII, so each row also carries a `search`
//! document: the same fields with text lowercased on the Rust side. Substring
//! filters run against that copy with an already lowercased pattern.

use std::collections::BTreeMap;
use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};

use propdesk_app::ports::ListingRepository;
use propdesk_domain::error::PropdeskError;
use propdesk_domain::id::ListingId;
use propdesk_domain::listing::Listing;
use propdesk_domain::query::{Direction, FieldFilter, Filter, ListQuery, Page, Sort, SortKey};
use propdesk_domain::schema::EntityKind;
use propdesk_domain::time::{Timestamp, to_sortable_string};
use propdesk_domain::value::{Fields, Value};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Listing);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Listing> {
        value.map(|w| w.0)
    }
}

fn decode_err<E: std::error::Error + Send + Sync + 'static>(err: E) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

fn parse_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    Ok(chrono::DateTime::parse_from_rfc3339(value)
        .map_err(decode_err)?
        .to_utc())
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let kind: String = row.try_get("kind")?;
        let fields_json: String = row.try_get("fields")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        let id = ListingId::from_str(&id).map_err(decode_err)?;
        let kind = EntityKind::from_str(&kind).map_err(decode_err)?;
        let fields: Fields = serde_json::from_str(&fields_json).map_err(decode_err)?;

        Ok(Self(Listing {
            id,
            kind,
            fields,
            expanded: BTreeMap::new(),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO listings (id, kind, fields, search, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?)
";
const SELECT_BY_ID: &str = "SELECT * FROM listings WHERE kind = ? AND id = ?";
const UPDATE: &str = r"
    UPDATE listings SET fields = ?, search = ?, updated_at = ?
    WHERE kind = ? AND id = ?
";
const DELETE_BY_ID: &str = "DELETE FROM listings WHERE kind = ? AND id = ?";

/// `SQLite`-backed repository for every entity kind.
#[derive(Clone)]
pub struct SqliteListingRepository {
    pool: SqlitePool,
}

impl SqliteListingRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn fold_case(value: &Value) -> Value {
    match value {
        Value::Text(text) => Value::Text(text.to_lowercase()),
        Value::List(items) => Value::List(items.iter().map(fold_case).collect()),
        other => other.clone(),
    }
}

fn search_document(fields: &Fields) -> Result<String, serde_json::Error> {
    let folded: Fields = fields
        .iter()
        .map(|(name, value)| (name.clone(), fold_case(value)))
        .collect();
    serde_json::to_string(&folded)
}

fn json_path(field: &str) -> String {
    format!("$.\"{field}\"")
}

/// Bind a filter operand. Booleans are compared as the `0`/`1` that
/// `json_each` reports for JSON `false`/`true`.
fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Null => {
            builder.push("NULL");
        }
        Value::Bool(flag) => {
            builder.push_bind(i64::from(*flag));
        }
        Value::Int(number) => {
            builder.push_bind(*number);
        }
        Value::Float(number) => {
            builder.push_bind(*number);
        }
        Value::Text(text) => {
            builder.push_bind(text.clone());
        }
        Value::List(_) => {
            builder.push_bind(serde_json::to_string(value).unwrap_or_default());
        }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, field_filter: &FieldFilter) {
    let path = json_path(&field_filter.field);
    match &field_filter.filter {
        Filter::Eq(value) => {
            builder
                .push("EXISTS (SELECT 1 FROM json_each(listings.fields, ")
                .push_bind(path)
                .push(") WHERE value = ");
            push_value(builder, value);
            builder.push(")");
        }
        Filter::Range { min, max } => {
            builder
                .push("json_type(listings.fields, ")
                .push_bind(path.clone())
                .push(") IN ('integer', 'real')");
            if let Some(min) = min {
                builder
                    .push(" AND json_extract(listings.fields, ")
                    .push_bind(path.clone())
                    .push(") >= ");
                push_value(builder, min);
            }
            if let Some(max) = max {
                builder
                    .push(" AND json_extract(listings.fields, ")
                    .push_bind(path)
                    .push(") <= ");
                push_value(builder, max);
            }
        }
        Filter::Like(pattern) => {
            builder
                .push("EXISTS (SELECT 1 FROM json_each(listings.search, ")
                .push_bind(path)
                .push(") WHERE type = 'text' AND instr(value, ")
                .push_bind(pattern.to_lowercase())
                .push(") > 0)");
        }
        Filter::In(values) if values.is_empty() => {
            builder.push("0 = 1");
        }
        Filter::In(values) => {
            builder
                .push("EXISTS (SELECT 1 FROM json_each(listings.fields, ")
                .push_bind(path)
                .push(") WHERE value IN (");
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                push_value(builder, value);
            }
            builder.push("))");
        }
    }
}

fn push_conditions(
    builder: &mut QueryBuilder<'_, Sqlite>,
    kind: EntityKind,
    filters: &[FieldFilter],
) {
    builder.push(" WHERE listings.kind = ").push_bind(kind.as_str());
    for filter in filters {
        builder.push(" AND ");
        push_filter(builder, filter);
    }
}

fn push_order(builder: &mut QueryBuilder<'_, Sqlite>, sort: &Sort) {
    let direction = match sort.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    builder.push(" ORDER BY ");
    match &sort.key {
        SortKey::CreatedAt => {
            builder.push("listings.created_at ");
        }
        SortKey::UpdatedAt => {
            builder.push("listings.updated_at ");
        }
        SortKey::Field(name) => {
            builder
                .push("json_extract(listings.fields, ")
                .push_bind(json_path(name))
                .push(") ");
        }
    }
    builder
        .push(direction)
        .push(", listings.id ")
        .push(direction);
}

fn select_query(kind: EntityKind, query: &ListQuery) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new("SELECT listings.* FROM listings");
    push_conditions(&mut builder, kind, &query.filters);
    push_order(&mut builder, &query.sort);
    builder
        .push(" LIMIT ")
        .push_bind(i64::from(query.window.limit))
        .push(" OFFSET ")
        .push_bind(i64::from(query.window.offset));
    builder
}

fn count_query(kind: EntityKind, query: &ListQuery) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM listings");
    push_conditions(&mut builder, kind, &query.filters);
    builder
}

impl ListingRepository for SqliteListingRepository {
    fn create(
        &self,
        listing: Listing,
    ) -> impl Future<Output = Result<Listing, PropdeskError>> + Send {
        let pool = self.pool.clone();
        async move {
            let fields = serde_json::to_string(&listing.fields).map_err(StorageError::from)?;
            let search = search_document(&listing.fields).map_err(StorageError::from)?;
            sqlx::query(INSERT)
                .bind(listing.id.to_string())
                .bind(listing.kind.as_str())
                .bind(fields)
                .bind(search)
                .bind(to_sortable_string(listing.created_at))
                .bind(to_sortable_string(listing.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(listing)
        }
    }

    fn get_by_id(
        &self,
        kind: EntityKind,
        id: ListingId,
    ) -> impl Future<Output = Result<Option<Listing>, PropdeskError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(kind.as_str())
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_ids(
        &self,
        kind: EntityKind,
        ids: Vec<ListingId>,
    ) -> impl Future<Output = Result<Vec<Listing>, PropdeskError>> + Send {
        let pool = self.pool.clone();
        async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let mut builder: QueryBuilder<'_, Sqlite> =
                QueryBuilder::new("SELECT * FROM listings WHERE kind = ");
            builder.push_bind(kind.as_str()).push(" AND id IN (");
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind(id.to_string());
            }
            separated.push_unseparated(")");

            let rows: Vec<Wrapper> = builder
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_many(
        &self,
        kind: EntityKind,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Listing>, PropdeskError>> + Send {
        let pool = self.pool.clone();
        let window = query.window;
        let mut select = select_query(kind, query);
        let mut count = count_query(kind, query);
        async move {
            let rows: Vec<Wrapper> = select
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;
            let total: i64 = count
                .build_query_scalar::<i64>()
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            tracing::trace!(%kind, total, returned = rows.len(), "listings query");
            Ok(Page {
                items: rows.into_iter().map(|w| w.0).collect(),
                total: u64::try_from(total).unwrap_or_default(),
                limit: window.limit,
                offset: window.offset,
            })
        }
    }

    fn update(
        &self,
        listing: Listing,
    ) -> impl Future<Output = Result<Option<Listing>, PropdeskError>> + Send {
        let pool = self.pool.clone();
        async move {
            let fields = serde_json::to_string(&listing.fields).map_err(StorageError::from)?;
            let search = search_document(&listing.fields).map_err(StorageError::from)?;
            let result = sqlx::query(UPDATE)
                .bind(fields)
                .bind(search)
                .bind(to_sortable_string(listing.updated_at))
                .bind(listing.kind.as_str())
                .bind(listing.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok((result.rows_affected() > 0).then_some(listing))
        }
    }

    fn delete(
        &self,
        kind: EntityKind,
        id: ListingId,
    ) -> impl Future<Output = Result<bool, PropdeskError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_BY_ID)
                .bind(kind.as_str())
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }
}
