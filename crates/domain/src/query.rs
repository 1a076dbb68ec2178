//! Filtered, sorted, paginated reads over one entity kind.
//!
//! Callers describe a read with a [`ListRequest`]. Resolving it against the
//! kind's [`EntitySchema`] yields a [`ListQuery`]: every filter checked and
//! coerced, the sort validated, the page window bounded. Storage adapters
//! only ever see resolved queries.
//!
//! Each [`Filter`] variant maps to exactly one primitive, picked by the
//! filter's shape and never by the field's name:
//!
//! | Variant | Scalar field | List field |
//! |---|---|---|
//! | `Eq` | equal | contains the value |
//! | `Range` | inclusive bounds | not supported |
//! | `Like` | case-insensitive substring | any element matches |
//! | `In` | member of the set | any element in the set |
//!
//! Filters combine with logical AND.

mod params;

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::ValidationError;
use crate::listing::Listing;
use crate::schema::{EntitySchema, FieldKind};
use crate::value::Value;

/// One filter primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(Value),
    Range { min: Option<Value>, max: Option<Value> },
    Like(String),
    In(Vec<Value>),
}

impl Filter {
    fn name(&self) -> &'static str {
        match self {
            Self::Eq(_) => "equality",
            Self::Range { .. } => "range",
            Self::Like(_) => "pattern",
            Self::In(_) => "set membership",
        }
    }

    /// Evaluate the filter against a stored value.
    #[must_use]
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let Some(value) = value.filter(|value| !value.is_null()) else {
            return false;
        };
        if let Value::List(items) = value {
            return match self {
                Self::Range { .. } => false,
                _ => items.iter().any(|item| self.matches_scalar(item)),
            };
        }
        self.matches_scalar(value)
    }

    fn matches_scalar(&self, value: &Value) -> bool {
        match self {
            Self::Eq(expected) => value.loosely_eq(expected),
            Self::Range { min, max } => {
                value.as_f64().is_some()
                    && min.as_ref().is_none_or(|min| value.total_cmp(min).is_ge())
                    && max.as_ref().is_none_or(|max| value.total_cmp(max).is_le())
            }
            Self::Like(pattern) => value
                .as_str()
                .is_some_and(|text| text.to_lowercase().contains(&pattern.to_lowercase())),
            Self::In(set) => set.iter().any(|candidate| value.loosely_eq(candidate)),
        }
    }
}

/// A filter bound to a field name.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub filter: Filter,
}

impl FieldFilter {
    #[must_use]
    pub fn new(field: impl Into<String>, filter: Filter) -> Self {
        Self {
            field: field.into(),
            filter,
        }
    }

    /// Check the filter against the schema and coerce its operands to the
    /// field's kind.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownField`] for names outside the
    /// schema, [`ValidationError::UnsupportedFilter`] when the filter shape
    /// does not fit the field kind, and [`ValidationError::InvalidValue`]
    /// when an operand cannot be coerced.
    pub fn resolve(self, schema: &EntitySchema) -> Result<Self, ValidationError> {
        let def = schema
            .field(&self.field)
            .ok_or_else(|| ValidationError::UnknownField {
                kind: schema.kind,
                field: self.field.clone(),
            })?;
        // Operands of list fields are single elements.
        let operand_kind = match def.kind {
            FieldKind::TextList => FieldKind::Text,
            other => other,
        };
        let unsupported = || ValidationError::UnsupportedFilter {
            field: self.field.clone(),
            filter: self.filter.name(),
        };
        let coerce = |value: Value| -> Result<Value, ValidationError> {
            let value = value.coerce(&self.field, operand_kind)?;
            if value.is_null() {
                return Err(ValidationError::InvalidValue {
                    field: self.field.clone(),
                    expected: operand_kind.expected(),
                });
            }
            Ok(value)
        };

        let filter = match self.filter.clone() {
            Filter::Eq(value) => Filter::Eq(coerce(value)?),
            Filter::Range { min, max } => {
                if !def.kind.is_numeric() {
                    return Err(unsupported());
                }
                if min.is_none() && max.is_none() {
                    return Err(ValidationError::InvalidValue {
                        field: self.field.clone(),
                        expected: "a lower or upper bound",
                    });
                }
                Filter::Range {
                    min: min.map(coerce).transpose()?,
                    max: max.map(coerce).transpose()?,
                }
            }
            Filter::Like(pattern) => {
                if !def.kind.is_textual() {
                    return Err(unsupported());
                }
                Filter::Like(pattern)
            }
            Filter::In(values) => Filter::In(
                values
                    .into_iter()
                    .map(coerce)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        Ok(Self {
            field: self.field,
            filter,
        })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(ValidationError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// What to order by before the `id` tiebreak.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    Field(String),
}

/// Ordering of a result set.
///
/// Rows that tie on the key are always ordered by `id` in the same
/// direction, so consecutive pages never overlap or skip rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort {
    pub key: SortKey,
    pub direction: Direction,
}

impl Sort {
    #[must_use]
    pub fn new(key: SortKey, direction: Direction) -> Self {
        Self { key, direction }
    }

    #[must_use]
    pub fn by_field(field: impl Into<String>, direction: Direction) -> Self {
        Self::new(SortKey::Field(field.into()), direction)
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownSortField`] for names outside the
    /// schema and for list-valued fields.
    pub fn resolve(self, schema: &EntitySchema) -> Result<Self, ValidationError> {
        if let SortKey::Field(name) = &self.key {
            let sortable = schema
                .field(name)
                .is_some_and(|def| def.kind != FieldKind::TextList);
            if !sortable {
                return Err(ValidationError::UnknownSortField {
                    kind: schema.kind,
                    field: name.clone(),
                });
            }
        }
        Ok(self)
    }

    /// Compare two listings the way every storage backend must order them.
    #[must_use]
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let primary = match &self.key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::Field(name) => {
                let left = a.field(name).unwrap_or(&Value::Null);
                let right = b.field(name).unwrap_or(&Value::Null);
                left.total_cmp(right)
            }
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Bounded page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u32,
}

/// A read request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequest {
    pub filters: Vec<FieldFilter>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<Sort>,
    /// Dotted relation paths to resolve inline.
    pub expand: Vec<String>,
}

impl ListRequest {
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.filters.push(FieldFilter::new(field, filter));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn expand(mut self, path: impl Into<String>) -> Self {
        self.expand.push(path.into());
        self
    }

    /// Resolve the request into a backend query.
    ///
    /// The limit defaults to the schema's default and is clamped to
    /// `max_limit`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a zero limit or any invalid filter
    /// or sort.
    pub fn resolve(
        &self,
        schema: &EntitySchema,
        max_limit: u32,
    ) -> Result<ListQuery, ValidationError> {
        let limit = self.limit.unwrap_or(schema.default_limit);
        if limit == 0 {
            return Err(ValidationError::ZeroLimit);
        }
        let filters = self
            .filters
            .iter()
            .cloned()
            .map(|filter| filter.resolve(schema))
            .collect::<Result<Vec<_>, _>>()?;
        let sort = self.sort.clone().unwrap_or_default().resolve(schema)?;

        Ok(ListQuery {
            filters,
            sort,
            window: Window {
                limit: limit.min(max_limit.max(1)),
                offset: self.offset.unwrap_or(0),
            },
        })
    }
}

/// A validated query handed to storage adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<FieldFilter>,
    pub sort: Sort,
    pub window: Window,
}

impl ListQuery {
    /// Whether a listing satisfies every filter.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.filter.matches(listing.field(&filter.field)))
    }
}

/// A bounded slice of results plus the filtered total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of matching rows before pagination.
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

impl<T> Page<T> {
    /// An empty page with the given window.
    #[must_use]
    pub fn empty(window: Window) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            limit: window.limit,
            offset: window.offset,
        }
    }
}
