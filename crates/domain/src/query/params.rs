//! Building a [`ListRequest`] from loosely-typed `key=value` parameters.
//!
//! Keys may be written in `snake_case` or `camelCase`. Reserved keys:
//! `limit`, `offset`, `sort`, `order`, `expand`. For a schema field `f`:
//! `f` (equality), `min_f` / `max_f` (range), `f_like` (substring),
//! `f_in` (comma-separated set). Empty values and unknown keys are skipped.

use std::collections::BTreeMap;

use super::{Direction, FieldFilter, Filter, ListRequest, Sort, SortKey};
use crate::error::ValidationError;
use crate::schema::EntitySchema;
use crate::value::Value;

impl ListRequest {
    /// Parse request parameters against `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPagination`] for non-numeric or
    /// negative `limit`/`offset`, and sort errors for an unknown sort key or
    /// order. Filter operands are checked later, by [`ListRequest::resolve`].
    pub fn from_params<I, K, V>(schema: &EntitySchema, params: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = Self::default();
        let mut ranges: BTreeMap<&'static str, (Option<Value>, Option<Value>)> = BTreeMap::new();
        let mut sort_key: Option<SortKey> = None;
        let mut sort_direction: Option<Direction> = None;
        let mut order: Option<Direction> = None;

        for (key, value) in params {
            let key = to_snake_case(key.as_ref().trim());
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }

            match key.as_str() {
                "limit" => request.limit = Some(parse_window("limit", value)?),
                "offset" => request.offset = Some(parse_window("offset", value)?),
                "expand" => request.expand.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|path| !path.is_empty())
                        .map(ToString::to_string),
                ),
                "order" => order = Some(value.parse()?),
                "sort" => {
                    let (key, direction) = parse_sort(schema, value)?;
                    sort_key = Some(key);
                    sort_direction = direction;
                }
                _ => {
                    if let Some(def) = schema.field(&key) {
                        request
                            .filters
                            .push(FieldFilter::new(def.name, Filter::Eq(value.into())));
                    } else if let Some(def) = key.strip_prefix("min_").and_then(|f| schema.field(f))
                    {
                        ranges.entry(def.name).or_default().0 = Some(value.into());
                    } else if let Some(def) = key.strip_prefix("max_").and_then(|f| schema.field(f))
                    {
                        ranges.entry(def.name).or_default().1 = Some(value.into());
                    } else if let Some(def) =
                        key.strip_suffix("_like").and_then(|f| schema.field(f))
                    {
                        request
                            .filters
                            .push(FieldFilter::new(def.name, Filter::Like(value.to_string())));
                    } else if let Some(def) = key.strip_suffix("_in").and_then(|f| schema.field(f))
                    {
                        let set = value
                            .split(',')
                            .map(str::trim)
                            .filter(|item| !item.is_empty())
                            .map(Value::from)
                            .collect();
                        request
                            .filters
                            .push(FieldFilter::new(def.name, Filter::In(set)));
                    }
                }
            }
        }

        request.filters.extend(
            ranges
                .into_iter()
                .map(|(field, (min, max))| FieldFilter::new(field, Filter::Range { min, max })),
        );

        if let Some(key) = sort_key {
            let direction = sort_direction.or(order).unwrap_or(Direction::Asc);
            request.sort = Some(Sort::new(key, direction));
        } else if let Some(direction) = order {
            request.sort = Some(Sort::new(SortKey::CreatedAt, direction));
        }

        Ok(request)
    }
}

fn parse_window(param: &'static str, value: &str) -> Result<u32, ValidationError> {
    value
        .parse::<u64>()
        .map(|parsed| u32::try_from(parsed).unwrap_or(u32::MAX))
        .map_err(|_| ValidationError::InvalidPagination {
            param,
            value: value.to_string(),
        })
}

/// Accepts `field`, `-field` (descending) and `field:asc|desc`.
fn parse_sort(
    schema: &EntitySchema,
    value: &str,
) -> Result<(SortKey, Option<Direction>), ValidationError> {
    let (name, direction) = if let Some(name) = value.strip_prefix('-') {
        (name, Some(Direction::Desc))
    } else if let Some((name, direction)) = value.split_once(':') {
        (name, Some(direction.parse()?))
    } else {
        (value, None)
    };

    let name = to_snake_case(name.trim());
    let key = match name.as_str() {
        "created_at" => SortKey::CreatedAt,
        "updated_at" => SortKey::UpdatedAt,
        _ => {
            let def = schema
                .field(&name)
                .ok_or_else(|| ValidationError::UnknownSortField {
                    kind: schema.kind,
                    field: name.clone(),
                })?;
            SortKey::Field(def.name.to_string())
        }
    };
    Ok((key, direction))
}

fn to_snake_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for ch in input.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
