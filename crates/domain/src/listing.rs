//! Listing: one record of any entity kind, with its schema-checked fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::ListingId;
use crate::schema::{EntityKind, EntitySchema};
use crate::slug::derive_slug;
use crate::time::Timestamp;
use crate::value::{Fields, Value};

/// A stored record of some [`EntityKind`].
///
/// `expanded` holds related records resolved for a single response. It is
/// never persisted; a `None` entry means the reference was unset or points
/// at nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub kind: EntityKind,
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub expanded: BTreeMap<String, Option<Box<Listing>>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Listing {
    /// Validate raw input against the schema of `kind` and build a new
    /// listing with a fresh id and both timestamps set to `at`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for unknown or derived field names,
    /// values that cannot be coerced, missing required fields, or a title
    /// that yields an empty slug.
    pub fn draft(kind: EntityKind, input: Fields, at: Timestamp) -> Result<Self, ValidationError> {
        let schema = kind.schema();
        let mut fields = Fields::new();
        for (name, value) in input {
            let def = schema.writable_field(&name)?;
            let value = value.coerce(&name, def.kind)?;
            if !value.is_null() {
                fields.insert(name, value);
            }
        }
        for def in schema.required_fields() {
            if !is_present(fields.get(def.name)) {
                return Err(ValidationError::MissingField {
                    kind,
                    field: def.name,
                });
            }
        }
        derive_fields(schema, &mut fields, |_| true)?;

        Ok(Self {
            id: ListingId::new(),
            kind,
            fields,
            expanded: BTreeMap::new(),
            created_at: at,
            updated_at: at,
        })
    }

    /// Merge a partial update over the current fields.
    ///
    /// Only the supplied names change; `Null` clears an optional field.
    /// Derived fields are recomputed when their source is part of the patch.
    /// `updated_at` moves to `at` even when the patch is empty.
    ///
    /// On error the listing is left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`Listing::draft`], plus clearing a required field.
    pub fn apply_patch(&mut self, patch: Fields, at: Timestamp) -> Result<(), ValidationError> {
        let schema = self.kind.schema();
        let mut fields = self.fields.clone();
        let mut touched = Vec::with_capacity(patch.len());
        for (name, value) in patch {
            let def = schema.writable_field(&name)?;
            let value = value.coerce(&name, def.kind)?;
            if def.required && !is_present(Some(&value)) {
                return Err(ValidationError::MissingField {
                    kind: self.kind,
                    field: def.name,
                });
            }
            if value.is_null() {
                fields.remove(&name);
            } else {
                fields.insert(name, value);
            }
            touched.push(def.name);
        }
        derive_fields(schema, &mut fields, |source| touched.iter().any(|name| *name == source))?;

        self.fields = fields;
        self.updated_at = at;
        Ok(())
    }

    /// Value of a field, treating an explicit `Null` as absent.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    /// Parse a reference field into the related id, if set and well-formed.
    #[must_use]
    pub fn reference(&self, field: &str) -> Option<ListingId> {
        self.field(field)
            .and_then(Value::as_str)
            .and_then(|text| text.parse().ok())
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Text(text)) => !text.trim().is_empty(),
        Some(_) => true,
    }
}

fn derive_fields(
    schema: &EntitySchema,
    fields: &mut Fields,
    should_derive: impl Fn(&str) -> bool,
) -> Result<(), ValidationError> {
    for def in schema.derived_fields() {
        let Some(source) = def.derived_from else {
            continue;
        };
        if !should_derive(source) {
            continue;
        }
        match fields.get(source).and_then(Value::as_str) {
            Some(text) => {
                let slug = derive_slug(text);
                if slug.is_empty() {
                    return Err(ValidationError::EmptySlug { field: source });
                }
                fields.insert(def.name.to_string(), Value::Text(slug));
            }
            None => {
                fields.remove(def.name);
            }
        }
    }
    Ok(())
}
