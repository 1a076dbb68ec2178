//! Loosely-typed field values and their coercion into declared field kinds.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::ListingId;
use crate::schema::FieldKind;

/// Field name to value mapping carried by a listing or a write request.
pub type Fields = BTreeMap<String, Value>;

/// A single field value.
///
/// Deserializes from plain JSON scalars and arrays; nested objects are not
/// representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value, if it holds a number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Coerce a loosely-typed value into the representation stored for
    /// `kind`. `Null` passes through untouched; anything that cannot be
    /// converted is rejected rather than silently dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] naming `field` and the
    /// expected kind.
    pub fn coerce(self, field: &str, kind: FieldKind) -> Result<Self, ValidationError> {
        if self.is_null() {
            return Ok(self);
        }
        let coerced = match kind {
            FieldKind::Text => self.into_text(),
            FieldKind::Integer => self.into_integer(),
            FieldKind::Number => self.into_number(),
            FieldKind::Boolean => self.into_boolean(),
            FieldKind::TextList => match self {
                Self::List(items) => items
                    .into_iter()
                    .map(Self::into_text)
                    .collect::<Option<Vec<_>>>()
                    .map(Self::List),
                scalar => scalar.into_text().map(|text| Self::List(vec![text])),
            },
            FieldKind::Reference(_) => self.into_reference(),
        };
        coerced.ok_or_else(|| ValidationError::InvalidValue {
            field: field.to_string(),
            expected: kind.expected(),
        })
    }

    fn into_text(self) -> Option<Self> {
        match self {
            Self::Text(_) => Some(self),
            Self::Int(value) => Some(Self::Text(value.to_string())),
            Self::Float(value) => Some(Self::Text(value.to_string())),
            Self::Bool(value) => Some(Self::Text(value.to_string())),
            Self::Null | Self::List(_) => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn into_integer(self) -> Option<Self> {
        match self {
            Self::Int(_) => Some(self),
            Self::Float(value)
                if value.is_finite()
                    && value.fract() == 0.0
                    && value.abs() < i64::MAX as f64 =>
            {
                Some(Self::Int(value as i64))
            }
            Self::Text(text) => text.trim().parse::<i64>().ok().map(Self::Int),
            _ => None,
        }
    }

    fn into_number(self) -> Option<Self> {
        match self {
            Self::Int(_) => Some(self),
            Self::Float(value) if value.is_finite() => Some(self),
            Self::Text(text) => {
                let trimmed = text.trim();
                if let Ok(value) = trimmed.parse::<i64>() {
                    return Some(Self::Int(value));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(Self::Float)
            }
            _ => None,
        }
    }

    fn into_boolean(self) -> Option<Self> {
        match self {
            Self::Bool(_) => Some(self),
            Self::Int(0) => Some(Self::Bool(false)),
            Self::Int(1) => Some(Self::Bool(true)),
            Self::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(Self::Bool(true)),
                "false" | "0" | "no" => Some(Self::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }

    fn into_reference(self) -> Option<Self> {
        match self {
            Self::Text(text) => text
                .parse::<ListingId>()
                .ok()
                .map(|id| Self::Text(id.to_string())),
            _ => None,
        }
    }

    /// Total order used for sorting: `Null` first, then booleans, numbers
    /// (compared numerically across `Int`/`Float`), text, and lists.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.total_cmp(y))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.rank().cmp(&b.rank()),
            },
        }
    }

    /// Equality that treats `Int(2)` and `Float(2.0)` as the same number.
    #[must_use]
    pub fn loosely_eq(&self, other: &Self) -> bool {
        self.total_cmp(other).is_eq()
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Text(_) => 3,
            Self::List(_) => 4,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<ListingId> for Value {
    fn from(value: ListingId) -> Self {
        Self::Text(value.to_string())
    }
}
