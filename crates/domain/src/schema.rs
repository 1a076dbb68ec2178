//! Entity schemas: the static allow-list of fields, relations, and paging
//! defaults for every entity kind handled by the listing service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Every collection the listing service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Profile,
    Agent,
    Property,
    Enquiry,
    Question,
    Valuation,
}

impl EntityKind {
    pub const ALL: [Self; 6] = [
        Self::Profile,
        Self::Agent,
        Self::Property,
        Self::Enquiry,
        Self::Question,
        Self::Valuation,
    ];

    /// Singular, lowercase name stored alongside each row.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Agent => "agent",
            Self::Property => "property",
            Self::Enquiry => "enquiry",
            Self::Question => "question",
            Self::Valuation => "valuation",
        }
    }

    /// The static schema describing this kind.
    #[must_use]
    pub fn schema(self) -> &'static EntitySchema {
        match self {
            Self::Profile => &PROFILE,
            Self::Agent => &AGENT,
            Self::Property => &PROPERTY,
            Self::Enquiry => &ENQUIRY,
            Self::Question => &QUESTION,
            Self::Valuation => &VALUATION,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    /// Accepts the singular kind name or the plural collection name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle || kind.schema().collection == needle)
            .ok_or_else(|| ValidationError::UnknownEntityType(s.to_string()))
    }
}

/// Storage kind of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Boolean,
    TextList,
    /// Id of a record of the given kind, stored as text.
    Reference(EntityKind),
}

impl FieldKind {
    /// Human description used in validation messages.
    #[must_use]
    pub fn expected(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::TextList => "a list of text values",
            Self::Reference(_) => "an identifier",
        }
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }

    #[must_use]
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::TextList)
    }
}

/// Declaration of one permitted field.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Source field for computed values such as slugs. Derived fields are
    /// never writable by callers.
    pub derived_from: Option<&'static str>,
}

impl FieldDef {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            derived_from: None,
        }
    }

    const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    const fn slug_of(self, source: &'static str) -> Self {
        Self {
            derived_from: Some(source),
            ..self
        }
    }

    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.derived_from.is_some()
    }
}

/// A named reference from one kind to another, resolved on read.
#[derive(Debug, Clone, Copy)]
pub struct RelationDef {
    /// Name used in `expand` paths.
    pub name: &'static str,
    /// Reference field holding the related id.
    pub field: &'static str,
    pub target: EntityKind,
}

/// Static description of an entity kind.
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Plural name used in URLs.
    pub collection: &'static str,
    pub fields: &'static [FieldDef],
    pub relations: &'static [RelationDef],
    pub default_limit: u32,
    /// Whether callers should notify the outside world after a create.
    pub notify_on_create: bool,
}

impl EntitySchema {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&'static RelationDef> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(|field| field.required)
    }

    pub fn derived_fields(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(|field| field.is_derived())
    }

    /// Look up a writable field, rejecting unknown and derived names.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownField`] or
    /// [`ValidationError::ReadOnlyField`].
    pub fn writable_field(&self, name: &str) -> Result<&'static FieldDef, ValidationError> {
        let field = self.field(name).ok_or_else(|| ValidationError::UnknownField {
            kind: self.kind,
            field: name.to_string(),
        })?;
        if field.is_derived() {
            return Err(ValidationError::ReadOnlyField {
                kind: self.kind,
                field: name.to_string(),
            });
        }
        Ok(field)
    }
}

use FieldKind::{Boolean, Integer, Number, Reference, Text, TextList};

static PROFILE: EntitySchema = EntitySchema {
    kind: EntityKind::Profile,
    collection: "profiles",
    fields: &[
        FieldDef::new("full_name", Text).required(),
        FieldDef::new("email", Text).required(),
        FieldDef::new("phone", Text),
        FieldDef::new("role", Text),
        FieldDef::new("avatar_url", Text),
    ],
    relations: &[],
    default_limit: 20,
    notify_on_create: false,
};

static AGENT: EntitySchema = EntitySchema {
    kind: EntityKind::Agent,
    collection: "agents",
    fields: &[
        FieldDef::new("name", Text).required(),
        FieldDef::new("slug", Text).slug_of("name"),
        FieldDef::new("email", Text).required(),
        FieldDef::new("phone", Text),
        FieldDef::new("position", Text),
        FieldDef::new("bio", Text),
        FieldDef::new("photo_url", Text),
        FieldDef::new("languages", TextList),
        FieldDef::new("specialties", TextList),
        FieldDef::new("experience_years", Integer),
        FieldDef::new("rating", Number),
        FieldDef::new("active", Boolean),
        FieldDef::new("profile_id", Reference(EntityKind::Profile)),
    ],
    relations: &[RelationDef {
        name: "profile",
        field: "profile_id",
        target: EntityKind::Profile,
    }],
    default_limit: 20,
    notify_on_create: false,
};

static PROPERTY: EntitySchema = EntitySchema {
    kind: EntityKind::Property,
    collection: "properties",
    fields: &[
        FieldDef::new("title", Text).required(),
        FieldDef::new("slug", Text).slug_of("title"),
        FieldDef::new("description", Text),
        FieldDef::new("price", Number).required(),
        FieldDef::new("currency", Text),
        FieldDef::new("beds", Integer),
        FieldDef::new("baths", Integer),
        FieldDef::new("area_sqft", Number),
        FieldDef::new("property_type", Text),
        FieldDef::new("listing_type", Text),
        FieldDef::new("status", Text),
        FieldDef::new("location", Text),
        FieldDef::new("community", Text),
        FieldDef::new("images", TextList),
        FieldDef::new("amenities", TextList),
        FieldDef::new("featured", Boolean),
        FieldDef::new("agent_id", Reference(EntityKind::Agent)).required(),
    ],
    relations: &[RelationDef {
        name: "agent",
        field: "agent_id",
        target: EntityKind::Agent,
    }],
    default_limit: 20,
    notify_on_create: false,
};

static ENQUIRY: EntitySchema = EntitySchema {
    kind: EntityKind::Enquiry,
    collection: "enquiries",
    fields: &[
        FieldDef::new("name", Text).required(),
        FieldDef::new("email", Text).required(),
        FieldDef::new("phone", Text),
        FieldDef::new("message", Text).required(),
        FieldDef::new("status", Text),
        FieldDef::new("source", Text),
        FieldDef::new("property_id", Reference(EntityKind::Property)),
        FieldDef::new("agent_id", Reference(EntityKind::Agent)),
    ],
    relations: &[
        RelationDef {
            name: "property",
            field: "property_id",
            target: EntityKind::Property,
        },
        RelationDef {
            name: "agent",
            field: "agent_id",
            target: EntityKind::Agent,
        },
    ],
    default_limit: 50,
    notify_on_create: true,
};

static QUESTION: EntitySchema = EntitySchema {
    kind: EntityKind::Question,
    collection: "questions",
    fields: &[
        FieldDef::new("name", Text).required(),
        FieldDef::new("email", Text).required(),
        FieldDef::new("question", Text).required(),
        FieldDef::new("answer", Text),
        FieldDef::new("status", Text),
        FieldDef::new("property_id", Reference(EntityKind::Property)),
    ],
    relations: &[RelationDef {
        name: "property",
        field: "property_id",
        target: EntityKind::Property,
    }],
    default_limit: 50,
    notify_on_create: true,
};

static VALUATION: EntitySchema = EntitySchema {
    kind: EntityKind::Valuation,
    collection: "valuations",
    fields: &[
        FieldDef::new("name", Text).required(),
        FieldDef::new("email", Text).required(),
        FieldDef::new("phone", Text),
        FieldDef::new("address", Text).required(),
        FieldDef::new("property_type", Text),
        FieldDef::new("beds", Integer),
        FieldDef::new("baths", Integer),
        FieldDef::new("area_sqft", Number),
        FieldDef::new("estimated_value", Number),
        FieldDef::new("status", Text),
        FieldDef::new("notes", Text),
    ],
    relations: &[],
    default_limit: 50,
    notify_on_create: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_singular_and_plural_names() {
        assert_eq!("property".parse::<EntityKind>(), Ok(EntityKind::Property));
        assert_eq!("Properties".parse::<EntityKind>(), Ok(EntityKind::Property));
        assert_eq!("enquiries".parse::<EntityKind>(), Ok(EntityKind::Enquiry));
    }

    #[test]
    fn should_reject_unknown_entity_type() {
        let result = "listings".parse::<EntityKind>();
        assert_eq!(
            result,
            Err(ValidationError::UnknownEntityType("listings".to_string()))
        );
    }

    #[test]
    fn should_point_every_relation_at_a_reference_field_of_its_target() {
        for kind in EntityKind::ALL {
            let schema = kind.schema();
            assert_eq!(schema.kind, kind);
            for relation in schema.relations {
                let field = schema.field(relation.field).unwrap();
                assert_eq!(field.kind, FieldKind::Reference(relation.target));
            }
        }
    }

    #[test]
    fn should_derive_slugs_from_existing_text_fields() {
        for kind in EntityKind::ALL {
            let schema = kind.schema();
            for field in schema.derived_fields() {
                let source = schema.field(field.derived_from.unwrap()).unwrap();
                assert_eq!(source.kind, FieldKind::Text);
                assert!(!field.required);
            }
        }
    }

    #[test]
    fn should_require_title_price_and_agent_for_properties() {
        let required: Vec<&str> = EntityKind::Property
            .schema()
            .required_fields()
            .map(|field| field.name)
            .collect();
        assert_eq!(required, ["title", "price", "agent_id"]);
    }

    #[test]
    fn should_reject_derived_field_writes() {
        let result = EntityKind::Property.schema().writable_field("slug");
        assert!(matches!(result, Err(ValidationError::ReadOnlyField { .. })));
        let result = EntityKind::Property.schema().writable_field("colour");
        assert!(matches!(result, Err(ValidationError::UnknownField { .. })));
    }
}
