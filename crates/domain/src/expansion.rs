//! Relation expansion plans.
//!
//! Dotted paths such as `agent` and `agent.profile` are validated against
//! the schemas along the path and merged into a tree, so a shared prefix is
//! resolved only once.

use crate::error::ValidationError;
use crate::schema::{EntityKind, RelationDef};

/// Deepest relation chain a caller may request.
pub const MAX_DEPTH: usize = 3;

/// One relation to resolve, plus what to resolve on the related records.
#[derive(Debug, Clone)]
pub struct Expansion {
    pub relation: &'static RelationDef,
    pub nested: Vec<Expansion>,
}

impl Expansion {
    /// Parse and merge expansion paths rooted at `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownExpansion`] when a segment is not a
    /// relation of the kind it is applied to, and
    /// [`ValidationError::ExpansionTooDeep`] beyond [`MAX_DEPTH`] segments.
    pub fn parse_all<S: AsRef<str>>(
        kind: EntityKind,
        paths: &[S],
    ) -> Result<Vec<Self>, ValidationError> {
        let mut roots: Vec<Self> = Vec::new();
        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                continue;
            }
            let segments: Vec<&str> = path.split('.').map(str::trim).collect();
            if segments.len() > MAX_DEPTH {
                return Err(ValidationError::ExpansionTooDeep(path.to_string()));
            }
            insert(&mut roots, kind, &segments)?;
        }
        Ok(roots)
    }
}

fn insert(
    level: &mut Vec<Expansion>,
    kind: EntityKind,
    segments: &[&str],
) -> Result<(), ValidationError> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(());
    };
    let relation = kind
        .schema()
        .relation(head)
        .ok_or_else(|| ValidationError::UnknownExpansion {
            kind,
            path: (*head).to_string(),
        })?;

    let position = match level.iter().position(|node| node.relation.name == relation.name) {
        Some(position) => position,
        None => {
            level.push(Expansion {
                relation,
                nested: Vec::new(),
            });
            level.len() - 1
        }
    };
    insert(&mut level[position].nested, relation.target, rest)
}
