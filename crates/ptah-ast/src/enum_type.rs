//! Global enum types.

use serde::{Deserialize, Serialize};

/// A schema-wide enum type, synthesized from a `schema:field
/// type="ENUM"` directive.
///
/// The canonical name is `enum_{table}_{column}`, lower-cased, built by
/// [`GlobalEnum::canonical_name`] — callers should prefer that
/// constructor over building the `name` field by hand so the naming
/// convention stays in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalEnum {
    /// Canonical enum name, unique within the schema.
    pub name: String,
    /// Ordered, non-empty, unique value list.
    pub values: Vec<String>
}

impl GlobalEnum {
    /// Build the canonical `enum_{table}_{column}` name used when a
    /// `schema:field type="ENUM"` directive synthesizes a new global
    /// enum.
    pub fn canonical_name(table: &str, column: &str) -> String {
        format!("enum_{}_{}", table.to_lowercase(), column.to_lowercase())
    }

    /// `true` if the value list has no duplicates and is non-empty —
    /// the invariant a valid enum must satisfy.
    pub fn is_valid(&self) -> bool {
        if self.values.is_empty() {
            return false;
        }
        let mut seen = std::collections::HashSet::with_capacity(self.values.len());
        self.values.iter().all(|v| seen.insert(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_lowercases_and_joins() {
        assert_eq!(GlobalEnum::canonical_name("User", "Status"), "enum_user_status");
    }

    #[test]
    fn empty_values_is_invalid() {
        let e = GlobalEnum {
            name: "enum_user_status".into(),
            values: vec![]
        };
        assert!(!e.is_valid());
    }

    #[test]
    fn duplicate_values_is_invalid() {
        let e = GlobalEnum {
            name: "enum_user_status".into(),
            values: vec!["active".into(), "active".into()]
        };
        assert!(!e.is_valid());
    }

    #[test]
    fn unique_non_empty_values_is_valid() {
        let e = GlobalEnum {
            name: "enum_user_status".into(),
            values: vec!["active".into(), "inactive".into()]
        };
        assert!(e.is_valid());
    }
}
