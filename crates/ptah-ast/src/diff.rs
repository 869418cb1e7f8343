//! The structured difference between two [`crate::Schema`]s.
//!
//! `Diff` is transient: built fresh for every comparison, never
//! stored, never mutated after construction.

use serde::{Deserialize, Serialize};

use crate::{
    column::Column,
    constraint::Constraint,
    enum_type::GlobalEnum,
    index::Index,
    table::Table
};

/// What changed about a single column that exists in both the
/// desired and actual versions of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ColumnChangeSet {
    /// The base type string differs.
    pub type_changed: bool,
    /// Nullability differs.
    pub nullability_changed: bool,
    /// The default (literal or expression) differs.
    pub default_changed: bool,
    /// The CHECK expression differs.
    pub check_changed: bool
}

impl ColumnChangeSet {
    /// `true` if nothing differs — callers should not emit a column
    /// entry in [`TableDiff::modified_columns`] when this holds.
    pub const fn is_empty(&self) -> bool {
        !self.type_changed && !self.nullability_changed && !self.default_changed && !self.check_changed
    }
}

/// A column whose attributes differ between desired and actual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedColumn {
    /// Column name (same in both sides; only attributes differ).
    pub name: String,
    /// Desired-side column definition, used by the migration generator to render the new
    /// attributes.
    pub desired: Column,
    /// What changed.
    pub changes: ColumnChangeSet
}

/// The per-table portion of a [`Diff`] for a table present on both
/// sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableDiff {
    /// Table name.
    pub table: String,
    /// Columns present only in the desired schema.
    pub added_columns: Vec<Column>,
    /// Columns present only in the actual schema.
    pub removed_columns: Vec<Column>,
    /// Columns present on both sides with differing attributes.
    pub modified_columns: Vec<ModifiedColumn>,
    /// Indexes present only in the desired schema.
    pub added_indexes: Vec<Index>,
    /// Indexes present only in the actual schema.
    pub removed_indexes: Vec<Index>,
    /// Constraints present only in the desired schema.
    pub added_constraints: Vec<Constraint>,
    /// Constraints present only in the actual schema.
    pub removed_constraints: Vec<Constraint>
}

impl TableDiff {
    /// `true` if this table has no recorded changes at all.
    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.removed_columns.is_empty()
            && self.modified_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.removed_indexes.is_empty()
            && self.added_constraints.is_empty()
            && self.removed_constraints.is_empty()
    }
}

/// An enum present on both sides whose value list differs.
///
/// Whether the difference is an append or a reorder is deliberately *not* distinguished here — generation
/// always treats a modified enum conservatively (warn, do not
/// auto-migrate) rather than infer intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedEnum {
    /// Enum name.
    pub name: String,
    /// Desired value list.
    pub desired_values: Vec<String>,
    /// Actual value list.
    pub actual_values: Vec<String>
}

/// The structured difference between a desired and an actual
/// [`crate::Schema`]. Sole input to the migration generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Diff {
    /// Tables present only in the desired schema, sorted by name.
    pub added_tables: Vec<Table>,
    /// Tables present only in the actual schema, sorted by name.
    pub removed_tables: Vec<Table>,
    /// Tables present in both, with at least one difference, sorted
    /// by table name.
    pub modified_tables: Vec<TableDiff>,
    /// Enums present only in the desired schema, sorted by name.
    pub added_enums: Vec<GlobalEnum>,
    /// Enums present only in the actual schema, sorted by name.
    pub removed_enums: Vec<GlobalEnum>,
    /// Enums present in both with differing value lists, sorted by
    /// name.
    pub modified_enums: Vec<ModifiedEnum>
}

impl Diff {
    /// `true` if the two schemas compared equal in every respect —
    /// the differ's idempotence property requires
    /// `diff(A, A).is_empty()` for every `A`.
    pub fn is_empty(&self) -> bool {
        self.added_tables.is_empty()
            && self.removed_tables.is_empty()
            && self.modified_tables.is_empty()
            && self.added_enums.is_empty()
            && self.removed_enums.is_empty()
            && self.modified_enums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_change_set_reports_empty() {
        assert!(ColumnChangeSet::default().is_empty());
    }

    #[test]
    fn non_empty_change_set_reports_non_empty() {
        let changes = ColumnChangeSet {
            type_changed: true,
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn table_diff_empty_when_no_changes() {
        assert!(TableDiff::default().is_empty());
    }

    #[test]
    fn diff_empty_when_all_categories_empty() {
        assert!(Diff::default().is_empty());
    }

    #[test]
    fn diff_non_empty_when_a_table_was_added() {
        let mut diff = Diff::default();
        diff.modified_tables.push(TableDiff {
            table: "users".into(),
            added_columns: vec![],
            removed_columns: vec![],
            modified_columns: vec![ModifiedColumn {
                name: "name".into(),
                desired: crate::column::Column {
                    name: "name".into(),
                    base_type: "VARCHAR(100)".into(),
                    nullable: false,
                    default: None,
                    check: None,
                    platform_overrides: Default::default(),
                    comment: None,
                    foreign_key: None,
                    enum_ref: None,
                    is_primary: false,
                    is_unique: false,
                    auto_increment: false
                },
                changes: ColumnChangeSet {
                    type_changed: true,
                    ..Default::default()
                }
            }],
            added_indexes: vec![],
            removed_indexes: vec![],
            added_constraints: vec![],
            removed_constraints: vec![]
        });
        assert!(!diff.is_empty());
    }
}
