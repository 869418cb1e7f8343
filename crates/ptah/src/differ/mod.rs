//! Structural diffing between a desired and an actual [`Schema`].

use ptah_ast::{
    Constraint, Diff, Schema,
    column::Column,
    diff::{ColumnChangeSet, ModifiedColumn, ModifiedEnum, TableDiff}
};

/// Compare `desired` against `actual`, producing the structured
/// difference the migration generator consumes.
///
/// Idempotent: `diff(a, a).is_empty()` for every `a`, since every
/// comparison below is driven by equality or by per-field comparison
/// with no hidden ordering-sensitive state.
pub fn diff(desired: &Schema, actual: &Schema) -> Diff {
    let mut out = Diff::default();

    for table in desired.tables() {
        if actual.table(&table.name).is_none() {
            out.added_tables.push(table.clone());
        }
    }
    for table in actual.tables() {
        if desired.table(&table.name).is_none() {
            out.removed_tables.push(table.clone());
        }
    }
    for desired_table in desired.tables() {
        let Some(actual_table) = actual.table(&desired_table.name) else {
            continue;
        };
        let table_diff = diff_table(desired_table, actual_table);
        if !table_diff.is_empty() {
            out.modified_tables.push(table_diff);
        }
    }

    for e in desired.enums() {
        if actual.enum_by_name(&e.name).is_none() {
            out.added_enums.push(e.clone());
        }
    }
    for e in actual.enums() {
        if desired.enum_by_name(&e.name).is_none() {
            out.removed_enums.push(e.clone());
        }
    }
    for desired_enum in desired.enums() {
        if let Some(actual_enum) = actual.enum_by_name(&desired_enum.name)
            && desired_enum.values != actual_enum.values
        {
            out.modified_enums.push(ModifiedEnum {
                name: desired_enum.name.clone(),
                desired_values: desired_enum.values.clone(),
                actual_values: actual_enum.values.clone()
            });
        }
    }

    out
}

fn diff_table(desired: &ptah_ast::Table, actual: &ptah_ast::Table) -> TableDiff {
    let mut table_diff = TableDiff {
        table: desired.name.clone(),
        ..Default::default()
    };

    for column in &desired.columns {
        if actual.column(&column.name).is_none() {
            table_diff.added_columns.push(column.clone());
        }
    }
    for column in &actual.columns {
        if desired.column(&column.name).is_none() {
            table_diff.removed_columns.push(column.clone());
        }
    }
    for desired_column in &desired.columns {
        let Some(actual_column) = actual.column(&desired_column.name) else {
            continue;
        };
        let changes = column_changes(desired_column, actual_column);
        if !changes.is_empty() {
            table_diff.modified_columns.push(ModifiedColumn {
                name: desired_column.name.clone(),
                desired: desired_column.clone(),
                changes
            });
        }
    }
    table_diff.modified_columns.sort_by(|a, b| a.name.cmp(&b.name));

    for index in &desired.indexes {
        if !actual.indexes.iter().any(|i| i.name == index.name) {
            table_diff.added_indexes.push(index.clone());
        }
    }
    for index in &actual.indexes {
        if !desired.indexes.iter().any(|i| i.name == index.name) {
            table_diff.removed_indexes.push(index.clone());
        }
    }

    for constraint in &desired.constraints {
        if !actual.constraints.iter().any(|c| constraints_match(c, constraint)) {
            table_diff.added_constraints.push(constraint.clone());
        }
    }
    for constraint in &actual.constraints {
        if !desired.constraints.iter().any(|c| constraints_match(c, constraint)) {
            table_diff.removed_constraints.push(constraint.clone());
        }
    }

    table_diff
}

fn constraints_match(a: &Constraint, b: &Constraint) -> bool {
    a == b
}

fn column_changes(desired: &Column, actual: &Column) -> ColumnChangeSet {
    ColumnChangeSet {
        type_changed: desired.base_type != actual.base_type,
        nullability_changed: desired.effective_nullable() != actual.effective_nullable(),
        default_changed: desired.default != actual.default,
        check_changed: desired.check != actual.check
    }
}
