//! Turns a [`Diff`] into an ordered list of DDL statements.
//!
//! The seven-step order below is load-bearing: creating an enum
//! before the table that uses it, adding a column before altering it,
//! and dropping a table only after its indexes are gone are all
//! things a careless reordering would silently break against a live
//! database.

use std::collections::BTreeSet;

use ptah_ast::{
    diff::Diff,
    schema::DependencyGraph,
    {Schema, Table}
};

use crate::{render::Renderer, resolver::resolve};

/// Render `diff` as a sequence of complete SQL statements for
/// `renderer`'s dialect.
///
/// `confirm_destructive` gates every `DROP COLUMN`, `DROP TABLE`, and
/// reordered/removed enum value: when `false` the operation is
/// emitted as an inert `-- WARNING:` comment instead of being
/// executed, matching the CLI's `--confirm` flag.
pub fn generate(diff: &Diff, desired: &Schema, renderer: &dyn Renderer, confirm_destructive: bool) -> Vec<String> {
    let mut statements = Vec::new();

    // 1. Create enum types the desired schema adds.
    for e in &diff.added_enums {
        if let Some(stmt) = renderer.render_enum_create(e) {
            statements.push(stmt);
        }
    }

    // 2. Create new tables, in dependency order among themselves.
    let added_plan = resolve(&added_tables_graph(diff));
    for name in &added_plan.order {
        if let Some(table) = diff.added_tables.iter().find(|t| &t.name == name) {
            statements.extend(renderer.render_new_table(desired, table));
        }
    }

    // 3. Per modified table: add columns, then alter columns, then
    //    (conditionally) drop columns.
    for table_diff in &diff.modified_tables {
        for column in &table_diff.added_columns {
            statements.push(renderer.render_add_column(&table_diff.table, desired, column));
        }
        for modified in &table_diff.modified_columns {
            statements.extend(renderer.render_alter_column(&table_diff.table, desired, modified));
        }
        for column in &table_diff.removed_columns {
            let stmt = renderer.render_drop_column(&table_diff.table, &column.name);
            statements.push(gate(stmt, confirm_destructive, "DROP COLUMN"));
        }
    }

    // 4. Create new indexes (added tables already carry theirs).
    for table_diff in &diff.modified_tables {
        for index in &table_diff.added_indexes {
            statements.push(renderer.render_index_create(index));
        }
    }

    // 5. Drop obsolete indexes. Not gated by `--confirm`: an index can
    //    always be recreated from the desired schema, unlike a
    //    dropped column or table.
    for table_diff in &diff.modified_tables {
        for index in &table_diff.removed_indexes {
            statements.push(renderer.render_index_drop(index));
        }
    }

    // 6. Drop obsolete tables.
    for table in &diff.removed_tables {
        let stmt = renderer.render_drop_table(&table.name);
        statements.push(gate(stmt, confirm_destructive, "DROP TABLE"));
    }

    // 7. Drop obsolete enum types. A modified (not removed) enum is
    // never rewritten automatically — reorder and append both collapse
    // to the same "value list differs" fact in `Diff`, and guessing
    // which one happened risks silently reordering a type whose
    // integer-backed ordinal other rows depend on.
    for e in &diff.removed_enums {
        if let Some(stmt) = renderer.render_enum_drop(e) {
            statements.push(gate(stmt, confirm_destructive, "DROP TYPE"));
        }
    }
    for modified in &diff.modified_enums {
        statements.push(format!(
            "-- WARNING: enum {} value list changed (desired {:?}, actual {:?}); review and migrate manually",
            modified.name, modified.desired_values, modified.actual_values
        ));
    }

    statements
}

/// Comment out a destructive statement unless the caller confirmed.
/// `Migrator` strips comments from each split statement before running
/// it and drops whatever becomes empty, so a gated statement never
/// executes even if it is applied straight from the generated file
/// without a human reviewing it first.
fn gate(stmt: String, confirm: bool, operation: &str) -> String {
    if confirm {
        stmt
    } else {
        format!("-- WARNING: {operation} refused without --confirm: {stmt}")
    }
}

/// Dependency graph restricted to edges between two tables that are
/// both being newly added — references to a table that already
/// exists impose no creation-order constraint.
fn added_tables_graph(diff: &Diff) -> DependencyGraph {
    let added_names: BTreeSet<&str> = diff.added_tables.iter().map(|t| t.name.as_str()).collect();
    let mut graph = DependencyGraph::new(diff.added_tables.iter().map(|t| t.name.clone()));
    for table in &diff.added_tables {
        for referenced in references_of(table) {
            if added_names.contains(referenced.as_str()) {
                graph.add_edge(table.name.clone(), referenced);
            }
        }
    }
    graph
}

fn references_of(table: &Table) -> Vec<String> {
    table
        .constraints
        .iter()
        .filter_map(|c| match c {
            ptah_ast::Constraint::ForeignKey { reference, .. } if !reference.external => Some(reference.table.clone()),
            _ => None
        })
        .collect()
}
