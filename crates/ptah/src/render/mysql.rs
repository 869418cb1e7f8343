//! MySQL/MariaDB DDL rendering.
//!
//! The two dialects differ only in the `platform.*` override
//! namespace they read from ([`Dialect::override_key`]) and their
//! identity for logging; the DDL shape they produce is identical, so
//! both [`super::MySqlRenderer`] and [`super::MariaDbRenderer`] call
//! into [`render`].

use std::collections::BTreeSet;

use ptah_ast::{Column, Constraint, Dialect, GlobalEnum, Index, Schema, Table, diff::ModifiedColumn};

use super::{Renderer, column_parts, column_parts_to_sql, quote_with, render_default, render_referential_action_clause};
use crate::resolver::Plan;

/// Renders a [`Schema`] as MySQL DDL.
pub struct MySqlRenderer;

impl Renderer for MySqlRenderer {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '`')
    }

    fn render_create(&self, schema: &Schema, plan: &Plan) -> Vec<String> {
        render(Dialect::MySql, schema, plan)
    }

    fn render_new_table(&self, schema: &Schema, table: &Table) -> Vec<String> {
        render_new_table(Dialect::MySql, schema, table)
    }

    fn render_enum_create(&self, _e: &GlobalEnum) -> Option<String> {
        None
    }

    fn render_enum_drop(&self, _e: &GlobalEnum) -> Option<String> {
        None
    }

    fn render_drop_table(&self, table: &str) -> String {
        render_drop_table(table)
    }

    fn render_add_column(&self, table: &str, schema: &Schema, column: &Column) -> String {
        render_add_column(Dialect::MySql, table, schema, column)
    }

    fn render_drop_column(&self, table: &str, column: &str) -> String {
        render_drop_column(table, column)
    }

    fn render_alter_column(&self, table: &str, schema: &Schema, modified: &ModifiedColumn) -> Vec<String> {
        render_alter_column(Dialect::MySql, table, schema, modified)
    }

    fn render_index_create(&self, index: &Index) -> String {
        render_index(Dialect::MySql, index)
    }

    fn render_index_drop(&self, index: &Index) -> String {
        render_index_drop(index)
    }
}

pub(super) fn render(dialect: Dialect, schema: &Schema, plan: &Plan) -> Vec<String> {
    let mut statements = Vec::new();
    let deferred: BTreeSet<(String, String)> = plan.deferred_edges.iter().cloned().collect();

    for table_name in &plan.order {
        let Some(table) = schema.table(table_name) else { continue };
        statements.push(render_table(dialect, schema, table, &deferred));
        for index in &table.indexes {
            statements.push(render_index(dialect, index));
        }
    }

    for (from, to) in &plan.deferred_edges {
        let Some(table) = schema.table(from) else { continue };
        for constraint in &table.constraints {
            if let Constraint::ForeignKey { name, columns, reference } = constraint
                && &reference.table == to
            {
                statements.push(format!("ALTER TABLE {} ADD {};", quote(&table.name), foreign_key_clause(dialect, name, columns, reference)));
            }
        }
    }

    statements
}

fn quote(ident: &str) -> String {
    quote_with(ident, '`')
}

fn column_type(dialect: Dialect, schema: &Schema, column: &Column) -> String {
    if let Some(ov) = column.platform_override(dialect.override_key(), "type") {
        return ov.to_string();
    }
    if let Some(enum_name) = &column.enum_ref
        && let Some(e) = schema.enum_by_name(enum_name)
    {
        let values = e.values.iter().map(|v| format!("'{}'", v.replace('\'', "''"))).collect::<Vec<_>>().join(",");
        return format!("ENUM({values})");
    }
    match column.base_type.to_ascii_uppercase().as_str() {
        "SERIAL" => "INT".to_string(),
        "BIGSERIAL" => "BIGINT".to_string(),
        _ => column.base_type.clone()
    }
}

fn render_table(dialect: Dialect, schema: &Schema, table: &Table, deferred: &BTreeSet<(String, String)>) -> String {
    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let mut parts = column_parts(table, c, column_type(dialect, schema, c));
            parts.auto_increment = c.auto_increment;
            let mut sql = column_parts_to_sql(&parts, |s| quote(s));
            if let Some(comment) = &c.comment {
                sql.push_str(&format!(" COMMENT '{}'", comment.replace('\'', "''")));
            }
            sql
        })
        .collect();

    if let Some(Constraint::PrimaryKey { columns }) = table.constraints.iter().find(|c| c.is_primary_key())
        && columns.len() > 1
    {
        let cols = columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
        parts.push(format!("PRIMARY KEY ({cols})"));
    }

    for constraint in &table.constraints {
        match constraint {
            Constraint::ForeignKey { name, columns, reference } => {
                if deferred.contains(&(table.name.clone(), reference.table.clone())) {
                    continue;
                }
                parts.push(foreign_key_clause(dialect, name, columns, reference));
            }
            Constraint::Unique { name, target } => {
                let named = name.as_deref().map(|n| format!("CONSTRAINT {} ", quote(n))).unwrap_or_default();
                let cols = match target {
                    ptah_ast::constraint::UniqueTarget::Columns(cols) => cols.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", "),
                    ptah_ast::constraint::UniqueTarget::Expression(expr) => expr.clone()
                };
                parts.push(format!("{named}UNIQUE ({cols})"));
            }
            Constraint::Check { name, expression } => parts.push(format!("CONSTRAINT {} CHECK ({expression})", quote(name))),
            Constraint::PrimaryKey { .. } => {}
        }
    }

    let mut stmt = format!("CREATE TABLE {} ({})", quote(&table.name), parts.join(", "));

    if let Some(engine) = table.options.get(dialect.override_key()).and_then(|o| o.get("engine")) {
        stmt.push_str(&format!(" ENGINE={engine}"));
    }
    if let Some(comment) = &table.comment {
        stmt.push_str(&format!(" COMMENT='{}'", comment.replace('\'', "''")));
    }
    stmt.push(';');
    stmt
}

fn foreign_key_clause(dialect: Dialect, name: &str, columns: &[String], reference: &ptah_ast::constraint::ConstraintRef) -> String {
    let cols = columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
    let ref_cols = reference.columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
    let action = render_referential_action_clause(reference.on_delete, reference.on_update);
    format!(
        "CONSTRAINT {} FOREIGN KEY ({cols}) REFERENCES {} ({ref_cols}){action}",
        quote(name),
        quote(&reference.table)
    )
}

pub(super) fn render_index(dialect: Dialect, index: &ptah_ast::Index) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    let columns: Vec<String> = index.columns.iter().map(|c| format!("{}{}", quote(&c.name), c.order.as_sql_suffix())).collect();
    let warning = if index.predicate.is_some() {
        format!("-- WARNING: partial index predicate on '{}' is not supported on {dialect} and was dropped\n", index.name)
    } else {
        String::new()
    };
    format!("{warning}CREATE {unique}INDEX {} ON {} ({});", quote(&index.name), quote(&index.table), columns.join(", "))
}

/// `DROP INDEX` on the MySQL family requires naming the owning table,
/// unlike PostgreSQL where an index name alone is unambiguous.
pub(super) fn render_index_drop(index: &ptah_ast::Index) -> String {
    format!("DROP INDEX {} ON {};", quote(&index.name), quote(&index.table))
}

pub(super) fn render_new_table(dialect: Dialect, schema: &Schema, table: &Table) -> Vec<String> {
    let mut statements = vec![render_table(dialect, schema, table, &BTreeSet::new())];
    for index in &table.indexes {
        statements.push(render_index(dialect, index));
    }
    statements
}

pub(super) fn render_drop_table(table: &str) -> String {
    format!("DROP TABLE {};", quote(table))
}

pub(super) fn render_add_column(dialect: Dialect, table: &str, schema: &Schema, column: &Column) -> String {
    let mut sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote(table),
        quote(&column.name),
        column_type(dialect, schema, column)
    );
    if !column.effective_nullable() {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&render_default(default));
    }
    if column.auto_increment {
        sql.push_str(" AUTO_INCREMENT");
    }
    if column.is_unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(check) = &column.check {
        sql.push_str(&format!(" CHECK ({check})"));
    }
    sql.push(';');
    sql
}

pub(super) fn render_drop_column(table: &str, column: &str) -> String {
    format!("ALTER TABLE {} DROP COLUMN {};", quote(table), quote(column))
}

/// MySQL's `MODIFY COLUMN` always restates the full column
/// definition, so each changed attribute is emitted as its own
/// `MODIFY COLUMN` carrying the attributes at and before it in the
/// spec's type/nullability/default ordering, rather than a single
/// statement that would blur which attribute the generator intended
/// to change.
pub(super) fn render_alter_column(dialect: Dialect, table: &str, schema: &Schema, modified: &ModifiedColumn) -> Vec<String> {
    let mut statements = Vec::new();
    let t = quote(table);
    let col = quote(&modified.name);
    let type_sql = column_type(dialect, schema, &modified.desired);

    if modified.changes.type_changed {
        statements.push(format!("ALTER TABLE {t} MODIFY COLUMN {col} {type_sql};"));
    }
    if modified.changes.nullability_changed {
        let mut stmt = format!("ALTER TABLE {t} MODIFY COLUMN {col} {type_sql}");
        if !modified.desired.effective_nullable() {
            stmt.push_str(" NOT NULL");
        }
        stmt.push(';');
        statements.push(stmt);
    }
    if modified.changes.default_changed {
        let mut stmt = format!("ALTER TABLE {t} MODIFY COLUMN {col} {type_sql}");
        if !modified.desired.effective_nullable() {
            stmt.push_str(" NOT NULL");
        }
        if let Some(default) = &modified.desired.default {
            stmt.push_str(" DEFAULT ");
            stmt.push_str(&render_default(default));
        }
        stmt.push(';');
        statements.push(stmt);
    }
    if modified.changes.check_changed {
        statements.push(format!("-- WARNING: CHECK constraint change on {t}.{col} requires a manual table rebuild on {dialect}"));
    }

    statements
}
