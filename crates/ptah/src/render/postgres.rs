//! PostgreSQL DDL rendering.

use std::collections::BTreeSet;

use ptah_ast::{Column, Constraint, Dialect, GlobalEnum, Index, Schema, Table, constraint::UniqueTarget, diff::ModifiedColumn};

use super::{Renderer, column_parts, column_parts_to_sql, quote_with, render_default, render_index_statement, render_referential_action_clause};
use crate::resolver::Plan;

/// Renders a [`Schema`] as PostgreSQL DDL.
pub struct PostgresRenderer;

impl Renderer for PostgresRenderer {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '"')
    }

    fn render_create(&self, schema: &Schema, plan: &Plan) -> Vec<String> {
        let mut statements = Vec::new();
        let deferred: BTreeSet<(String, String)> = plan.deferred_edges.iter().cloned().collect();

        for ext in &schema.extensions {
            let if_not_exists = if ext.if_not_exists { "IF NOT EXISTS " } else { "" };
            statements.push(format!("CREATE EXTENSION {if_not_exists}{};", self.quote_ident(&ext.name)));
            if let Some(comment) = &ext.comment {
                statements.push(format!("COMMENT ON EXTENSION {} IS '{}';", self.quote_ident(&ext.name), escape_literal(comment)));
            }
        }

        for e in schema.enums() {
            let values = e.values.iter().map(|v| format!("'{}'", escape_literal(v))).collect::<Vec<_>>().join(", ");
            statements.push(format!("CREATE TYPE {} AS ENUM ({values});", self.quote_ident(&e.name)));
        }

        for table_name in &plan.order {
            let Some(table) = schema.table(table_name) else { continue };
            statements.extend(self.render_table(table, &deferred));
        }

        for (from, to) in &plan.deferred_edges {
            let Some(table) = schema.table(from) else { continue };
            for constraint in &table.constraints {
                if let Constraint::ForeignKey { name, columns, reference } = constraint
                    && &reference.table == to
                {
                    statements.push(self.foreign_key_alter(&table.name, name, columns, reference));
                }
            }
        }

        statements
    }

    fn render_new_table(&self, _schema: &Schema, table: &Table) -> Vec<String> {
        self.render_table(table, &BTreeSet::new())
    }

    fn render_enum_create(&self, e: &GlobalEnum) -> Option<String> {
        let values = e.values.iter().map(|v| format!("'{}'", escape_literal(v))).collect::<Vec<_>>().join(", ");
        Some(format!("CREATE TYPE {} AS ENUM ({values});", self.quote_ident(&e.name)))
    }

    fn render_enum_drop(&self, e: &GlobalEnum) -> Option<String> {
        Some(format!("DROP TYPE {};", self.quote_ident(&e.name)))
    }

    fn render_drop_table(&self, table: &str) -> String {
        format!("DROP TABLE {};", self.quote_ident(table))
    }

    fn render_add_column(&self, table: &str, _schema: &Schema, column: &Column) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.quote_ident(table),
            self.quote_ident(&column.name),
            self.column_type(column)
        );
        if !column.effective_nullable() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&render_default(default));
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

    fn render_drop_column(&self, table: &str, column: &str) -> String {
        format!("ALTER TABLE {} DROP COLUMN {};", self.quote_ident(table), self.quote_ident(column))
    }

    fn render_alter_column(&self, table: &str, _schema: &Schema, modified: &ModifiedColumn) -> Vec<String> {
        let mut statements = Vec::new();
        let t = self.quote_ident(table);
        let col = self.quote_ident(&modified.name);

        if modified.changes.type_changed {
            statements.push(format!("ALTER TABLE {t} ALTER COLUMN {col} TYPE {};", self.column_type(&modified.desired)));
        }
        if modified.changes.nullability_changed {
            if modified.desired.effective_nullable() {
                statements.push(format!("ALTER TABLE {t} ALTER COLUMN {col} DROP NOT NULL;"));
            } else {
                statements.push(format!("ALTER TABLE {t} ALTER COLUMN {col} SET NOT NULL;"));
            }
        }
        if modified.changes.default_changed {
            match &modified.desired.default {
                Some(default) => statements.push(format!("ALTER TABLE {t} ALTER COLUMN {col} SET DEFAULT {};", render_default(default))),
                None => statements.push(format!("ALTER TABLE {t} ALTER COLUMN {col} DROP DEFAULT;"))
            }
        }
        if modified.changes.check_changed {
            statements.push(format!(
                "-- WARNING: CHECK constraint change on {t}.{col} requires a manual DROP CONSTRAINT/ADD CONSTRAINT"
            ));
        }

        statements
    }

    fn render_index_create(&self, index: &Index) -> String {
        render_index_statement(index, |s| self.quote_ident(s), index.kind.as_postgres_using())
    }

    fn render_index_drop(&self, index: &Index) -> String {
        format!("DROP INDEX {};", self.quote_ident(&index.name))
    }
}

impl PostgresRenderer {
    fn column_type(&self, column: &ptah_ast::Column) -> String {
        column.platform_override(self.dialect().override_key(), "type").map(str::to_string).unwrap_or_else(|| column.base_type.clone())
    }

    fn render_table(&self, table: &Table, deferred: &BTreeSet<(String, String)>) -> Vec<String> {
        let mut statements = Vec::new();

        let mut parts: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                let p = column_parts(table, c, self.column_type(c));
                column_parts_to_sql(&p, |s| self.quote_ident(s))
            })
            .collect();

        if let Some(Constraint::PrimaryKey { columns }) = table.constraints.iter().find(|c| c.is_primary_key())
            && columns.len() > 1
        {
            let cols = columns.iter().map(|c| self.quote_ident(c)).collect::<Vec<_>>().join(", ");
            parts.push(format!("PRIMARY KEY ({cols})"));
        }

        for constraint in &table.constraints {
            match constraint {
                Constraint::ForeignKey { name, columns, reference } => {
                    if deferred.contains(&(table.name.clone(), reference.table.clone())) {
                        continue;
                    }
                    parts.push(self.foreign_key_clause(name, columns, reference));
                }
                Constraint::Unique { name, target } => parts.push(self.unique_clause(name.as_deref(), target)),
                Constraint::Check { name, expression } => parts.push(format!("CONSTRAINT {} CHECK ({expression})", self.quote_ident(name))),
                Constraint::PrimaryKey { .. } => {}
            }
        }

        statements.push(format!("CREATE TABLE {} ({});", self.quote_ident(&table.name), parts.join(", ")));

        for index in &table.indexes {
            statements.push(render_index_statement(index, |s| self.quote_ident(s), index.kind.as_postgres_using()));
        }

        if table.rls.enabled {
            statements.push(format!("ALTER TABLE {} ENABLE ROW LEVEL SECURITY;", self.quote_ident(&table.name)));
            for policy in &table.rls.policies {
                statements.push(self.policy_statement(&table.name, policy));
            }
        }

        if let Some(comment) = &table.comment {
            statements.push(format!("COMMENT ON TABLE {} IS '{}';", self.quote_ident(&table.name), escape_literal(comment)));
        }
        for column in &table.columns {
            if let Some(comment) = &column.comment {
                statements.push(format!(
                    "COMMENT ON COLUMN {}.{} IS '{}';",
                    self.quote_ident(&table.name),
                    self.quote_ident(&column.name),
                    escape_literal(comment)
                ));
            }
        }

        statements
    }

    fn foreign_key_clause(&self, name: &str, columns: &[String], reference: &ptah_ast::constraint::ConstraintRef) -> String {
        let cols = columns.iter().map(|c| self.quote_ident(c)).collect::<Vec<_>>().join(", ");
        let ref_cols = reference.columns.iter().map(|c| self.quote_ident(c)).collect::<Vec<_>>().join(", ");
        let action = render_referential_action_clause(reference.on_delete, reference.on_update);
        format!(
            "CONSTRAINT {} FOREIGN KEY ({cols}) REFERENCES {} ({ref_cols}){action}",
            self.quote_ident(name),
            self.quote_ident(&reference.table)
        )
    }

    fn foreign_key_alter(&self, table: &str, name: &str, columns: &[String], reference: &ptah_ast::constraint::ConstraintRef) -> String {
        format!(
            "ALTER TABLE {} ADD {};",
            self.quote_ident(table),
            self.foreign_key_clause(name, columns, reference)
        )
    }

    fn unique_clause(&self, name: Option<&str>, target: &UniqueTarget) -> String {
        let named = name.map(|n| format!("CONSTRAINT {} ", self.quote_ident(n))).unwrap_or_default();
        match target {
            UniqueTarget::Columns(cols) => {
                let cols = cols.iter().map(|c| self.quote_ident(c)).collect::<Vec<_>>().join(", ");
                format!("{named}UNIQUE ({cols})")
            }
            UniqueTarget::Expression(expr) => format!("{named}UNIQUE ({expr})")
        }
    }

    fn policy_statement(&self, table: &str, policy: &ptah_ast::table::RlsPolicy) -> String {
        let mut stmt = format!("CREATE POLICY {} ON {}", self.quote_ident(&policy.name), self.quote_ident(table));
        if let Some(f) = &policy.for_clause {
            stmt.push_str(&format!(" FOR {f}"));
        }
        if let Some(to) = &policy.to_clause {
            stmt.push_str(&format!(" TO {to}"));
        }
        if let Some(using) = &policy.using {
            stmt.push_str(&format!(" USING ({using})"));
        }
        if let Some(check) = &policy.with_check {
            stmt.push_str(&format!(" WITH CHECK ({check})"));
        }
        stmt.push(';');
        stmt
    }
}

fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}
