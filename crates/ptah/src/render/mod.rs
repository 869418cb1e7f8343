//! Dialect-specific DDL rendering.
//!
//! One [`Renderer`] implementation per dialect. Each is a visitor over
//! [`Schema`] that produces an ordered list of complete SQL statements
//! (never pre-joined strings) so callers can still split, count, or
//! write them one per line per the file-output contract.

mod mariadb;
mod mysql;
mod postgres;

use ptah_ast::{
    Column, Constraint, Dialect, GlobalEnum, Index, Schema, Table,
    column::{ColumnDefault, ReferentialAction},
    diff::ModifiedColumn
};

pub use mariadb::MariaDbRenderer;
pub use mysql::MySqlRenderer;
pub use postgres::PostgresRenderer;

use crate::resolver::Plan;

/// Pick the [`Renderer`] implementation matching `dialect` — the one
/// indirection point between a [`Dialect`] value (read off a DSN or
/// passed explicitly for MariaDB) and the visitor that knows how to
/// render it.
pub fn for_dialect(dialect: Dialect) -> Box<dyn Renderer> {
    match dialect {
        Dialect::Postgres => Box::new(PostgresRenderer),
        Dialect::MySql => Box::new(MySqlRenderer),
        Dialect::MariaDb => Box::new(MariaDbRenderer)
    }
}

/// A visitor that lowers a [`Schema`] into a dialect's DDL.
pub trait Renderer {
    /// The dialect this renderer targets.
    fn dialect(&self) -> Dialect;

    /// Render a full `CREATE` script for `schema`, creating tables in
    /// `plan.order` and applying `plan.deferred_edges` as trailing
    /// `ALTER TABLE` statements.
    fn render_create(&self, schema: &Schema, plan: &Plan) -> Vec<String>;

    /// Quote `ident` only if it is a reserved word or contains
    /// characters unsafe to leave bare.
    fn quote_ident(&self, ident: &str) -> String;

    /// Render one table's `CREATE TABLE`, its indexes, its
    /// row-level-security setup, and its comments — the unit the
    /// migration generator emits per added table.
    fn render_new_table(&self, schema: &Schema, table: &Table) -> Vec<String>;

    /// `CREATE TYPE ... AS ENUM (...)`, or `None` for dialects that
    /// inline enums instead of declaring a named type.
    fn render_enum_create(&self, e: &GlobalEnum) -> Option<String>;

    /// `DROP TYPE ...`, or `None` for dialects with no named enum
    /// type to drop.
    fn render_enum_drop(&self, e: &GlobalEnum) -> Option<String>;

    /// `DROP TABLE ...`.
    fn render_drop_table(&self, table: &str) -> String;

    /// `ALTER TABLE ... ADD COLUMN ...`.
    fn render_add_column(&self, table: &str, schema: &Schema, column: &Column) -> String;

    /// `ALTER TABLE ... DROP COLUMN ...`.
    fn render_drop_column(&self, table: &str, column: &str) -> String;

    /// One or more `ALTER TABLE`/`MODIFY COLUMN` statements applying
    /// exactly the attributes `modified.changes` flags as differing.
    fn render_alter_column(&self, table: &str, schema: &Schema, modified: &ModifiedColumn) -> Vec<String>;

    /// `CREATE [UNIQUE] INDEX ...`.
    fn render_index_create(&self, index: &Index) -> String;

    /// `DROP INDEX ...`.
    fn render_index_drop(&self, index: &Index) -> String;
}

/// Shared reserved-word test: SQL keywords any of the three
/// supported dialects treat specially, kept deliberately small — this
/// is a safety net, not a full keyword table. Anything outside this
/// list and `[a-zA-Z_][a-zA-Z0-9_]*` is quoted unconditionally.
pub(crate) fn needs_quoting(ident: &str) -> bool {
    const RESERVED: &[&str] = &[
        "select", "insert", "update", "delete", "table", "order", "group", "user", "primary", "key", "index",
        "check", "default", "references", "unique", "column", "from", "where", "join",
    ];
    if ident.is_empty() {
        return true;
    }
    let mut chars = ident.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    !first_ok || !rest_ok || RESERVED.contains(&ident.to_ascii_lowercase().as_str())
}

pub(crate) fn quote_with(ident: &str, quote: char) -> String {
    if needs_quoting(ident) {
        format!("{quote}{ident}{quote}")
    } else {
        ident.to_string()
    }
}

/// Shared pieces of a column definition every dialect renders in the
/// same relative order, differing only in the pieces a dialect hook
/// computes (`type_sql`) and whether the enum is rendered inline or
/// by referencing a previously created type.
pub(crate) struct ColumnParts {
    pub name: String,
    pub type_sql: String,
    pub is_inline_primary: bool,
    pub auto_increment: bool,
    pub default_sql: Option<String>,
    pub nullable: bool,
    pub unique: bool,
    pub check: Option<String>
}

pub(crate) fn column_parts(table: &Table, column: &Column, type_sql: String) -> ColumnParts {
    let table_level_pk = table.constraints.iter().any(Constraint::is_primary_key);
    ColumnParts {
        name: column.name.clone(),
        type_sql,
        is_inline_primary: column.is_primary && !table_level_pk,
        auto_increment: false,
        default_sql: column.default.as_ref().map(render_default),
        nullable: column.effective_nullable(),
        unique: column.is_unique,
        check: column.check.clone()
    }
}

pub(crate) fn render_default(default: &ColumnDefault) -> String {
    match default {
        ColumnDefault::Literal(lit) => format!("'{}'", lit.replace('\'', "''")),
        ColumnDefault::Expression(expr) => expr.clone()
    }
}

pub(crate) fn column_parts_to_sql(parts: &ColumnParts, quote: impl Fn(&str) -> String) -> String {
    let mut out = format!("{} {}", quote(&parts.name), parts.type_sql);
    if parts.auto_increment {
        out.push_str(" AUTO_INCREMENT");
    }
    if parts.is_inline_primary {
        out.push_str(" PRIMARY KEY");
    } else if !parts.nullable {
        out.push_str(" NOT NULL");
    }
    if let Some(default) = &parts.default_sql {
        out.push_str(" DEFAULT ");
        out.push_str(default);
    }
    if parts.unique && !parts.is_inline_primary {
        out.push_str(" UNIQUE");
    }
    if let Some(check) = &parts.check {
        out.push_str(&format!(" CHECK ({check})"));
    }
    out
}

pub(crate) fn render_referential_action_clause(on_delete: ReferentialAction, on_update: ReferentialAction) -> String {
    let mut out = String::new();
    if on_delete != ReferentialAction::NoAction {
        out.push_str(&format!(" ON DELETE {}", on_delete.as_sql()));
    }
    if on_update != ReferentialAction::NoAction {
        out.push_str(&format!(" ON UPDATE {}", on_update.as_sql()));
    }
    out
}

pub(crate) fn render_index_statement(index: &Index, quote: impl Fn(&str) -> String, using_clause: &str) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    let columns: Vec<String> = index
        .columns
        .iter()
        .map(|c| format!("{}{}", quote(&c.name), c.order.as_sql_suffix()))
        .collect();
    let predicate = index.predicate.as_ref().map(|p| format!(" WHERE {p}")).unwrap_or_default();
    format!(
        "CREATE {unique}INDEX {}{using_clause} ON {} ({}){predicate};",
        quote(&index.name),
        quote(&index.table),
        columns.join(", ")
    )
}
