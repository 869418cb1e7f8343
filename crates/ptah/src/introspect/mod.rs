//! Reads a live database's catalog into the same [`Schema`] shape the
//! annotation parser produces, so the differ never needs to know
//! which side of a comparison came from source and which came from a
//! connection.
//!
//! Fidelity target (spec): tables, columns (name, type, nullability,
//! default, auto-increment flag, primary-key membership, unique-column
//! flag), indexes (name, columns, uniqueness), and enum types. Foreign
//! keys are deliberately not reconstructed into [`ptah_ast::Constraint::ForeignKey`]
//! here — the spec calls this out as deferred work, and guessing at
//! `ON DELETE`/`ON UPDATE` semantics from catalog metadata this module
//! doesn't query would be worse than omitting them. [`introspect`]
//! still surfaces the constraint *names* it finds via `tracing::debug`
//! so an operator diffing generated DDL against a real database isn't
//! flying blind.

mod mysql;
mod postgres;

use ptah_ast::{Dialect, Schema, column::ColumnDefault};

use crate::{
    db::Connection,
    error::Result
};

/// Read `conn`'s current schema into the same AST shape
/// [`crate::transform::lower`] produces from annotations.
///
/// A nil/closed connection cannot be expressed in this type (see
/// [`Connection`]'s doc comment) so there is no "nil handle" case to
/// guard against here; a dropped network connection instead surfaces
/// as `Err(`[`crate::Error::Introspection`]`)`.
pub async fn introspect(conn: &Connection) -> Result<Schema> {
    match conn {
        Connection::Postgres(pool) => postgres::introspect(pool).await,
        Connection::MySql(pool) => mysql::introspect(pool, Dialect::MySql).await
    }
}

/// Parse a catalog-reported default expression into a [`ColumnDefault`],
/// unwrapping the `'value'::type` cast suffix PostgreSQL appends and
/// distinguishing a quoted literal from a bare function call.
fn parse_default(raw: &str) -> ColumnDefault {
    let without_cast = raw.split("::").next().unwrap_or(raw).trim();
    if without_cast.len() >= 2 && without_cast.starts_with('\'') && without_cast.ends_with('\'') {
        ColumnDefault::Literal(without_cast[1..without_cast.len() - 1].replace("''", "'"))
    } else {
        ColumnDefault::Expression(without_cast.to_string())
    }
}
