//! Ptah: an annotation-driven schema migration engine.
//!
//! Ptah discovers `migrator:` directives in a host source tree
//! ([`annotation`]), lowers them into a dialect-neutral [`ptah_ast::Schema`]
//! ([`transform`]), orders tables by foreign-key dependency ([`resolver`]),
//! renders dialect-specific DDL ([`render`]), reads a live database's
//! current schema back into the same AST shape ([`introspect`]), diffs
//! desired against actual ([`differ`]), lowers the diff into an ordered
//! statement sequence ([`generator`]), and finally applies it under a
//! versioned, restartable migration protocol ([`migrator`]).
//!
//! None of these stages hold global state: every operation takes its
//! inputs explicitly and a [`db::Connection`] is always caller-owned.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotation;
pub mod db;
pub mod differ;
pub mod error;
pub mod generator;
pub mod introspect;
pub mod lexer;
pub mod migrator;
pub mod render;
pub mod resolver;
pub mod transform;

pub use db::{Connection, Dsn};
pub use error::{Error, Result};

use std::path::Path;

use ptah_ast::Schema;

/// Scan `root` for `migrator:` directives and lower the result into a
/// dialect-neutral [`Schema`] in one call — the composition of
/// [`annotation::parse_tree`] and [`transform::lower`] that every CLI
/// command needing the "desired" schema performs identically.
///
/// Returns the schema alongside any non-fatal warnings collected while
/// scanning (unrecognized directive keys, unresolvable embedded
/// types).
pub fn build_desired_schema(root: &Path) -> Result<(Schema, Vec<String>)> {
    let (entities, extensions, warnings) = annotation::parse_tree(root)?;
    let schema = transform::lower(&entities, &extensions)?;
    Ok((schema, warnings))
}
