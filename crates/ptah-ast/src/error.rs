//! Invariant errors raised while constructing AST nodes.
//!
//! These are distinct from the engine-level [`ptah::Error`] taxonomy —
//! they only cover violations of the structural invariants assigned to `Schema`/`Table`/`Column`/etc., and
//! are raised while building a [`crate::Schema`], not while running a
//! migration.

use thiserror::Error;

/// Invariant violation while constructing or mutating an AST node.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AstError {
    /// A table was added to a schema that already has a table with
    /// this name.
    #[error("duplicate table name: {name}")]
    DuplicateTable {
        /// The offending table name.
        name: String
    },

    /// A field name repeats within a single struct/table.
    #[error("duplicate column name {column} in table {table}")]
    DuplicateColumn {
        /// Owning table.
        table: String,
        /// The offending column name.
        column: String
    },

    /// More than one primary-key constraint was attached to a table.
    #[error("table {table} declares more than one primary key")]
    MultiplePrimaryKeys {
        /// Owning table.
        table: String
    },

    /// A foreign key references a column that does not exist on the
    /// owning table.
    #[error("foreign key on {table}.{column} has no such column")]
    UnknownForeignKeyColumn {
        /// Owning table.
        table: String,
        /// The missing column.
        column: String
    },

    /// An index name collides with another index in the same schema.
    #[error("duplicate index name: {name}")]
    DuplicateIndex {
        /// The offending index name.
        name: String
    },

    /// A global enum was declared with an empty or duplicated value
    /// list, or its name collides with another enum.
    #[error("invalid enum {name}: {reason}")]
    InvalidEnum {
        /// The enum name.
        name: String,
        /// Human-readable reason.
        reason: String
    },

    /// A column declared both a default literal and a default
    /// expression, which are mutually exclusive.
    #[error("column {table}.{column} has both a default literal and a default expression")]
    ConflictingDefaults {
        /// Owning table.
        table: String,
        /// Offending column.
        column: String
    },

    /// An identifier exceeds the dialect-agnostic length ceiling or
    /// contains characters no supported dialect can quote safely.
    #[error("identifier {name} is not valid: {reason}")]
    InvalidIdentifier {
        /// The offending identifier.
        name: String,
        /// Human-readable reason.
        reason: String
    }
}
