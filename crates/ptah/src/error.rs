//! The engine-level error taxonomy.

use ptah_ast::AstError;
use thiserror::Error;

/// Errors raised by any engine operation: parsing, resolving,
/// rendering, introspecting, diffing, generating, or migrating.
///
/// Every variant carries the structured context (operation, table,
/// version) a caller needs to report the failure without re-deriving
/// it from a bare string.
#[derive(Debug, Error)]
pub enum Error {
    /// A DSN was missing, unparseable, or named an unsupported
    /// dialect. Fatal; raised before any side effect.
    #[error("configuration error: {reason}")]
    Config {
        /// Human-readable description of what was wrong.
        reason: String
    },

    /// A host source file could not be read.
    #[error("cannot read source file {path}: {source}")]
    UnreadableSource {
        /// The file that could not be read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error
    },

    /// A host source file failed to parse as Rust source.
    #[error("cannot parse source file {path}: {source}")]
    SyntaxError {
        /// The file that failed to parse.
        path: String,
        /// Underlying parse failure.
        #[source]
        source: syn::Error
    },

    /// A directive was malformed, or two directives on one field
    /// contradicted each other. Fatal to the whole parse.
    #[error("malformed directive on {location}: {reason}")]
    Parse {
        /// `struct.field` or `struct` the offending directive was on.
        location: String,
        /// What was wrong.
        reason: String
    },

    /// A foreign key or embedded relation pointed at a table the
    /// resolver could not classify as internal or declared external.
    #[error("unresolved reference from {from} to {to}")]
    Dependency {
        /// Referencing table.
        from: String,
        /// Referenced table.
        to: String
    },

    /// An AST invariant was violated while building a `Schema` from
    /// parsed directives or introspected catalog data.
    #[error("schema construction error: {0}")]
    Ast(#[from] AstError),

    /// Reading the live database's catalog failed.
    #[error("introspection failed against {dialect}: {source}")]
    Introspection {
        /// Dialect being introspected.
        dialect: ptah_ast::Dialect,
        /// Underlying database error.
        #[source]
        source: sqlx::Error
    },

    /// A single migration's transaction failed. The migration log is
    /// not updated for that version; subsequent migrations do not
    /// run.
    #[error("migration {version} ({name}) failed: {source}")]
    Migration {
        /// Version of the migration that failed.
        version: i64,
        /// Name of the migration that failed.
        name: String,
        /// Underlying database error.
        #[source]
        source: sqlx::Error
    },

    /// A migration already recorded as applied no longer matches the
    /// checksum of the SQL currently generated for that version.
    #[error("migration {version} ({name}) checksum mismatch: recorded {recorded}, current {current}")]
    ChecksumMismatch {
        /// Version whose checksum drifted.
        version: i64,
        /// Name of the migration.
        name: String,
        /// Checksum recorded at apply time.
        recorded: String,
        /// Checksum of the migration as currently generated.
        current: String
    },

    /// A destructive operation (`drop`, `reset`, a DROP COLUMN/TABLE)
    /// was requested without `--confirm`.
    #[error("refusing destructive operation {operation} without confirmation")]
    DestructiveRefusal {
        /// The operation that was refused.
        operation: String
    },

    /// The advisory lock could not be obtained within the configured
    /// timeout.
    #[error("could not acquire advisory lock {key} within {timeout_secs}s")]
    LockTimeout {
        /// Lock key that was contended.
        key: String,
        /// Configured timeout, in seconds.
        timeout_secs: u64
    },

    /// The caller's cancellation context was cancelled before the
    /// operation committed.
    #[error("operation cancelled before commit")]
    Cancelled,

    /// A raw database error not otherwise classified above.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error)
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a [`Error::Config`] from any displayable reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into()
        }
    }

    /// Build a [`Error::Parse`] for a given location.
    pub fn parse(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            location: location.into(),
            reason: reason.into()
        }
    }

    /// `true` for errors that represent a policy-level refusal rather
    /// than an unexpected failure (destructive refusal, lock
    /// timeout) — useful for the CLI to decide whether to print a
    /// stack-trace-free one-liner even without `--verbose`.
    pub fn is_policy_refusal(&self) -> bool {
        matches!(self, Self::DestructiveRefusal { .. } | Self::LockTimeout { .. })
    }
}
