//! Database extensions (`schema:extension`).
//!
//! PostgreSQL-only; other dialects ignore extensions entirely
//! at render time.

use serde::{Deserialize, Serialize};

/// A `CREATE EXTENSION` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Extension name (e.g. `"pgcrypto"`, `"uuid-ossp"`).
    pub name: String,
    /// Whether to emit `IF NOT EXISTS`.
    pub if_not_exists: bool,
    /// Free-text comment.
    pub comment: Option<String>
}
