//! The `migrations` bookkeeping table row type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction a migration was applied in. Down-migrations delete their
/// row rather than inserting one with `Down`, but the variant exists
/// so `migrate status --format json` can report the last action taken
/// in a run that mixed directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down
}

/// One row of the `migrations` bookkeeping table: the record of a
/// single applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Monotonic version identifier (a timestamp-derived integer, per
    /// the generator's naming convention).
    pub version: i64,
    /// Human-readable migration name, e.g. `add_users_table`.
    pub name: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
    /// SHA-256 checksum of the applied SQL, hex-encoded. Used on
    /// re-apply to detect a migration file that changed after it was
    /// already recorded as applied.
    pub checksum: String,
    /// Direction this record reflects.
    pub direction: Direction
}

impl MigrationRecord {
    /// `true` if `sql`'s checksum matches the one recorded at apply
    /// time.
    pub fn checksum_matches(&self, sql: &str) -> bool {
        self.checksum == Self::checksum_of(sql)
    }

    /// Compute the hex-encoded SHA-256 checksum of a migration's SQL
    /// body, the same way the migrator does at apply time.
    pub fn checksum_of(sql: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(sql.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
