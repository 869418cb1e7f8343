//! Versioned migration apply/rollback against a live database (C9).
//!
//! The migrator owns none of the schema logic — it is strictly a
//! state machine over migration files on disk and one bookkeeping
//! table in the target database. Building the SQL those files
//! contain is [`crate::generator`]'s job, performed once by `migrate
//! generate` and checked into the migrations directory like any other
//! source file.
//!
//! Every public operation here acquires the cross-process advisory
//! lock ([`lock`]) for its full duration, so two processes targeting
//! the same database never interleave mutating operations.

mod lock;
mod migration_file;

use std::{path::Path, time::Duration};

pub use migration_file::MigrationFile;
use ptah_ast::{
    Dialect,
    migration_record::{Direction, MigrationRecord}
};
use sqlx::Row;

use crate::{
    db::Connection,
    error::{Error, Result},
    lexer
};

/// Default advisory-lock acquisition timeout. The spec leaves this
/// uncofigured at the core level; the CLI may expose it as a flag
/// later without changing this default.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Report returned by [`Migrator::up`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpReport {
    /// Migrations applied (or, in dry-run, that would have been
    /// applied), oldest first.
    pub applied: Vec<MigrationFile>,
    /// Whether this was a dry run (no statement was executed).
    pub dry_run: bool
}

/// Report returned by [`Migrator::down`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownReport {
    /// Migrations rolled back, most recently applied first.
    pub reverted: Vec<MigrationFile>,
    /// Whether this was a dry run.
    pub dry_run: bool
}

/// Report returned by [`Migrator::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Highest applied version, if any migration has been applied.
    pub current_version: Option<i64>,
    /// Total migrations known on disk.
    pub total: usize,
    /// Migrations on disk not yet applied, oldest first.
    pub pending: Vec<MigrationFile>,
    /// Versions recorded as applied whose on-disk `.up.sql` no longer
    /// matches the checksum recorded at apply time.
    pub checksum_mismatches: Vec<i64>
}

/// Orchestrates apply/rollback of on-disk migrations against a
/// connection, tracked in a bookkeeping table.
pub struct Migrator<'a> {
    conn: &'a Connection,
    dialect: Dialect,
    table: String,
    lock_timeout: Duration
}

impl<'a> Migrator<'a> {
    /// Build a migrator targeting `conn`, rendering and tracking
    /// under `dialect` (independent of `conn`'s own wire protocol, so
    /// a MySQL-protocol connection can still be treated as MariaDB).
    pub fn new(conn: &'a Connection, dialect: Dialect) -> Self {
        Self {
            conn,
            dialect,
            table: "schema_migrations".to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT
        }
    }

    /// Override the bookkeeping table name (spec: "Name
    /// `schema_migrations` (override per-deployment)").
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Override the advisory-lock acquisition timeout.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Apply every migration in `migrations_dir` not yet recorded as
    /// applied, oldest first, each in its own transaction (PostgreSQL)
    /// or as directly executed statements (MySQL/MariaDB, whose DDL
    /// auto-commits per statement regardless of a surrounding
    /// transaction).
    ///
    /// `operational_user`, when given, is applied via `SET ROLE`
    /// before each migration's statements so newly created objects
    /// are owned by the declared role.
    pub async fn up(&self, migrations_dir: &Path, dry_run: bool, operational_user: Option<&str>) -> Result<UpReport> {
        self.ensure_migrations_table().await?;
        lock::with_lock(self.conn, self.lock_timeout, || async {
            let all = migration_file::discover(migrations_dir)?;
            let applied_records = self.applied_records().await?;
            for record in &applied_records {
                if let Some(file) = all.iter().find(|m| m.version == record.version)
                    && !record.checksum_matches(&file.up_sql)
                {
                    // Not a hard failure: the generator is not required
                    // to be byte-stable across engine versions, so a
                    // drifted checksum is worth surfacing but not worth
                    // blocking `up` over.
                    let warning = Error::ChecksumMismatch {
                        version: record.version,
                        name: record.name.clone(),
                        recorded: record.checksum.clone(),
                        current: MigrationRecord::checksum_of(&file.up_sql)
                    };
                    tracing::warn!("{warning}");
                }
            }
            let applied_versions: std::collections::BTreeSet<i64> = applied_records.iter().map(|r| r.version).collect();
            let pending: Vec<_> = all.into_iter().filter(|m| !applied_versions.contains(&m.version)).collect();

            if dry_run {
                return Ok(UpReport {
                    applied: pending,
                    dry_run: true
                });
            }

            let mut applied = Vec::with_capacity(pending.len());
            for migration in pending {
                self.apply_one(&migration, operational_user).await?;
                applied.push(migration);
            }
            Ok(UpReport {
                applied,
                dry_run: false
            })
        })
        .await
    }

    /// Reverse the last `steps` applied migrations, most recent
    /// first, running each one's `.down.sql`.
    ///
    /// A migration applied on disk with no paired `.down.sql` makes
    /// rollback past it impossible; `down` stops (without reverting
    /// anything further) and reports only the migrations it actually
    /// reverted.
    pub async fn down(&self, migrations_dir: &Path, steps: usize, dry_run: bool) -> Result<DownReport> {
        self.ensure_migrations_table().await?;
        lock::with_lock(self.conn, self.lock_timeout, || async {
            let all = migration_file::discover(migrations_dir)?;
            let mut applied_records = self.applied_records().await?;
            applied_records.sort_by(|a, b| b.version.cmp(&a.version));

            let mut reverted = Vec::new();
            for record in applied_records.into_iter().take(steps) {
                let Some(migration) = all.iter().find(|m| m.version == record.version) else {
                    break;
                };
                let Some(down_sql) = migration.down_sql.clone() else {
                    break;
                };
                if !dry_run {
                    self.revert_one(migration, &down_sql).await?;
                }
                reverted.push(migration.clone());
            }
            Ok(DownReport { reverted, dry_run })
        })
        .await
    }

    /// Current version, total migration count, and pending list.
    pub async fn status(&self, migrations_dir: &Path) -> Result<StatusReport> {
        self.ensure_migrations_table().await?;
        let all = migration_file::discover(migrations_dir)?;
        let applied_records = self.applied_records().await?;
        let applied_versions: std::collections::BTreeSet<i64> = applied_records.iter().map(|r| r.version).collect();
        let current_version = applied_versions.iter().max().copied();
        let total = all.len();

        let checksum_mismatches = applied_records
            .iter()
            .filter_map(|record| {
                let file = all.iter().find(|m| m.version == record.version)?;
                (!record.checksum_matches(&file.up_sql)).then_some(record.version)
            })
            .collect();

        let pending = all.into_iter().filter(|m| !applied_versions.contains(&m.version)).collect();
        Ok(StatusReport {
            current_version,
            total,
            pending,
            checksum_mismatches
        })
    }

    /// Drop every base table (and, on PostgreSQL, every enum type) in
    /// the connected database.
    ///
    /// The introspector deliberately does not reconstruct foreign-key
    /// constraints (see [`crate::introspect`]), so no
    /// dependency-respecting drop order can be computed here; instead
    /// every `DROP TABLE` cascades (PostgreSQL) or foreign-key
    /// checking is disabled for the duration of the drop
    /// (MySQL/MariaDB). Refuses outside dry-run without `confirm`.
    pub async fn drop_database(&self, dry_run: bool, confirm: bool) -> Result<Vec<String>> {
        if !dry_run && !confirm {
            return Err(Error::DestructiveRefusal {
                operation: "migrate drop".to_string()
            });
        }

        let schema = crate::introspect::introspect(self.conn).await?;
        let mut statements = Vec::new();

        match self.dialect {
            Dialect::Postgres => {
                for table in schema.tables() {
                    statements.push(format!("DROP TABLE IF EXISTS {} CASCADE;", table.name));
                }
                for e in schema.enums() {
                    statements.push(format!("DROP TYPE IF EXISTS {} CASCADE;", e.name));
                }
            }
            Dialect::MySql | Dialect::MariaDb => {
                statements.push("SET FOREIGN_KEY_CHECKS=0;".to_string());
                for table in schema.tables() {
                    statements.push(format!("DROP TABLE IF EXISTS {};", table.name));
                }
                statements.push("SET FOREIGN_KEY_CHECKS=1;".to_string());
            }
        }

        if !dry_run {
            self.execute_statements(&statements).await?;
        }
        Ok(statements)
    }

    /// `DropDatabase` followed by `up` against `migrations_dir`, in
    /// one call.
    pub async fn reset_database(
        &self, migrations_dir: &Path, dry_run: bool, confirm: bool, operational_user: Option<&str>
    ) -> Result<(Vec<String>, UpReport)> {
        let dropped = self.drop_database(dry_run, confirm).await?;
        let up_report = self.up(migrations_dir, dry_run, operational_user).await?;
        Ok((dropped, up_report))
    }

    async fn ensure_migrations_table(&self) -> Result<()> {
        let ddl = match self.dialect {
            Dialect::Postgres => format!(
                "CREATE TABLE IF NOT EXISTS {table} (\
                    version BIGINT PRIMARY KEY, \
                    name TEXT NOT NULL, \
                    applied_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
                    checksum TEXT NOT NULL\
                );",
                table = self.table
            ),
            Dialect::MySql | Dialect::MariaDb => format!(
                "CREATE TABLE IF NOT EXISTS {table} (\
                    version BIGINT PRIMARY KEY, \
                    name VARCHAR(255) NOT NULL, \
                    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP, \
                    checksum VARCHAR(64) NOT NULL\
                ) ENGINE=InnoDB;",
                table = self.table
            )
        };
        self.execute_statements(std::slice::from_ref(&ddl)).await
    }

    async fn applied_records(&self) -> Result<Vec<MigrationRecord>> {
        let query = format!("SELECT version, name, applied_at, checksum FROM {} ORDER BY version", self.table);
        let records = match self.conn {
            Connection::Postgres(pool) => {
                let rows = sqlx::query(&query).fetch_all(pool).await?;
                rows.iter()
                    .map(|row| {
                        Ok(MigrationRecord {
                            version: row.try_get("version")?,
                            name: row.try_get("name")?,
                            applied_at: row.try_get("applied_at")?,
                            checksum: row.try_get("checksum")?,
                            direction: Direction::Up
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?
            }
            Connection::MySql(pool) => {
                let rows = sqlx::query(&query).fetch_all(pool).await?;
                rows.iter()
                    .map(|row| {
                        Ok(MigrationRecord {
                            version: row.try_get("version")?,
                            name: row.try_get("name")?,
                            applied_at: row.try_get("applied_at")?,
                            checksum: row.try_get("checksum")?,
                            direction: Direction::Up
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?
            }
        };
        Ok(records)
    }

    async fn apply_one(&self, migration: &MigrationFile, operational_user: Option<&str>) -> Result<()> {
        let statements = executable_statements(&migration.up_sql);
        let checksum = MigrationRecord::checksum_of(&migration.up_sql);
        let insert = format!(
            "INSERT INTO {table} (version, name, applied_at, checksum) VALUES ({version}, '{name}', {now}, '{checksum}')",
            table = self.table,
            version = migration.version,
            name = escape_literal(&migration.name),
            now = now_expr(self.dialect),
            checksum = checksum
        );

        let to_error = |source: sqlx::Error| Error::Migration {
            version: migration.version,
            name: migration.name.clone(),
            source
        };

        match self.conn {
            Connection::Postgres(pool) => {
                let mut tx = pool.begin().await.map_err(to_error)?;
                if let Some(user) = operational_user {
                    sqlx::query(&format!("SET ROLE {user}")).execute(&mut *tx).await.map_err(to_error)?;
                }
                for stmt in &statements {
                    sqlx::query(stmt).execute(&mut *tx).await.map_err(to_error)?;
                }
                sqlx::query(&insert).execute(&mut *tx).await.map_err(to_error)?;
                tx.commit().await.map_err(to_error)?;
            }
            Connection::MySql(pool) => {
                // MySQL/MariaDB DDL is not transactional: each
                // statement commits as it runs, so a failure partway
                // through leaves prior statements applied. There is
                // nothing to roll back; the error is still reported
                // as a failed migration so the bookkeeping row is
                // never inserted for it.
                if let Some(user) = operational_user {
                    sqlx::query(&format!("SET ROLE {user}")).execute(pool).await.map_err(to_error)?;
                }
                for stmt in &statements {
                    sqlx::query(stmt).execute(pool).await.map_err(to_error)?;
                }
                sqlx::query(&insert).execute(pool).await.map_err(to_error)?;
            }
        }
        Ok(())
    }

    async fn revert_one(&self, migration: &MigrationFile, down_sql: &str) -> Result<()> {
        let statements = executable_statements(down_sql);
        let delete = format!("DELETE FROM {} WHERE version = {}", self.table, migration.version);

        let to_error = |source: sqlx::Error| Error::Migration {
            version: migration.version,
            name: migration.name.clone(),
            source
        };

        match self.conn {
            Connection::Postgres(pool) => {
                let mut tx = pool.begin().await.map_err(to_error)?;
                for stmt in &statements {
                    sqlx::query(stmt).execute(&mut *tx).await.map_err(to_error)?;
                }
                sqlx::query(&delete).execute(&mut *tx).await.map_err(to_error)?;
                tx.commit().await.map_err(to_error)?;
            }
            Connection::MySql(pool) => {
                for stmt in &statements {
                    sqlx::query(stmt).execute(pool).await.map_err(to_error)?;
                }
                sqlx::query(&delete).execute(pool).await.map_err(to_error)?;
            }
        }
        Ok(())
    }

    async fn execute_statements(&self, statements: &[String]) -> Result<()> {
        match self.conn {
            Connection::Postgres(pool) => {
                for stmt in statements {
                    sqlx::query(stmt).execute(pool).await?;
                }
            }
            Connection::MySql(pool) => {
                for stmt in statements {
                    sqlx::query(stmt).execute(pool).await?;
                }
            }
        }
        Ok(())
    }
}

fn now_expr(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => "now()",
        Dialect::MySql | Dialect::MariaDb => "CURRENT_TIMESTAMP"
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Split a migration's SQL text into statements and drop any that are
/// comment-only once comments are stripped — the generator's `gate()`
/// emits `-- WARNING:` lines for destructive statements refused
/// without `--confirm`, and a comment-only statement must never reach
/// `execute()` as if it were live DDL.
fn executable_statements(sql: &str) -> Vec<String> {
    lexer::split_statements(sql)
        .into_iter()
        .map(|stmt| lexer::strip_comments(&stmt))
        .filter(|stmt| !stmt.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_expr_is_dialect_specific() {
        assert_eq!(now_expr(Dialect::Postgres), "now()");
        assert_eq!(now_expr(Dialect::MySql), "CURRENT_TIMESTAMP");
    }

    #[test]
    fn escape_literal_doubles_single_quotes() {
        assert_eq!(escape_literal("O'Brien"), "O''Brien");
    }

    #[test]
    fn executable_statements_drops_standalone_warning_comment() {
        let sql = "-- WARNING: DROP TABLE refused without --confirm: DROP TABLE widgets;";
        assert!(executable_statements(sql).is_empty());
    }

    #[test]
    fn executable_statements_keeps_real_statement_following_a_warning() {
        let sql = "-- WARNING: DROP COLUMN refused without --confirm: ALTER TABLE widgets DROP COLUMN legacy;\nCREATE INDEX idx_widgets_name ON widgets (name);";
        let statements = executable_statements(sql);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("CREATE INDEX idx_widgets_name"));
        assert!(!statements[0].contains("DROP COLUMN"));
    }

    #[test]
    fn executable_statements_keeps_ordinary_ddl_untouched() {
        let sql = "CREATE TABLE widgets (id SERIAL PRIMARY KEY);";
        assert_eq!(executable_statements(sql), vec![sql.to_string()]);
    }
}
