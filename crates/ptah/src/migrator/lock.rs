//! Cross-process advisory locking so two processes targeting the same
//! database never run a mutating migrator operation concurrently.
//!
//! PostgreSQL has session-level advisory locks keyed by a 64-bit
//! integer; MySQL/MariaDB have named locks keyed by a string. Both are
//! released automatically if the connection drops, so a crashed
//! process can never leave the lock held forever.

use std::{future::Future, time::Duration};

use sqlx::Row;

use crate::{
    db::Connection,
    error::{Error, Result}
};

/// Fixed lock key ("PTAH" read as a 32-bit big-endian word, doubled
/// into the low bits of a 64-bit key). Any constant works as long as
/// every ptah instance agrees on it; this one just happens to be
/// recognizable in a `pg_locks` dump.
const LOCK_KEY: i64 = 0x5054_4148_5054_4148;
const LOCK_NAME: &str = "ptah_migrator_lock";

/// Acquire the migrator's advisory lock, run `f`, then release it
/// even if `f` returned an error.
///
/// A lock that cannot be acquired within `timeout` surfaces as
/// [`Error::LockTimeout`] rather than blocking forever.
pub async fn with_lock<F, Fut, T>(conn: &Connection, timeout: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>
{
    acquire(conn, timeout).await?;
    let result = f().await;
    release(conn).await?;
    result
}

async fn acquire(conn: &Connection, timeout: Duration) -> Result<()> {
    match conn {
        Connection::Postgres(pool) => {
            // pg_advisory_lock blocks indefinitely on its own; wrap it
            // in a timeout so a contended lock surfaces as
            // `Error::LockTimeout` instead of hanging the caller.
            tokio::time::timeout(timeout, sqlx::query("SELECT pg_advisory_lock($1)").bind(LOCK_KEY).execute(pool))
                .await
                .map_err(|_| Error::LockTimeout {
                    key: LOCK_KEY.to_string(),
                    timeout_secs: timeout.as_secs()
                })??;
            Ok(())
        }
        Connection::MySql(pool) => {
            let row = sqlx::query("SELECT GET_LOCK(?, ?) AS acquired")
                .bind(LOCK_NAME)
                .bind(timeout.as_secs() as i64)
                .fetch_one(pool)
                .await?;
            let acquired: Option<i64> = row.try_get("acquired")?;
            if acquired == Some(1) {
                Ok(())
            } else {
                Err(Error::LockTimeout {
                    key: LOCK_NAME.to_string(),
                    timeout_secs: timeout.as_secs()
                })
            }
        }
    }
}

async fn release(conn: &Connection) -> Result<()> {
    match conn {
        Connection::Postgres(pool) => {
            sqlx::query("SELECT pg_advisory_unlock($1)").bind(LOCK_KEY).execute(pool).await?;
        }
        Connection::MySql(pool) => {
            sqlx::query("SELECT RELEASE_LOCK(?)").bind(LOCK_NAME).execute(pool).await?;
        }
    }
    Ok(())
}
