//! Exercises [`Migrator`] and [`introspect`] against a live database.
//!
//! Every test here is `#[ignore]`d: it requires a running PostgreSQL
//! (`DATABASE_URL`) or MySQL/MariaDB (`MYSQL_URL`) instance and talks
//! to it directly, which the rest of the suite avoids. Run with
//! `cargo test --test migration_lifecycle -- --ignored` against a
//! disposable database.

use std::time::{SystemTime, UNIX_EPOCH};

use ptah::{Dsn, introspect, migrator::Migrator};
use ptah_ast::Dialect;

fn unique_table_name(prefix: &str) -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    format!("{prefix}_{nanos}")
}

fn write_migration(dir: &std::path::Path, version: i64, name: &str, up: &str, down: Option<&str>) {
    std::fs::write(dir.join(format!("{version}_{name}.up.sql")), up).unwrap();
    if let Some(down) = down {
        std::fs::write(dir.join(format!("{version}_{name}.down.sql")), down).unwrap();
    }
}

async fn postgres_conn() -> ptah::Connection {
    let dsn = Dsn::parse(&std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test")).unwrap();
    dsn.connect().await.unwrap()
}

#[tokio::test]
#[ignore]
async fn up_applies_pending_migrations_and_records_them() {
    let conn = postgres_conn().await;
    let migrator = Migrator::new(&conn, Dialect::Postgres).with_table(unique_table_name("schema_migrations"));

    let dir = tempfile::tempdir().unwrap();
    let table = unique_table_name("widgets");
    write_migration(
        dir.path(),
        1,
        "create_widgets",
        &format!("CREATE TABLE {table} (id SERIAL PRIMARY KEY, name TEXT NOT NULL);"),
        Some(&format!("DROP TABLE {table};"))
    );

    let report = migrator.up(dir.path(), false, None).await.unwrap();
    assert_eq!(report.applied.len(), 1);
    assert!(!report.dry_run);

    let status = migrator.status(dir.path()).await.unwrap();
    assert_eq!(status.current_version, Some(1));
    assert!(status.pending.is_empty());
    assert!(status.checksum_mismatches.is_empty());

    // Re-running up is a no-op: the migration is already recorded.
    let second = migrator.up(dir.path(), false, None).await.unwrap();
    assert!(second.applied.is_empty());

    migrator.down(dir.path(), 1, false).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn down_reverts_the_most_recent_migration() {
    let conn = postgres_conn().await;
    let migrator = Migrator::new(&conn, Dialect::Postgres).with_table(unique_table_name("schema_migrations"));

    let dir = tempfile::tempdir().unwrap();
    let table = unique_table_name("gadgets");
    write_migration(
        dir.path(),
        1,
        "create_gadgets",
        &format!("CREATE TABLE {table} (id SERIAL PRIMARY KEY);"),
        Some(&format!("DROP TABLE {table};"))
    );
    migrator.up(dir.path(), false, None).await.unwrap();

    let report = migrator.down(dir.path(), 1, false).await.unwrap();
    assert_eq!(report.reverted.len(), 1);

    let status = migrator.status(dir.path()).await.unwrap();
    assert_eq!(status.current_version, None);
}

#[tokio::test]
#[ignore]
async fn down_stops_cleanly_without_a_paired_down_file() {
    let conn = postgres_conn().await;
    let migrator = Migrator::new(&conn, Dialect::Postgres).with_table(unique_table_name("schema_migrations"));

    let dir = tempfile::tempdir().unwrap();
    let table = unique_table_name("irreversible");
    write_migration(dir.path(), 1, "create_irreversible", &format!("CREATE TABLE {table} (id SERIAL PRIMARY KEY);"), None);
    migrator.up(dir.path(), false, None).await.unwrap();

    let report = migrator.down(dir.path(), 1, false).await.unwrap();
    assert!(report.reverted.is_empty());

    let status = migrator.status(dir.path()).await.unwrap();
    assert_eq!(status.current_version, Some(1));
}

#[tokio::test]
#[ignore]
async fn introspection_reads_back_an_applied_table() {
    let conn = postgres_conn().await;
    let migrator = Migrator::new(&conn, Dialect::Postgres).with_table(unique_table_name("schema_migrations"));

    let dir = tempfile::tempdir().unwrap();
    let table = unique_table_name("introspected");
    write_migration(
        dir.path(),
        1,
        "create_table",
        &format!("CREATE TABLE {table} (id SERIAL PRIMARY KEY, email VARCHAR(255) NOT NULL UNIQUE);"),
        Some(&format!("DROP TABLE {table};"))
    );
    migrator.up(dir.path(), false, None).await.unwrap();

    let schema = introspect::introspect(&conn).await.unwrap();
    let introspected = schema.table(&table).expect("created table is visible to introspection");
    assert!(introspected.column("email").unwrap().is_unique);
    assert!(introspected.column("id").unwrap().is_primary);

    migrator.down(dir.path(), 1, false).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn drop_database_refuses_without_confirm_outside_dry_run() {
    let conn = postgres_conn().await;
    let migrator = Migrator::new(&conn, Dialect::Postgres);
    let err = migrator.drop_database(false, false).await.unwrap_err();
    assert!(matches!(err, ptah::Error::DestructiveRefusal { .. }));
}

#[tokio::test]
#[ignore]
async fn drop_database_dry_run_never_touches_the_database() {
    let conn = postgres_conn().await;
    let migrator = Migrator::new(&conn, Dialect::Postgres).with_table(unique_table_name("schema_migrations"));

    let dir = tempfile::tempdir().unwrap();
    let table = unique_table_name("survivor");
    write_migration(
        dir.path(),
        1,
        "create_survivor",
        &format!("CREATE TABLE {table} (id SERIAL PRIMARY KEY);"),
        Some(&format!("DROP TABLE {table};"))
    );
    migrator.up(dir.path(), false, None).await.unwrap();

    let statements = migrator.drop_database(true, false).await.unwrap();
    assert!(statements.iter().any(|s| s.contains(&table)));

    let schema = introspect::introspect(&conn).await.unwrap();
    assert!(schema.table(&table).is_some(), "dry-run drop must not have executed");

    migrator.down(dir.path(), 1, false).await.unwrap();
}
