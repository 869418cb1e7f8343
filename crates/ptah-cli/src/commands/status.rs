//! `ptah migrate status`.

use anyhow::Result;
use ptah::{Dsn, migrator::Migrator};

use crate::{
    cli::{StatusArgs, StatusFormat},
    config,
    exit::Outcome
};

pub async fn run(args: &StatusArgs) -> Result<Outcome> {
    let resolved = config::resolve(args.dsn.dsn.as_deref())?;
    let dsn = Dsn::parse(&resolved.dsn)?;
    let conn = dsn.connect().await?;
    let mut migrator = Migrator::new(&conn, dsn.dialect());
    if let Some(table) = resolved.migrations_table {
        migrator = migrator.with_table(table);
    }

    let report = migrator.status(&args.migrations_dir).await?;

    match args.format {
        StatusFormat::Json => {
            let pending: Vec<_> = report
                .pending
                .iter()
                .map(|m| serde_json::json!({"version": m.version, "name": m.name}))
                .collect();
            let payload = serde_json::json!({
                "current_version": report.current_version,
                "total": report.total,
                "pending_count": report.pending.len(),
                "pending": if args.verbose { serde_json::Value::Array(pending) } else { serde_json::Value::Null },
                "checksum_mismatches": report.checksum_mismatches,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        StatusFormat::Text => {
            match report.current_version {
                Some(version) => println!("current version: {version}"),
                None => println!("current version: none applied")
            }
            println!("total migrations: {}", report.total);
            println!("pending: {}", report.pending.len());

            if args.verbose {
                for migration in &report.pending {
                    println!("  {} ({})", migration.version, migration.name);
                }
            }

            if !report.checksum_mismatches.is_empty() {
                println!("checksum mismatches: {:?}", report.checksum_mismatches);
            }
        }
    }

    Ok(Outcome::Success)
}
