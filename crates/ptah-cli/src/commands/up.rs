//! `ptah migrate up`.

use anyhow::Result;
use ptah::{Dsn, migrator::Migrator};

use crate::{cli::UpArgs, config, exit::Outcome};

pub async fn run(args: &UpArgs) -> Result<Outcome> {
    let resolved = config::resolve(args.dsn.dsn.as_deref())?;
    let dsn = Dsn::parse(&resolved.dsn)?;
    let conn = dsn.connect().await?;
    let mut migrator = Migrator::new(&conn, dsn.dialect());
    if let Some(table) = resolved.migrations_table {
        migrator = migrator.with_table(table);
    }

    let report = migrator
        .up(&args.migrations_dir, args.dry_run, args.operational_user.as_deref())
        .await?;

    if report.applied.is_empty() {
        println!("no pending migrations");
        return Ok(Outcome::NothingToDo);
    }

    for migration in &report.applied {
        let verb = if report.dry_run { "would apply" } else { "applied" };
        println!("{verb} {} ({})", migration.version, migration.name);
    }
    Ok(Outcome::Success)
}
