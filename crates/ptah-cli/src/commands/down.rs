//! `ptah migrate down`.

use anyhow::Result;
use ptah::{Dsn, migrator::Migrator};

use crate::{cli::DownArgs, config, exit::Outcome};

pub async fn run(args: &DownArgs) -> Result<Outcome> {
    let resolved = config::resolve(args.dsn.dsn.as_deref())?;
    let dsn = Dsn::parse(&resolved.dsn)?;
    let conn = dsn.connect().await?;
    let mut migrator = Migrator::new(&conn, dsn.dialect());
    if let Some(table) = resolved.migrations_table {
        migrator = migrator.with_table(table);
    }

    let report = migrator.down(&args.migrations_dir, args.steps, args.dry_run).await?;

    if report.reverted.is_empty() {
        println!("no applied migrations to revert");
        return Ok(Outcome::NothingToDo);
    }

    for migration in &report.reverted {
        let verb = if report.dry_run { "would revert" } else { "reverted" };
        println!("{verb} {} ({})", migration.version, migration.name);
    }
    Ok(Outcome::Success)
}
