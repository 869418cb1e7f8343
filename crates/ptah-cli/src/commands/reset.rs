//! `ptah migrate reset`.

use anyhow::Result;
use ptah::{Dsn, migrator::Migrator};

use crate::{cli::ResetArgs, config, exit::Outcome};

pub async fn run(args: &ResetArgs) -> Result<Outcome> {
    let resolved = config::resolve(args.dsn.dsn.as_deref())?;
    let dsn = Dsn::parse(&resolved.dsn)?;
    let conn = dsn.connect().await?;
    let mut migrator = Migrator::new(&conn, dsn.dialect());
    if let Some(table) = resolved.migrations_table {
        migrator = migrator.with_table(table);
    }

    let (dropped, up_report) = migrator
        .reset_database(&args.migrations_dir, args.dry_run, args.confirm, args.operational_user.as_deref())
        .await?;

    let drop_verb = if args.dry_run { "would drop" } else { "dropped" };
    println!("{drop_verb} {} object(s)", dropped.len());

    let up_verb = if up_report.dry_run { "would apply" } else { "applied" };
    for migration in &up_report.applied {
        println!("{up_verb} {} ({})", migration.version, migration.name);
    }

    Ok(Outcome::Success)
}
