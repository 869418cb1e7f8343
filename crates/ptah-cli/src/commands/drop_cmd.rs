//! `ptah migrate drop`.

use anyhow::Result;
use ptah::{Dsn, migrator::Migrator};

use crate::{cli::DropArgs, config, exit::Outcome};

pub async fn run(args: &DropArgs) -> Result<Outcome> {
    let resolved = config::resolve(args.dsn.dsn.as_deref())?;
    let dsn = Dsn::parse(&resolved.dsn)?;
    let conn = dsn.connect().await?;
    let mut migrator = Migrator::new(&conn, dsn.dialect());
    if let Some(table) = resolved.migrations_table {
        migrator = migrator.with_table(table);
    }

    let statements = migrator.drop_database(args.dry_run, args.confirm).await?;

    let verb = if args.dry_run { "would drop" } else { "dropped" };
    println!("{verb} {} object(s)", statements.len());
    if args.dry_run {
        for stmt in &statements {
            println!("{stmt}");
        }
    }

    Ok(Outcome::Success)
}
