//! `ptah migrate generate`.
//!
//! Diffs a live database (the "actual" schema, read via introspection)
//! against an annotated source tree (the "desired" schema, read via
//! the annotation parser) and writes the resulting DDL to a file
//! instead of applying it — the one subcommand that never touches the
//! target database beyond reading its catalog.
//!
//! When `--from` is omitted there is no database to introspect at
//! all: the desired schema is rendered from scratch, as if every
//! table and enum were newly added, using the renderer directly
//! instead of going through [`differ::diff`]/[`generator::generate`].

use anyhow::{Context, Result, bail};
use ptah::{Dsn, differ, generator, render, resolver};

use crate::{cli::GenerateArgs, exit::Outcome};

pub async fn run(args: &GenerateArgs) -> Result<Outcome> {
    let (desired, warnings) = ptah::build_desired_schema(&args.to)?;
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    let statements = match &args.from {
        Some(from) => {
            let dsn = Dsn::parse(from)?;
            let conn = dsn.connect().await?;
            let actual = ptah::introspect::introspect(&conn).await?;
            let diff = differ::diff(&desired, &actual);
            let renderer = render::for_dialect(dsn.dialect());
            generator::generate(&diff, &desired, renderer.as_ref(), false)
        }
        None => {
            let dialect = args
                .dialect
                .context("--dialect is required when generating from scratch without --from")?
                .to_dialect();
            let plan = resolver::resolve(&desired.dependencies);
            let renderer = render::for_dialect(dialect);
            renderer.render_create(&desired, &plan)
        }
    };

    if statements.is_empty() {
        match &args.from {
            Some(from) => println!("no differences between {from} and {}", args.to.display()),
            None => bail!("scanned schema at {} is empty, nothing to generate", args.to.display())
        }
        return Ok(Outcome::NothingToDo);
    }

    let mut out = String::new();
    for statement in &statements {
        out.push_str(statement);
        out.push('\n');
    }
    std::fs::write(&args.out, out).with_context(|| format!("cannot write {}", args.out.display()))?;

    println!("wrote {} statement(s) to {}", statements.len(), args.out.display());
    Ok(Outcome::Success)
}
