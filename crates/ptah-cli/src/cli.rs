//! Clap CLI definitions for the `ptah` command.
//!
//! The command tree is rooted at `migrate`, per the engine's external
//! interface: `ptah migrate up`, `ptah migrate down`, and so on.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ptah -- annotation-driven schema migration engine.
#[derive(Parser, Debug)]
#[command(name = "ptah", about = "Annotation-driven schema migration engine", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: TopCommand,
}

/// Flags available to every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Print the full error chain instead of a one-line summary.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool
}

/// The single top-level command: `migrate`, with its own subcommand tree.
#[derive(Subcommand, Debug)]
pub enum TopCommand {
    /// Schema migration operations.
    Migrate(MigrateArgs)
}

/// `ptah migrate <action>`.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateCommand
}

#[derive(Subcommand, Debug)]
pub enum MigrateCommand {
    /// Apply every pending migration.
    Up(UpArgs),
    /// Roll back the most recently applied migrations.
    Down(DownArgs),
    /// Report current version and pending migrations.
    Status(StatusArgs),
    /// Drop every table (and, on PostgreSQL, every enum type) in the database.
    Drop(DropArgs),
    /// Drop the database, then apply every migration from scratch.
    Reset(ResetArgs),
    /// Diff a live database against an annotated source tree and emit DDL.
    Generate(GenerateArgs)
}

/// Connection string shared by every subcommand that touches a
/// database. Resolved by [`crate::config::resolve`] with precedence
/// `--dsn` flag, then `INVENTARIO_DB_DSN` env var, then an optional
/// `ptah.toml` in the current directory -- left optional here so a
/// missing flag doesn't fail argument parsing before the file fallback
/// gets a chance to run.
#[derive(Args, Debug, Clone)]
pub struct DsnArgs {
    /// Database connection string (`postgres://`, `postgresql://`, or `mysql://`).
    #[arg(long)]
    pub dsn: Option<String>
}

#[derive(Args, Debug)]
pub struct UpArgs {
    #[command(flatten)]
    pub dsn: DsnArgs,

    /// Print the statements that would run without executing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Role to assign ownership of newly created objects to.
    #[arg(long)]
    pub operational_user: Option<String>,

    /// Directory containing `{version}_{name}.up.sql` / `.down.sql` pairs.
    #[arg(long, default_value = "./migrations")]
    pub migrations_dir: PathBuf
}

#[derive(Args, Debug)]
pub struct DownArgs {
    #[command(flatten)]
    pub dsn: DsnArgs,

    /// Number of applied migrations to revert.
    #[arg(long, default_value_t = 1)]
    pub steps: usize,

    /// Print the statements that would run without executing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Confirm the rollback (no-op placeholder for symmetry with
    /// other destructive subcommands; `down` itself never needs
    /// confirmation since it only reverts already-applied changes,
    /// but the flag is accepted so `--confirm` is never an error
    /// here).
    #[arg(long)]
    pub confirm: bool,

    #[arg(long, default_value = "./migrations")]
    pub migrations_dir: PathBuf
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub dsn: DsnArgs,

    /// List pending migration names, not just the count.
    #[arg(long)]
    pub verbose: bool,

    /// Output format: `text` (default) or `json`, for embedding status
    /// checks in a larger service's own health check.
    #[arg(long, value_enum, default_value_t = StatusFormat::Text)]
    pub format: StatusFormat,

    #[arg(long, default_value = "./migrations")]
    pub migrations_dir: PathBuf
}

/// `migrate status --format` values.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFormat {
    /// Human-readable lines (the default).
    Text,
    /// A single JSON object on stdout.
    Json
}

#[derive(Args, Debug)]
pub struct DropArgs {
    #[command(flatten)]
    pub dsn: DsnArgs,

    /// Print the statements that would run without executing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Required in live (non-dry-run) mode; refused otherwise.
    #[arg(long)]
    pub confirm: bool
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    #[command(flatten)]
    pub dsn: DsnArgs,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub confirm: bool,

    #[arg(long)]
    pub operational_user: Option<String>,

    #[arg(long, default_value = "./migrations")]
    pub migrations_dir: PathBuf
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Database to introspect as the "actual" schema. When omitted,
    /// `generate` skips introspection/diffing entirely and renders the
    /// scanned schema from scratch, as if every table were newly added.
    #[arg(long)]
    pub from: Option<String>,

    /// Dialect to render for when `--from` is omitted, since there is
    /// then no DSN to infer one from. Ignored (and unnecessary) when
    /// `--from` is given.
    #[arg(long, value_enum)]
    pub dialect: Option<DialectArg>,

    /// Source tree to scan for `migrator:` directives as the "desired" schema.
    #[arg(long, default_value = ".")]
    pub to: PathBuf,

    /// File to write the generated DDL to.
    #[arg(long)]
    pub out: PathBuf
}

/// `migrate generate --dialect` values, standing in for
/// [`ptah_ast::Dialect`] so `ptah-ast` doesn't need a `clap` dependency
/// just to be selectable on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectArg {
    Postgres,
    Mysql,
    Mariadb
}

impl DialectArg {
    /// Map to the engine's own dialect enum.
    pub fn to_dialect(self) -> ptah_ast::Dialect {
        match self {
            Self::Postgres => ptah_ast::Dialect::Postgres,
            Self::Mysql => ptah_ast::Dialect::MySql,
            Self::Mariadb => ptah_ast::Dialect::MariaDb
        }
    }
}
