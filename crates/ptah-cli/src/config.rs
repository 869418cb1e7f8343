//! `ptah.toml` config-file support.
//!
//! DSN resolution order: `--dsn` flag, then `INVENTARIO_DB_DSN` env
//! var, then an optional `ptah.toml` in the current directory
//! (`[database] dsn = "..."`, `[database] migrations_table = "..."`).
//! The env var is read here rather than via clap's `env` attribute so
//! the file fallback can slot in between the two without clap
//! rejecting a missing `--dsn` before this module gets a chance to run.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database: Option<DatabaseConfig>
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseConfig {
    dsn: Option<String>,
    migrations_table: Option<String>
}

/// DSN and bookkeeping-table name assembled from the flag/env/file
/// precedence chain.
pub struct ResolvedConfig {
    pub dsn: String,
    pub migrations_table: Option<String>
}

/// Resolve the DSN and optional migrations-table override, consulting
/// `ptah.toml` in the current directory only when neither `dsn_flag`
/// nor `INVENTARIO_DB_DSN` supplied a value.
pub fn resolve(dsn_flag: Option<&str>) -> Result<ResolvedConfig> {
    let file = load(Path::new("ptah.toml"))?;

    let dsn = dsn_flag
        .map(str::to_string)
        .or_else(|| std::env::var("INVENTARIO_DB_DSN").ok())
        .or_else(|| file.database.as_ref().and_then(|d| d.dsn.clone()))
        .context("no DSN given: pass --dsn, set INVENTARIO_DB_DSN, or add [database] dsn to ptah.toml")?;

    let migrations_table = file.database.and_then(|d| d.migrations_table);

    Ok(ResolvedConfig { dsn, migrations_table })
}

fn load(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("cannot parse {}", path.display()))
}
