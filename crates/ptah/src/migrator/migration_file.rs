//! On-disk migration discovery.
//!
//! A migration is a pair of files in a migrations directory:
//! `{version}_{name}.up.sql` and, optionally, `{version}_{name}.down.sql`.
//! `version` is the leading run of ASCII digits before the first
//! underscore — by convention a `YYYYMMDDHHMMSS` timestamp, matching
//! the generator's naming scheme, but any monotonically increasing
//! integer is accepted.

use std::path::Path;

use crate::error::{Error, Result};

/// One versioned migration read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Monotonic version, parsed from the filename.
    pub version: i64,
    /// Human-readable name, parsed from the filename.
    pub name: String,
    /// Contents of the `.up.sql` file.
    pub up_sql: String,
    /// Contents of the paired `.down.sql` file, if one exists.
    pub down_sql: Option<String>
}

/// Read every migration in `dir`, sorted ascending by version.
///
/// A directory that does not exist yet is treated as empty rather
/// than an error — a fresh checkout with no migrations authored yet
/// is a valid starting state, not a configuration mistake.
pub fn discover(dir: &Path) -> Result<Vec<MigrationFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut by_version: std::collections::BTreeMap<i64, MigrationFile> = std::collections::BTreeMap::new();

    for entry in std::fs::read_dir(dir).map_err(|source| Error::UnreadableSource {
        path: dir.display().to_string(),
        source
    })? {
        let entry = entry.map_err(|source| Error::UnreadableSource {
            path: dir.display().to_string(),
            source
        })?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let Some((stem, kind)) = strip_direction_suffix(file_name) else {
            continue;
        };
        let Some((version, name)) = split_stem(stem) else {
            continue;
        };

        let contents = std::fs::read_to_string(&path).map_err(|source| Error::UnreadableSource {
            path: path.display().to_string(),
            source
        })?;

        let entry = by_version.entry(version).or_insert_with(|| MigrationFile {
            version,
            name: name.clone(),
            up_sql: String::new(),
            down_sql: None
        });
        match kind {
            Direction::Up => entry.up_sql = contents,
            Direction::Down => entry.down_sql = Some(contents)
        }
    }

    Ok(by_version.into_values().collect())
}

enum Direction {
    Up,
    Down
}

fn strip_direction_suffix(file_name: &str) -> Option<(&str, Direction)> {
    if let Some(stem) = file_name.strip_suffix(".up.sql") {
        Some((stem, Direction::Up))
    } else {
        file_name.strip_suffix(".down.sql").map(|stem| (stem, Direction::Down))
    }
}

fn split_stem(stem: &str) -> Option<(i64, String)> {
    let underscore = stem.find('_')?;
    let (digits, rest) = stem.split_at(underscore);
    let version: i64 = digits.parse().ok()?;
    Some((version, rest.trim_start_matches('_').to_string()))
}
