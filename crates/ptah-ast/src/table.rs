//! Table definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{column::Column, constraint::Constraint, error::AstError, index::Index};

/// Per-dialect table storage options (`engine`, `comment`, storage
/// parameters) captured verbatim from `platform.{dialect}.*`
/// overrides on `schema:table`.
pub type TableOptions = BTreeMap<String, BTreeMap<String, String>>;

/// A single row-level-security policy (`schema:rls:policy`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlsPolicy {
    /// Policy name.
    pub name: String,
    /// `FOR` clause (`SELECT`, `INSERT`, `UPDATE`, `DELETE`, `ALL`).
    pub for_clause: Option<String>,
    /// `TO` clause (role name(s)).
    pub to_clause: Option<String>,
    /// `USING (...)` expression.
    pub using: Option<String>,
    /// `WITH CHECK (...)` expression.
    pub with_check: Option<String>,
    /// Free-text comment.
    pub comment: Option<String>
}

/// Row-level-security configuration for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RowLevelSecurity {
    /// Whether `ENABLE ROW LEVEL SECURITY` should be emitted.
    pub enabled: bool,
    /// Policies to create once RLS is enabled.
    pub policies: Vec<RlsPolicy>
}

/// A database table, lowered from a `schema:table` directive or read
/// back from a live database by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Logical struct name this table originated from (empty when
    /// produced by introspection rather than annotation parsing).
    pub origin: String,
    /// Database table name.
    pub name: String,
    /// Ordered column list.
    pub columns: Vec<Column>,
    /// Table-level constraints.
    pub constraints: Vec<Constraint>,
    /// Indexes.
    pub indexes: Vec<Index>,
    /// Per-dialect options (engine, comment, storage parameters).
    pub options: TableOptions,
    /// Row-level-security configuration.
    pub rls: RowLevelSecurity,
    /// Free-text table comment.
    pub comment: Option<String>
}

impl Table {
    /// Validate the invariants a well-formed `Table` must satisfy: unique column
    /// names and at most one primary-key constraint.
    pub fn validate(&self) -> Result<(), AstError> {
        validate_identifier(&self.name)?;

        let mut seen = std::collections::HashSet::with_capacity(self.columns.len());
        for col in &self.columns {
            validate_identifier(&col.name)?;
            if !seen.insert(&col.name) {
                return Err(AstError::DuplicateColumn {
                    table: self.name.clone(),
                    column: col.name.clone()
                });
            }
        }

        let pk_count = self
            .constraints
            .iter()
            .filter(|c| c.is_primary_key())
            .count();
        if pk_count > 1 {
            return Err(AstError::MultiplePrimaryKeys {
                table: self.name.clone()
            });
        }

        for fk in self.constraints.iter().filter_map(|c| match c {
            Constraint::ForeignKey { columns, .. } => Some(columns),
            _ => None
        }) {
            for col in fk {
                if !self.columns.iter().any(|c| &c.name == col) {
                    return Err(AstError::UnknownForeignKeyColumn {
                        table: self.name.clone(),
                        column: col.clone()
                    });
                }
            }
        }

        Ok(())
    }

    /// Column names that make up the table's primary key, whether
    /// declared as a table-level constraint or via column-level
    /// `is_primary` flags.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        if let Some(Constraint::PrimaryKey { columns }) = self
            .constraints
            .iter()
            .find(|c| c.is_primary_key())
        {
            return columns.iter().map(String::as_str).collect();
        }
        self.columns
            .iter()
            .filter(|c| c.is_primary)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// The identifier-length ceiling every supported dialect can quote
/// safely (PostgreSQL's `NAMEDATALEN - 1`; MySQL/MariaDB allow up to
/// 64, so the lower Postgres bound governs cross-dialect names).
const MAX_IDENTIFIER_LEN: usize = 63;

/// Reject an identifier that is empty or exceeds
/// [`MAX_IDENTIFIER_LEN`] — the two failure modes no dialect's
/// quoting rules can paper over.
fn validate_identifier(name: &str) -> Result<(), AstError> {
    if name.is_empty() {
        return Err(AstError::InvalidIdentifier {
            name: name.to_string(),
            reason: "identifier is empty".to_string()
        });
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(AstError::InvalidIdentifier {
            name: name.to_string(),
            reason: format!("identifier exceeds {MAX_IDENTIFIER_LEN} characters")
        });
    }
    Ok(())
}
