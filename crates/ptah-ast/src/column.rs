//! Column definitions.
//!
//! A [`Column`] is dialect-neutral: the `base_type` is whatever string
//! the annotation or introspector produced (e.g. `"VARCHAR(255)"`,
//! `"SERIAL"`), and dialect-specific rewriting (SERIAL → INT
//! AUTO_INCREMENT, enum inlining, etc.) happens entirely in the
//! renderers, never here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A column's default value.
///
/// A column's default is a literal *or* an expression, never both —
/// [`ColumnDefault::from_pair`] enforces this by construction: the two
/// are stored as one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnDefault {
    /// A literal value, rendered single-quoted (e.g. `'active'`, `0`
    /// is still rendered quoted — renderers quote every
    /// literal default regardless of its Rust-level type).
    Literal(String),
    /// A raw SQL expression, rendered unquoted (e.g. `now()`,
    /// `gen_random_uuid()`).
    Expression(String)
}

impl ColumnDefault {
    /// Build from the annotation parser's `default`/`default_fn` pair.
    /// Returns `None` if neither was present.
    pub fn from_pair(literal: Option<String>, expr: Option<String>) -> Option<Self> {
        match (literal, expr) {
            (Some(_), Some(_)) => None, // caller must reject as ConflictingDefaults
            (Some(l), None) => Some(Self::Literal(l)),
            (None, Some(e)) => Some(Self::Expression(e)),
            (None, None) => None
        }
    }
}

/// How a column's foreign key reference renders ON DELETE/ON UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReferentialAction {
    /// No explicit action (dialect default, usually NO ACTION).
    #[default]
    NoAction,
    /// `CASCADE`.
    Cascade,
    /// `SET NULL`.
    SetNull,
    /// `SET DEFAULT`.
    SetDefault,
    /// `RESTRICT`.
    Restrict
}

impl ReferentialAction {
    /// Render as the SQL keyword(s).
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT"
        }
    }

    /// Parse from the annotation grammar's `on_delete`/`on_update`
    /// values (case-insensitive, spaces or underscores).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.to_ascii_uppercase().replace('_', " ");
        match normalized.as_str() {
            "NO ACTION" => Some(Self::NoAction),
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            "RESTRICT" => Some(Self::Restrict),
            _ => None
        }
    }
}

/// A column-level foreign key reference (`foreign = "table(col)"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table name.
    pub table: String,
    /// Referenced column name.
    pub column: String,
    /// Constraint name. Defaults to `fk_{table}_{column}` if
    /// the annotation omitted `foreign_key_name`.
    pub constraint_name: String,
    /// `ON DELETE` action.
    pub on_delete: ReferentialAction,
    /// `ON UPDATE` action.
    pub on_update: ReferentialAction,
    /// Whether the referenced table is known to be outside this
    /// schema (declared "external") — such references impose
    /// no ordering constraint on dependency resolution.
    pub external: bool
}

/// A single column in a [`crate::Table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Base SQL type string, dialect-neutral unless overridden (e.g.
    /// `"VARCHAR(255)"`, `"SERIAL"`, `"JSONB"`).
    pub base_type: String,
    /// Whether NULL is allowed. A column marked primary is implicitly
    /// NOT NULL regardless of this field — renderers enforce that,
    /// not the AST, so introspection round-trips remain faithful to
    /// what the database actually reports.
    pub nullable: bool,
    /// Default literal or expression, mutually exclusive by
    /// construction.
    pub default: Option<ColumnDefault>,
    /// `CHECK (...)` expression scoped to this column.
    pub check: Option<String>,
    /// Per-dialect type/check overrides, keyed by
    /// [`crate::Dialect::override_key`] then by override key
    /// (`"type"`, `"check"`, or an arbitrary `platform.*` key).
    pub platform_overrides: BTreeMap<String, BTreeMap<String, String>>,
    /// Free-text column comment.
    pub comment: Option<String>,
    /// Foreign key reference, if any.
    pub foreign_key: Option<ForeignKeyRef>,
    /// Name of the [`crate::GlobalEnum`] this column's type resolves
    /// to, if it is an enum column.
    pub enum_ref: Option<String>,
    /// Whether this column participates in the table's primary key.
    pub is_primary: bool,
    /// Whether this column is a single-column `UNIQUE` constraint.
    pub is_unique: bool,
    /// Whether this column auto-increments (implies primary).
    pub auto_increment: bool
}

impl Column {
    /// Look up a per-dialect override (`platform.{dialect}.{key}`).
    /// Falls back to `None` if no override is registered for that
    /// dialect/key pair — callers fall back to `base_type`/`check`.
    pub fn platform_override(&self, dialect: &str, key: &str) -> Option<&str> {
        self.platform_overrides
            .get(dialect)
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }

    /// Effective nullability for rendering: primary-key columns are
    /// always NOT NULL regardless of the stored `nullable` flag (
    /// invariant: "a column marked primary is implicitly NOT NULL").
    pub const fn effective_nullable(&self) -> bool {
        !self.is_primary && self.nullable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_column() -> Column {
        Column {
            name: "id".into(),
            base_type: "SERIAL".into(),
            nullable: true,
            default: None,
            check: None,
            platform_overrides: BTreeMap::new(),
            comment: None,
            foreign_key: None,
            enum_ref: None,
            is_primary: true,
            is_unique: false,
            auto_increment: true
        }
    }

    #[test]
    fn default_from_pair_prefers_neither_on_conflict() {
        assert!(ColumnDefault::from_pair(Some("'x'".into()), Some("now()".into())).is_none());
    }

    #[test]
    fn default_from_pair_literal_only() {
        assert_eq!(
            ColumnDefault::from_pair(Some("'x'".into()), None),
            Some(ColumnDefault::Literal("'x'".into()))
        );
    }

    #[test]
    fn default_from_pair_expression_only() {
        assert_eq!(
            ColumnDefault::from_pair(None, Some("now()".into())),
            Some(ColumnDefault::Expression("now()".into()))
        );
    }

    #[test]
    fn referential_action_parses_case_and_separator_insensitively() {
        assert_eq!(ReferentialAction::parse("cascade"), Some(ReferentialAction::Cascade));
        assert_eq!(ReferentialAction::parse("SET_NULL"), Some(ReferentialAction::SetNull));
        assert_eq!(ReferentialAction::parse("set default"), Some(ReferentialAction::SetDefault));
        assert_eq!(ReferentialAction::parse("bogus"), None);
    }

    #[test]
    fn primary_column_is_effectively_not_null() {
        let mut col = base_column();
        col.nullable = true;
        assert!(!col.effective_nullable());
    }

    #[test]
    fn non_primary_column_respects_nullable_flag() {
        let mut col = base_column();
        col.is_primary = false;
        col.nullable = false;
        assert!(!col.effective_nullable());
        col.nullable = true;
        assert!(col.effective_nullable());
    }

    #[test]
    fn platform_override_lookup() {
        let mut col = base_column();
        let mut pg = BTreeMap::new();
        pg.insert("type".to_string(), "BIGSERIAL".to_string());
        col.platform_overrides.insert("postgres".to_string(), pg);

        assert_eq!(col.platform_override("postgres", "type"), Some("BIGSERIAL"));
        assert_eq!(col.platform_override("postgres", "check"), None);
        assert_eq!(col.platform_override("mysql", "type"), None);
    }
}
