//! Index definitions.

use serde::{Deserialize, Serialize};

/// Sort direction for an indexed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    /// Ascending (the default when unspecified).
    #[default]
    Asc,
    /// Descending.
    Desc
}

impl SortOrder {
    /// Render as the SQL keyword, or `""` for the (implicit) ascending
    /// default so rendered DDL doesn't grow noisy `ASC` suffixes.
    pub const fn as_sql_suffix(self) -> &'static str {
        match self {
            Self::Asc => "",
            Self::Desc => " DESC"
        }
    }
}

/// A single column participating in an index, with its sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Sort order for this column within the index.
    pub order: SortOrder
}

impl IndexColumn {
    /// Construct an ascending-order index column (the common case).
    pub fn ascending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: SortOrder::Asc
        }
    }
}

/// Index storage method / access method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IndexKind {
    /// B-tree (the default for every supported dialect).
    #[default]
    BTree,
    /// PostgreSQL GIN.
    Gin,
    /// PostgreSQL GiST.
    Gist,
    /// Hash index.
    Hash,
    /// PostgreSQL BRIN.
    Brin
}

impl IndexKind {
    /// Parse the annotation grammar's `type`/`platform.*` index-kind
    /// value (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "BTREE" => Some(Self::BTree),
            "GIN" => Some(Self::Gin),
            "GIST" => Some(Self::Gist),
            "HASH" => Some(Self::Hash),
            "BRIN" => Some(Self::Brin),
            _ => None
        }
    }

    /// The PostgreSQL `USING ...` clause fragment, or `""` for the
    /// default B-tree (which needs no explicit `USING`).
    pub const fn as_postgres_using(self) -> &'static str {
        match self {
            Self::BTree => "",
            Self::Gin => " USING gin",
            Self::Gist => " USING gist",
            Self::Hash => " USING hash",
            Self::Brin => " USING brin"
        }
    }
}

/// A named index on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name, unique within the schema.
    pub name: String,
    /// Owning table name.
    pub table: String,
    /// Indexed columns, in order.
    pub columns: Vec<IndexColumn>,
    /// Whether this is a `UNIQUE INDEX`.
    pub unique: bool,
    /// Storage/access method.
    pub kind: IndexKind,
    /// Partial-index predicate (`WHERE ...`), PostgreSQL-only; other
    /// dialects ignore it at render time with a warning comment.
    pub predicate: Option<String>,
    /// Free-text comment.
    pub comment: Option<String>
}
