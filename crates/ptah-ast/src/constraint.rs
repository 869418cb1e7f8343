//! Table-level constraints.

use serde::{Deserialize, Serialize};

use crate::column::ReferentialAction;

/// A reference target for a table-level foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRef {
    /// Referenced table.
    pub table: String,
    /// Referenced columns, in order.
    pub columns: Vec<String>,
    /// `ON DELETE` action.
    pub on_delete: ReferentialAction,
    /// `ON UPDATE` action.
    pub on_update: ReferentialAction,
    /// Whether the referenced table lives outside this schema.
    pub external: bool
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// `PRIMARY KEY (col, ...)`. At most one per table.
    PrimaryKey {
        /// Participating column names, in declared order.
        columns: Vec<String>
    },
    /// `CONSTRAINT name FOREIGN KEY (cols) REFERENCES ...`.
    ForeignKey {
        /// Constraint name.
        name: String,
        /// Owning columns, in order.
        columns: Vec<String>,
        /// Reference target.
        reference: ConstraintRef
    },
    /// `UNIQUE (cols)` or a unique expression index
    /// (`unique_expr`-style).
    Unique {
        /// Optional explicit name; renderers synthesize one from the
        /// table/columns when absent.
        name: Option<String>,
        /// Either a plain column list or a single expression.
        target: UniqueTarget
    },
    /// `CONSTRAINT name CHECK (expr)`.
    Check {
        /// Constraint name.
        name: String,
        /// The check expression, rendered verbatim.
        expression: String
    }
}

/// What a `UNIQUE` constraint is defined over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniqueTarget {
    /// A plain column list.
    Columns(Vec<String>),
    /// A raw SQL expression (`unique_expr`).
    Expression(String)
}

impl Constraint {
    /// `true` if this is the table's primary key constraint.
    pub const fn is_primary_key(&self) -> bool {
        matches!(self, Self::PrimaryKey { .. })
    }

    /// The constraint's name, if it has one. Primary keys are
    /// unnamed in this model (dialects name them implicitly);
    /// unique constraints may be unnamed pending renderer synthesis.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::PrimaryKey { .. } => None,
            Self::ForeignKey { name, .. } | Self::Check { name, .. } => Some(name),
            Self::Unique { name, .. } => name.as_deref()
        }
    }
}
