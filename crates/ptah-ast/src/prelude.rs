//! Convenient re-exports for downstream crates.

pub use crate::{
    column::{Column, ColumnDefault, ForeignKeyRef, ReferentialAction},
    constraint::{Constraint, ConstraintRef, UniqueTarget},
    dialect::Dialect,
    diff::{ColumnChangeSet, Diff, ModifiedColumn, ModifiedEnum, TableDiff},
    enum_type::GlobalEnum,
    error::AstError,
    extension::Extension,
    index::{Index, IndexColumn, IndexKind, SortOrder},
    migration_record::{Direction, MigrationRecord},
    schema::{DependencyGraph, Schema},
    table::{RlsPolicy, RowLevelSecurity, Table, TableOptions}
};
