//! The `Schema` aggregate and its dependency graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    constraint::Constraint, enum_type::GlobalEnum, error::AstError, extension::Extension,
    table::Table
};

/// A map from table name to the set of table names it references,
/// derived from foreign keys and relation-mode embeddings.
///
/// Self-references are allowed and recorded — a table may appear in
/// its own reference set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>
}

impl DependencyGraph {
    /// Build an empty graph covering the given table names, so every
    /// table is present as a key even if it has no dependencies.
    pub fn new(table_names: impl IntoIterator<Item = String>) -> Self {
        let edges = table_names.into_iter().map(|n| (n, BTreeSet::new())).collect();
        Self { edges }
    }

    /// Record an edge `from -> to` (table `from` references `to`).
    /// Both ends are inserted as nodes if not already present.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        let to = to.into();
        self.edges.entry(to.clone()).or_default();
        self.edges.entry(from).or_default().insert(to);
    }

    /// All table names known to the graph.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    /// The set of tables a given table directly references.
    pub fn references_of(&self, table: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(table)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Raw edge map, for dependency-ordering algorithms that want direct access.
    pub fn edges(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.edges
    }
}

/// The fundamental aggregate for one parse or one introspection pass:
/// a set of tables, global enums, dialect-scoped extensions, and the
/// dependency graph over tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Schema {
    /// Tables, keyed by name for O(log n) lookup; iteration order is
    /// the table name's natural (alphabetical) order, which is what
    /// deterministic diff output requires.
    tables: BTreeMap<String, Table>,
    /// Global enums, keyed by name.
    enums: BTreeMap<String, GlobalEnum>,
    /// Dialect-scoped extensions.
    pub extensions: Vec<Extension>,
    /// Dependency graph derived from foreign keys and relation-mode
    /// embeddings.
    pub dependencies: DependencyGraph
}

impl Schema {
    /// Start building an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table, rejecting a duplicate name: no table name may appear twice.
    pub fn add_table(&mut self, table: Table) -> Result<(), AstError> {
        table.validate()?;
        if self.tables.contains_key(&table.name) {
            return Err(AstError::DuplicateTable {
                name: table.name.clone()
            });
        }
        self.dependencies.edges.entry(table.name.clone()).or_default();

        for constraint in &table.constraints {
            if let Constraint::ForeignKey { reference, .. } = constraint
                && !reference.external
            {
                self.dependencies.add_edge(table.name.clone(), reference.table.clone());
            }
        }

        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    /// Insert a global enum, rejecting a duplicate name.
    pub fn add_enum(&mut self, e: GlobalEnum) -> Result<(), AstError> {
        if !e.is_valid() {
            return Err(AstError::InvalidEnum {
                name: e.name.clone(),
                reason: "enum must have a non-empty, de-duplicated value list".into()
            });
        }
        if self.enums.contains_key(&e.name) {
            return Err(AstError::InvalidEnum {
                name: e.name.clone(),
                reason: "enum name already used in this schema".into()
            });
        }
        self.enums.insert(e.name.clone(), e);
        Ok(())
    }

    /// Tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Number of tables in the schema.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Global enums in name order.
    pub fn enums(&self) -> impl Iterator<Item = &GlobalEnum> {
        self.enums.values()
    }

    /// Look up a global enum by name.
    pub fn enum_by_name(&self, name: &str) -> Option<&GlobalEnum> {
        self.enums.get(name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{column::Column, table::RowLevelSecurity};

    fn simple_table(name: &str) -> Table {
        Table {
            origin: name.to_string(),
            name: name.to_string(),
            columns: vec![Column {
                name: "id".into(),
                base_type: "SERIAL".into(),
                nullable: false,
                default: None,
                check: None,
                platform_overrides: BTreeMap::new(),
                comment: None,
                foreign_key: None,
                enum_ref: None,
                is_primary: true,
                is_unique: false,
                auto_increment: true
            }],
            constraints: vec![],
            indexes: vec![],
            options: BTreeMap::new(),
            rls: RowLevelSecurity::default(),
            comment: None
        }
    }

    #[test]
    fn add_table_rejects_duplicates() {
        let mut schema = Schema::new();
        schema.add_table(simple_table("users")).unwrap();
        let err = schema.add_table(simple_table("users")).unwrap_err();
        assert_eq!(
            err,
            AstError::DuplicateTable {
                name: "users".into()
            }
        );
    }

    #[test]
    fn tables_iterate_in_name_order() {
        let mut schema = Schema::new();
        schema.add_table(simple_table("zebras")).unwrap();
        schema.add_table(simple_table("apples")).unwrap();
        let names: Vec<_> = schema.tables().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["apples", "zebras"]);
    }

    #[test]
    fn add_table_without_fk_has_no_self_loop() {
        let mut schema = Schema::new();
        schema.add_table(simple_table("users")).unwrap();
        let refs: Vec<_> = schema.dependencies.references_of("users").collect();
        assert!(refs.is_empty());
    }

    #[test]
    fn add_table_records_foreign_key_edge() {
        let mut schema = Schema::new();
        schema.add_table(simple_table("users")).unwrap();

        let mut articles = simple_table("articles");
        articles.constraints.push(Constraint::ForeignKey {
            name: "fk_articles_user_id".into(),
            columns: vec!["id".into()],
            reference: crate::constraint::ConstraintRef {
                table: "users".into(),
                columns: vec!["id".into()],
                on_delete: crate::column::ReferentialAction::Cascade,
                on_update: crate::column::ReferentialAction::NoAction,
                external: false
            }
        });
        schema.add_table(articles).unwrap();

        let refs: Vec<_> = schema.dependencies.references_of("articles").collect();
        assert_eq!(refs, vec!["users"]);
    }

    #[test]
    fn self_referencing_foreign_key_is_recorded() {
        let mut categories = simple_table("categories");
        categories.constraints.push(Constraint::ForeignKey {
            name: "fk_categories_parent_id".into(),
            columns: vec!["id".into()],
            reference: crate::constraint::ConstraintRef {
                table: "categories".into(),
                columns: vec!["id".into()],
                on_delete: crate::column::ReferentialAction::SetNull,
                on_update: crate::column::ReferentialAction::NoAction,
                external: false
            }
        });
        let mut schema = Schema::new();
        schema.add_table(categories).unwrap();

        let refs: Vec<_> = schema.dependencies.references_of("categories").collect();
        assert_eq!(refs, vec!["categories"]);
    }

    #[test]
    fn add_enum_rejects_invalid_value_list() {
        let mut schema = Schema::new();
        let err = schema
            .add_enum(GlobalEnum {
                name: "enum_user_status".into(),
                values: vec![]
            })
            .unwrap_err();
        assert!(matches!(err, AstError::InvalidEnum { .. }));
    }

    #[test]
    fn add_enum_rejects_duplicate_name() {
        let mut schema = Schema::new();
        schema
            .add_enum(GlobalEnum {
                name: "enum_user_status".into(),
                values: vec!["active".into()]
            })
            .unwrap();
        let err = schema
            .add_enum(GlobalEnum {
                name: "enum_user_status".into(),
                values: vec!["inactive".into()]
            })
            .unwrap_err();
        assert!(matches!(err, AstError::InvalidEnum { .. }));
    }
}
