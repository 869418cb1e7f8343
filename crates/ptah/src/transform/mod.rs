//! Lowers resolved directive bundles into a dialect-neutral
//! [`ptah_ast::Schema`].

use std::collections::BTreeMap;

use ptah_ast::{
    Column, Constraint, Dialect, Extension, GlobalEnum, Index, Schema, Table,
    column::{ColumnDefault, ForeignKeyRef, ReferentialAction},
    constraint::ConstraintRef,
    index::{IndexColumn, IndexKind, SortOrder},
    table::{RlsPolicy, RowLevelSecurity}
};

use crate::{
    annotation::{Directive, ResolvedEntity},
    error::{Error, Result}
};

/// Lower a list of resolved entities and global extensions into a
/// [`Schema`].
pub fn lower(entities: &[ResolvedEntity], extensions: &[Directive]) -> Result<Schema> {
    let mut schema = Schema::new();

    for entity in entities {
        let table = lower_table(entity)?;
        schema.add_table(table)?;
    }

    for entity in entities {
        for field in &entity.fields {
            if field.directive.get("type") == Some("ENUM") {
                let values = field.directive.list("enum");
                if values.is_empty() {
                    continue;
                }
                let table_name = entity.table.require("name", &entity.name)?;
                let column_name = field.directive.require("name", &entity.name)?;
                let enum_name = GlobalEnum::canonical_name(table_name, column_name);
                if schema.enum_by_name(&enum_name).is_none() {
                    schema.add_enum(GlobalEnum {
                        name: enum_name,
                        values
                    })?;
                }
            }
        }
    }

    for directive in extensions {
        let name = directive.require("name", "schema:extension")?.to_string();
        schema.extensions.push(Extension {
            name,
            if_not_exists: directive.args.get("if_not_exists").is_none_or(|v| v == "true"),
            comment: directive.get("comment").map(str::to_string)
        });
    }
    schema.extensions.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(schema)
}

fn lower_table(entity: &ResolvedEntity) -> Result<Table> {
    let table_name = entity.table.require("name", &entity.name)?.to_string();

    let mut columns = Vec::with_capacity(entity.fields.len());
    for field in &entity.fields {
        columns.push(lower_column(&table_name, &field.directive, &entity.name)?);
    }

    let mut constraints = Vec::new();
    let primary_key = entity.table.list("primary_key");
    if !primary_key.is_empty() {
        constraints.push(Constraint::PrimaryKey { columns: primary_key });
    }
    for (i, check) in entity.table.list("checks").into_iter().enumerate() {
        constraints.push(Constraint::Check {
            name: format!("chk_{table_name}_{i}"),
            expression: check
        });
    }
    for field in &entity.fields {
        if let Some(fk) = foreign_key_constraint(&table_name, &field.directive)? {
            constraints.push(fk);
        }
    }

    let mut indexes = Vec::with_capacity(entity.indexes.len());
    for directive in &entity.indexes {
        indexes.push(lower_index(&table_name, directive, &entity.name)?);
    }

    let options = platform_table_options(&entity.table);

    let rls = RowLevelSecurity {
        enabled: entity.rls_enable.is_some(),
        policies: entity
            .rls_policies
            .iter()
            .map(|d| RlsPolicy {
                name: d.get("name").unwrap_or_default().to_string(),
                for_clause: d.get("for").map(str::to_string),
                to_clause: d.get("to").map(str::to_string),
                using: d.get("using").map(str::to_string),
                with_check: d.get("with_check").map(str::to_string),
                comment: d.get("comment").map(str::to_string)
            })
            .collect()
    };

    Ok(Table {
        origin: entity.name.clone(),
        name: table_name,
        columns,
        constraints,
        indexes,
        options,
        rls,
        comment: entity.table.get("comment").map(str::to_string)
    })
}

fn lower_column(table_name: &str, directive: &Directive, location: &str) -> Result<Column> {
    let name = directive.require("name", location)?.to_string();
    let declared_type = directive.require("type", location)?;
    let (base_type, enum_ref) = if declared_type == "ENUM" {
        (GlobalEnum::canonical_name(table_name, &name), Some(GlobalEnum::canonical_name(table_name, &name)))
    } else {
        (declared_type.to_string(), None)
    };

    let literal = directive.get("default").map(str::to_string);
    let expr = directive.get("default_fn").map(str::to_string);
    let default = match ColumnDefault::from_pair(literal.clone(), expr.clone()) {
        Some(d) => Some(d),
        None if literal.is_some() && expr.is_some() => {
            return Err(Error::parse(
                format!("{location}.{name}"),
                "column declares both default and default_fn; they are mutually exclusive"
            ));
        }
        None => None
    };

    let is_primary = directive.flag("primary");
    let auto_increment = directive.flag("auto_increment") || declared_type.eq_ignore_ascii_case("SERIAL");
    let nullable = if is_primary { false } else { !directive.flag("not_null") };

    let foreign_key = parse_foreign_key_ref(table_name, &name, directive)?;

    Ok(Column {
        name,
        base_type,
        nullable,
        default,
        check: directive.get("check").map(str::to_string),
        platform_overrides: directive.platform_overrides(),
        comment: directive.get("comment").map(str::to_string),
        foreign_key,
        enum_ref,
        is_primary,
        is_unique: directive.flag("unique"),
        auto_increment
    })
}

fn parse_foreign_key_ref(table_name: &str, column_name: &str, directive: &Directive) -> Result<Option<ForeignKeyRef>> {
    let Some(foreign) = directive.get("foreign") else {
        return Ok(None);
    };
    let (ref_table, ref_column) = parse_table_paren_column(foreign)
        .ok_or_else(|| Error::parse(format!("{table_name}.{column_name}"), format!("malformed foreign reference '{foreign}', expected table(column)")))?;

    let constraint_name = directive
        .get("foreign_key_name")
        .map(str::to_string)
        .unwrap_or_else(|| format!("fk_{table_name}_{column_name}"));

    Ok(Some(ForeignKeyRef {
        table: ref_table,
        column: ref_column,
        constraint_name,
        on_delete: directive.get("on_delete").and_then(ReferentialAction::parse).unwrap_or_default(),
        on_update: directive.get("on_update").and_then(ReferentialAction::parse).unwrap_or_default(),
        external: directive.flag("external")
    }))
}

fn foreign_key_constraint(table_name: &str, directive: &Directive) -> Result<Option<Constraint>> {
    let Some(column_name) = directive.get("name") else {
        return Ok(None);
    };
    let Some(fk) = parse_foreign_key_ref(table_name, column_name, directive)? else {
        return Ok(None);
    };
    Ok(Some(Constraint::ForeignKey {
        name: fk.constraint_name.clone(),
        columns: vec![column_name.to_string()],
        reference: ConstraintRef {
            table: fk.table,
            columns: vec![fk.column],
            on_delete: fk.on_delete,
            on_update: fk.on_update,
            external: fk.external
        }
    }))
}

/// Parse `table(column)` as used by the `foreign` directive key.
fn parse_table_paren_column(s: &str) -> Option<(String, String)> {
    let open = s.find('(')?;
    if !s.ends_with(')') {
        return None;
    }
    let table = s[..open].trim().to_string();
    let column = s[open + 1..s.len() - 1].trim().to_string();
    if table.is_empty() || column.is_empty() {
        return None;
    }
    Some((table, column))
}

fn lower_index(table_name: &str, directive: &Directive, location: &str) -> Result<Index> {
    let name = directive.get("name").map(str::to_string).unwrap_or_else(|| format!("idx_{table_name}"));
    let fields = directive.list("fields");
    if fields.is_empty() {
        return Err(Error::parse(location, format!("schema:index '{name}' declares no fields")));
    }
    let columns = fields
        .into_iter()
        .map(|f| IndexColumn {
            name: f,
            order: SortOrder::Asc
        })
        .collect();

    Ok(Index {
        name,
        table: table_name.to_string(),
        columns,
        unique: directive.flag("unique"),
        kind: directive.get("type").and_then(IndexKind::parse).unwrap_or_default(),
        predicate: directive.get("predicate").map(str::to_string),
        comment: directive.get("comment").map(str::to_string)
    })
}

fn platform_table_options(directive: &Directive) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut options = directive.platform_overrides();
    if let Some(engine) = directive.get("engine") {
        options.entry("mysql".to_string()).or_default().insert("engine".to_string(), engine.to_string());
    }
    options
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::annotation::ResolvedField;

    fn field(args: &[(&str, &str)]) -> ResolvedField {
        let mut map = BTreeMap::new();
        for (k, v) in args {
            map.insert(k.to_string(), v.to_string());
        }
        let name = map.get("name").cloned().unwrap_or_default();
        ResolvedField {
            name,
            directive: Directive::new("schema:field", map)
        }
    }

    fn entity(table_name: &str, fields: Vec<ResolvedField>) -> ResolvedEntity {
        let mut table_args = BTreeMap::new();
        table_args.insert("name".to_string(), table_name.to_string());
        ResolvedEntity {
            name: "Origin".into(),
            table: Directive::new("schema:table", table_args),
            fields,
            indexes: vec![],
            rls_enable: None,
            rls_policies: vec![]
        }
    }

    #[test]
    fn lowers_a_minimal_table() {
        let entities = vec![entity(
            "users",
            vec![
                field(&[("name", "id"), ("type", "SERIAL"), ("primary", "true")]),
                field(&[("name", "email"), ("type", "VARCHAR(255)"), ("not_null", "true"), ("unique", "true")]),
            ]
        )];
        let schema = lower(&entities, &[]).unwrap();
        let table = schema.table("users").unwrap();
        assert_eq!(table.columns.len(), 2);
        assert!(table.column("id").unwrap().is_primary);
        assert!(!table.column("id").unwrap().effective_nullable());
        assert!(table.column("email").unwrap().is_unique);
    }

    #[test]
    fn enum_field_synthesizes_global_enum() {
        let entities = vec![entity(
            "users",
            vec![
                field(&[("name", "id"), ("type", "SERIAL"), ("primary", "true")]),
                field(&[("name", "status"), ("type", "ENUM"), ("enum", "active,inactive")]),
            ]
        )];
        let schema = lower(&entities, &[]).unwrap();
        let e = schema.enum_by_name("enum_users_status").unwrap();
        assert_eq!(e.values, vec!["active".to_string(), "inactive".to_string()]);
        assert_eq!(schema.table("users").unwrap().column("status").unwrap().base_type, "enum_users_status");
    }

    #[test]
    fn foreign_key_parses_table_and_column() {
        let entities = vec![entity(
            "articles",
            vec![field(&[
                ("name", "user_id"),
                ("type", "INTEGER"),
                ("foreign", "users(id)"),
                ("on_delete", "cascade")
            ])]
        )];
        let schema = lower(&entities, &[]).unwrap();
        let table = schema.table("articles").unwrap();
        let fk = table.column("user_id").unwrap().foreign_key.as_ref().unwrap();
        assert_eq!(fk.table, "users");
        assert_eq!(fk.column, "id");
        assert_eq!(fk.constraint_name, "fk_articles_user_id");
        assert_eq!(fk.on_delete, ReferentialAction::Cascade);
    }

    #[test]
    fn conflicting_defaults_are_rejected() {
        let entities = vec![entity(
            "t",
            vec![field(&[("name", "x"), ("type", "TEXT"), ("default", "'a'"), ("default_fn", "now()")])]
        )];
        let err = lower(&entities, &[]).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn extensions_lower_with_if_not_exists_default_true() {
        let mut args = BTreeMap::new();
        args.insert("name".to_string(), "pgcrypto".to_string());
        let directive = Directive::new("schema:extension", args);
        let schema = lower(&[], std::slice::from_ref(&directive)).unwrap();
        assert_eq!(schema.extensions.len(), 1);
        assert!(schema.extensions[0].if_not_exists);
    }
}
