//! Scans a host source tree and resolves it into a flat list of
//! per-table directive bundles, ready for the transform stage to
//! lower into an AST.
//!
//! This module owns embedded-field resolution: by the time
//! [`resolve`] returns, every `embedded` directive has been expanded
//! into plain `schema:field`-shaped directives (inline, json, or
//! relation mode) or dropped (skip mode). The transform stage never
//! sees an `embedded` directive.

pub mod directive;
pub mod scan;

use std::{collections::BTreeMap, path::Path};

pub use directive::Directive;
pub use scan::{RawField, RawStruct, ScanResult};

use crate::error::{Error, Result};

/// A field ready for the transform stage: a final column name and the
/// `schema:field`-shaped directive describing it.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    /// Final column name.
    pub name: String,
    /// Normalized `schema:field` directive (`category == "schema:field"`).
    pub directive: Directive
}

/// One table's worth of directives, with embedding already flattened.
#[derive(Debug, Clone)]
pub struct ResolvedEntity {
    /// Originating struct name.
    pub name: String,
    /// The struct's `schema:table` directive.
    pub table: Directive,
    /// Flattened field list.
    pub fields: Vec<ResolvedField>,
    /// `schema:index` directives attached to the struct.
    pub indexes: Vec<Directive>,
    /// `schema:rls:enable` directive, if present.
    pub rls_enable: Option<Directive>,
    /// `schema:rls:policy` directives attached to the struct.
    pub rls_policies: Vec<Directive>
}

/// Scan `root` and resolve it into per-table directive bundles plus
/// any global `schema:extension` directives.
pub fn parse_tree(root: &Path) -> Result<(Vec<ResolvedEntity>, Vec<Directive>, Vec<String>)> {
    let scan = scan::scan_tree(root)?;
    resolve(&scan)
}

/// Resolve an already-scanned tree. Split out from [`parse_tree`] so
/// tests can build a [`ScanResult`] without touching the filesystem.
pub fn resolve(scan: &ScanResult) -> Result<(Vec<ResolvedEntity>, Vec<Directive>, Vec<String>)> {
    let mut entities = Vec::new();
    let mut warnings = scan.warnings.clone();

    for raw in scan.structs.values() {
        let Some(table) = raw.table.clone() else {
            continue;
        };
        if table.get("name").is_none() {
            return Err(Error::parse(&raw.name, "schema:table directive is missing required key 'name'"));
        }

        let mut fields = Vec::new();
        for field in &raw.fields {
            resolve_field(field, raw, scan, &mut fields, &mut warnings)?;
        }

        let mut seen = std::collections::HashSet::new();
        for f in &fields {
            if !seen.insert(f.name.clone()) {
                return Err(Error::parse(&raw.name, format!("duplicate field name '{}' after embedding", f.name)));
            }
        }

        entities.push(ResolvedEntity {
            name: raw.name.clone(),
            table,
            fields,
            indexes: raw.indexes.clone(),
            rls_enable: raw.rls_enable.clone(),
            rls_policies: raw.rls_policies.clone()
        });
    }

    entities.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table_names = std::collections::HashSet::new();
    for e in &entities {
        let table_name = e.table.get("name").unwrap_or_default();
        if !table_names.insert(table_name.to_string()) {
            return Err(Error::parse(&e.name, format!("duplicate table name '{table_name}'")));
        }
    }

    Ok((entities, scan.extensions.clone(), warnings))
}

fn resolve_field(
    field: &RawField,
    owner: &RawStruct,
    scan: &ScanResult,
    out: &mut Vec<ResolvedField>,
    warnings: &mut Vec<String>
) -> Result<()> {
    for directive in &field.directives {
        match directive.category.as_str() {
            "schema:field" => out.push(ResolvedField {
                name: directive.get("name").unwrap_or(&field.name).to_string(),
                directive: directive.clone()
            }),
            "embedded" => resolve_embedded(directive, owner, scan, out, warnings)?,
            _ => {}
        }
    }
    Ok(())
}

fn resolve_embedded(
    directive: &Directive,
    owner: &RawStruct,
    scan: &ScanResult,
    out: &mut Vec<ResolvedField>,
    warnings: &mut Vec<String>
) -> Result<()> {
    let location = format!("{}.<embedded>", owner.name);
    let mode = directive.get("mode").unwrap_or("inline");
    let type_name = directive.require("type", &location)?;

    match mode {
        "skip" => {}
        "inline" => {
            let Some(embedded) = scan.structs.get(type_name) else {
                warnings.push(format!("{location}: embedded type '{type_name}' not found in scanned tree"));
                return Ok(());
            };
            let prefix = directive.get("prefix").unwrap_or("");
            for child in &embedded.fields {
                for child_directive in &child.directives {
                    if child_directive.category != "schema:field" {
                        continue;
                    }
                    let base_name = child_directive.get("name").unwrap_or(&child.name);
                    out.push(ResolvedField {
                        name: format!("{prefix}{base_name}"),
                        directive: child_directive.clone()
                    });
                }
            }
        }
        "json" => {
            let name = directive.require("name", &location)?;
            let mut args = BTreeMap::new();
            args.insert("name".to_string(), name.to_string());
            args.insert("type".to_string(), "JSONB".to_string());
            args.insert(
                "not_null".to_string(),
                (!directive.flag("nullable")).to_string()
            );
            if let Some(comment) = directive.get("comment") {
                args.insert("comment".to_string(), comment.to_string());
            }
            out.push(ResolvedField {
                name: name.to_string(),
                directive: Directive::new("schema:field", args)
            });
        }
        "relation" => {
            let ref_table = directive.require("ref", &location)?;
            let column = directive
                .get("field")
                .map(str::to_string)
                .unwrap_or_else(|| format!("{ref_table}_id"));
            let mut args = BTreeMap::new();
            args.insert("name".to_string(), column.clone());
            args.insert("type".to_string(), "INTEGER".to_string());
            args.insert("foreign".to_string(), format!("{ref_table}(id)"));
            args.insert(
                "not_null".to_string(),
                (!directive.flag("nullable")).to_string()
            );
            if let Some(on_delete) = directive.get("on_delete") {
                args.insert("on_delete".to_string(), on_delete.to_string());
            }
            if let Some(on_update) = directive.get("on_update") {
                args.insert("on_update".to_string(), on_update.to_string());
            }
            if let Some(comment) = directive.get("comment") {
                args.insert("comment".to_string(), comment.to_string());
            }
            out.push(ResolvedField {
                name: column,
                directive: Directive::new("schema:field", args)
            });
        }
        other => {
            warnings.push(format!("{location}: unrecognized embedded mode '{other}', treated as skip"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_source(src: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".rs").tempfile().unwrap();
        file.write_all(src.as_bytes()).unwrap();
        file
    }

    #[test]
    fn resolves_a_simple_table() {
        let src = r#"
/// migrator:schema:table name="users"
struct User {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="email" type="VARCHAR(255)" not_null="true"
    email: String,
}
"#;
        let file = write_source(src);
        let mut scan = ScanResult::default();
        scan::scan_file(file.path(), &mut scan).unwrap();
        let (entities, _, _) = resolve(&scan).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].fields.len(), 2);
    }

    #[test]
    fn inline_embedding_splices_fields_with_prefix() {
        let src = r#"
/// migrator:schema:table name="articles"
struct Article {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:embedded mode="inline" type="Timestamps" prefix=""
    stamps: Timestamps,
}

struct Timestamps {
    /// migrator:schema:field name="created_at" type="TIMESTAMPTZ" not_null="true"
    created_at: i64,
    /// migrator:schema:field name="updated_at" type="TIMESTAMPTZ" not_null="true"
    updated_at: i64,
}
"#;
        let file = write_source(src);
        let mut scan = ScanResult::default();
        scan::scan_file(file.path(), &mut scan).unwrap();
        let (entities, _, _) = resolve(&scan).unwrap();
        let article = entities.iter().find(|e| e.name == "Article").unwrap();
        let names: Vec<_> = article.fields.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"created_at"));
        assert!(names.contains(&"updated_at"));
    }

    #[test]
    fn relation_embedding_synthesizes_foreign_key_column() {
        let src = r#"
/// migrator:schema:table name="articles"
struct Article {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:embedded mode="relation" type="User" ref="users" field="author_id"
    author: User,
}
"#;
        let file = write_source(src);
        let mut scan = ScanResult::default();
        scan::scan_file(file.path(), &mut scan).unwrap();
        let (entities, _, _) = resolve(&scan).unwrap();
        let article = entities.iter().find(|e| e.name == "Article").unwrap();
        let fk_field = article.fields.iter().find(|f| f.name == "author_id").unwrap();
        assert_eq!(fk_field.directive.get("foreign"), Some("users(id)"));
    }

    #[test]
    fn skip_embedding_drops_the_field() {
        let src = r#"
/// migrator:schema:table name="articles"
struct Article {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:embedded mode="skip" type="Anything"
    ignored: i64,
}
"#;
        let file = write_source(src);
        let mut scan = ScanResult::default();
        scan::scan_file(file.path(), &mut scan).unwrap();
        let (entities, _, _) = resolve(&scan).unwrap();
        let article = entities.iter().find(|e| e.name == "Article").unwrap();
        assert_eq!(article.fields.len(), 1);
    }

    #[test]
    fn missing_table_name_is_fatal() {
        let src = r#"
/// migrator:schema:table comment="oops"
struct Bad {
    id: i64,
}
"#;
        let file = write_source(src);
        let mut scan = ScanResult::default();
        scan::scan_file(file.path(), &mut scan).unwrap();
        let err = resolve(&scan).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
