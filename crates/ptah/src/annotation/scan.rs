//! Walks a host source tree, parses each file as Rust source, and
//! extracts `migrator:` directives from doc comments on structs and
//! their fields.

use std::{collections::BTreeMap, fs, path::Path};

use syn::{Fields, Item};
use walkdir::WalkDir;

use super::directive::{self, Directive};
use crate::error::{Error, Result};

/// One field of a scanned struct, with every directive that applied
/// to it (`schema:field` and/or `embedded`; both may legitimately
/// co-occur is not expected, but the scanner does not enforce that —
/// the transform stage does).
#[derive(Debug, Clone)]
pub struct RawField {
    /// Field name as written in the struct.
    pub name: String,
    /// All directives whose doc-comment line preceded this field.
    pub directives: Vec<Directive>
}

/// One scanned struct and the directives attached to it and its
/// fields.
#[derive(Debug, Clone)]
pub struct RawStruct {
    /// Struct name (becomes `Table::origin`).
    pub name: String,
    /// Source file the struct was found in, for error messages.
    pub file: String,
    /// The struct's `schema:table` directive, if any.
    pub table: Option<Directive>,
    /// `schema:index` directives attached to the struct.
    pub indexes: Vec<Directive>,
    /// The struct's `schema:rls:enable` directive, if any.
    pub rls_enable: Option<Directive>,
    /// `schema:rls:policy` directives attached to the struct.
    pub rls_policies: Vec<Directive>,
    /// Ordered field list, in declaration order.
    pub fields: Vec<RawField>
}

/// The result of scanning an entire source tree.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Every struct found, keyed by name for embedded-field
    /// resolution. Scanning the whole tree rather than only the
    /// current file means an embedded type defined in a sibling file
    /// resolves for free.
    pub structs: BTreeMap<String, RawStruct>,
    /// `schema:extension` directives found anywhere in the tree, not
    /// tied to any particular struct.
    pub extensions: Vec<Directive>,
    /// Non-fatal issues: unrecognized directive keys, etc.
    pub warnings: Vec<String>
}

/// Scan every `.rs` file under `root`, merging results into one
/// [`ScanResult`].
pub fn scan_tree(root: &Path) -> Result<ScanResult> {
    let mut result = ScanResult::default();

    let mut entries: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "rs"))
        .collect();
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    for entry in entries {
        scan_file(entry.path(), &mut result)?;
    }

    Ok(result)
}

pub(crate) fn scan_file(path: &Path, result: &mut ScanResult) -> Result<()> {
    let display_path = path.display().to_string();
    let source = fs::read_to_string(path).map_err(|source| Error::UnreadableSource {
        path: display_path.clone(),
        source
    })?;
    let file = syn::parse_file(&source).map_err(|source| Error::SyntaxError {
        path: display_path.clone(),
        source
    })?;

    for directive in directives_from_attrs(&file.attrs, &display_path)? {
        if directive.category == "schema:extension" {
            result.extensions.push(directive);
        }
    }

    for item in &file.items {
        scan_item(item, &display_path, result)?;
    }

    Ok(())
}

fn scan_item(item: &Item, file: &str, result: &mut ScanResult) -> Result<()> {
    let Item::Struct(item_struct) = item else {
        if let Some(attrs) = item_attrs(item) {
            for directive in directives_from_attrs(attrs, file)? {
                if directive.category == "schema:extension" {
                    result.extensions.push(directive);
                }
            }
        }
        return Ok(());
    };

    let name = item_struct.ident.to_string();
    let mut raw = RawStruct {
        name: name.clone(),
        file: file.to_string(),
        table: None,
        indexes: Vec::new(),
        rls_enable: None,
        rls_policies: Vec::new(),
        fields: Vec::new()
    };

    for directive in directives_from_attrs(&item_struct.attrs, &name)? {
        match directive.category.as_str() {
            "schema:table" => raw.table = Some(directive),
            "schema:index" => raw.indexes.push(directive),
            "schema:rls:enable" => raw.rls_enable = Some(directive),
            "schema:rls:policy" => raw.rls_policies.push(directive),
            "schema:extension" => result.extensions.push(directive),
            other => result
                .warnings
                .push(format!("{name}: unrecognized directive category '{other}' on struct")),
        }
    }

    if let Fields::Named(named) = &item_struct.fields {
        for field in &named.named {
            let Some(ident) = &field.ident else { continue };
            let field_name = ident.to_string();
            let location = format!("{name}.{field_name}");
            let directives = directives_from_attrs(&field.attrs, &location)?
                .into_iter()
                .filter(|d| {
                    let recognized = matches!(d.category.as_str(), "schema:field" | "embedded");
                    if !recognized {
                        result
                            .warnings
                            .push(format!("{location}: unrecognized directive category '{}'", d.category));
                    }
                    recognized
                })
                .collect();
            raw.fields.push(RawField {
                name: field_name,
                directives
            });
        }
    }

    result.structs.insert(name, raw);
    Ok(())
}

fn item_attrs(item: &Item) -> Option<&[syn::Attribute]> {
    match item {
        Item::Enum(i) => Some(&i.attrs),
        Item::Mod(i) => Some(&i.attrs),
        Item::Const(i) => Some(&i.attrs),
        Item::Static(i) => Some(&i.attrs),
        Item::Fn(i) => Some(&i.attrs),
        _ => None
    }
}

/// Extract every doc-comment line from `attrs` and parse each as a
/// directive, skipping lines that are not directives at all.
fn directives_from_attrs(attrs: &[syn::Attribute], location: &str) -> Result<Vec<Directive>> {
    let mut out = Vec::new();
    for line in doc_lines(attrs) {
        match directive::parse_line(&line, location) {
            Ok(Some(d)) => out.push(d),
            Ok(None) => {}
            Err(err) => return Err(err)
        }
    }
    Ok(out)
}

fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s), ..
                }) => Some(s.value()),
                _ => None
            },
            _ => None
        })
        .collect()
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
    fn scans_a_table_with_two_fields() {
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
        let mut result = ScanResult::default();
        scan_file(file.path(), &mut result).unwrap();

        let user = result.structs.get("User").unwrap();
        assert_eq!(user.table.as_ref().unwrap().get("name"), Some("users"));
        assert_eq!(user.fields.len(), 2);
        assert_eq!(user.fields[0].name, "id");
    }

    #[test]
    fn unrecognized_directive_category_is_a_warning_not_an_error() {
        let src = r#"
/// migrator:schema:bogus name="x"
struct Thing {
    id: i64,
}
"#;
        let file = write_source(src);
        let mut result = ScanResult::default();
        scan_file(file.path(), &mut result).unwrap();
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn unreadable_source_is_fatal() {
        let mut result = ScanResult::default();
        let err = scan_file(Path::new("/nonexistent/path/does/not/exist.rs"), &mut result).unwrap_err();
        assert!(matches!(err, Error::UnreadableSource { .. }));
    }

    #[test]
    fn malformed_directive_is_fatal() {
        let src = r#"
/// migrator:schema:table name="unterminated
struct Broken {
    id: i64,
}
"#;
        let file = write_source(src);
        let mut result = ScanResult::default();
        let err = scan_file(file.path(), &mut result).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn schema_extension_directive_is_captured_globally() {
        let src = r#"
/// migrator:schema:extension name="pgcrypto" if_not_exists="true"
const _PGCRYPTO: () = ();
"#;
        let file = write_source(src);
        let mut result = ScanResult::default();
        scan_file(file.path(), &mut result).unwrap();
        assert_eq!(result.extensions.len(), 1);
        assert_eq!(result.extensions[0].get("name"), Some("pgcrypto"));
    }
}
