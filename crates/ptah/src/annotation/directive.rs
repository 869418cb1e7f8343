//! Parsing of a single `migrator: ...` directive line into a category
//! and a `key="value"` argument map.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

const PREFIX: &str = "migrator:";

/// One parsed directive: a category name (`schema:table`,
/// `schema:field`, `schema:index`, `schema:rls:enable`,
/// `schema:rls:policy`, `embedded`, `schema:extension`) plus its
/// `key="value"` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive category, e.g. `"schema:table"`.
    pub category: String,
    /// Parsed arguments, keyed by argument name.
    pub args: BTreeMap<String, String>
}

impl Directive {
    /// Build a directive directly from a category and argument map,
    /// bypassing line parsing. Used to synthesize a `schema:field`-shaped
    /// directive out of an `embedded` directive during relation
    /// resolution.
    pub fn new(category: impl Into<String>, args: BTreeMap<String, String>) -> Self {
        Self {
            category: category.into(),
            args
        }
    }

    /// Look up a required argument, raising a [`Error::Parse`] tagged
    /// with `location` if it is absent.
    pub fn require(&self, key: &str, location: &str) -> Result<&str> {
        self.args
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::parse(location, format!("directive {} is missing required key {key}", self.category)))
    }

    /// Look up an optional argument.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }

    /// Parse a `bool`-valued argument (`"true"`/`"false"`), defaulting
    /// to `false` when absent.
    pub fn flag(&self, key: &str) -> bool {
        self.args.get(key).map(|v| v == "true").unwrap_or(false)
    }

    /// Split a comma-list argument into its trimmed, non-empty parts.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.args
            .get(key)
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
            .unwrap_or_default()
    }

    /// Platform overrides namespaced `platform.{dialect}.{key}`,
    /// grouped by dialect.
    pub fn platform_overrides(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let mut out: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (k, v) in &self.args {
            if let Some(rest) = k.strip_prefix("platform.")
                && let Some((dialect, key)) = rest.split_once('.')
            {
                out.entry(dialect.to_string()).or_default().insert(key.to_string(), v.clone());
            }
        }
        out
    }
}

/// Recognize and parse a single doc-comment line as a directive, if
/// its text begins with the `migrator:` namespace prefix.
///
/// Returns `Ok(None)` for lines that are not directives at all (not
/// every doc-comment line is one). Returns `Err` only for a line that
/// *is* namespaced as a directive but is malformed.
pub fn parse_line(line: &str, location: &str) -> Result<Option<Directive>> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix(PREFIX) else {
        return Ok(None);
    };

    let (category, payload) = match rest.split_once(char::is_whitespace) {
        Some((category, payload)) => (category.to_string(), payload),
        None => (rest.trim().to_string(), "")
    };

    if category.is_empty() {
        return Err(Error::parse(location, "directive is missing a category after 'migrator:'"));
    }

    let args = parse_args(payload, location)?;
    Ok(Some(Directive { category, args }))
}

/// Parse a space-separated sequence of `key="value"` pairs, honoring
/// quoted values that may themselves contain spaces.
fn parse_args(payload: &str, location: &str) -> Result<BTreeMap<String, String>> {
    let mut args = BTreeMap::new();
    let chars: Vec<char> = payload.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let key_start = i;
        while i < chars.len() && chars[i] != '=' && !chars[i].is_whitespace() {
            i += 1;
        }
        let key: String = chars[key_start..i].iter().collect();
        if key.is_empty() {
            return Err(Error::parse(location, "expected key=\"value\" pair"));
        }

        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if chars.get(i) != Some(&'=') {
            return Err(Error::parse(location, format!("expected '=' after key {key}")));
        }
        i += 1;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if chars.get(i) != Some(&'"') {
            return Err(Error::parse(location, format!("expected a quoted value for key {key}")));
        }
        i += 1;

        let value_start = i;
        while i < chars.len() && chars[i] != '"' {
            i += 1;
        }
        if i >= chars.len() {
            return Err(Error::parse(location, format!("unterminated quoted value for key {key}")));
        }
        let value: String = chars[value_start..i].iter().collect();
        i += 1;

        args.insert(key, value);
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_directive_lines_are_ignored() {
        assert_eq!(parse_line("just a doc comment", "User").unwrap(), None);
    }

    #[test]
    fn parses_category_and_single_arg() {
        let d = parse_line(r#"migrator:schema:table name="users""#, "User").unwrap().unwrap();
        assert_eq!(d.category, "schema:table");
        assert_eq!(d.get("name"), Some("users"));
    }

    #[test]
    fn parses_multiple_args() {
        let d = parse_line(r#"migrator:schema:field name="id" type="SERIAL" primary="true""#, "User.id")
            .unwrap()
            .unwrap();
        assert_eq!(d.get("name"), Some("id"));
        assert_eq!(d.get("type"), Some("SERIAL"));
        assert!(d.flag("primary"));
    }

    #[test]
    fn parses_value_containing_spaces() {
        let d = parse_line(r#"migrator:schema:table name="users" comment="the users table""#, "User")
            .unwrap()
            .unwrap();
        assert_eq!(d.get("comment"), Some("the users table"));
    }

    #[test]
    fn category_with_no_payload() {
        let d = parse_line("migrator:schema:rls:enable", "User").unwrap().unwrap();
        assert_eq!(d.category, "schema:rls:enable");
        assert!(d.args.is_empty());
    }

    #[test]
    fn rejects_unterminated_value() {
        let err = parse_line(r#"migrator:schema:table name="users"#, "User").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn list_splits_and_trims() {
        let d = parse_line(r#"migrator:schema:table name="t" primary_key="a, b""#, "T").unwrap().unwrap();
        assert_eq!(d.list("primary_key"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn platform_overrides_groups_by_dialect() {
        let d = parse_line(r#"migrator:schema:field name="x" platform.mysql.type="TEXT""#, "T.x")
            .unwrap()
            .unwrap();
        let overrides = d.platform_overrides();
        assert_eq!(overrides.get("mysql").and_then(|m| m.get("type")), Some(&"TEXT".to_string()));
    }
}
