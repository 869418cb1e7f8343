//! MySQL/MariaDB catalog introspection. Both speak the same
//! `information_schema` shape, so one implementation serves the
//! `Dialect::MySql`/`Dialect::MariaDb` pair; the dialect parameter only
//! feeds the enum-naming convention and log context.

use ptah_ast::{
    Column, Dialect, GlobalEnum, Index, Schema, Table,
    column::ColumnDefault,
    index::IndexColumn,
    table::RowLevelSecurity
};
use sqlx::{MySqlPool, Row};

use super::parse_default;
use crate::error::Result;

/// Read every table, its columns (including inline `ENUM(...)`
/// columns, which the MySQL family never declares as a named catalog
/// type), and its non-primary indexes from the connection's default
/// database.
pub async fn introspect(pool: &MySqlPool, dialect: Dialect) -> Result<Schema> {
    let mut schema = Schema::new();

    for table_name in fetch_table_names(pool).await? {
        let (table, enums) = fetch_table(pool, &table_name, dialect).await?;
        for e in enums {
            if schema.enum_by_name(&e.name).is_none() {
                schema.add_enum(e)?;
            }
        }
        schema.add_table(table)?;
    }

    Ok(schema)
}

async fn fetch_table_names(pool: &MySqlPool) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
         ORDER BY table_name"
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(|r| r.get::<String, _>("table_name")).collect())
}

async fn fetch_table(pool: &MySqlPool, name: &str, dialect: Dialect) -> Result<(Table, Vec<GlobalEnum>)> {
    let (columns, enums) = fetch_columns(pool, name, dialect).await?;
    let indexes = fetch_indexes(pool, name).await?;

    tracing::debug!(table = name, dialect = %dialect, "introspected table");

    let table = Table {
        origin: String::new(),
        name: name.to_string(),
        columns,
        constraints: Vec::new(),
        indexes,
        options: Default::default(),
        rls: RowLevelSecurity::default(),
        comment: None
    };
    Ok((table, enums))
}

async fn fetch_columns(pool: &MySqlPool, table: &str, dialect: Dialect) -> Result<(Vec<Column>, Vec<GlobalEnum>)> {
    let rows = sqlx::query(
        "SELECT column_name, data_type, column_type, is_nullable, column_default, \
                column_key, extra, column_comment \
         FROM information_schema.columns \
         WHERE table_schema = DATABASE() AND table_name = ? \
         ORDER BY ordinal_position"
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    let mut columns = Vec::with_capacity(rows.len());
    let mut enums = Vec::new();

    for row in rows {
        let name: String = row.get("column_name");
        let data_type: String = row.get("data_type");
        let column_type: String = row.get("column_type");
        let is_nullable: String = row.get("is_nullable");
        let default: Option<String> = row.get("column_default");
        let column_key: String = row.get("column_key");
        let extra: String = row.get("extra");
        let comment: String = row.get("column_comment");

        let auto_increment = extra.contains("auto_increment");
        let is_primary = column_key == "PRI";
        let is_unique = column_key == "UNI";

        let (base_type, enum_ref) = if data_type.eq_ignore_ascii_case("enum") {
            let values = parse_enum_values(&column_type);
            let enum_name = GlobalEnum::canonical_name(table, &name);
            enums.push(GlobalEnum {
                name: enum_name.clone(),
                values
            });
            (enum_name.clone(), Some(enum_name))
        } else {
            (column_type.to_ascii_uppercase(), None)
        };

        columns.push(Column {
            name,
            base_type,
            nullable: is_nullable.eq_ignore_ascii_case("YES"),
            default: default.as_deref().map(parse_mysql_default),
            check: None,
            platform_overrides: Default::default(),
            comment: (!comment.is_empty()).then_some(comment),
            foreign_key: None,
            enum_ref,
            is_primary,
            is_unique,
            auto_increment
        });
    }

    tracing::trace!(dialect = %dialect, table, enum_count = enums.len(), "introspected enum columns");
    Ok((columns, enums))
}

/// MySQL's `information_schema.columns.column_default` is a bare
/// string with no cast suffix to strip (unlike PostgreSQL's), but
/// still needs literal-vs-expression classification.
fn parse_mysql_default(raw: &str) -> ColumnDefault {
    if raw.eq_ignore_ascii_case("NULL") {
        return ColumnDefault::Expression("NULL".to_string());
    }
    parse_default(raw)
}

/// Parse `enum('a','b','c')` (MySQL's `COLUMN_TYPE` rendering of an
/// inline enum) into its ordered value list.
fn parse_enum_values(column_type: &str) -> Vec<String> {
    let inner = column_type
        .strip_prefix("enum(")
        .or_else(|| column_type.strip_prefix("ENUM("))
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or("");
    inner
        .split(',')
        .map(|v| v.trim().trim_matches('\'').replace("''", "'"))
        .filter(|v| !v.is_empty())
        .collect()
}

/// Non-primary indexes, grouped from `information_schema.statistics`
/// rows (one row per member column).
async fn fetch_indexes(pool: &MySqlPool, table: &str) -> Result<Vec<Index>> {
    let rows = sqlx::query(
        "SELECT index_name, column_name, non_unique, seq_in_index \
         FROM information_schema.statistics \
         WHERE table_schema = DATABASE() AND table_name = ? AND index_name != 'PRIMARY' \
         ORDER BY index_name, seq_in_index"
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    let mut indexes: Vec<Index> = Vec::new();
    for row in rows {
        let index_name: String = row.get("index_name");
        let column_name: String = row.get("column_name");
        let non_unique: i64 = row.get("non_unique");

        if let Some(existing) = indexes.iter_mut().find(|i: &&mut Index| i.name == index_name) {
            existing.columns.push(IndexColumn::ascending(column_name));
        } else {
            indexes.push(Index {
                name: index_name,
                table: table.to_string(),
                columns: vec![IndexColumn::ascending(column_name)],
                unique: non_unique == 0,
                kind: Default::default(),
                predicate: None,
                comment: None
            });
        }
    }
    Ok(indexes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_enum_values_splits_and_unquotes() {
        assert_eq!(
            parse_enum_values("enum('active','inactive')"),
            vec!["active".to_string(), "inactive".to_string()]
        );
    }

    #[test]
    fn parse_enum_values_handles_escaped_quote() {
        assert_eq!(parse_enum_values("enum('can''t')"), vec!["can't".to_string()]);
    }

    #[test]
    fn parse_mysql_default_treats_bare_null_as_expression() {
        assert_eq!(parse_mysql_default("NULL"), ColumnDefault::Expression("NULL".to_string()));
    }

    #[test]
    fn parse_mysql_default_treats_quoted_value_as_literal() {
        assert_eq!(parse_mysql_default("'pending'"), ColumnDefault::Literal("pending".to_string()));
    }
}
