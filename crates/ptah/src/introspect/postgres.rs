//! PostgreSQL catalog introspection.

use ptah_ast::{
    Column, GlobalEnum, Index, Schema, Table,
    index::IndexColumn,
    table::RowLevelSecurity
};
use sqlx::{PgPool, Row};

use super::parse_default;
use crate::error::Result;

/// Read every base table, its columns, primary key, unique columns,
/// non-primary indexes, and every enum type in the catalog's `public`
/// schema.
pub async fn introspect(pool: &PgPool) -> Result<Schema> {
    let mut schema = Schema::new();

    for e in fetch_enums(pool).await? {
        // Enum names collide only if the catalog itself is
        // inconsistent; a duplicate here would mean `pg_enum` returned
        // the same type twice, which `add_enum` would reject loudly
        // rather than silently drop.
        schema.add_enum(e)?;
    }

    for table_name in fetch_table_names(pool).await? {
        let table = fetch_table(pool, &table_name).await?;
        schema.add_table(table)?;
    }

    Ok(schema)
}

async fn fetch_table_names(pool: &PgPool) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
         ORDER BY table_name"
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(|r| r.get::<String, _>("table_name")).collect())
}

async fn fetch_table(pool: &PgPool, name: &str) -> Result<Table> {
    let primary_key = fetch_primary_key_columns(pool, name).await?;
    let unique_columns = fetch_unique_columns(pool, name).await?;
    let columns = fetch_columns(pool, name, &primary_key, &unique_columns).await?;
    let indexes = fetch_indexes(pool, name).await?;

    tracing::debug!(table = name, "introspected table");

    Ok(Table {
        origin: String::new(),
        name: name.to_string(),
        columns,
        constraints: Vec::new(),
        indexes,
        options: Default::default(),
        rls: RowLevelSecurity::default(),
        comment: None
    })
}

async fn fetch_primary_key_columns(pool: &PgPool, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT kcu.column_name FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
           ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
         WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = 'public' AND tc.table_name = $1 \
         ORDER BY kcu.ordinal_position"
    )
    .bind(table)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(|r| r.get::<String, _>("column_name")).collect())
}

/// Columns covered by a single-column UNIQUE constraint. A
/// multi-column unique constraint is not reflected back onto any one
/// column's `is_unique` flag — that would misrepresent it as N
/// independent single-column constraints.
async fn fetch_unique_columns(pool: &PgPool, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT kcu.column_name FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
           ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema \
         WHERE tc.constraint_type = 'UNIQUE' AND tc.table_schema = 'public' AND tc.table_name = $1 \
         GROUP BY kcu.constraint_name, kcu.column_name HAVING count(*) OVER (PARTITION BY kcu.constraint_name) = 1"
    )
    .bind(table)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(|r| r.get::<String, _>("column_name")).collect())
}

async fn fetch_columns(pool: &PgPool, table: &str, primary_key: &[String], unique_columns: &[String]) -> Result<Vec<Column>> {
    let rows = sqlx::query(
        "SELECT column_name, data_type, udt_name, is_nullable, column_default, \
                character_maximum_length, numeric_precision, numeric_scale \
         FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name = $1 \
         ORDER BY ordinal_position"
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.get("column_name");
        let data_type: String = row.get("data_type");
        let udt_name: String = row.get("udt_name");
        let is_nullable: String = row.get("is_nullable");
        let default: Option<String> = row.get("column_default");
        let char_len: Option<i32> = row.get("character_maximum_length");
        let numeric_precision: Option<i32> = row.get("numeric_precision");
        let numeric_scale: Option<i32> = row.get("numeric_scale");

        let is_primary = primary_key.iter().any(|c| c == &name);
        let is_serial_default = default.as_deref().is_some_and(|d| d.starts_with("nextval("));

        let (base_type, enum_ref) = column_type(&data_type, &udt_name, char_len, numeric_precision, numeric_scale, is_serial_default);

        columns.push(Column {
            name: name.clone(),
            base_type,
            nullable: is_nullable == "YES",
            default: if is_serial_default { None } else { default.as_deref().map(parse_default) },
            check: None,
            platform_overrides: Default::default(),
            comment: None,
            foreign_key: None,
            enum_ref,
            is_primary,
            is_unique: unique_columns.iter().any(|c| c == &name),
            auto_increment: is_serial_default
        });
    }
    Ok(columns)
}

fn column_type(
    data_type: &str,
    udt_name: &str,
    char_len: Option<i32>,
    numeric_precision: Option<i32>,
    numeric_scale: Option<i32>,
    is_serial: bool
) -> (String, Option<String>) {
    if is_serial {
        return (if data_type == "bigint" { "BIGSERIAL".to_string() } else { "SERIAL".to_string() }, None);
    }
    match data_type {
        "USER-DEFINED" => (udt_name.to_string(), Some(udt_name.to_string())),
        "character varying" => (char_len.map(|n| format!("VARCHAR({n})")).unwrap_or_else(|| "VARCHAR".to_string()), None),
        "character" => (char_len.map(|n| format!("CHAR({n})")).unwrap_or_else(|| "CHAR".to_string()), None),
        "numeric" => match (numeric_precision, numeric_scale) {
            (Some(p), Some(s)) => (format!("NUMERIC({p},{s})"), None),
            (Some(p), None) => (format!("NUMERIC({p})"), None),
            _ => ("NUMERIC".to_string(), None)
        },
        "timestamp with time zone" => ("TIMESTAMPTZ".to_string(), None),
        "timestamp without time zone" => ("TIMESTAMP".to_string(), None),
        "integer" => ("INTEGER".to_string(), None),
        "bigint" => ("BIGINT".to_string(), None),
        "smallint" => ("SMALLINT".to_string(), None),
        "boolean" => ("BOOLEAN".to_string(), None),
        "text" => ("TEXT".to_string(), None),
        "jsonb" => ("JSONB".to_string(), None),
        "json" => ("JSON".to_string(), None),
        "uuid" => ("UUID".to_string(), None),
        other => (other.to_ascii_uppercase(), None)
    }
}

/// Every non-primary-key index on `table`: name, member columns in
/// index order, and uniqueness. The primary key's own implicit index
/// is excluded since it is already represented as a primary-key
/// membership flag on its columns.
async fn fetch_indexes(pool: &PgPool, table: &str) -> Result<Vec<Index>> {
    let rows = sqlx::query(
        "SELECT i.relname AS index_name, a.attname AS column_name, ix.indisunique AS is_unique, \
                array_position(ix.indkey, a.attnum) AS position \
         FROM pg_class t \
         JOIN pg_index ix ON t.oid = ix.indrelid \
         JOIN pg_class i ON i.oid = ix.indexrelid \
         JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
         WHERE t.relname = $1 AND t.relkind = 'r' AND NOT ix.indisprimary \
         ORDER BY i.relname, position"
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    let mut indexes: Vec<Index> = Vec::new();
    for row in rows {
        let index_name: String = row.get("index_name");
        let column_name: String = row.get("column_name");
        let is_unique: bool = row.get("is_unique");

        if let Some(existing) = indexes.iter_mut().find(|i: &&mut Index| i.name == index_name) {
            existing.columns.push(IndexColumn::ascending(column_name));
        } else {
            indexes.push(Index {
                name: index_name,
                table: table.to_string(),
                columns: vec![IndexColumn::ascending(column_name)],
                unique: is_unique,
                kind: Default::default(),
                predicate: None,
                comment: None
            });
        }
    }
    Ok(indexes)
}

async fn fetch_enums(pool: &PgPool) -> Result<Vec<GlobalEnum>> {
    let rows = sqlx::query(
        "SELECT t.typname AS enum_name, e.enumlabel AS value \
         FROM pg_type t JOIN pg_enum e ON t.oid = e.enumtypid \
         JOIN pg_namespace n ON n.oid = t.typnamespace \
         WHERE n.nspname = 'public' \
         ORDER BY t.typname, e.enumsortorder"
    )
    .fetch_all(pool)
    .await?;

    let mut enums: Vec<GlobalEnum> = Vec::new();
    for row in rows {
        let name: String = row.get("enum_name");
        let value: String = row.get("value");
        if let Some(existing) = enums.iter_mut().find(|e: &&mut GlobalEnum| e.name == name) {
            existing.values.push(value);
        } else {
            enums.push(GlobalEnum { name, values: vec![value] });
        }
    }
    Ok(enums)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_default_is_recognized_as_auto_increment() {
        let (base_type, _) = column_type("integer", "int4", None, None, None, true);
        assert_eq!(base_type, "SERIAL");
    }

    #[test]
    fn bigint_serial_renders_bigserial() {
        let (base_type, _) = column_type("bigint", "int8", None, None, None, true);
        assert_eq!(base_type, "BIGSERIAL");
    }

    #[test]
    fn varchar_length_is_preserved() {
        let (base_type, _) = column_type("character varying", "varchar", Some(255), None, None, false);
        assert_eq!(base_type, "VARCHAR(255)");
    }

    #[test]
    fn enum_column_reports_udt_as_base_type_and_enum_ref() {
        let (base_type, enum_ref) = column_type("USER-DEFINED", "enum_users_status", None, None, None, false);
        assert_eq!(base_type, "enum_users_status");
        assert_eq!(enum_ref, Some("enum_users_status".to_string()));
    }
}
