//! End-to-end exercises of the properties and concrete scenarios
//! from spec §8, driven entirely against an in-memory scanned source
//! tree — no live database required. Database-dependent properties
//! (introspection fidelity, applied-up/applied-down round trips) live
//! in `migration_lifecycle.rs`, gated behind `DATABASE_URL`.

use std::{fs, path::Path};

use ptah::{build_desired_schema, differ, generator, render, render::Renderer, resolver};

fn write_tree(dir: &Path, files: &[(&str, &str)]) {
    for (name, contents) in files {
        fs::write(dir.join(name), contents).expect("write fixture source file");
    }
}

/// Scenario 1: a minimal table with a SERIAL primary key and a unique
/// NOT NULL column renders byte-exactly.
#[test]
fn scenario_minimal_table_renders_expected_postgres_ddl() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[(
            "user.rs",
            r#"
/// migrator:schema:table name="users"
struct User {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="email" type="VARCHAR(255)" not_null="true" unique="true"
    email: String,
}
"#
        )]
    );

    let (schema, warnings) = build_desired_schema(dir.path()).unwrap();
    assert!(warnings.is_empty());

    let plan = resolver::resolve(&schema.dependencies);
    let stmts = render::PostgresRenderer.render_create(&schema, &plan);

    assert_eq!(stmts, vec!["CREATE TABLE users (id SERIAL PRIMARY KEY, email VARCHAR(255) NOT NULL UNIQUE);".to_string()]);
}

/// Scenario 2: enum lowering renders a leading CREATE TYPE on
/// PostgreSQL and an inline ENUM(...) column with no CREATE TYPE on
/// MySQL.
#[test]
fn scenario_enum_lowering_differs_by_dialect() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[(
            "user.rs",
            r#"
/// migrator:schema:table name="users"
struct User {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="status" type="ENUM" enum="active,inactive"
    status: String,
}
"#
        )]
    );

    let (schema, _) = build_desired_schema(dir.path()).unwrap();
    let plan = resolver::resolve(&schema.dependencies);

    let pg_stmts = render::PostgresRenderer.render_create(&schema, &plan);
    assert_eq!(pg_stmts[0], "CREATE TYPE enum_users_status AS ENUM ('active', 'inactive');");
    assert!(pg_stmts[1].contains("status enum_users_status"));

    let mysql_stmts = render::MySqlRenderer.render_create(&schema, &plan);
    assert!(mysql_stmts.iter().all(|s| !s.starts_with("CREATE TYPE")));
    assert!(mysql_stmts[0].contains("status ENUM('active','inactive')"));
}

/// Scenario 3: dependency ordering places referenced tables before
/// referencing ones, and a self-referencing table appears exactly
/// once regardless of where it sits in the source tree.
#[test]
fn scenario_dependency_ordering_across_multiple_tables() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            (
                "users.rs",
                r#"
/// migrator:schema:table name="users"
struct User {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
}
"#
            ),
            (
                "articles.rs",
                r#"
/// migrator:schema:table name="articles"
struct Article {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="user_id" type="INTEGER" foreign="users(id)"
    user_id: i64,
}
"#
            ),
            (
                "categories.rs",
                r#"
/// migrator:schema:table name="categories"
struct Category {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="parent_id" type="INTEGER" foreign="categories(id)"
    parent_id: i64,
}
"#
            ),
            (
                "products.rs",
                r#"
/// migrator:schema:table name="products"
struct Product {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="category_id" type="INTEGER" foreign="categories(id)"
    category_id: i64,
}
"#
            ),
        ]
    );

    let (schema, _) = build_desired_schema(dir.path()).unwrap();
    let plan = resolver::resolve(&schema.dependencies);

    let pos = |name: &str| plan.order.iter().position(|n| n == name).unwrap();
    assert!(pos("users") < pos("articles"));
    assert!(pos("categories") < pos("products"));
    assert_eq!(plan.order.iter().filter(|n| *n == "categories").count(), 1);
}

/// Scenario 4: an inline-mode embedded struct splices its fields into
/// the host table.
#[test]
fn scenario_embedded_inline_splices_fields_into_host_table() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[(
            "article.rs",
            r#"
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
"#
        )]
    );

    let (schema, _) = build_desired_schema(dir.path()).unwrap();
    let articles = schema.table("articles").unwrap();
    assert!(articles.column("created_at").is_some());
    assert!(articles.column("updated_at").is_some());
}

/// Scenario 5: diffing an actual schema missing one column against a
/// desired schema that adds it yields exactly one ADD COLUMN
/// statement; re-diffing after applying it conceptually (by diffing
/// desired against itself) yields nothing further.
#[test]
fn scenario_diff_and_generate_minimal_column_addition() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[(
            "user.rs",
            r#"
/// migrator:schema:table name="users"
struct User {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="email" type="VARCHAR(255)" not_null="true"
    email: String,
    /// migrator:schema:field name="name" type="VARCHAR(100)" not_null="true"
    name: String,
}
"#
        )]
    );
    let (desired, _) = build_desired_schema(dir.path()).unwrap();

    let actual_dir = tempfile::tempdir().unwrap();
    write_tree(
        actual_dir.path(),
        &[(
            "user.rs",
            r#"
/// migrator:schema:table name="users"
struct User {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="email" type="VARCHAR(255)" not_null="true"
    email: String,
}
"#
        )]
    );
    let (actual, _) = build_desired_schema(actual_dir.path()).unwrap();

    let diff = differ::diff(&desired, &actual);
    let stmts = generator::generate(&diff, &desired, &render::PostgresRenderer, true);
    assert_eq!(stmts, vec!["ALTER TABLE users ADD COLUMN name VARCHAR(100) NOT NULL;".to_string()]);

    // diff(desired, desired) is empty: the differ is idempotent.
    assert!(differ::diff(&desired, &desired).is_empty());
}

/// Universal invariant: the differ is idempotent for every schema,
/// not just the fixture above.
#[test]
fn differ_is_idempotent_for_multi_table_schema() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            (
                "users.rs",
                r#"
/// migrator:schema:table name="users"
struct User {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="status" type="ENUM" enum="active,inactive"
    status: String,
}
"#
            ),
            (
                "articles.rs",
                r#"
/// migrator:schema:table name="articles"
/// migrator:schema:index name="idx_articles_user_id" fields="user_id"
struct Article {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="user_id" type="INTEGER" foreign="users(id)"
    user_id: i64,
}
"#
            ),
        ]
    );

    let (schema, _) = build_desired_schema(dir.path()).unwrap();
    assert!(differ::diff(&schema, &schema).is_empty());
}

/// Universal invariant: for every foreign-key edge in the creation
/// order (excluding SCC back-edges, none of which occur in this
/// fixture), the referenced table precedes the referencing table.
#[test]
fn creation_order_respects_every_foreign_key_edge() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            (
                "users.rs",
                r#"
/// migrator:schema:table name="users"
struct User {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
}
"#
            ),
            (
                "articles.rs",
                r#"
/// migrator:schema:table name="articles"
struct Article {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="author_id" type="INTEGER" foreign="users(id)"
    author_id: i64,
}
"#
            ),
            (
                "comments.rs",
                r#"
/// migrator:schema:table name="comments"
struct Comment {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="article_id" type="INTEGER" foreign="articles(id)"
    article_id: i64,
}
"#
            ),
        ]
    );

    let (schema, _) = build_desired_schema(dir.path()).unwrap();
    let plan = resolver::resolve(&schema.dependencies);
    let deferred: std::collections::BTreeSet<_> = plan.deferred_edges.iter().cloned().collect();

    for table in schema.tables() {
        for referenced in schema.dependencies.references_of(&table.name) {
            if referenced == table.name || deferred.contains(&(table.name.clone(), referenced.to_string())) {
                continue;
            }
            let ref_pos = plan.order.iter().position(|n| n == referenced).unwrap();
            let table_pos = plan.order.iter().position(|n| n == &table.name).unwrap();
            assert!(ref_pos < table_pos, "{referenced} must precede {} in creation order", table.name);
        }
    }
}

/// Universal invariant: generating DDL for the same schema twice
/// produces byte-identical output (the generator and renderers carry
/// no hidden non-deterministic state).
#[test]
fn render_create_is_deterministic_across_invocations() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[(
            "user.rs",
            r#"
/// migrator:schema:table name="users"
struct User {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="status" type="ENUM" enum="active,inactive"
    status: String,
}
"#
        )]
    );

    let (schema, _) = build_desired_schema(dir.path()).unwrap();
    let plan = resolver::resolve(&schema.dependencies);

    let first = render::PostgresRenderer.render_create(&schema, &plan);
    let second = render::PostgresRenderer.render_create(&schema, &plan);
    assert_eq!(first, second);
}

/// A parse error on one struct's contradictory directives fails the
/// whole parse rather than returning a partial schema (spec §7:
/// ParseError is fatal to the whole parse).
#[test]
fn conflicting_column_defaults_fail_the_whole_parse_not_partially() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[(
            "broken.rs",
            r#"
/// migrator:schema:table name="widgets"
struct Widget {
    /// migrator:schema:field name="id" type="SERIAL" primary="true"
    id: i64,
    /// migrator:schema:field name="x" type="TEXT" default="'a'" default_fn="now()"
    x: String,
}
"#
        )]
    );

    let result = build_desired_schema(dir.path());
    assert!(result.is_err());
}
