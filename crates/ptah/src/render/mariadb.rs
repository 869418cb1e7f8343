//! MariaDB DDL rendering.
//!
//! MariaDB shares its DDL shape with MySQL entirely; the only
//! difference is the `platform.mariadb.*` override namespace this
//! renderer reads from, kept distinct from `platform.mysql.*` so a
//! schema can diverge between the two forks when it needs to.

use ptah_ast::{Column, Dialect, GlobalEnum, Index, Schema, Table, diff::ModifiedColumn};

use super::{Renderer, mysql, quote_with};
use crate::resolver::Plan;

/// Renders a [`Schema`] as MariaDB DDL.
pub struct MariaDbRenderer;

impl Renderer for MariaDbRenderer {
    fn dialect(&self) -> Dialect {
        Dialect::MariaDb
    }

    fn quote_ident(&self, ident: &str) -> String {
        quote_with(ident, '`')
    }

    fn render_create(&self, schema: &Schema, plan: &Plan) -> Vec<String> {
        mysql::render(Dialect::MariaDb, schema, plan)
    }

    fn render_new_table(&self, schema: &Schema, table: &Table) -> Vec<String> {
        mysql::render_new_table(Dialect::MariaDb, schema, table)
    }

    fn render_enum_create(&self, _e: &GlobalEnum) -> Option<String> {
        None
    }

    fn render_enum_drop(&self, _e: &GlobalEnum) -> Option<String> {
        None
    }

    fn render_drop_table(&self, table: &str) -> String {
        mysql::render_drop_table(table)
    }

    fn render_add_column(&self, table: &str, schema: &Schema, column: &Column) -> String {
        mysql::render_add_column(Dialect::MariaDb, table, schema, column)
    }

    fn render_drop_column(&self, table: &str, column: &str) -> String {
        mysql::render_drop_column(table, column)
    }

    fn render_alter_column(&self, table: &str, schema: &Schema, modified: &ModifiedColumn) -> Vec<String> {
        mysql::render_alter_column(Dialect::MariaDb, table, schema, modified)
    }

    fn render_index_create(&self, index: &Index) -> String {
        mysql::render_index(Dialect::MariaDb, index)
    }

    fn render_index_drop(&self, index: &Index) -> String {
        mysql::render_index_drop(index)
    }
}
