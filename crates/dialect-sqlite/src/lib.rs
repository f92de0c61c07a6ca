//! SQLite [`Grammar`] implementation: double-quoted identifiers, `?`
//! placeholders, no row-level locking (SQLite serializes at the file
//! level), `INTEGER PRIMARY KEY AUTOINCREMENT` wired through the shared
//! blueprint compiler's `primary` flag rather than a column suffix. Thin
//! wrapper over `quarry_core::grammar::shared`.

#[cfg(feature = "live")]
mod adapter;

use quarry_core::builder::QueryBuilder;
use quarry_core::expr::LockMode;
use quarry_core::grammar::{rewrite_placeholders, shared, Grammar};
use quarry_core::ident::{Ident, TableRef};
use quarry_core::migration::ColumnType;
use quarry_core::value::Value;

#[cfg(feature = "live")]
pub use adapter::connect;

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteGrammar;

const DIALECT_NAME: &str = "sqlite";

impl Grammar for SqliteGrammar {
    fn name(&self) -> &'static str {
        DIALECT_NAME
    }

    fn quote_ident(&self, ident: &Ident) -> String {
        format!("\"{}\"", ident.0.replace('"', "\"\""))
    }

    /// SQLite has no row-level locking; every writer serializes on the
    /// database file, so `FOR UPDATE`/shared-lock syntax has no SQLite
    /// equivalent.
    fn lock_clause(&self, _mode: LockMode) -> &'static str {
        ""
    }

    fn compile_select(&self, builder: &QueryBuilder) -> (String, Vec<Value>) {
        shared::compile_select(self, builder)
    }

    fn compile_insert(&self, table: &TableRef, values: &[(String, Value)]) -> (String, Vec<Value>) {
        shared::compile_insert(self, table, values)
    }

    fn compile_bulk_insert(&self, table: &TableRef, rows: &[Vec<(String, Value)>]) -> (String, Vec<Value>) {
        shared::compile_bulk_insert(self, table, rows)
    }

    fn compile_update(&self, builder: &QueryBuilder, values: &[(String, Value)]) -> (String, Vec<Value>) {
        shared::compile_update(self, builder, values)
    }

    fn compile_delete(&self, builder: &QueryBuilder) -> (String, Vec<Value>) {
        shared::compile_delete(self, builder)
    }

    fn compile_insert_or_ignore(&self, table: &TableRef, values: &[(String, Value)]) -> (String, Vec<Value>) {
        let (sql, _names, bindings) = shared::insert_fragment(self, table, values);
        let sql = format!("{sql} ON CONFLICT DO NOTHING");
        (rewrite_placeholders(self, &sql), bindings)
    }

    fn compile_upsert(
        &self,
        table: &TableRef,
        values: &[(String, Value)],
        unique_by: &[String],
        update_columns: &[String],
    ) -> (String, Vec<Value>) {
        let (sql, _names, bindings) = shared::insert_fragment(self, table, values);
        let conflict_target: Vec<String> = unique_by.iter().map(|c| self.quote_ident(&Ident::new(c.clone()))).collect();
        let assignments: Vec<String> = update_columns
            .iter()
            .map(|c| {
                let quoted = self.quote_ident(&Ident::new(c.clone()));
                format!("{quoted} = EXCLUDED.{quoted}")
            })
            .collect();
        let sql = format!(
            "{sql} ON CONFLICT ({}) DO UPDATE SET {}",
            conflict_target.join(", "),
            assignments.join(", ")
        );
        (rewrite_placeholders(self, &sql), bindings)
    }

    fn compile_truncate(&self, table: &TableRef, _foreign_keys: bool) -> String {
        format!("DELETE FROM {}", self.quote_ident(&table.name))
    }

    fn column_type_sql(&self, data_type: &ColumnType) -> String {
        match data_type {
            ColumnType::Increments | ColumnType::BigIncrements => "INTEGER".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInteger => "INTEGER".to_string(),
            ColumnType::String(len) => format!("VARCHAR({len})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "DATETIME".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::Json => "TEXT".to_string(),
            ColumnType::Uuid => "TEXT".to_string(),
            ColumnType::Binary => "BLOB".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_uses_delete_from() {
        let table = TableRef::new("users");
        assert_eq!(SqliteGrammar.compile_truncate(&table, false), "DELETE FROM \"users\"");
    }

    #[test]
    fn lock_clause_is_always_empty() {
        assert_eq!(SqliteGrammar.lock_clause(LockMode::Update), "");
    }

    #[test]
    fn increments_compiles_to_integer() {
        assert_eq!(SqliteGrammar.column_type_sql(&ColumnType::Increments), "INTEGER");
    }

    #[test]
    fn insert_or_ignore_emits_on_conflict_do_nothing() {
        let table = TableRef::new("users");
        let values = vec![("email".to_string(), Value::Text("a@example.com".to_string()))];
        let (sql, bindings) = SqliteGrammar.compile_insert_or_ignore(&table, &values);
        assert_eq!(sql, "INSERT INTO \"users\" (\"email\") VALUES (?) ON CONFLICT DO NOTHING");
        assert_eq!(bindings, vec![Value::Text("a@example.com".to_string())]);
    }

    #[test]
    fn upsert_updates_from_excluded_on_conflict() {
        let table = TableRef::new("users");
        let values = vec![
            ("email".to_string(), Value::Text("a@example.com".to_string())),
            ("name".to_string(), Value::Text("Ada".to_string())),
        ];
        let (sql, bindings) = SqliteGrammar.compile_upsert(
            &table,
            &values,
            &["email".to_string()],
            &["name".to_string()],
        );
        assert_eq!(
            sql,
            "INSERT INTO \"users\" (\"email\", \"name\") VALUES (?, ?) ON CONFLICT (\"email\") DO UPDATE SET \"name\" = EXCLUDED.\"name\""
        );
        assert_eq!(bindings.len(), 2);
    }
}
