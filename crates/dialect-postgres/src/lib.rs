//! PostgreSQL [`Grammar`] implementation: `$n` placeholders, double-quoted
//! identifiers, `SERIAL`/`BIGSERIAL` auto-increment columns, `FOR UPDATE`/
//! `FOR SHARE` row locking. Every `compile_*` method delegates to
//! `quarry_core::grammar::shared`; this crate supplies only the syntax
//! Postgres diverges on.

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
pub struct PostgresGrammar;

const DIALECT_NAME: &str = "postgres";

impl Grammar for PostgresGrammar {
    fn name(&self) -> &'static str {
        DIALECT_NAME
    }

    fn quote_ident(&self, ident: &Ident) -> String {
        format!("\"{}\"", ident.0.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn lock_clause(&self, mode: LockMode) -> &'static str {
        match mode {
            LockMode::None => "",
            LockMode::Shared => " FOR SHARE",
            LockMode::Update => " FOR UPDATE",
        }
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

    fn compile_truncate(&self, table: &TableRef, foreign_keys: bool) -> String {
        let quoted = self.quote_ident(&table.name);
        if foreign_keys {
            format!("TRUNCATE TABLE {quoted} CASCADE")
        } else {
            format!("TRUNCATE TABLE {quoted}")
        }
    }

    fn column_type_sql(&self, data_type: &ColumnType) -> String {
        match data_type {
            ColumnType::Increments => "SERIAL".to_string(),
            ColumnType::BigIncrements => "BIGSERIAL".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::String(len) => format!("VARCHAR({len})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Decimal(p, s) => format!("NUMERIC({p}, {s})"),
            ColumnType::Json => "JSONB".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Binary => "BYTEA".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_uses_dollar_placeholders() {
        let builder = QueryBuilder::table("users").where_eq("id", 1i64);
        let (sql, bindings) = PostgresGrammar.compile_select(&builder);
        assert!(sql.contains("$1"), "{sql}");
        assert_eq!(bindings, vec![Value::Integer(1)]);
    }

    #[test]
    fn quote_ident_double_quotes() {
        assert_eq!(PostgresGrammar.quote_ident(&Ident::new("users")), "\"users\"");
    }

    #[test]
    fn increments_compiles_to_serial() {
        assert_eq!(PostgresGrammar.column_type_sql(&ColumnType::Increments), "SERIAL");
    }

    #[test]
    fn insert_or_ignore_emits_on_conflict_do_nothing() {
        let table = TableRef::new("users");
        let values = vec![("email".to_string(), Value::Text("a@example.com".to_string()))];
        let (sql, bindings) = PostgresGrammar.compile_insert_or_ignore(&table, &values);
        assert_eq!(sql, "INSERT INTO \"users\" (\"email\") VALUES ($1) ON CONFLICT DO NOTHING");
        assert_eq!(bindings, vec![Value::Text("a@example.com".to_string())]);
    }

    #[test]
    fn upsert_updates_from_excluded_on_conflict() {
        let table = TableRef::new("users");
        let values = vec![
            ("email".to_string(), Value::Text("a@example.com".to_string())),
            ("name".to_string(), Value::Text("Ada".to_string())),
        ];
        let (sql, bindings) = PostgresGrammar.compile_upsert(
            &table,
            &values,
            &["email".to_string()],
            &["name".to_string()],
        );
        assert_eq!(
            sql,
            "INSERT INTO \"users\" (\"email\", \"name\") VALUES ($1, $2) ON CONFLICT (\"email\") DO UPDATE SET \"name\" = EXCLUDED.\"name\""
        );
        assert_eq!(bindings.len(), 2);
    }
}
