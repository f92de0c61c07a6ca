//! MySQL/MariaDB [`Grammar`] implementation: backtick-quoted identifiers,
//! `?` placeholders (the shared default), `AUTO_INCREMENT` column suffix,
//! `LOCK IN SHARE MODE`/`FOR UPDATE` row locking. Thin wrapper over
//! `quarry_core::grammar::shared`.

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
pub struct MysqlGrammar;

const DIALECT_NAME: &str = "mysql";

impl Grammar for MysqlGrammar {
    fn name(&self) -> &'static str {
        DIALECT_NAME
    }

    fn quote_ident(&self, ident: &Ident) -> String {
        format!("`{}`", ident.0.replace('`', "``"))
    }

    fn lock_clause(&self, mode: LockMode) -> &'static str {
        match mode {
            LockMode::None => "",
            LockMode::Shared => " LOCK IN SHARE MODE",
            LockMode::Update => " FOR UPDATE",
        }
    }

    fn autoincrement_suffix(&self) -> &'static str {
        "AUTO_INCREMENT"
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
        let sql = sql.replacen("INSERT INTO", "INSERT IGNORE INTO", 1);
        (rewrite_placeholders(self, &sql), bindings)
    }

    fn compile_upsert(
        &self,
        table: &TableRef,
        values: &[(String, Value)],
        _unique_by: &[String],
        update_columns: &[String],
    ) -> (String, Vec<Value>) {
        let (sql, _names, bindings) = shared::insert_fragment(self, table, values);
        let assignments: Vec<String> = update_columns
            .iter()
            .map(|c| {
                let quoted = self.quote_ident(&Ident::new(c.clone()));
                format!("{quoted} = VALUES({quoted})")
            })
            .collect();
        let sql = format!("{sql} ON DUPLICATE KEY UPDATE {}", assignments.join(", "));
        (rewrite_placeholders(self, &sql), bindings)
    }

    fn compile_truncate(&self, table: &TableRef, foreign_keys: bool) -> String {
        let quoted = self.quote_ident(&table.name);
        if foreign_keys {
            format!("SET FOREIGN_KEY_CHECKS=0; TRUNCATE TABLE {quoted}; SET FOREIGN_KEY_CHECKS=1")
        } else {
            format!("TRUNCATE TABLE {quoted}")
        }
    }

    fn column_type_sql(&self, data_type: &ColumnType) -> String {
        match data_type {
            ColumnType::Increments => "INT".to_string(),
            ColumnType::BigIncrements => "BIGINT".to_string(),
            ColumnType::Integer => "INT".to_string(),
            ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::String(len) => format!("VARCHAR({len})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Boolean => "TINYINT(1)".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Uuid => "CHAR(36)".to_string(),
            ColumnType::Binary => "BLOB".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_uses_question_mark_placeholders() {
        let builder = QueryBuilder::table("users").where_eq("id", 1i64);
        let (sql, bindings) = MysqlGrammar.compile_select(&builder);
        assert!(sql.contains('?'), "{sql}");
        assert_eq!(bindings, vec![Value::Integer(1)]);
    }

    #[test]
    fn quote_ident_uses_backticks() {
        assert_eq!(MysqlGrammar.quote_ident(&Ident::new("users")), "`users`");
    }

    #[test]
    fn increments_compiles_to_int_with_autoincrement_suffix() {
        assert_eq!(MysqlGrammar.column_type_sql(&ColumnType::Increments), "INT");
        assert_eq!(MysqlGrammar.autoincrement_suffix(), "AUTO_INCREMENT");
    }

    #[test]
    fn insert_or_ignore_uses_the_ignore_keyword() {
        let table = TableRef::new("users");
        let values = vec![("email".to_string(), Value::Text("a@example.com".to_string()))];
        let (sql, bindings) = MysqlGrammar.compile_insert_or_ignore(&table, &values);
        assert_eq!(sql, "INSERT IGNORE INTO `users` (`email`) VALUES (?)");
        assert_eq!(bindings, vec![Value::Text("a@example.com".to_string())]);
    }

    #[test]
    fn upsert_updates_from_values_on_duplicate_key() {
        let table = TableRef::new("users");
        let values = vec![
            ("email".to_string(), Value::Text("a@example.com".to_string())),
            ("name".to_string(), Value::Text("Ada".to_string())),
        ];
        let (sql, bindings) = MysqlGrammar.compile_upsert(
            &table,
            &values,
            &["email".to_string()],
            &["name".to_string()],
        );
        assert_eq!(
            sql,
            "INSERT INTO `users` (`email`, `name`) VALUES (?, ?) ON DUPLICATE KEY UPDATE `name` = VALUES(`name`)"
        );
        assert_eq!(bindings.len(), 2);
    }
}
