//! Microsoft SQL Server [`Grammar`] implementation: bracket-quoted
//! identifiers, `?` placeholders (the shared default), `OFFSET ... ROWS
//! FETCH NEXT ... ROWS ONLY` in place of native `LIMIT`/`OFFSET`, `WITH
//! (UPDLOCK, ROWLOCK)` table hints instead of a trailing lock clause, and
//! a `GO` batch boundary inserted between every blueprint statement.

#[cfg(feature = "live")]
mod adapter;

use quarry_core::builder::QueryBuilder;
use quarry_core::expr::LockMode;
use quarry_core::grammar::{rewrite_placeholders, shared, Grammar};
use quarry_core::ident::{Ident, TableRef};
use quarry_core::migration::{Blueprint, ColumnType};
use quarry_core::statement::Statement;
use quarry_core::value::Value;

#[cfg(feature = "live")]
pub use adapter::connect;

#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlGrammar;

const DIALECT_NAME: &str = "mssql";

impl Grammar for MssqlGrammar {
    fn name(&self) -> &'static str {
        DIALECT_NAME
    }

    fn quote_ident(&self, ident: &Ident) -> String {
        format!("[{}]", ident.0.replace(']', "]]"))
    }

    fn supports_native_limit_offset(&self) -> bool {
        false
    }

    /// MSSQL expresses locking as a table hint rather than a trailing
    /// clause; see [`Self::table_lock_hint`].
    fn lock_clause(&self, _mode: LockMode) -> &'static str {
        ""
    }

    fn table_lock_hint(&self, mode: LockMode) -> &'static str {
        match mode {
            LockMode::None => "",
            LockMode::Shared => "WITH (HOLDLOCK, ROWLOCK)",
            LockMode::Update => "WITH (UPDLOCK, ROWLOCK)",
        }
    }

    fn batch_separator(&self) -> &str {
        "GO\n"
    }

    fn autoincrement_suffix(&self) -> &'static str {
        "IDENTITY(1,1)"
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

    /// MSSQL has no `INSERT IGNORE`/`ON CONFLICT`; a conflict-tolerant
    /// insert is expressed as a `MERGE` whose match predicate compares
    /// every inserted column, since no unique key is given to this method.
    fn compile_insert_or_ignore(&self, table: &TableRef, values: &[(String, Value)]) -> (String, Vec<Value>) {
        let quoted_table = self.quote_ident(&table.name);
        let columns: Vec<String> = values.iter().map(|(c, _)| c.clone()).collect();
        let quoted_columns: Vec<String> = columns.iter().map(|c| self.quote_ident(&Ident::new(c.clone()))).collect();
        let source_columns: Vec<String> = quoted_columns.iter().map(|c| format!("? AS {c}")).collect();
        let bindings: Vec<Value> = values.iter().map(|(_, v)| v.clone()).collect();
        let on_clause = quoted_columns
            .iter()
            .map(|c| format!("target.{c} = source.{c}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let insert_values: Vec<String> = quoted_columns.iter().map(|c| format!("source.{c}")).collect();
        let sql = format!(
            "MERGE INTO {quoted_table} AS target USING (SELECT {}) AS source ON ({on_clause}) \
             WHEN NOT MATCHED THEN INSERT ({}) VALUES ({});",
            source_columns.join(", "),
            quoted_columns.join(", "),
            insert_values.join(", ")
        );
        (rewrite_placeholders(self, &sql), bindings)
    }

    fn compile_upsert(
        &self,
        table: &TableRef,
        values: &[(String, Value)],
        unique_by: &[String],
        update_columns: &[String],
    ) -> (String, Vec<Value>) {
        let quoted_table = self.quote_ident(&table.name);
        let columns: Vec<String> = values.iter().map(|(c, _)| c.clone()).collect();
        let quoted_columns: Vec<String> = columns.iter().map(|c| self.quote_ident(&Ident::new(c.clone()))).collect();
        let source_columns: Vec<String> = quoted_columns.iter().map(|c| format!("? AS {c}")).collect();
        let bindings: Vec<Value> = values.iter().map(|(_, v)| v.clone()).collect();
        let on_clause = unique_by
            .iter()
            .map(|c| {
                let quoted = self.quote_ident(&Ident::new(c.clone()));
                format!("target.{quoted} = source.{quoted}")
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        let update_assignments = update_columns
            .iter()
            .map(|c| {
                let quoted = self.quote_ident(&Ident::new(c.clone()));
                format!("target.{quoted} = source.{quoted}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let insert_values: Vec<String> = quoted_columns.iter().map(|c| format!("source.{c}")).collect();
        let sql = format!(
            "MERGE INTO {quoted_table} AS target USING (SELECT {}) AS source ON ({on_clause}) \
             WHEN MATCHED THEN UPDATE SET {update_assignments} \
             WHEN NOT MATCHED THEN INSERT ({}) VALUES ({});",
            source_columns.join(", "),
            quoted_columns.join(", "),
            insert_values.join(", ")
        );
        (rewrite_placeholders(self, &sql), bindings)
    }

    fn compile_truncate(&self, table: &TableRef, foreign_keys: bool) -> String {
        let quoted = self.quote_ident(&table.name);
        if foreign_keys {
            format!("TRUNCATE TABLE {quoted}")
        } else {
            format!("DELETE FROM {quoted}")
        }
    }

    fn column_type_sql(&self, data_type: &ColumnType) -> String {
        match data_type {
            ColumnType::Increments => "INT".to_string(),
            ColumnType::BigIncrements => "BIGINT".to_string(),
            ColumnType::Integer => "INT".to_string(),
            ColumnType::BigInteger => "BIGINT".to_string(),
            ColumnType::String(len) => format!("NVARCHAR({len})"),
            ColumnType::Text => "NVARCHAR(MAX)".to_string(),
            ColumnType::Boolean => "BIT".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime | ColumnType::Timestamp => "DATETIME2".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "FLOAT".to_string(),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::Json => "NVARCHAR(MAX)".to_string(),
            ColumnType::Uuid => "UNIQUEIDENTIFIER".to_string(),
            ColumnType::Binary => "VARBINARY(MAX)".to_string(),
        }
    }

    /// The shared compiler renders ordinary DDL statements; this override
    /// only interleaves a `BatchBoundary` between them, since each
    /// `CREATE`/`ALTER` in a multi-statement script must run in its own
    /// batch for MSSQL's `GO` separator to apply.
    fn compile_blueprint(&self, blueprint: &Blueprint) -> Vec<Statement> {
        let statements = shared::compile_blueprint(self, blueprint);
        let mut out = Vec::with_capacity(statements.len() * 2);
        for (index, statement) in statements.into_iter().enumerate() {
            if index > 0 {
                out.push(Statement::BatchBoundary);
            }
            out.push(statement);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_uses_question_mark_placeholders() {
        let builder = QueryBuilder::table("users").where_eq("id", 1i64);
        let (sql, bindings) = MssqlGrammar.compile_select(&builder);
        assert!(sql.contains('?'), "{sql}");
        assert_eq!(bindings, vec![Value::Integer(1)]);
    }

    #[test]
    fn quote_ident_uses_brackets() {
        assert_eq!(MssqlGrammar.quote_ident(&Ident::new("users")), "[users]");
    }

    #[test]
    fn offset_without_limit_falls_back_to_fetch_syntax() {
        let builder = QueryBuilder::table("users").offset(5);
        let (sql, _) = MssqlGrammar.compile_select(&builder);
        assert!(sql.contains("OFFSET 5 ROWS"), "{sql}");
        assert!(!sql.contains("LIMIT"), "{sql}");
    }

    #[test]
    fn blueprint_statements_are_separated_by_batch_boundaries() {
        let mut blueprint = Blueprint::create("widgets");
        blueprint.increments("id");
        blueprint.unique(&["id"], None);
        let statements = MssqlGrammar.compile_blueprint(&blueprint);
        assert!(statements.iter().any(|s| matches!(s, Statement::BatchBoundary)));
    }

    #[test]
    fn insert_or_ignore_merges_on_every_inserted_column() {
        let table = TableRef::new("users");
        let values = vec![("email".to_string(), Value::Text("a@example.com".to_string()))];
        let (sql, bindings) = MssqlGrammar.compile_insert_or_ignore(&table, &values);
        assert_eq!(
            sql,
            "MERGE INTO [users] AS target USING (SELECT ? AS [email]) AS source ON (target.[email] = source.[email]) \
             WHEN NOT MATCHED THEN INSERT ([email]) VALUES (source.[email]);"
        );
        assert_eq!(bindings, vec![Value::Text("a@example.com".to_string())]);
    }

    #[test]
    fn upsert_merges_matched_rows_with_an_update_and_unmatched_with_an_insert() {
        let table = TableRef::new("users");
        let values = vec![
            ("email".to_string(), Value::Text("a@example.com".to_string())),
            ("name".to_string(), Value::Text("Ada".to_string())),
        ];
        let (sql, bindings) = MssqlGrammar.compile_upsert(
            &table,
            &values,
            &["email".to_string()],
            &["name".to_string()],
        );
        assert_eq!(
            sql,
            "MERGE INTO [users] AS target USING (SELECT ? AS [email], ? AS [name]) AS source ON (target.[email] = source.[email]) \
             WHEN MATCHED THEN UPDATE SET target.[name] = source.[name] \
             WHEN NOT MATCHED THEN INSERT ([email], [name]) VALUES (source.[email], source.[name]);"
        );
        assert_eq!(bindings.len(), 2);
    }
}
