//! Live `rusqlite` driver adapter: a `Mutex<rusqlite::Connection>`
//! adapted to `quarry_core::Connection`'s compiled-SQL-in/rows-out
//! boundary.

use std::sync::Mutex;

use rusqlite::types::Value as SqliteValue;
use rusqlite::Connection as RusqliteConnection;
use quarry_core::connection::{Row, StatementResult};
use quarry_core::value::Value;
use quarry_core::{Connection, ConnectionConfig, Grammar};

use crate::SqliteGrammar;

type DynError = Box<dyn std::error::Error + Send + Sync>;

pub struct SqliteConnection {
    conn: Mutex<RusqliteConnection>,
    grammar: SqliteGrammar,
}

pub fn connect(config: &ConnectionConfig) -> Result<SqliteConnection, DynError> {
    let conn = RusqliteConnection::open(&config.database)?;
    Ok(SqliteConnection {
        conn: Mutex::new(conn),
        grammar: SqliteGrammar,
    })
}

impl Connection for SqliteConnection {
    fn grammar(&self) -> &dyn Grammar {
        &self.grammar
    }

    fn statement(&mut self, sql: &str, bindings: &[Value]) -> Result<StatementResult, DynError> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        let params = to_sqlite_params(bindings);
        if is_select(sql) {
            let mut stmt = conn.prepare(sql)?;
            let column_names: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();
            let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Row::new();
                for (index, name) in column_names.iter().enumerate() {
                    let value: SqliteValue = row.get(index)?;
                    record.insert(name.clone(), from_sqlite_value(value));
                }
                out.push(record);
            }
            Ok(StatementResult::Rows(out))
        } else {
            let affected = conn.execute(sql, rusqlite::params_from_iter(params.iter()))?;
            Ok(StatementResult::Affected(affected as u64))
        }
    }

    fn begin_transaction(&mut self) -> Result<(), DynError> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DynError> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DynError> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn savepoint(&mut self, name: &str) -> Result<(), DynError> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        Ok(())
    }

    fn release_savepoint(&mut self, name: &str) -> Result<(), DynError> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        conn.execute_batch(&format!("RELEASE SAVEPOINT {name}"))?;
        Ok(())
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), DynError> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        conn.execute_batch(&format!("ROLLBACK TO SAVEPOINT {name}"))?;
        Ok(())
    }
}

fn is_select(sql: &str) -> bool {
    sql.trim_start().get(0..6).is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

fn to_sqlite_params(bindings: &[Value]) -> Vec<SqliteValue> {
    bindings
        .iter()
        .map(|value| match value.clone() {
            Value::Null => SqliteValue::Null,
            Value::Bool(b) => SqliteValue::Integer(i64::from(b)),
            Value::Integer(n) => SqliteValue::Integer(n),
            Value::Float(n) => SqliteValue::Real(n),
            Value::Text(s) | Value::Json(s) => SqliteValue::Text(s),
            Value::Bytes(b) => SqliteValue::Blob(b),
        })
        .collect()
}

fn from_sqlite_value(value: SqliteValue) -> Value {
    match value {
        SqliteValue::Null => Value::Null,
        SqliteValue::Integer(n) => Value::Integer(n),
        SqliteValue::Real(n) => Value::Float(n),
        SqliteValue::Text(s) => Value::Text(s),
        SqliteValue::Blob(b) => Value::Bytes(b),
    }
}
