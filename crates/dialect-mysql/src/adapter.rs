//! Live `mysql` driver adapter: a `Mutex<PooledConn>` built from
//! `OptsBuilder`, adapted to `quarry_core::Connection`'s
//! compiled-SQL-in/rows-out boundary.

use std::sync::Mutex;

use mysql::prelude::Queryable;
use mysql::{OptsBuilder, Params, Pool, PooledConn, Value as MysqlValue};
use quarry_core::connection::{Row, StatementResult};
use quarry_core::value::Value;
use quarry_core::{Connection, ConnectionConfig, Grammar};

use crate::MysqlGrammar;

const DEFAULT_MYSQL_HOST: &str = "127.0.0.1";
const DEFAULT_MYSQL_PORT: u16 = 3306;

type DynError = Box<dyn std::error::Error + Send + Sync>;

pub struct MysqlConnection {
    conn: Mutex<PooledConn>,
    grammar: MysqlGrammar,
    schema: String,
}

pub fn connect(config: &ConnectionConfig) -> Result<MysqlConnection, DynError> {
    let builder = OptsBuilder::new()
        .ip_or_hostname(Some(config.host.clone().unwrap_or_else(|| DEFAULT_MYSQL_HOST.to_string())))
        .tcp_port(config.port.unwrap_or(DEFAULT_MYSQL_PORT))
        .user(config.user.clone())
        .pass(config.password.clone())
        .db_name(Some(config.database.clone()));
    let pool = Pool::new(builder)?;
    let conn = pool.get_conn()?;
    Ok(MysqlConnection {
        conn: Mutex::new(conn),
        grammar: MysqlGrammar,
        schema: config.database.clone(),
    })
}

impl Connection for MysqlConnection {
    fn grammar(&self) -> &dyn Grammar {
        &self.grammar
    }

    fn statement(&mut self, sql: &str, bindings: &[Value]) -> Result<StatementResult, DynError> {
        let mut conn = self.conn.lock().expect("mysql connection poisoned");
        let params = to_params(bindings);
        let mut result = conn.exec_iter(sql, params)?;
        if is_select(sql) {
            let mut rows = Vec::new();
            for row in result {
                rows.push(decode_row(row?));
            }
            Ok(StatementResult::Rows(rows))
        } else {
            Ok(StatementResult::Affected(result.affected_rows()))
        }
    }

    fn begin_transaction(&mut self) -> Result<(), DynError> {
        let mut conn = self.conn.lock().expect("mysql connection poisoned");
        conn.query_drop("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DynError> {
        let mut conn = self.conn.lock().expect("mysql connection poisoned");
        conn.query_drop("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DynError> {
        let mut conn = self.conn.lock().expect("mysql connection poisoned");
        conn.query_drop("ROLLBACK")?;
        Ok(())
    }

    fn savepoint(&mut self, name: &str) -> Result<(), DynError> {
        let mut conn = self.conn.lock().expect("mysql connection poisoned");
        conn.query_drop(format!("SAVEPOINT {name}"))?;
        Ok(())
    }

    fn release_savepoint(&mut self, name: &str) -> Result<(), DynError> {
        let mut conn = self.conn.lock().expect("mysql connection poisoned");
        conn.query_drop(format!("RELEASE SAVEPOINT {name}"))?;
        Ok(())
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), DynError> {
        let mut conn = self.conn.lock().expect("mysql connection poisoned");
        conn.query_drop(format!("ROLLBACK TO SAVEPOINT {name}"))?;
        Ok(())
    }

    fn schema_search_path(&self) -> Option<&str> {
        Some(&self.schema)
    }
}

fn is_select(sql: &str) -> bool {
    sql.trim_start().get(0..6).is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

fn to_params(bindings: &[Value]) -> Params {
    if bindings.is_empty() {
        return Params::Empty;
    }
    let values: Vec<MysqlValue> = bindings
        .iter()
        .map(|value| match value.clone() {
            Value::Null => MysqlValue::NULL,
            Value::Bool(b) => MysqlValue::Int(i64::from(b)),
            Value::Integer(n) => MysqlValue::Int(n),
            Value::Float(n) => MysqlValue::Double(n),
            Value::Text(s) | Value::Json(s) => MysqlValue::Bytes(s.into_bytes()),
            Value::Bytes(b) => MysqlValue::Bytes(b),
        })
        .collect();
    Params::Positional(values)
}

fn decode_row(row: mysql::Row) -> Row {
    let mut out = Row::new();
    let columns = row.columns();
    for (index, column) in columns.iter().enumerate() {
        let value = row.as_ref(index).cloned().unwrap_or(MysqlValue::NULL);
        out.insert(column.name_str().to_string(), decode_value(value));
    }
    out
}

fn decode_value(value: MysqlValue) -> Value {
    match value {
        MysqlValue::NULL => Value::Null,
        MysqlValue::Int(n) => Value::Integer(n),
        MysqlValue::UInt(n) => Value::Integer(n as i64),
        MysqlValue::Float(n) => Value::Float(f64::from(n)),
        MysqlValue::Double(n) => Value::Float(n),
        MysqlValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => Value::Text(s),
            Err(err) => Value::Bytes(err.into_bytes()),
        },
        other => Value::Text(format!("{other:?}")),
    }
}
