//! Live `postgres` driver adapter: wraps a `Mutex<Client>` behind a
//! single lock seam and implements `quarry_core::Connection` — compiled
//! SQL plus bindings in, rows or affected-count out.

use std::sync::Mutex;

use postgres::types::{FromSql, ToSql};
use postgres::{Client, NoTls, Row as PgRow};
use quarry_core::connection::{Row, StatementResult};
use quarry_core::value::Value;
use quarry_core::{Connection, ConnectionConfig, Grammar};

use crate::PostgresGrammar;

type DynError = Box<dyn std::error::Error + Send + Sync>;

pub struct PostgresConnection {
    client: Mutex<Client>,
    grammar: PostgresGrammar,
    schema: Option<String>,
}

pub fn connect(config: &ConnectionConfig) -> Result<PostgresConnection, DynError> {
    let mut pg_config = postgres::Config::new();
    pg_config.host(config.host.as_deref().unwrap_or("127.0.0.1"));
    if let Some(port) = config.port {
        pg_config.port(port);
    }
    if let Some(user) = &config.user {
        pg_config.user(user);
    }
    if let Some(password) = &config.password {
        pg_config.password(password);
    }
    pg_config.dbname(&config.database);
    let client = pg_config.connect(NoTls)?;
    Ok(PostgresConnection {
        client: Mutex::new(client),
        grammar: PostgresGrammar,
        schema: config.schema.clone(),
    })
}

impl Connection for PostgresConnection {
    fn grammar(&self) -> &dyn Grammar {
        &self.grammar
    }

    fn statement(&mut self, sql: &str, bindings: &[Value]) -> Result<StatementResult, DynError> {
        let mut client = self.client.lock().expect("postgres connection poisoned");
        let owned = to_sql_params(bindings);
        let params: Vec<&(dyn ToSql + Sync)> = owned.iter().map(AsRef::as_ref).collect();
        if is_select(sql) {
            let rows = client.query(sql, &params)?;
            Ok(StatementResult::Rows(rows.iter().map(decode_row).collect()))
        } else {
            let affected = client.execute(sql, &params)?;
            Ok(StatementResult::Affected(affected))
        }
    }

    fn begin_transaction(&mut self) -> Result<(), DynError> {
        let mut client = self.client.lock().expect("postgres connection poisoned");
        client.batch_execute("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DynError> {
        let mut client = self.client.lock().expect("postgres connection poisoned");
        client.batch_execute("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DynError> {
        let mut client = self.client.lock().expect("postgres connection poisoned");
        client.batch_execute("ROLLBACK")?;
        Ok(())
    }

    fn savepoint(&mut self, name: &str) -> Result<(), DynError> {
        let mut client = self.client.lock().expect("postgres connection poisoned");
        client.batch_execute(&format!("SAVEPOINT {name}"))?;
        Ok(())
    }

    fn release_savepoint(&mut self, name: &str) -> Result<(), DynError> {
        let mut client = self.client.lock().expect("postgres connection poisoned");
        client.batch_execute(&format!("RELEASE SAVEPOINT {name}"))?;
        Ok(())
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), DynError> {
        let mut client = self.client.lock().expect("postgres connection poisoned");
        client.batch_execute(&format!("ROLLBACK TO SAVEPOINT {name}"))?;
        Ok(())
    }

    fn schema_search_path(&self) -> Option<&str> {
        self.schema.as_deref()
    }
}

fn is_select(sql: &str) -> bool {
    sql.trim_start().get(0..6).is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

fn to_sql_params(bindings: &[Value]) -> Vec<Box<dyn ToSql + Sync>> {
    bindings
        .iter()
        .map(|value| -> Box<dyn ToSql + Sync> {
            match value.clone() {
                Value::Null => Box::new(Option::<String>::None),
                Value::Bool(b) => Box::new(b),
                Value::Integer(n) => Box::new(n),
                Value::Float(n) => Box::new(n),
                Value::Text(s) | Value::Json(s) => Box::new(s),
                Value::Bytes(b) => Box::new(b),
            }
        })
        .collect()
}

fn decode_row(row: &PgRow) -> Row {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), decode_value(row, index));
    }
    out
}

fn decode_value(row: &PgRow, index: usize) -> Value {
    if let Ok(v) = try_get::<i64>(row, index) {
        return v.map_or(Value::Null, Value::Integer);
    }
    if let Ok(v) = try_get::<i32>(row, index) {
        return v.map_or(Value::Null, |n| Value::Integer(i64::from(n)));
    }
    if let Ok(v) = try_get::<bool>(row, index) {
        return v.map_or(Value::Null, Value::Bool);
    }
    if let Ok(v) = try_get::<f64>(row, index) {
        return v.map_or(Value::Null, Value::Float);
    }
    if let Ok(v) = try_get::<String>(row, index) {
        return v.map_or(Value::Null, Value::Text);
    }
    if let Ok(v) = try_get::<Vec<u8>>(row, index) {
        return v.map_or(Value::Null, Value::Bytes);
    }
    Value::Null
}

fn try_get<'a, T: FromSql<'a>>(row: &'a PgRow, index: usize) -> Result<Option<T>, postgres::Error> {
    row.try_get::<_, Option<T>>(index)
}
