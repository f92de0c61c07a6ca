//! Live `tiberius` driver adapter: a `Runtime` + `Client` pair behind a
//! single `Mutex`, with `block_on` bridging tiberius's async API into the
//! synchronous `quarry_core::Connection` boundary.

use std::sync::Mutex;

use futures_util::TryStreamExt;
use quarry_core::connection::{Row, StatementResult};
use quarry_core::value::Value;
use quarry_core::{Connection, ConnectionConfig, Grammar};
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::MssqlGrammar;

const DEFAULT_MSSQL_HOST: &str = "127.0.0.1";
const DEFAULT_MSSQL_PORT: u16 = 1433;

type TdsClient = Client<Compat<TcpStream>>;
type DynError = Box<dyn std::error::Error + Send + Sync>;

pub struct MssqlConnection {
    state: Mutex<LiveState>,
    grammar: MssqlGrammar,
}

struct LiveState {
    runtime: Runtime,
    client: TdsClient,
}

pub fn connect(config: &ConnectionConfig) -> Result<MssqlConnection, DynError> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let mut tds_config = Config::new();
    tds_config.host(config.host.as_deref().unwrap_or(DEFAULT_MSSQL_HOST));
    tds_config.port(config.port.unwrap_or(DEFAULT_MSSQL_PORT));
    tds_config.database(config.database.clone());
    let user = config.user.clone().unwrap_or_default();
    let password = config.password.clone().unwrap_or_default();
    tds_config.authentication(AuthMethod::sql_server(user, password));
    tds_config.trust_cert();

    let client = runtime.block_on(async {
        let tcp = TcpStream::connect(tds_config.get_addr()).await?;
        tcp.set_nodelay(true)?;
        Client::connect(tds_config, tcp.compat_write()).await
    })?;

    Ok(MssqlConnection {
        state: Mutex::new(LiveState { runtime, client }),
        grammar: MssqlGrammar,
    })
}

impl Connection for MssqlConnection {
    fn grammar(&self) -> &dyn Grammar {
        &self.grammar
    }

    fn statement(&mut self, sql: &str, bindings: &[Value]) -> Result<StatementResult, DynError> {
        let mut state = self.state.lock().expect("mssql connection poisoned");
        let LiveState { runtime, client } = &mut *state;
        let owned_sql = sql.to_string();
        let params: Vec<ParamBox> = bindings.iter().map(to_param).collect();

        runtime.block_on(async {
            let refs: Vec<&dyn tiberius::ToSql> = params.iter().map(|p| p.as_tosql()).collect();
            if is_select(&owned_sql) {
                let mut stream = client.query(owned_sql, &refs).await?;
                let mut rows = Vec::new();
                while let Some(item) = stream.try_next().await? {
                    if let tiberius::QueryItem::Row(row) = item {
                        rows.push(decode_row(&row));
                    }
                }
                Ok(StatementResult::Rows(rows))
            } else {
                let result = client.execute(owned_sql, &refs).await?;
                let affected: u64 = result.rows_affected().iter().sum();
                Ok(StatementResult::Affected(affected))
            }
        })
    }

    fn begin_transaction(&mut self) -> Result<(), DynError> {
        run_batch(self, "BEGIN TRANSACTION")
    }

    fn commit(&mut self) -> Result<(), DynError> {
        run_batch(self, "COMMIT TRANSACTION")
    }

    fn rollback(&mut self) -> Result<(), DynError> {
        run_batch(self, "ROLLBACK TRANSACTION")
    }

    fn savepoint(&mut self, name: &str) -> Result<(), DynError> {
        run_batch(self, &format!("SAVE TRANSACTION {name}"))
    }

    fn release_savepoint(&mut self, _name: &str) -> Result<(), DynError> {
        // MSSQL has no `RELEASE SAVEPOINT`; a savepoint is implicitly
        // released once the outer transaction commits.
        Ok(())
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<(), DynError> {
        run_batch(self, &format!("ROLLBACK TRANSACTION {name}"))
    }
}

fn run_batch(conn: &mut MssqlConnection, sql: &str) -> Result<(), DynError> {
    let mut state = conn.state.lock().expect("mssql connection poisoned");
    let LiveState { runtime, client } = &mut *state;
    let owned = sql.to_string();
    runtime.block_on(async { client.simple_query(owned).await.map(|_| ()) })
}

fn is_select(sql: &str) -> bool {
    sql.trim_start().get(0..6).is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

enum ParamBox {
    Null(Option<i64>),
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl ParamBox {
    fn as_tosql(&self) -> &dyn tiberius::ToSql {
        match self {
            ParamBox::Null(n) => n,
            ParamBox::Bool(b) => b,
            ParamBox::I64(n) => n,
            ParamBox::F64(n) => n,
            ParamBox::Text(s) => s,
            ParamBox::Bytes(b) => b,
        }
    }
}

fn to_param(value: &Value) -> ParamBox {
    match value.clone() {
        Value::Null => ParamBox::Null(None),
        Value::Bool(b) => ParamBox::Bool(b),
        Value::Integer(n) => ParamBox::I64(n),
        Value::Float(n) => ParamBox::F64(n),
        Value::Text(s) | Value::Json(s) => ParamBox::Text(s),
        Value::Bytes(b) => ParamBox::Bytes(b),
    }
}

fn decode_row(row: &tiberius::Row) -> Row {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = row.try_get::<&str, _>(index).ok().flatten().map_or_else(
            || decode_non_text(row, index),
            |s| Value::Text(s.to_string()),
        );
        out.insert(column.name().to_string(), value);
    }
    out
}

fn decode_non_text(row: &tiberius::Row, index: usize) -> Value {
    if let Ok(Some(n)) = row.try_get::<i64, _>(index) {
        return Value::Integer(n);
    }
    if let Ok(Some(n)) = row.try_get::<i32, _>(index) {
        return Value::Integer(i64::from(n));
    }
    if let Ok(Some(b)) = row.try_get::<bool, _>(index) {
        return Value::Bool(b);
    }
    if let Ok(Some(n)) = row.try_get::<f64, _>(index) {
        return Value::Float(n);
    }
    if let Ok(Some(b)) = row.try_get::<&[u8], _>(index) {
        return Value::Bytes(b.to_vec());
    }
    Value::Null
}
