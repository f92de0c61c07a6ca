//! The fluent [`QueryBuilder`]: a mutable accumulator of
//! [`crate::expr`] AST nodes. Every mutator returns `&mut Self` for
//! chaining; terminal operations compile the accumulated AST through a
//! [`crate::grammar::Grammar`] and execute it against a
//! [`crate::connection::Connection`].

use std::collections::BTreeMap;

use crate::collection::Collection;
use crate::connection::{Connection, StatementResult};
use crate::error::{Error, ModelNotFound, QueryException};
use crate::expr::{
    AggregateClause, AggregateFn, Boolean, Direction, GroupClause, HavingClause, JoinClause,
    JoinKind, LockMode, OnClause, OrderClause, OrderTarget, Operator, SelectColumn, WhereClause,
};
use crate::ident::{ColumnRef, Ident, TableRef};
use crate::value::Value;

pub type Row = BTreeMap<String, Value>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    Distinct,
    All,
}

#[derive(Clone)]
pub struct QueryBuilder {
    pub(crate) table: TableRef,
    pub(crate) columns: Vec<SelectColumn>,
    pub(crate) distinct: bool,
    pub(crate) wheres: Vec<WhereClause>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) groups: Vec<GroupClause>,
    pub(crate) havings: Vec<HavingClause>,
    pub(crate) orders: Vec<OrderClause>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) aggregate: Option<AggregateClause>,
    pub(crate) lock: LockMode,
    pub(crate) unions: Vec<(Box<QueryBuilder>, UnionKind)>,
    pub(crate) connection_name: Option<String>,
}

impl QueryBuilder {
    #[must_use]
    pub fn table(name: impl Into<Ident>) -> Self {
        Self::new(TableRef::new(name))
    }

    #[must_use]
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            columns: Vec::new(),
            distinct: false,
            wheres: Vec::new(),
            joins: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            aggregate: None,
            lock: LockMode::None,
            unions: Vec::new(),
            connection_name: None,
        }
    }

    #[must_use]
    pub fn on_connection(mut self, name: impl Into<String>) -> Self {
        self.connection_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn table_ref(&self) -> &TableRef {
        &self.table
    }

    // ---- column selection ----------------------------------------------

    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns
            .extend(columns.iter().map(|c| SelectColumn::Column(ColumnRef::parse(c))));
        self
    }

    #[must_use]
    pub fn select_raw(mut self, sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        self.columns.push(SelectColumn::Raw(sql.into(), bindings));
        self
    }

    #[must_use]
    pub fn add_select(mut self, alias: impl Into<String>, subquery: QueryBuilder) -> Self {
        self.columns.push(SelectColumn::Subquery {
            alias: alias.into(),
            subquery: Box::new(subquery),
        });
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ---- where ------------------------------------------------------------

    #[must_use]
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Eq, value)
    }

    #[must_use]
    pub fn where_op(mut self, column: &str, op: Operator, value: impl Into<Value>) -> Self {
        self.push_where(WhereClause::Basic {
            column: ColumnRef::parse(column),
            op,
            value: value.into(),
            boolean: self.next_boolean(),
            negated: false,
        });
        self
    }

    #[must_use]
    pub fn or_where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.wheres.push(WhereClause::Basic {
            column: ColumnRef::parse(column),
            op: Operator::Eq,
            value: value.into(),
            boolean: Boolean::Or,
            negated: false,
        });
        self
    }

    #[must_use]
    pub fn where_map(mut self, pairs: &[(&str, Value)]) -> Self {
        for (column, value) in pairs {
            self = self.where_eq(column, value.clone());
        }
        self
    }

    #[must_use]
    pub fn where_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.push_where(WhereClause::In {
            column: ColumnRef::parse(column),
            values,
            boolean: self.next_boolean(),
            negated: false,
        });
        self
    }

    #[must_use]
    pub fn where_not_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.push_where(WhereClause::In {
            column: ColumnRef::parse(column),
            values,
            boolean: self.next_boolean(),
            negated: true,
        });
        self
    }

    #[must_use]
    pub fn where_in_subquery(mut self, column: &str, subquery: QueryBuilder) -> Self {
        self.push_where(WhereClause::InSubquery {
            column: ColumnRef::parse(column),
            subquery: Box::new(subquery),
            boolean: self.next_boolean(),
            negated: false,
        });
        self
    }

    #[must_use]
    pub fn where_between(mut self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.push_where(WhereClause::Between {
            column: ColumnRef::parse(column),
            low: low.into(),
            high: high.into(),
            boolean: self.next_boolean(),
            negated: false,
        });
        self
    }

    #[must_use]
    pub fn where_null(mut self, column: &str) -> Self {
        self.push_where(WhereClause::Null {
            column: ColumnRef::parse(column),
            boolean: self.next_boolean(),
            negated: false,
        });
        self
    }

    #[must_use]
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.push_where(WhereClause::Null {
            column: ColumnRef::parse(column),
            boolean: self.next_boolean(),
            negated: true,
        });
        self
    }

    #[must_use]
    pub fn where_like(self, column: &str, pattern: impl Into<String>) -> Self {
        self.where_op(column, Operator::Like, Value::Text(pattern.into()))
    }

    #[must_use]
    pub fn where_not_like(self, column: &str, pattern: impl Into<String>) -> Self {
        self.where_op(column, Operator::NotLike, Value::Text(pattern.into()))
    }

    #[must_use]
    pub fn where_column(mut self, left: &str, op: Operator, right: &str) -> Self {
        self.push_where(WhereClause::Column {
            left: ColumnRef::parse(left),
            op,
            right: ColumnRef::parse(right),
            boolean: self.next_boolean(),
        });
        self
    }

    #[must_use]
    pub fn where_exists(mut self, subquery: QueryBuilder) -> Self {
        self.push_where(WhereClause::Exists {
            subquery: Box::new(subquery),
            boolean: self.next_boolean(),
            negated: false,
        });
        self
    }

    #[must_use]
    pub fn where_raw(mut self, sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        self.push_where(WhereClause::Raw {
            sql: sql.into(),
            bindings,
            boolean: self.next_boolean(),
        });
        self
    }

    /// Groups the clauses built by `build` into a single parenthesized
    /// nested clause, e.g. `.where_nested(|b| b.where_eq("a", 1).or_where_eq("b", 2))`.
    #[must_use]
    pub fn where_nested(mut self, build: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        let sub = build(QueryBuilder::table(self.table.name.clone()));
        let boolean = self.next_boolean();
        self.wheres.push(WhereClause::Nested {
            clauses: sub.wheres,
            boolean,
        });
        self
    }

    /// `when(cond, callable)`: only applies the closure
    /// when `cond` is true, enabling fluent conditionals without branching
    /// at the call site.
    #[must_use]
    pub fn when(self, cond: bool, then: impl FnOnce(QueryBuilder) -> QueryBuilder) -> Self {
        if cond { then(self) } else { self }
    }

    fn push_where(&mut self, clause: WhereClause) {
        self.wheres.push(clause);
    }

    fn next_boolean(&self) -> Boolean {
        Boolean::And
    }

    // ---- joins --------------------------------------------------------

    #[must_use]
    pub fn join(mut self, table: impl Into<Ident>, left: &str, op: Operator, right: &str) -> Self {
        self.joins.push(JoinClause {
            kind: JoinKind::Inner,
            table: TableRef::new(table),
            on: vec![OnClause {
                left: ColumnRef::parse(left),
                op,
                right: ColumnRef::parse(right),
                boolean: Boolean::And,
            }],
            wheres: Vec::new(),
        });
        self
    }

    #[must_use]
    pub fn left_join(mut self, table: impl Into<Ident>, left: &str, op: Operator, right: &str) -> Self {
        self.joins.push(JoinClause {
            kind: JoinKind::Left,
            table: TableRef::new(table),
            on: vec![OnClause {
                left: ColumnRef::parse(left),
                op,
                right: ColumnRef::parse(right),
                boolean: Boolean::And,
            }],
            wheres: Vec::new(),
        });
        self
    }

    #[must_use]
    pub fn right_join(mut self, table: impl Into<Ident>, left: &str, op: Operator, right: &str) -> Self {
        self.joins.push(JoinClause {
            kind: JoinKind::Right,
            table: TableRef::new(table),
            on: vec![OnClause {
                left: ColumnRef::parse(left),
                op,
                right: ColumnRef::parse(right),
                boolean: Boolean::And,
            }],
            wheres: Vec::new(),
        });
        self
    }

    // ---- group / having / order / limit --------------------------------

    #[must_use]
    pub fn group_by(mut self, column: &str) -> Self {
        self.groups.push(GroupClause::Column(ColumnRef::parse(column)));
        self
    }

    #[must_use]
    pub fn having(mut self, column: &str, op: Operator, value: impl Into<Value>) -> Self {
        self.havings.push(HavingClause::Basic {
            column: ColumnRef::parse(column),
            op,
            value: value.into(),
            boolean: Boolean::And,
            negated: false,
        });
        self
    }

    #[must_use]
    pub fn having_raw(mut self, sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        self.havings.push(HavingClause::Raw {
            sql: sql.into(),
            bindings,
            boolean: Boolean::And,
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.orders.push(OrderClause {
            target: OrderTarget::Column(ColumnRef::parse(column)),
            direction,
        });
        self
    }

    #[must_use]
    pub fn order_by_raw(mut self, sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        self.orders.push(OrderClause {
            target: OrderTarget::Raw(sql.into(), bindings),
            direction: Direction::Asc,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    #[must_use]
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    #[must_use]
    pub fn lock_for_update(mut self) -> Self {
        self.lock = LockMode::Update;
        self
    }

    #[must_use]
    pub fn shared_lock(mut self) -> Self {
        self.lock = LockMode::Shared;
        self
    }

    #[must_use]
    pub fn union(mut self, other: QueryBuilder) -> Self {
        self.unions.push((Box::new(other), UnionKind::Distinct));
        self
    }

    #[must_use]
    pub fn union_all(mut self, other: QueryBuilder) -> Self {
        self.unions.push((Box::new(other), UnionKind::All));
        self
    }

    // ---- compilation ----------------------------------------------------

    /// Compiles without consuming/resetting builder state. Used internally
    /// by every terminal operation so that e.g. `chunk` can recompile the
    /// same clause set with a new limit/offset each iteration.
    fn compile_select(&self, conn: &dyn Connection) -> (String, Vec<Value>) {
        conn.grammar().compile_select(self)
    }

    /// Produces SQL with `?` placeholders plus the bindings vector — the
    /// form sent to the driver. Resets the builder's accumulated state as
    /// a documented side effect.
    pub fn to_qmark(&mut self, conn: &dyn Connection) -> (String, Vec<Value>) {
        let compiled = self.compile_select(conn);
        *self = QueryBuilder::table(self.table.name.clone());
        compiled
    }

    /// Renders SQL with bindings interpolated inline — debugging only,
    /// never sent to a driver.
    #[must_use]
    pub fn to_sql(&self, conn: &dyn Connection) -> String {
        let (sql, bindings) = self.compile_select(conn);
        interpolate(&sql, &bindings)
    }

    // ---- terminal operations --------------------------------------------

    pub fn get(&self, conn: &mut dyn Connection) -> Result<Collection<Row>> {
        let (sql, bindings) = self.compile_select(conn);
        match run(conn, &sql, &bindings)? {
            StatementResult::Rows(rows) => Ok(Collection::new(rows)),
            StatementResult::Affected(_) => Ok(Collection::new(Vec::new())),
        }
    }

    pub fn first(&self, conn: &mut dyn Connection) -> Result<Option<Row>> {
        let mut limited = self.clone();
        limited.limit = Some(1);
        Ok(limited.get(conn)?.into_vec().into_iter().next())
    }

    pub fn first_or_fail(&self, conn: &mut dyn Connection, model: &'static str) -> Result<Row> {
        self.first(conn)?.ok_or_else(|| {
            Error::from(ModelNotFound {
                model,
                key: "<query>".to_string(),
            })
        })
    }

    pub fn find(&self, conn: &mut dyn Connection, id: impl Into<Value>) -> Result<Option<Row>> {
        self.clone().where_eq("id", id).first(conn)
    }

    pub fn find_many(&self, conn: &mut dyn Connection, ids: Vec<Value>) -> Result<Collection<Row>> {
        self.clone().where_in("id", ids).get(conn)
    }

    pub fn all(&self, conn: &mut dyn Connection) -> Result<Collection<Row>> {
        self.get(conn)
    }

    fn aggregate_scalar(&self, conn: &mut dyn Connection, func: AggregateFn, column: &str) -> Result<Value> {
        let mut query = self.clone();
        query.aggregate = Some(AggregateClause {
            func,
            column: ColumnRef::parse(column),
            alias: Some("aggregate".to_string()),
        });
        query.orders.clear();
        query.limit = None;
        query.offset = None;
        let row = query.first(conn)?;
        Ok(row
            .and_then(|mut r| r.remove("aggregate"))
            .unwrap_or(Value::Null))
    }

    pub fn count(&self, conn: &mut dyn Connection) -> Result<i64> {
        Ok(self.aggregate_scalar(conn, AggregateFn::Count, "*")?.as_i64().unwrap_or(0))
    }

    pub fn sum(&self, conn: &mut dyn Connection, column: &str) -> Result<Value> {
        self.aggregate_scalar(conn, AggregateFn::Sum, column)
    }

    pub fn avg(&self, conn: &mut dyn Connection, column: &str) -> Result<Value> {
        self.aggregate_scalar(conn, AggregateFn::Avg, column)
    }

    pub fn max(&self, conn: &mut dyn Connection, column: &str) -> Result<Value> {
        self.aggregate_scalar(conn, AggregateFn::Max, column)
    }

    pub fn min(&self, conn: &mut dyn Connection, column: &str) -> Result<Value> {
        self.aggregate_scalar(conn, AggregateFn::Min, column)
    }

    pub fn paginate(&self, conn: &mut dyn Connection, per_page: u64, page: u64) -> Result<Pagination> {
        let page = page.max(1);
        let mut count_query = self.clone();
        count_query.columns.clear();
        count_query.orders.clear();
        count_query.limit = None;
        count_query.offset = None;
        let total = count_query.count(conn)?.max(0) as u64;

        let mut data_query = self.clone();
        data_query.limit = Some(per_page);
        data_query.offset = Some((page - 1) * per_page);
        let data = data_query.get(conn)?;

        let last_page = if per_page == 0 { 1 } else { total.div_ceil(per_page).max(1) };
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = (page - 1) * per_page + 1;
            (Some(from), Some(from + data.len() as u64 - 1))
        };

        Ok(Pagination {
            data,
            total,
            per_page,
            current_page: page,
            last_page,
            from,
            to,
        })
    }

    pub fn simple_paginate(&self, conn: &mut dyn Connection, per_page: u64, page: u64) -> Result<SimplePagination> {
        let page = page.max(1);
        let mut data_query = self.clone();
        data_query.limit = Some(per_page + 1);
        data_query.offset = Some((page - 1) * per_page);
        let mut data = data_query.get(conn)?.into_vec();
        let has_more = data.len() as u64 > per_page;
        if has_more {
            data.truncate(per_page as usize);
        }

        Ok(SimplePagination {
            data: Collection::new(data),
            per_page,
            current_page: page,
            has_more,
        })
    }

    /// Yields successive collections of `n` rows by repeatedly re-compiling
    /// this builder's clause set with advancing limit/offset, stopping when
    /// a page returns fewer than `n` rows. A lazy cursor expressed as a
    /// callback because the core has no async/generator runtime.
    pub fn chunk<F>(&self, conn: &mut dyn Connection, n: u64, mut f: F) -> Result<()>
    where
        F: FnMut(Collection<Row>) -> Result<bool>,
    {
        let mut offset = 0_u64;
        loop {
            let mut page_query = self.clone();
            page_query.limit = Some(n);
            page_query.offset = Some(offset);
            let page = page_query.get(conn)?;
            let len = page.len() as u64;
            if len == 0 {
                return Ok(());
            }
            let keep_going = f(page)?;
            if !keep_going || len < n {
                return Ok(());
            }
            offset += n;
        }
    }

    pub fn create(&self, conn: &mut dyn Connection, values: Vec<(String, Value)>) -> Result<Value> {
        let (sql, bindings) = conn.grammar().compile_insert(&self.table, &values);
        match run(conn, &sql, &bindings)? {
            StatementResult::Rows(mut rows) => Ok(rows
                .pop()
                .and_then(|mut r| r.remove("id"))
                .unwrap_or(Value::Null)),
            StatementResult::Affected(n) => Ok(Value::Integer(n as i64)),
        }
    }

    pub fn bulk_create(&self, conn: &mut dyn Connection, rows: Vec<Vec<(String, Value)>>) -> Result<u64> {
        let (sql, bindings) = conn.grammar().compile_bulk_insert(&self.table, &rows);
        match run(conn, &sql, &bindings)? {
            StatementResult::Affected(n) => Ok(n),
            StatementResult::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    /// Inserts `values`, doing nothing (no error, no row) when the row
    /// conflicts with an existing one. The conflict key is whatever the
    /// dialect's underlying constraint says it is; this carries no
    /// `unique_by` of its own (see [`Self::upsert`] when the update target
    /// needs to be explicit).
    pub fn insert_or_ignore(&self, conn: &mut dyn Connection, values: Vec<(String, Value)>) -> Result<u64> {
        let (sql, bindings) = conn.grammar().compile_insert_or_ignore(&self.table, &values);
        match run(conn, &sql, &bindings)? {
            StatementResult::Affected(n) => Ok(n),
            StatementResult::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    /// Inserts `values`, updating `update_columns` from the incoming row
    /// when a row already unique on `unique_by` exists.
    pub fn upsert(
        &self,
        conn: &mut dyn Connection,
        values: Vec<(String, Value)>,
        unique_by: &[&str],
        update_columns: &[&str],
    ) -> Result<u64> {
        let unique_by: Vec<String> = unique_by.iter().map(|c| (*c).to_string()).collect();
        let update_columns: Vec<String> = update_columns.iter().map(|c| (*c).to_string()).collect();
        let (sql, bindings) = conn.grammar().compile_upsert(&self.table, &values, &unique_by, &update_columns);
        match run(conn, &sql, &bindings)? {
            StatementResult::Affected(n) => Ok(n),
            StatementResult::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    pub fn update(&self, conn: &mut dyn Connection, values: Vec<(String, Value)>) -> Result<u64> {
        let (sql, bindings) = conn.grammar().compile_update(self, &values);
        match run(conn, &sql, &bindings)? {
            StatementResult::Affected(n) => Ok(n),
            StatementResult::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    pub fn increment(&self, conn: &mut dyn Connection, column: &str, by: i64) -> Result<u64> {
        self.update(conn, vec![(column.to_string(), Value::Text(format!("{column}+{by}")))])
    }

    pub fn decrement(&self, conn: &mut dyn Connection, column: &str, by: i64) -> Result<u64> {
        self.update(conn, vec![(column.to_string(), Value::Text(format!("{column}-{by}")))])
    }

    pub fn delete(&self, conn: &mut dyn Connection) -> Result<u64> {
        let (sql, bindings) = conn.grammar().compile_delete(self);
        match run(conn, &sql, &bindings)? {
            StatementResult::Affected(n) => Ok(n),
            StatementResult::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    pub fn truncate(&self, conn: &mut dyn Connection) -> Result<()> {
        let sql = conn.grammar().compile_truncate(&self.table, false);
        run(conn, &sql, &[])?;
        Ok(())
    }
}

fn run(conn: &mut dyn Connection, sql: &str, bindings: &[Value]) -> Result<StatementResult> {
    conn.statement(sql, bindings)
        .map_err(|cause| Error::from(QueryException::new(sql, bindings.to_vec(), cause)))
}

fn interpolate(sql: &str, bindings: &[Value]) -> String {
    let mut out = String::new();
    let mut iter = bindings.iter();
    for ch in sql.chars() {
        if ch == '?' {
            if let Some(value) = iter.next() {
                out.push_str(&value.to_string());
                continue;
            }
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone)]
pub struct Pagination {
    pub data: Collection<Row>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SimplePagination {
    pub data: Collection<Row>,
    pub per_page: u64,
    pub current_page: u64,
    pub has_more: bool,
}
