//! The query expression AST: immutable value objects that a
//! [`crate::builder::QueryBuilder`] accumulates and a
//! [`crate::grammar::Grammar`] compiles into dialect SQL plus a bindings
//! vector. Nodes never embed driver-specific syntax — that is the
//! grammar's job.

use crate::ident::{ColumnRef, TableRef};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
    Regexp,
    NotRegexp,
}

impl Operator {
    #[must_use]
    pub fn from_str(raw: &str) -> Option<Self> {
        Some(match raw {
            "=" => Self::Eq,
            "!=" | "<>" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "like" => Self::Like,
            "not like" => Self::NotLike,
            "regexp" => Self::Regexp,
            "not regexp" => Self::NotRegexp,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    None,
    Shared,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateFn {
    #[must_use]
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Max => "MAX",
            Self::Min => "MIN",
        }
    }
}

/// A fully built, cloneable sub-builder used for nested `where`/`exists`
/// callbacks. [`crate::builder::QueryBuilder`] is the concrete type; kept
/// behind `Box` here to avoid a cyclic type definition.
pub type SubBuilder = Box<crate::builder::QueryBuilder>;

#[derive(Debug, Clone)]
pub enum WhereClause {
    Basic {
        column: ColumnRef,
        op: Operator,
        value: Value,
        boolean: Boolean,
        negated: bool,
    },
    Column {
        left: ColumnRef,
        op: Operator,
        right: ColumnRef,
        boolean: Boolean,
    },
    Between {
        column: ColumnRef,
        low: Value,
        high: Value,
        boolean: Boolean,
        negated: bool,
    },
    In {
        column: ColumnRef,
        values: Vec<Value>,
        boolean: Boolean,
        negated: bool,
    },
    InSubquery {
        column: ColumnRef,
        subquery: SubBuilder,
        boolean: Boolean,
        negated: bool,
    },
    Null {
        column: ColumnRef,
        boolean: Boolean,
        negated: bool,
    },
    Exists {
        subquery: SubBuilder,
        boolean: Boolean,
        negated: bool,
    },
    Nested {
        clauses: Vec<WhereClause>,
        boolean: Boolean,
    },
    Raw {
        sql: String,
        bindings: Vec<Value>,
        boolean: Boolean,
    },
}

impl WhereClause {
    #[must_use]
    pub fn boolean(&self) -> Boolean {
        match self {
            Self::Basic { boolean, .. }
            | Self::Column { boolean, .. }
            | Self::Between { boolean, .. }
            | Self::In { boolean, .. }
            | Self::InSubquery { boolean, .. }
            | Self::Null { boolean, .. }
            | Self::Exists { boolean, .. }
            | Self::Nested { boolean, .. }
            | Self::Raw { boolean, .. } => *boolean,
        }
    }
}

/// Reused verbatim for `HAVING`: the clause shapes that make sense after
/// aggregation are a subset of `WHERE`'s, so the grammar compiles both with
/// the same walker.
pub type HavingClause = WhereClause;

#[derive(Debug, Clone)]
pub struct OnClause {
    pub left: ColumnRef,
    pub op: Operator,
    pub right: ColumnRef,
    pub boolean: Boolean,
}

#[derive(Debug, Clone)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: Vec<OnClause>,
    pub wheres: Vec<WhereClause>,
}

#[derive(Debug, Clone)]
pub enum OrderTarget {
    Column(ColumnRef),
    Raw(String, Vec<Value>),
}

#[derive(Debug, Clone)]
pub struct OrderClause {
    pub target: OrderTarget,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub enum GroupClause {
    Column(ColumnRef),
    Raw(String, Vec<Value>),
}

#[derive(Debug, Clone)]
pub struct AggregateClause {
    pub func: AggregateFn,
    pub column: ColumnRef,
    pub alias: Option<String>,
}

#[derive(Debug, Clone)]
pub enum SelectColumn {
    Column(ColumnRef),
    Raw(String, Vec<Value>),
    /// A correlated subquery column added via `add_select(alias, callable)`.
    Subquery { alias: String, subquery: SubBuilder },
}
