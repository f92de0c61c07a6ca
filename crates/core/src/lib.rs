//! Dialect-agnostic query builder and active-record model layer.
//!
//! This crate is the core of the `quarry` toolkit: a fluent
//! [`builder::QueryBuilder`] that accumulates a [`expr`] AST and compiles
//! it through a dialect [`grammar::Grammar`] impl, a [`model`] layer that
//! hydrates rows into domain objects with dirty tracking and lifecycle
//! events, a [`relationship`]/[`eager_load`] pair implementing N+1-free
//! eager loading, and a [`migration`] schema builder. Dialect crates
//! (`quarry-dialect-postgres`, `-mysql`, `-sqlite`, `-mssql`) each provide
//! one `Grammar` implementation plus an optional live driver adapter.

pub mod builder;
pub mod collection;
pub mod connection;
pub mod eager_load;
pub mod error;
pub mod expr;
pub mod grammar;
pub mod ident;
pub mod migration;
pub mod model;
pub mod pluralize;
pub mod relationship;
pub mod statement;
pub mod value;

pub use builder::QueryBuilder;
pub use collection::Collection;
pub use connection::{Connection, ConnectionConfig, ConnectionResolver, StatementResult};
pub use error::{Error, Result};
pub use grammar::Grammar;
pub use ident::{ColumnRef, Ident, TableRef};
pub use model::{Instance, Model, RelationValue};
pub use value::Value;
