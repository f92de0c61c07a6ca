//! Migration schema builder and blueprint compiler: the
//! `Blueprint` DSL, the `Schema`/`Migration` facade migration files write
//! against, and the `migrations`-table ledger that drives `migrate`,
//! `migrate:rollback`, `migrate:reset`, `migrate:refresh`, and
//! `migrate:status`.

pub mod blueprint;
pub mod ledger;
pub mod schema;

pub use blueprint::{Blueprint, ColumnDef, ColumnType, ForeignAction, IndexDef, IndexKind};
pub use ledger::MigrationLedger;
pub use schema::{Migration, Schema};
