//! The migration ledger: a `migrations` table tracking
//! `{id, migration, batch}`. `migrate` applies every unmigrated file in
//! lexicographic filename order under the next batch number;
//! `migrate:rollback` reverses the last batch; `migrate:reset` reverses
//! every batch; `migrate:refresh` resets then migrates; `migrate:status`
//! reports migrated/pending per file.

use crate::connection::Connection;
use crate::error::{Error, MigrationError};
use crate::expr::Direction;
use crate::migration::schema::{Migration, Schema};
use crate::statement::Statement;
use crate::value::Value;

pub struct MigrationLedger {
    table: String,
}

impl Default for MigrationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: "migrations".to_string(),
        }
    }

    pub fn ensure_table(&self, conn: &mut dyn Connection) -> crate::error::Result<()> {
        let mut schema = Schema::new(conn.grammar());
        schema.create(&self.table, |bp| {
            bp.increments("id");
            bp.string("migration", 255).unique();
            bp.integer("batch");
        });
        for statement in schema.into_statements() {
            execute_statement(conn, &statement, "migrations", 0)?;
        }
        Ok(())
    }

    /// All applied `(migration, batch)` pairs in application order.
    pub fn applied(&self, conn: &mut dyn Connection) -> crate::error::Result<Vec<(String, i64)>> {
        let rows = crate::builder::QueryBuilder::table(self.table.clone())
            .order_by("id", Direction::Asc)
            .get(conn)?;
        Ok(rows
            .iter()
            .map(|row| {
                let migration = row.get("migration").and_then(Value::as_str).unwrap_or_default().to_string();
                let batch = row.get("batch").and_then(Value::as_i64).unwrap_or(0);
                (migration, batch)
            })
            .collect())
    }

    fn record(&self, conn: &mut dyn Connection, name: &str, batch: i64) -> crate::error::Result<()> {
        crate::builder::QueryBuilder::table(self.table.clone()).create(
            conn,
            vec![
                ("migration".to_string(), Value::Text(name.to_string())),
                ("batch".to_string(), Value::Integer(batch)),
            ],
        )?;
        Ok(())
    }

    fn forget(&self, conn: &mut dyn Connection, name: &str) -> crate::error::Result<()> {
        crate::builder::QueryBuilder::table(self.table.clone())
            .where_eq("migration", name)
            .delete(conn)?;
        Ok(())
    }

    /// Applies every migration in `candidates` not yet recorded, in
    /// ascending name order, under one new batch number. Each file runs in
    /// its own transaction: a failure rolls back that file but leaves
    /// prior files in the same batch committed. Cross-file batch
    /// atomicity depends on the driver, which this ledger does not
    /// second-guess.
    pub fn migrate(
        &self,
        conn: &mut dyn Connection,
        candidates: &[Box<dyn Migration>],
    ) -> crate::error::Result<Vec<String>> {
        self.ensure_table(conn)?;
        let applied = self.applied(conn)?;
        let applied_names: std::collections::HashSet<_> = applied.iter().map(|(name, _)| name.clone()).collect();
        let next_batch = applied.iter().map(|(_, batch)| *batch).max().unwrap_or(0) + 1;

        let mut pending: Vec<&Box<dyn Migration>> =
            candidates.iter().filter(|m| !applied_names.contains(m.name())).collect();
        pending.sort_by_key(|m| m.name().to_string());

        let mut applied_now = Vec::new();
        for migration in pending {
            self.run_in_transaction(conn, migration.name(), next_batch, |conn| {
                let mut schema = Schema::new(conn.grammar());
                migration.up(&mut schema);
                for statement in schema.into_statements() {
                    execute_statement(conn, &statement, migration.name(), next_batch)?;
                }
                self.record(conn, migration.name(), next_batch)
            })?;
            applied_now.push(migration.name().to_string());
        }
        Ok(applied_now)
    }

    /// Reverses every migration recorded in the last batch.
    pub fn rollback(&self, conn: &mut dyn Connection, candidates: &[Box<dyn Migration>]) -> crate::error::Result<Vec<String>> {
        self.ensure_table(conn)?;
        let applied = self.applied(conn)?;
        let Some(last_batch) = applied.iter().map(|(_, batch)| *batch).max() else {
            return Ok(Vec::new());
        };
        let mut targets: Vec<&str> = applied
            .iter()
            .filter(|(_, batch)| *batch == last_batch)
            .map(|(name, _)| name.as_str())
            .collect();
        targets.sort_unstable();
        targets.reverse();

        let mut rolled_back = Vec::new();
        for name in targets {
            let Some(migration) = candidates.iter().find(|m| m.name() == name) else {
                continue;
            };
            self.run_in_transaction(conn, name, last_batch, |conn| {
                let mut schema = Schema::new(conn.grammar());
                migration.down(&mut schema);
                for statement in schema.into_statements() {
                    execute_statement(conn, &statement, name, last_batch)?;
                }
                self.forget(conn, name)
            })?;
            rolled_back.push(name.to_string());
        }
        Ok(rolled_back)
    }

    /// Rolls back every batch, most recent first.
    pub fn reset(&self, conn: &mut dyn Connection, candidates: &[Box<dyn Migration>]) -> crate::error::Result<Vec<String>> {
        let mut all = Vec::new();
        loop {
            let batch = self.rollback(conn, candidates)?;
            if batch.is_empty() {
                return Ok(all);
            }
            all.extend(batch);
        }
    }

    /// Resets then migrates, returning the names re-applied.
    pub fn refresh(&self, conn: &mut dyn Connection, candidates: &[Box<dyn Migration>]) -> crate::error::Result<Vec<String>> {
        self.reset(conn, candidates)?;
        self.migrate(conn, candidates)
    }

    /// Reports, for each candidate in input order, whether it has been
    /// applied.
    pub fn status(&self, conn: &mut dyn Connection, candidates: &[Box<dyn Migration>]) -> crate::error::Result<Vec<(String, bool)>> {
        self.ensure_table(conn)?;
        let applied = self.applied(conn)?;
        let applied_names: std::collections::HashSet<_> = applied.into_iter().map(|(name, _)| name).collect();
        Ok(candidates
            .iter()
            .map(|m| (m.name().to_string(), applied_names.contains(m.name())))
            .collect())
    }

    fn run_in_transaction(
        &self,
        conn: &mut dyn Connection,
        name: &str,
        batch: i64,
        f: impl FnOnce(&mut dyn Connection) -> crate::error::Result<()>,
    ) -> crate::error::Result<()> {
        conn.begin_transaction().map_err(|cause| migration_error(name, batch, cause))?;
        match f(conn) {
            Ok(()) => {
                conn.commit().map_err(|cause| migration_error(name, batch, cause))?;
                Ok(())
            }
            Err(err) => {
                let _ = conn.rollback();
                Err(err)
            }
        }
    }
}

fn execute_statement(
    conn: &mut dyn Connection,
    statement: &Statement,
    migration: &str,
    batch: i64,
) -> crate::error::Result<()> {
    match statement {
        Statement::Sql { sql, .. } => {
            tracing::debug!(target: "quarry::migration", migration, sql);
            conn.statement(sql, &[]).map_err(|cause| migration_error(migration, batch, cause))?;
            Ok(())
        }
        Statement::BatchBoundary => Ok(()),
    }
}

fn migration_error(migration: &str, batch: i64, cause: Box<dyn std::error::Error + Send + Sync>) -> Error {
    Error::from(MigrationError {
        migration: migration.to_string(),
        batch,
        cause,
    })
}
