//! The `Schema` facade: migration files build a
//! [`crate::migration::blueprint::Blueprint`] through closures passed to
//! `create`/`table`/`drop_table`, and `Schema` compiles each into ordered
//! DDL [`crate::statement::Statement`]s via the active dialect's
//! [`crate::grammar::Grammar::compile_blueprint`].

use crate::grammar::Grammar;
use crate::migration::blueprint::Blueprint;
use crate::statement::Statement;

pub struct Schema<'a> {
    grammar: &'a dyn Grammar,
    statements: Vec<Statement>,
}

impl<'a> Schema<'a> {
    #[must_use]
    pub fn new(grammar: &'a dyn Grammar) -> Self {
        Self {
            grammar,
            statements: Vec::new(),
        }
    }

    pub fn create(&mut self, table: &str, build: impl FnOnce(&mut Blueprint)) {
        let mut blueprint = Blueprint::create(table);
        build(&mut blueprint);
        self.statements.extend(self.grammar.compile_blueprint(&blueprint));
    }

    pub fn table(&mut self, table: &str, build: impl FnOnce(&mut Blueprint)) {
        let mut blueprint = Blueprint::alter(table);
        build(&mut blueprint);
        self.statements.extend(self.grammar.compile_blueprint(&blueprint));
    }

    pub fn drop_table(&mut self, table: &str) {
        let blueprint = Blueprint::drop_table(table);
        self.statements.extend(self.grammar.compile_blueprint(&blueprint));
    }

    /// Compiles a `DROP TABLE IF EXISTS`, tolerating a table that was
    /// never created (a migration re-run, or a down-migration applied
    /// out of order).
    pub fn drop_table_if_exists(&mut self, table: &str) {
        let blueprint = Blueprint::drop_table_if_exists(table);
        self.statements.extend(self.grammar.compile_blueprint(&blueprint));
    }

    #[must_use]
    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }
}

/// A single migration file: forward (`up`) and reverse (`down`) schema
/// changes, named so the ledger can order files lexicographically.
pub trait Migration: Send + Sync {
    fn name(&self) -> &str;
    fn up(&self, schema: &mut Schema<'_>);
    fn down(&self, schema: &mut Schema<'_>);
}
