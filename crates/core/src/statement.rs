//! Compiled DDL/DML units: `Statement::Sql { sql, transactional }` plus a
//! `BatchBoundary` variant for MSSQL's `GO` separator, which only a
//! cross-dialect compiler needs since each run otherwise targets a single
//! dialect family.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A single executable SQL string.
    Sql { sql: String, transactional: bool },
    /// A batch boundary (MSSQL `GO`) — not sent to the driver, only used
    /// when splitting a migration script into separately-executed batches.
    BatchBoundary,
}

impl Statement {
    #[must_use]
    pub fn sql(sql: impl Into<String>) -> Self {
        Self::Sql {
            sql: sql.into(),
            transactional: true,
        }
    }

    #[must_use]
    pub fn non_transactional(sql: impl Into<String>) -> Self {
        Self::Sql {
            sql: sql.into(),
            transactional: false,
        }
    }
}
