use crate::value::Value;

/// Error taxonomy expressed as `thiserror`-derived leaf enums aggregated
/// into [`Error`], each carrying its own `Display`/`source()`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Query(#[from] QueryException),
    #[error(transparent)]
    ModelNotFound(#[from] ModelNotFound),
    #[error(transparent)]
    RelationshipNotLoaded(#[from] RelationshipNotLoaded),
    #[error(transparent)]
    MassAssignment(#[from] MassAssignmentError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    OperationCancelled(#[from] OperationCancelled),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("connection `{name}` is not registered")]
    UnknownConnection { name: String },
    #[error("invalid connection url: {reason}")]
    InvalidUrl { reason: String },
    #[error("model `{model}` declares both __hidden__ and __visible__, which are mutually exclusive")]
    HiddenAndVisible { model: &'static str },
    #[error("relationship `{name}` on model `{model}` has no resolvable related model")]
    UnresolvedRelationship { model: &'static str, name: String },
}

#[derive(Debug, thiserror::Error)]
#[error("query failed: {sql} (bindings={bindings:?}): {cause}")]
pub struct QueryException {
    pub sql: String,
    pub bindings: Vec<Value>,
    #[source]
    pub cause: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl QueryException {
    pub fn new(
        sql: impl Into<String>,
        bindings: Vec<Value>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            sql: sql.into(),
            bindings,
            cause: Box::new(cause),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("model `{model}` with key `{key}` was not found")]
pub struct ModelNotFound {
    pub model: &'static str,
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
#[error("relationship `{relation}` on model `{model}` was serialized before it was loaded")]
pub struct RelationshipNotLoaded {
    pub model: &'static str,
    pub relation: String,
}

#[derive(Debug, thiserror::Error)]
#[error("column `{column}` on model `{model}` is guarded against mass assignment")]
pub struct MassAssignmentError {
    pub model: &'static str,
    pub column: String,
}

/// Raised when an observer vetoes a `creating`/`updating`/`saving`/
/// `deleting` event by returning `false`.
#[derive(Debug, thiserror::Error)]
#[error("`{event}` on model `{model}` was cancelled by an observer")]
pub struct OperationCancelled {
    pub model: &'static str,
    pub event: &'static str,
}

#[derive(Debug, thiserror::Error)]
#[error("migration `{migration}` in batch {batch} failed: {cause}")]
pub struct MigrationError {
    pub migration: String,
    pub batch: i64,
    #[source]
    pub cause: Box<dyn std::error::Error + Send + Sync + 'static>,
}

pub type Result<T> = std::result::Result<T, Error>;
