//! Per-model-type metadata, computed once via a `register()` hook backed
//! by a `OnceLock` in the implementing type — no runtime reflection,
//! explicit registration only.

use std::collections::HashMap;

use crate::builder::Row;
use crate::model::cast::Cast;
use crate::model::event::Observer;
use crate::model::scope::{GlobalScope, UuidVersion};
use crate::relationship::RelationshipDescriptor;
use crate::value::Value;

/// A custom accessor (`get_<name>_attribute`) or appended computed
/// attribute: given the full attribute map, produces a value.
pub type Accessor = fn(&Row) -> Value;

/// A custom mutator (`set_<name>_attribute`): given the value passed to
/// the setter, produces the value actually stored.
pub type Mutator = fn(Value) -> Value;

pub struct ModelMeta {
    pub table: String,
    pub primary_key: &'static str,
    pub connection: Option<&'static str>,
    pub timestamps: bool,
    pub timezone: &'static str,
    pub fillable: Vec<String>,
    pub guarded: Vec<String>,
    pub hidden: Vec<String>,
    pub visible: Vec<String>,
    pub appends: Vec<String>,
    pub casts: HashMap<String, Cast>,
    pub soft_delete_column: Option<String>,
    pub uuid_primary_key: Option<UuidVersion>,
    pub global_scopes: Vec<Box<dyn GlobalScope>>,
    pub relationships: HashMap<String, RelationshipDescriptor>,
    pub accessors: HashMap<String, Accessor>,
    pub mutators: HashMap<String, Mutator>,
    pub observers: Vec<Box<dyn Observer>>,
}

/// Builder used by a model's `register()` function; `ModelMeta` itself has
/// no public constructor so every field is set deliberately.
pub struct ModelMetaBuilder {
    meta: ModelMeta,
}

impl ModelMetaBuilder {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            meta: ModelMeta {
                table: table.into(),
                primary_key: "id",
                connection: None,
                timestamps: true,
                timezone: "UTC",
                fillable: Vec::new(),
                guarded: Vec::new(),
                hidden: Vec::new(),
                visible: Vec::new(),
                appends: Vec::new(),
                casts: HashMap::new(),
                soft_delete_column: None,
                uuid_primary_key: None,
                global_scopes: Vec::new(),
                relationships: HashMap::new(),
                accessors: HashMap::new(),
                mutators: HashMap::new(),
                observers: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn primary_key(mut self, key: &'static str) -> Self {
        self.meta.primary_key = key;
        self
    }

    #[must_use]
    pub fn connection(mut self, name: &'static str) -> Self {
        self.meta.connection = Some(name);
        self
    }

    #[must_use]
    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.meta.timestamps = enabled;
        self
    }

    #[must_use]
    pub fn timezone(mut self, tz: &'static str) -> Self {
        self.meta.timezone = tz;
        self
    }

    #[must_use]
    pub fn fillable(mut self, columns: &[&str]) -> Self {
        self.meta.fillable = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    #[must_use]
    pub fn guarded(mut self, columns: &[&str]) -> Self {
        self.meta.guarded = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Panics at registration time if both `hidden` and `visible` are
    /// set — the combination is a configuration error, and registration
    /// happens once at process start, so failing loudly here beats
    /// deferring to the first `serialize()` call.
    #[must_use]
    pub fn hidden(mut self, columns: &[&str]) -> Self {
        self.meta.hidden = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    #[must_use]
    pub fn visible(mut self, columns: &[&str]) -> Self {
        self.meta.visible = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    #[must_use]
    pub fn appends(mut self, names: &[&str]) -> Self {
        self.meta.appends = names.iter().map(|c| c.to_string()).collect();
        self
    }

    #[must_use]
    pub fn cast(mut self, column: &str, cast: Cast) -> Self {
        self.meta.casts.insert(column.to_string(), cast);
        self
    }

    #[must_use]
    pub fn soft_deletes(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.meta.global_scopes.push(Box::new(crate::model::scope::SoftDeletesScope {
            column: column.clone(),
        }));
        self.meta.soft_delete_column = Some(column);
        self
    }

    #[must_use]
    pub fn uuid_primary_key(mut self, version: UuidVersion) -> Self {
        self.meta.global_scopes.push(Box::new(crate::model::scope::UuidPrimaryKeyScope { version }));
        self.meta.uuid_primary_key = Some(version);
        self
    }

    #[must_use]
    pub fn global_scope(mut self, scope: Box<dyn GlobalScope>) -> Self {
        self.meta.global_scopes.push(scope);
        self
    }

    #[must_use]
    pub fn relationship(mut self, descriptor: RelationshipDescriptor) -> Self {
        self.meta.relationships.insert(descriptor.name.clone(), descriptor);
        self
    }

    #[must_use]
    pub fn accessor(mut self, column: &str, f: Accessor) -> Self {
        self.meta.accessors.insert(column.to_string(), f);
        self
    }

    #[must_use]
    pub fn mutator(mut self, column: &str, f: Mutator) -> Self {
        self.meta.mutators.insert(column.to_string(), f);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.meta.observers.push(observer);
        self
    }

    #[must_use]
    pub fn build(self) -> ModelMeta {
        assert!(
            self.meta.hidden.is_empty() || self.meta.visible.is_empty(),
            "model declares both hidden and visible columns, which are mutually exclusive"
        );
        self.meta
    }
}

impl ModelMeta {
    #[must_use]
    pub fn is_fillable(&self, column: &str) -> bool {
        if self.guarded.iter().any(|g| g == column) {
            return false;
        }
        if self.fillable.iter().any(|f| f == "*") {
            return true;
        }
        if self.fillable.is_empty() {
            // Already passed the guarded check above, so an empty
            // fillable list with only `guarded` configured allows
            // everything not explicitly guarded.
            return true;
        }
        self.fillable.iter().any(|f| f == column)
    }

    #[must_use]
    pub fn is_visible(&self, column: &str) -> bool {
        if !self.visible.is_empty() {
            return self.visible.iter().any(|v| v == column);
        }
        !self.hidden.iter().any(|h| h == column)
    }
}
