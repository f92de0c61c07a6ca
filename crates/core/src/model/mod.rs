//! Active-record model layer: attribute hydration with dirty tracking,
//! casts, mass assignment, serialization, lifecycle events, and
//! global/local scopes. Model metadata is registered once per type —
//! no runtime reflection.

pub mod cast;
pub mod event;
pub mod meta;
pub mod scope;

use std::marker::PhantomData;

use chrono::Utc;

use crate::builder::{QueryBuilder, Row};
use crate::collection::Collection;
use crate::connection::Connection;
use crate::error::{ConfigurationError, Error, MassAssignmentError, ModelNotFound, OperationCancelled, Result};
use crate::model::event::{dispatch, dispatch_cancelable, Event};
use crate::model::meta::ModelMeta;
use crate::value::{value_total_eq, Value};

/// A loaded (or not-yet-loaded) relationship value. Related rows hydrate
/// as plain [`Row`]s rather than a typed `Instance<Related>` — the eager
/// loader in [`crate::eager_load`] documents why one level of dot-path
/// recursion is manual in a statically-typed model graph.
#[derive(Debug, Clone)]
pub enum RelationValue {
    Unloaded,
    One(Option<Row>),
    Many(Collection<Row>),
}

/// Implemented once per concrete model type; `meta()` should return a
/// reference into a module-level `OnceLock<ModelMeta>` populated by a
/// `register()` function the first time it's accessed.
pub trait Model: Send + Sync + 'static {
    fn meta() -> &'static ModelMeta;
    fn model_name() -> &'static str;
}

/// Instance state: `attributes`, `original`, `relations`,
/// `exists`, and the `__force_update__` override.
pub struct Instance<M: Model> {
    attributes: Row,
    original: Row,
    relations: std::collections::HashMap<String, RelationValue>,
    exists: bool,
    force_update: bool,
    timestamps_enabled: bool,
    _marker: PhantomData<M>,
}

impl<M: Model> Instance<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: Row::new(),
            original: Row::new(),
            relations: std::collections::HashMap::new(),
            exists: false,
            force_update: false,
            timestamps_enabled: true,
            _marker: PhantomData,
        }
    }

    /// Materializes a freshly-queried row: fires `hydrating`/`hydrated`,
    /// and sets `original` to the just-loaded snapshot so `is_dirty()` is
    /// false immediately afterward.
    #[must_use]
    pub fn hydrate(row: Row) -> Self {
        let meta = M::meta();
        dispatch(&meta.observers, Event::Hydrating, &row);
        let instance = Self {
            attributes: row.clone(),
            original: row,
            relations: std::collections::HashMap::new(),
            exists: true,
            force_update: false,
            timestamps_enabled: true,
            _marker: PhantomData,
        };
        dispatch(&meta.observers, Event::Hydrated, &instance.attributes);
        instance
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.exists
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.attributes.iter().any(|(column, value)| match self.original.get(column) {
            Some(original) => !value_total_eq(value, original),
            None => true,
        })
    }

    #[must_use]
    pub fn dirty_columns(&self) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(column, value)| match self.original.get(column.as_str()) {
                Some(original) => !value_total_eq(value, original),
                None => true,
            })
            .map(|(column, _)| column.clone())
            .collect()
    }

    #[must_use]
    pub fn get_original(&self, column: &str) -> Option<&Value> {
        self.original.get(column)
    }

    /// Read order: (1) registered accessor/append
    /// function, (2) loaded relation (serialized form, not exposed via
    /// this method — see `relation`), (3) attribute with its cast
    /// applied. Lazily-triggered relationship loading needs a connection
    /// and therefore lives on `relation_or_load`, not here.
    #[must_use]
    pub fn get(&self, column: &str) -> Value {
        let meta = M::meta();
        if let Some(accessor) = meta.accessors.get(column) {
            return accessor(&self.attributes);
        }
        match self.attributes.get(column) {
            Some(value) => match meta.casts.get(column) {
                Some(cast) => cast.read(value),
                None => value.clone(),
            },
            None => Value::Null,
        }
    }

    /// Write order: (1) registered mutator, (2)
    /// cast-aware coerce, (3) store. Marks the model dirty by definition
    /// (comparison against `original` happens in `is_dirty`).
    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        let meta = M::meta();
        let mut value = value.into();
        if let Some(mutator) = meta.mutators.get(column) {
            value = mutator(value);
        } else if let Some(cast) = meta.casts.get(column) {
            value = cast.write(value);
        }
        self.attributes.insert(column.to_string(), value);
    }

    pub fn force_update(&mut self, flag: bool) {
        self.force_update = flag;
    }

    /// Toggles `created_at`/`updated_at` maintenance for this instance only,
    /// leaving `ModelMeta::timestamps` (and every other instance) untouched.
    /// Useful for a one-off import that needs to preserve caller-supplied
    /// timestamp columns verbatim.
    pub fn activate_timestamps(&mut self, flag: bool) {
        self.timestamps_enabled = flag;
    }

    pub fn relation(&self, name: &str) -> &RelationValue {
        self.relations.get(name).unwrap_or(&RelationValue::Unloaded)
    }

    pub fn set_relation(&mut self, name: impl Into<String>, value: RelationValue) {
        self.relations.insert(name.into(), value);
    }

    /// Filters `values` to fillable columns: `guarded`
    /// wins on conflict with `fillable`; `fillable = ["*"]` disables
    /// filtering entirely.
    fn mass_assign(&mut self, values: Vec<(String, Value)>) -> Result<()> {
        let meta = M::meta();
        for (column, value) in values {
            if !meta.is_fillable(&column) {
                return Err(Error::from(MassAssignmentError {
                    model: M::model_name(),
                    column,
                }));
            }
            self.set(&column, value);
        }
        Ok(())
    }

    fn apply_timestamps(&mut self, touch_updated_only: bool) {
        let meta = M::meta();
        if !meta.timestamps || !self.timestamps_enabled {
            return;
        }
        let now = Value::Text(Utc::now().to_rfc3339());
        if !touch_updated_only {
            self.attributes.entry("created_at".to_string()).or_insert_with(|| now.clone());
        }
        self.attributes.insert("updated_at".to_string(), now);
    }

    fn maybe_generate_uuid_key(&mut self) {
        let meta = M::meta();
        let Some(version) = meta.uuid_primary_key else {
            return;
        };
        if self.attributes.get(meta.primary_key).is_some_and(|v| !v.is_null()) {
            return;
        }
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        meta.table.hash(&mut hasher);
        for (column, value) in &self.attributes {
            column.hash(&mut hasher);
            value.to_string().hash(&mut hasher);
        }
        let seed = hasher.finish();
        self.attributes.insert(meta.primary_key.to_string(), crate::model::scope::generate_uuid(version, seed));
    }

    /// Chooses insert vs update based on `exists`, firing `saving`/
    /// `creating`/`created`/`updating`/`updated`/`saved`. A veto from any
    /// `*ing` observer is surfaced as a `saving` failure rather than
    /// silently no-op'ing.
    pub fn save(&mut self, conn: &mut dyn Connection) -> Result<()> {
        let meta = M::meta();
        if !dispatch_cancelable(&meta.observers, Event::Saving, &self.attributes) {
            return Err(Error::from(OperationCancelled {
                model: M::model_name(),
                event: "saving",
            }));
        }

        if self.exists {
            self.update_internal(conn, false)?;
        } else {
            self.insert_internal(conn)?;
        }

        dispatch(&meta.observers, Event::Saved, &self.attributes);
        Ok(())
    }

    fn insert_internal(&mut self, conn: &mut dyn Connection) -> Result<()> {
        let meta = M::meta();
        if !dispatch_cancelable(&meta.observers, Event::Creating, &self.attributes) {
            return Err(Error::from(OperationCancelled {
                model: M::model_name(),
                event: "creating",
            }));
        }
        self.maybe_generate_uuid_key();
        self.apply_timestamps(false);

        let values: Vec<(String, Value)> = self.attributes.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let id = QueryBuilder::table(meta.table.clone()).create(conn, values)?;
        if !id.is_null() && !self.attributes.contains_key(meta.primary_key) {
            self.attributes.insert(meta.primary_key.to_string(), id);
        }
        self.exists = true;
        self.original = self.attributes.clone();
        dispatch(&meta.observers, Event::Created, &self.attributes);
        Ok(())
    }

    fn update_internal(&mut self, conn: &mut dyn Connection, force: bool) -> Result<()> {
        let meta = M::meta();
        let dirty = self.dirty_columns();
        if dirty.is_empty() && !force && !self.force_update {
            return Ok(());
        }
        if !dispatch_cancelable(&meta.observers, Event::Updating, &self.attributes) {
            return Err(Error::from(OperationCancelled {
                model: M::model_name(),
                event: "updating",
            }));
        }
        self.apply_timestamps(true);

        let key = self.attributes.get(meta.primary_key).cloned().unwrap_or(Value::Null);
        let values: Vec<(String, Value)> = self
            .attributes
            .iter()
            .filter(|(k, _)| k.as_str() != meta.primary_key)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        QueryBuilder::table(meta.table.clone()).where_eq(meta.primary_key, key).update(conn, values)?;
        self.original = self.attributes.clone();
        dispatch(&meta.observers, Event::Updated, &self.attributes);
        Ok(())
    }

    /// `update(values)`: merges `values`, then skips SQL
    /// emission entirely when nothing ends up dirty unless `force` or
    /// `__force_update__` says otherwise.
    pub fn update(&mut self, conn: &mut dyn Connection, values: Vec<(String, Value)>, force: bool) -> Result<()> {
        self.mass_assign(values)?;
        self.update_internal(conn, force)
    }

    /// Respects the `SoftDeletes` global scope: rewrites into an `UPDATE
    /// deleted_col = now()` unless `force` bypasses it for this call.
    pub fn delete(&mut self, conn: &mut dyn Connection, force: bool) -> Result<u64> {
        let meta = M::meta();
        if !dispatch_cancelable(&meta.observers, Event::Deleting, &self.attributes) {
            return Ok(0);
        }
        let key = self.attributes.get(meta.primary_key).cloned().unwrap_or(Value::Null);
        let affected = match &meta.soft_delete_column {
            Some(column) if !force => QueryBuilder::table(meta.table.clone()).where_eq(meta.primary_key, key).update(
                conn,
                vec![(column.clone(), Value::Text(Utc::now().to_rfc3339()))],
            )?,
            _ => QueryBuilder::table(meta.table.clone()).where_eq(meta.primary_key, key).delete(conn)?,
        };
        dispatch(&meta.observers, Event::Deleted, &self.attributes);
        Ok(affected)
    }

    /// Serializes attributes (filtered by hidden/visible), appended
    /// computed attributes, and loaded relations.
    #[must_use]
    pub fn serialize(&self) -> serde_json::Value {
        let meta = M::meta();
        let mut map = serde_json::Map::new();
        for (column, _) in &self.attributes {
            if meta.is_visible(column) {
                map.insert(column.clone(), serde_json::to_value(self.get(column)).unwrap_or(serde_json::Value::Null));
            }
        }
        for appended in &meta.appends {
            map.insert(appended.clone(), serde_json::to_value(self.get(appended)).unwrap_or(serde_json::Value::Null));
        }
        for (name, relation) in &self.relations {
            let value = match relation {
                RelationValue::Unloaded => continue,
                RelationValue::One(row) => row
                    .as_ref()
                    .map(|r| serde_json::to_value(r).unwrap_or(serde_json::Value::Null))
                    .unwrap_or(serde_json::Value::Null),
                RelationValue::Many(rows) => rows.serialize(),
            };
            map.insert(name.clone(), value);
        }
        serde_json::Value::Object(map)
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        self.serialize().to_string()
    }

    // ---- static query entry points --------------------------------------

    /// A fresh builder with every registered global scope applied.
    #[must_use]
    pub fn query() -> QueryBuilder {
        let meta = M::meta();
        let mut builder = QueryBuilder::table(meta.table.clone());
        for scope in &meta.global_scopes {
            builder = scope.apply(builder);
        }
        builder
    }

    /// `query()` with the named global scope(s) skipped.
    #[must_use]
    pub fn query_without_scopes(names: &[&str]) -> QueryBuilder {
        let meta = M::meta();
        let mut builder = QueryBuilder::table(meta.table.clone());
        for scope in &meta.global_scopes {
            if !names.contains(&scope.name()) {
                builder = scope.apply(builder);
            }
        }
        builder
    }

    /// Includes soft-deleted rows.
    #[must_use]
    pub fn with_trashed() -> QueryBuilder {
        Self::query_without_scopes(&["soft_deletes"])
    }

    /// Only soft-deleted rows.
    #[must_use]
    pub fn only_trashed() -> QueryBuilder {
        let meta = M::meta();
        match &meta.soft_delete_column {
            Some(column) => Self::query_without_scopes(&["soft_deletes"]).where_not_null(column),
            None => Self::query(),
        }
    }

    pub fn find(conn: &mut dyn Connection, id: impl Into<Value>) -> Result<Option<Self>> {
        let meta = M::meta();
        Ok(Self::query().where_eq(meta.primary_key, id).first(conn)?.map(Self::hydrate))
    }

    pub fn find_or_fail(conn: &mut dyn Connection, id: impl Into<Value>) -> Result<Self> {
        let id = id.into();
        Self::find(conn, id.clone())?.ok_or_else(|| {
            Error::from(ModelNotFound {
                model: M::model_name(),
                key: id.to_string(),
            })
        })
    }

    pub fn all(conn: &mut dyn Connection) -> Result<Vec<Self>> {
        Ok(Self::query().get(conn)?.into_vec().into_iter().map(Self::hydrate).collect())
    }

    pub fn create(conn: &mut dyn Connection, values: Vec<(String, Value)>) -> Result<Self> {
        let mut instance = Self::new();
        instance.mass_assign(values)?;
        instance.save(conn)?;
        Ok(instance)
    }

    #[must_use]
    pub fn validate_serialization_config() -> std::result::Result<(), ConfigurationError> {
        let meta = M::meta();
        if !meta.hidden.is_empty() && !meta.visible.is_empty() {
            return Err(ConfigurationError::HiddenAndVisible { model: M::model_name() });
        }
        Ok(())
    }
}

impl<M: Model> Default for Instance<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::model::cast::Cast;
    use crate::model::meta::ModelMetaBuilder;

    struct TestUser;

    fn full_name_accessor(row: &Row) -> Value {
        let first = row.get("first_name").and_then(Value::as_str).unwrap_or("");
        let last = row.get("last_name").and_then(Value::as_str).unwrap_or("");
        Value::Text(format!("{first} {last}"))
    }

    impl Model for TestUser {
        fn meta() -> &'static ModelMeta {
            static META: OnceLock<ModelMeta> = OnceLock::new();
            META.get_or_init(|| {
                ModelMetaBuilder::new("test_users")
                    .fillable(&["first_name", "last_name", "is_admin"])
                    .hidden(&["password"])
                    .appends(&["full_name"])
                    .cast("is_admin", Cast::Bool)
                    .accessor("full_name", full_name_accessor)
                    .build()
            })
        }

        fn model_name() -> &'static str {
            "TestUser"
        }
    }

    #[test]
    fn get_applies_registered_cast() {
        let mut instance: Instance<TestUser> = Instance::new();
        instance.set("is_admin", Value::Integer(1));
        assert_eq!(instance.get("is_admin"), Value::Bool(true));
    }

    #[test]
    fn accessor_takes_priority_over_stored_attribute() {
        let mut instance: Instance<TestUser> = Instance::new();
        instance.set("first_name", "Ada");
        instance.set("last_name", "Lovelace");
        assert_eq!(instance.get("full_name"), Value::Text("Ada Lovelace".to_string()));
    }

    #[test]
    fn hydrate_starts_clean_then_set_marks_dirty() {
        let mut row = Row::new();
        row.insert("first_name".to_string(), Value::Text("Ada".to_string()));
        let mut instance = Instance::<TestUser>::hydrate(row);
        assert!(!instance.is_dirty());
        instance.set("first_name", "Grace");
        assert!(instance.is_dirty());
        assert_eq!(instance.dirty_columns(), vec!["first_name".to_string()]);
    }

    #[test]
    fn mass_assign_rejects_non_fillable_columns() {
        let mut instance: Instance<TestUser> = Instance::new();
        let result = instance.mass_assign(vec![("password".to_string(), Value::Text("secret".to_string()))]);
        assert!(result.is_err());
    }

    #[test]
    fn serialize_hides_configured_columns() {
        let mut instance: Instance<TestUser> = Instance::new();
        instance.set("first_name", "Ada");
        instance.set("password", "secret");
        let json = instance.serialize();
        assert!(json.get("first_name").is_some());
        assert!(json.get("password").is_none());
    }

    struct TimestampedWidget;

    impl Model for TimestampedWidget {
        fn meta() -> &'static ModelMeta {
            static META: OnceLock<ModelMeta> = OnceLock::new();
            META.get_or_init(|| ModelMetaBuilder::new("widgets").fillable(&["name"]).timestamps(true).build())
        }

        fn model_name() -> &'static str {
            "TimestampedWidget"
        }
    }

    #[test]
    fn apply_timestamps_sets_created_and_updated_at_by_default() {
        let mut instance: Instance<TimestampedWidget> = Instance::new();
        instance.apply_timestamps(false);
        assert!(instance.attributes.contains_key("created_at"));
        assert!(instance.attributes.contains_key("updated_at"));
    }

    #[test]
    fn activate_timestamps_false_disables_maintenance_for_this_instance() {
        let mut instance: Instance<TimestampedWidget> = Instance::new();
        instance.activate_timestamps(false);
        instance.apply_timestamps(false);
        assert!(!instance.attributes.contains_key("created_at"));
        assert!(!instance.attributes.contains_key("updated_at"));
    }
}
