//! Batched, N+1-free relationship loading: loading `N`
//! parents across `K` distinct relation names issues exactly one `SELECT`
//! per name (`K` statements total, on top of whatever query produced the
//! parents themselves), never one per parent.
//!
//! Rust's static model typing can't express the arbitrary-depth,
//! dynamically-typed-model-graph recursion the dotted-path form
//! (`"author.country"`) implies in a dynamically-typed host language — a
//! single call here only loads one path segment (the part before the
//! first `.`). Loading `"author.country"` means calling [`load`] for
//! `"author"` against `M`, then calling it again for `"country"` against
//! the author's own model type once the caller has the hydrated
//! `Instance<Author>` rows in hand. This is the documented, deliberate
//! simplification: every *single-level* relation name still gets the full
//! batched treatment, so the N+1-free invariant holds at each hop.

use std::collections::HashMap;

use crate::builder::{QueryBuilder, Row};
use crate::collection::Collection;
use crate::connection::Connection;
use crate::error::{ConfigurationError, Error, Result};
use crate::expr::Operator;
use crate::model::{Instance, Model, RelationValue};
use crate::pluralize::default_pivot_table;
use crate::relationship::RelationshipKind;
use crate::value::Value;

/// Loads every named relation (its head segment only, for dotted paths)
/// against `parents`, attaching the result to each instance's relation
/// map. Safe to call with an empty `parents` slice or a relation already
/// loaded — re-running it simply refreshes the attached value.
pub fn load<M: Model>(conn: &mut dyn Connection, parents: &mut [Instance<M>], relations: &[&str]) -> Result<()> {
    for path in relations {
        let head = path.split('.').next().unwrap_or(path);
        load_one(conn, parents, head)?;
    }
    Ok(())
}

/// Attaches a correlated-subquery count under `"{name}_count"` for each
/// parent, without loading the related rows themselves.
pub fn with_count<M: Model>(conn: &mut dyn Connection, parents: &mut [Instance<M>], name: &str) -> Result<()> {
    let meta = M::meta();
    let descriptor = meta.relationships.get(name).ok_or_else(|| relationship_error::<M>(name))?.clone();
    let related_table = (descriptor.related_table)();

    let (local_key, foreign_key) = match &descriptor.kind {
        RelationshipKind::HasOne(rel) => (rel.local_key.clone(), rel.foreign_key.clone()),
        RelationshipKind::HasMany(rel) => (rel.local_key.clone(), rel.foreign_key.clone()),
        _ => {
            return Err(Error::from(ConfigurationError::UnresolvedRelationship {
                model: M::model_name(),
                name: format!("{name} (with_count only supports has_one/has_many)"),
            }));
        }
    };

    let keys = collect_keys(parents, &local_key);
    if keys.is_empty() {
        return Ok(());
    }
    let rows = QueryBuilder::table(related_table.to_string()).where_in(&foreign_key, keys).get(conn)?;
    let mut counts: HashMap<String, i64> = HashMap::new();
    for row in &rows {
        let key = group_key(row.get(&foreign_key).unwrap_or(&Value::Null));
        *counts.entry(key).or_insert(0) += 1;
    }
    let attribute = format!("{name}_count");
    for parent in parents.iter_mut() {
        let key = group_key(&parent.get(&local_key));
        let count = counts.get(&key).copied().unwrap_or(0);
        parent.set(&attribute, Value::Integer(count));
    }
    Ok(())
}

fn relationship_error<M: Model>(name: &str) -> Error {
    Error::from(ConfigurationError::UnresolvedRelationship {
        model: M::model_name(),
        name: name.to_string(),
    })
}

fn load_one<M: Model>(conn: &mut dyn Connection, parents: &mut [Instance<M>], name: &str) -> Result<()> {
    if parents.is_empty() {
        return Ok(());
    }
    let meta = M::meta();
    let descriptor = meta.relationships.get(name).ok_or_else(|| relationship_error::<M>(name))?.clone();
    let related_table = (descriptor.related_table)();

    match descriptor.kind {
        RelationshipKind::BelongsTo(rel) => {
            let keys = collect_keys(parents, &rel.foreign_key);
            if keys.is_empty() {
                return Ok(());
            }
            let rows = QueryBuilder::table(related_table.to_string()).where_in(&rel.owner_key, keys).get(conn)?;
            let index = index_by(rows.into_vec(), &rel.owner_key);
            for parent in parents.iter_mut() {
                let key = group_key(&parent.get(&rel.foreign_key));
                parent.set_relation(name, RelationValue::One(index.get(&key).cloned()));
            }
        }
        RelationshipKind::HasOne(rel) => {
            let keys = collect_keys(parents, &rel.local_key);
            if keys.is_empty() {
                return Ok(());
            }
            let rows = QueryBuilder::table(related_table.to_string()).where_in(&rel.foreign_key, keys).get(conn)?;
            let index = index_by(rows.into_vec(), &rel.foreign_key);
            for parent in parents.iter_mut() {
                let key = group_key(&parent.get(&rel.local_key));
                parent.set_relation(name, RelationValue::One(index.get(&key).cloned()));
            }
        }
        RelationshipKind::HasMany(rel) => {
            let keys = collect_keys(parents, &rel.local_key);
            if keys.is_empty() {
                return Ok(());
            }
            let rows = QueryBuilder::table(related_table.to_string()).where_in(&rel.foreign_key, keys).get(conn)?;
            let groups = group_rows_by(rows.into_vec(), &rel.foreign_key);
            for parent in parents.iter_mut() {
                let key = group_key(&parent.get(&rel.local_key));
                let matched = groups.get(&key).cloned().unwrap_or_default();
                parent.set_relation(name, RelationValue::Many(Collection::new(matched)));
            }
        }
        RelationshipKind::BelongsToMany(rel) => {
            let pivot_table = rel.pivot_table.clone().unwrap_or_else(|| default_pivot_table(&meta.table, related_table));
            let keys = collect_keys(parents, &rel.parent_key);
            if keys.is_empty() {
                return Ok(());
            }
            const PIVOT_PREFIX: &str = "__quarry_pivot__";

            // The two join keys are always pulled across so rows can be
            // grouped back to a parent; `pivot_id`/`with_fields`/
            // `with_timestamps` add whatever else the pivot attribute
            // should carry.
            let mut pivot_columns: Vec<String> = vec![rel.foreign_pivot_key.clone(), rel.related_pivot_key.clone()];
            if let Some(pivot_id) = &rel.pivot_id {
                pivot_columns.push(pivot_id.clone());
            }
            pivot_columns.extend(rel.with_fields.iter().cloned());
            if rel.with_timestamps {
                pivot_columns.push("created_at".to_string());
                pivot_columns.push("updated_at".to_string());
            }
            pivot_columns.sort();
            pivot_columns.dedup();

            let select_related = format!("{related_table}.*");
            let pivot_selects: Vec<String> = pivot_columns
                .iter()
                .map(|column| format!("{pivot_table}.{column} as {PIVOT_PREFIX}{column}"))
                .collect();
            let mut select_refs: Vec<&str> = vec![select_related.as_str()];
            select_refs.extend(pivot_selects.iter().map(String::as_str));

            let join_left = format!("{related_table}.{}", rel.related_key);
            let join_right = format!("{pivot_table}.{}", rel.related_pivot_key);
            let where_column = format!("{pivot_table}.{}", rel.foreign_pivot_key);
            let rows = QueryBuilder::table(related_table.to_string())
                .select(&select_refs)
                .join(pivot_table, &join_left, Operator::Eq, &join_right)
                .where_in(&where_column, keys)
                .get(conn)?;

            let mut groups: HashMap<String, Vec<Row>> = HashMap::new();
            for mut row in rows.into_vec() {
                let pivot_row = extract_pivot_row(&mut row, &pivot_columns, PIVOT_PREFIX);
                let marker = pivot_row.get(&rel.foreign_pivot_key).cloned().unwrap_or(Value::Null);
                let pivot_json = serde_json::to_string(&pivot_row).unwrap_or_default();
                row.insert(rel.attribute_name.clone(), Value::Json(pivot_json));
                groups.entry(group_key(&marker)).or_default().push(row);
            }
            for parent in parents.iter_mut() {
                let key = group_key(&parent.get(&rel.parent_key));
                let matched = groups.get(&key).cloned().unwrap_or_default();
                parent.set_relation(name, RelationValue::Many(Collection::new(matched)));
            }
        }
        RelationshipKind::HasOneThrough(rel) => {
            let through_table = descriptor.through_table.expect("has_one_through descriptor carries a through_table")();
            let keys = collect_keys(parents, &rel.local_key_on_parent);
            if keys.is_empty() {
                return Ok(());
            }
            const THROUGH_MARKER: &str = "__quarry_through_parent_key";
            let rows = through_join_query(related_table, through_table, &rel.foreign_key_on_far, &rel.local_key_on_intermediate, &rel.foreign_key_on_intermediate, keys, THROUGH_MARKER)
                .get(conn)?;
            let mut index: HashMap<String, Row> = HashMap::new();
            for mut row in rows.into_vec() {
                let marker = row.remove(THROUGH_MARKER).unwrap_or(Value::Null);
                index.entry(group_key(&marker)).or_insert(row);
            }
            for parent in parents.iter_mut() {
                let key = group_key(&parent.get(&rel.local_key_on_parent));
                parent.set_relation(name, RelationValue::One(index.get(&key).cloned()));
            }
        }
        RelationshipKind::HasManyThrough(rel) => {
            let through_table = descriptor.through_table.expect("has_many_through descriptor carries a through_table")();
            let keys = collect_keys(parents, &rel.local_key_on_parent);
            if keys.is_empty() {
                return Ok(());
            }
            const THROUGH_MARKER: &str = "__quarry_through_parent_key";
            let rows = through_join_query(related_table, through_table, &rel.foreign_key_on_far, &rel.local_key_on_intermediate, &rel.foreign_key_on_intermediate, keys, THROUGH_MARKER)
                .get(conn)?;
            let mut groups: HashMap<String, Vec<Row>> = HashMap::new();
            for mut row in rows.into_vec() {
                let marker = row.remove(THROUGH_MARKER).unwrap_or(Value::Null);
                groups.entry(group_key(&marker)).or_default().push(row);
            }
            for parent in parents.iter_mut() {
                let key = group_key(&parent.get(&rel.local_key_on_parent));
                let matched = groups.get(&key).cloned().unwrap_or_default();
                parent.set_relation(name, RelationValue::Many(Collection::new(matched)));
            }
        }
    }
    Ok(())
}

/// `far JOIN intermediate ON far.foreign_key_on_far = intermediate.local_key_on_intermediate`,
/// filtered to the intermediate rows whose `foreign_key_on_intermediate`
/// matches one of `parent_keys`, with that column re-selected under
/// `marker` so the caller can group far-table rows back to a parent.
fn through_join_query(
    far_table: &str,
    intermediate_table: &str,
    foreign_key_on_far: &str,
    local_key_on_intermediate: &str,
    foreign_key_on_intermediate: &str,
    parent_keys: Vec<Value>,
    marker: &str,
) -> QueryBuilder {
    let select_far = format!("{far_table}.*");
    let select_marker = format!("{intermediate_table}.{foreign_key_on_intermediate} as {marker}");
    let join_left = format!("{far_table}.{foreign_key_on_far}");
    let join_right = format!("{intermediate_table}.{local_key_on_intermediate}");
    let where_column = format!("{intermediate_table}.{foreign_key_on_intermediate}");
    QueryBuilder::table(far_table.to_string())
        .select(&[select_far.as_str(), select_marker.as_str()])
        .join(intermediate_table.to_string(), &join_left, Operator::Eq, &join_right)
        .where_in(&where_column, parent_keys)
}

fn collect_keys<M: Model>(parents: &[Instance<M>], column: &str) -> Vec<Value> {
    let mut seen = std::collections::HashSet::new();
    let mut keys = Vec::new();
    for parent in parents {
        let value = parent.get(column);
        if value.is_null() {
            continue;
        }
        let marker = group_key(&value);
        if seen.insert(marker) {
            keys.push(value);
        }
    }
    keys
}

fn index_by(rows: Vec<Row>, column: &str) -> HashMap<String, Row> {
    let mut index = HashMap::new();
    for row in rows {
        let key = group_key(row.get(column).unwrap_or(&Value::Null));
        index.entry(key).or_insert(row);
    }
    index
}

/// Pulls every `{prefix}{column}`-aliased pivot column out of a hydrated
/// related row into its own [`Row`], leaving the related row with only its
/// own columns.
fn extract_pivot_row(row: &mut Row, pivot_columns: &[String], prefix: &str) -> Row {
    let mut pivot_row = Row::new();
    for column in pivot_columns {
        if let Some(value) = row.remove(&format!("{prefix}{column}")) {
            pivot_row.insert(column.clone(), value);
        }
    }
    pivot_row
}

fn group_rows_by(rows: Vec<Row>, column: &str) -> HashMap<String, Vec<Row>> {
    let mut groups: HashMap<String, Vec<Row>> = HashMap::new();
    for row in rows {
        let key = group_key(row.get(column).unwrap_or(&Value::Null));
        groups.entry(key).or_default().push(row);
    }
    groups
}

/// A grouping key derived from a [`Value`]: `Value` has no `Hash`/`Eq`
/// impl of its own (`Float`'s `PartialEq` isn't total), so joins here key
/// on this string form instead, distinguishing variants by a tag prefix
/// to avoid `Integer(1)` and `Text("1")` colliding.
fn group_key(value: &Value) -> String {
    match value {
        Value::Null => "null:".to_string(),
        Value::Bool(b) => format!("bool:{b}"),
        Value::Integer(n) => format!("int:{n}"),
        Value::Float(n) => format!("float:{n}"),
        Value::Text(s) => format!("text:{s}"),
        Value::Json(s) => format!("json:{s}"),
        Value::Bytes(b) => format!("bytes:{}", b.iter().map(|byte| format!("{byte:02x}")).collect::<String>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_key_distinguishes_integer_and_text_lookalikes() {
        assert_ne!(group_key(&Value::Integer(1)), group_key(&Value::Text("1".to_string())));
    }

    #[test]
    fn group_key_is_stable_for_equal_values() {
        assert_eq!(group_key(&Value::Integer(42)), group_key(&Value::Integer(42)));
        assert_eq!(group_key(&Value::Text("a".to_string())), group_key(&Value::Text("a".to_string())));
    }

    #[test]
    fn index_by_keeps_first_row_on_duplicate_keys() {
        let mut first = Row::new();
        first.insert("id".to_string(), Value::Integer(1));
        first.insert("name".to_string(), Value::Text("first".to_string()));
        let mut second = Row::new();
        second.insert("id".to_string(), Value::Integer(1));
        second.insert("name".to_string(), Value::Text("second".to_string()));

        let index = index_by(vec![first, second], "id");
        let key = group_key(&Value::Integer(1));
        assert_eq!(index.get(&key).and_then(|r| r.get("name")), Some(&Value::Text("first".to_string())));
    }

    #[test]
    fn extract_pivot_row_separates_prefixed_columns_from_the_related_row() {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::Integer(9));
        row.insert("name".to_string(), Value::Text("widget".to_string()));
        row.insert("__quarry_pivot__store_id".to_string(), Value::Integer(1));
        row.insert("__quarry_pivot__product_id".to_string(), Value::Integer(9));

        let pivot_columns = vec!["store_id".to_string(), "product_id".to_string()];
        let pivot_row = extract_pivot_row(&mut row, &pivot_columns, "__quarry_pivot__");

        assert_eq!(pivot_row.get("store_id"), Some(&Value::Integer(1)));
        assert_eq!(pivot_row.get("product_id"), Some(&Value::Integer(9)));
        assert!(!row.contains_key("__quarry_pivot__store_id"));
        assert!(!row.contains_key("__quarry_pivot__product_id"));
        assert_eq!(row.get("id"), Some(&Value::Integer(9)));
    }

    #[test]
    fn group_rows_by_groups_every_match() {
        let mut a = Row::new();
        a.insert("author_id".to_string(), Value::Integer(7));
        let mut b = Row::new();
        b.insert("author_id".to_string(), Value::Integer(7));
        let mut c = Row::new();
        c.insert("author_id".to_string(), Value::Integer(8));

        let groups = group_rows_by(vec![a, b, c], "author_id");
        assert_eq!(groups.get(&group_key(&Value::Integer(7))).map(Vec::len), Some(2));
        assert_eq!(groups.get(&group_key(&Value::Integer(8))).map(Vec::len), Some(1));
    }
}
