//! YAML-driven query-compilation fixtures: a `serde`-deserialized case
//! struct, a three-way pass/skip/fail result, and a `parse_yaml_error`
//! diagnostic converter, applied to per-dialect SQL compilation. One
//! fixture names a [`quarry_core::builder::QueryBuilder`] shape and the
//! exact SQL string each dialect's [`quarry_core::grammar::Grammar`] must
//! compile it to.

use std::collections::BTreeMap;

use serde::Deserialize;
use quarry_core::builder::QueryBuilder;
use quarry_core::expr::Operator;
use quarry_core::grammar::Grammar;
use quarry_core::value::Value;

const FIXTURE_SOURCE_LABEL: &str = "yaml fixture";

#[derive(Debug, thiserror::Error)]
#[error("failed to parse fixture `{excerpt}`: {source}")]
pub struct FixtureParseError {
    pub excerpt: String,
    #[source]
    pub source: serde_yaml::Error,
}

pub type Result<T> = std::result::Result<T, FixtureParseError>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WhereFixture {
    pub column: String,
    pub op: String,
    pub value: FixtureValue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FixtureValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Default for FixtureValue {
    fn default() -> Self {
        FixtureValue::Text(String::new())
    }
}

impl From<FixtureValue> for Value {
    fn from(value: FixtureValue) -> Self {
        match value {
            FixtureValue::Int(n) => Value::Integer(n),
            FixtureValue::Float(n) => Value::Float(n),
            FixtureValue::Bool(b) => Value::Bool(b),
            FixtureValue::Text(s) => Value::Text(s),
        }
    }
}

/// A single query shape plus the SQL every listed dialect must compile it
/// to, keyed by [`Grammar::name`]. A dialect absent from `expected` is not
/// checked by [`run_select_fixture`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryFixture {
    pub table: String,
    pub wheres: Vec<WhereFixture>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub lock: Option<String>,
    pub expected: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

pub fn load_fixtures_from_str(yaml: &str) -> Result<BTreeMap<String, QueryFixture>> {
    serde_yaml::from_str(yaml).map_err(|source| parse_yaml_error(yaml, source))
}

fn build_query(fixture: &QueryFixture) -> QueryBuilder {
    let mut builder = QueryBuilder::table(fixture.table.clone());
    for clause in &fixture.wheres {
        let op = Operator::from_str(&clause.op).unwrap_or(Operator::Eq);
        builder = builder.where_op(&clause.column, op, Value::from(clause.value.clone()));
    }
    if let Some(limit) = fixture.limit {
        builder = builder.limit(limit);
    }
    if let Some(offset) = fixture.offset {
        builder = builder.offset(offset);
    }
    match fixture.lock.as_deref() {
        Some("update") => builder = builder.lock_for_update(),
        Some("shared") => builder = builder.shared_lock(),
        _ => {}
    }
    builder
}

/// Compiles `fixture` with `grammar` and compares against
/// `fixture.expected[grammar.name()]`. Skips (rather than fails) when the
/// fixture names no expectation for this dialect — a dialect gap is not a
/// failure.
pub fn run_select_fixture(fixture: &QueryFixture, grammar: &dyn Grammar) -> TestResult {
    let Some(expected) = fixture.expected.get(grammar.name()) else {
        return TestResult::Skipped(format!("no expectation recorded for dialect `{}`", grammar.name()));
    };
    let builder = build_query(fixture);
    let (sql, _bindings) = grammar.compile_select(&builder);
    if &sql == expected {
        TestResult::Passed
    } else {
        TestResult::Failed(format!("expected `{expected}`, got `{sql}`"))
    }
}

fn parse_yaml_error(yaml: &str, source: serde_yaml::Error) -> FixtureParseError {
    FixtureParseError {
        excerpt: source_excerpt(yaml),
        source,
    }
}

fn source_excerpt(yaml: &str) -> String {
    let trimmed = yaml.trim();
    if trimmed.is_empty() {
        return FIXTURE_SOURCE_LABEL.to_string();
    }

    const MAX_CHARS: usize = 256;
    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }

    let mut excerpt: String = trimmed.chars().take(MAX_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_fixture() {
        let yaml = r#"
select_by_id:
  table: users
  wheres:
    - column: id
      op: "="
      value: 1
  expected:
    postgres: 'SELECT * FROM "users" WHERE "users"."id" = $1'
"#;
        let fixtures = load_fixtures_from_str(yaml).unwrap();
        assert!(fixtures.contains_key("select_by_id"));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(load_fixtures_from_str("not: [valid").is_err());
    }
}
