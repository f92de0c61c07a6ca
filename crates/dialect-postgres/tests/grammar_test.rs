use quarry_core::builder::QueryBuilder;
use quarry_core::expr::LockMode;
use quarry_core::grammar::Grammar;
use quarry_core::migration::{Blueprint, ColumnType};
use quarry_core::value::Value;
use quarry_dialect_postgres::PostgresGrammar;

#[test]
fn compiles_a_filtered_paginated_select() {
    let builder = QueryBuilder::table("posts")
        .where_eq("author_id", 7i64)
        .order_by("created_at", quarry_core::expr::Direction::Desc)
        .limit(10)
        .offset(20);
    let (sql, bindings) = PostgresGrammar.compile_select(&builder);
    assert_eq!(
        sql,
        r#"SELECT * FROM "posts" WHERE "posts"."author_id" = $1 ORDER BY "posts"."created_at" DESC LIMIT 10 OFFSET 20"#
    );
    assert_eq!(bindings, vec![Value::Integer(7)]);
}

#[test]
fn lock_for_update_appends_trailing_clause() {
    let builder = QueryBuilder::table("accounts").where_eq("id", 1i64);
    let builder = builder.lock_for_update();
    let (sql, _) = PostgresGrammar.compile_select(&builder);
    assert!(sql.ends_with("FOR UPDATE"), "{sql}");
    assert_eq!(PostgresGrammar.lock_clause(LockMode::Update), " FOR UPDATE");
}

#[test]
fn blueprint_compiles_primary_key_column_as_serial() {
    let mut blueprint = Blueprint::create("widgets");
    blueprint.increments("id");
    blueprint.string("name", 255);
    let statements = PostgresGrammar.compile_blueprint(&blueprint);
    assert_eq!(statements.len(), 1);
    assert_eq!(PostgresGrammar.column_type_sql(&ColumnType::String(255)), "VARCHAR(255)");
}
