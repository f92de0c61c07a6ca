use quarry_core::builder::QueryBuilder;
use quarry_core::expr::LockMode;
use quarry_core::grammar::Grammar;
use quarry_core::migration::{Blueprint, ColumnType};
use quarry_core::value::Value;
use quarry_dialect_sqlite::SqliteGrammar;

#[test]
fn compiles_a_filtered_select_with_double_quote_idents() {
    let builder = QueryBuilder::table("posts").where_eq("author_id", 7i64);
    let (sql, bindings) = SqliteGrammar.compile_select(&builder);
    assert_eq!(sql, r#"SELECT * FROM "posts" WHERE "posts"."author_id" = ?"#);
    assert_eq!(bindings, vec![Value::Integer(7)]);
}

#[test]
fn lock_for_update_has_no_effect_on_compiled_sql() {
    let builder = QueryBuilder::table("accounts").where_eq("id", 1i64).lock_for_update();
    let (sql, _) = SqliteGrammar.compile_select(&builder);
    assert!(!sql.contains("LOCK"), "{sql}");
    assert_eq!(SqliteGrammar.lock_clause(LockMode::Update), "");
}

#[test]
fn blueprint_compiles_a_single_create_table_statement() {
    let mut blueprint = Blueprint::create("widgets");
    blueprint.increments("id");
    blueprint.string("name", 255);
    let statements = SqliteGrammar.compile_blueprint(&blueprint);
    assert_eq!(statements.len(), 1);
    assert_eq!(SqliteGrammar.column_type_sql(&ColumnType::Boolean), "BOOLEAN");
}

#[test]
fn drop_table_if_exists_emits_the_if_exists_clause() {
    let blueprint = Blueprint::drop_table_if_exists("widgets");
    let statements = SqliteGrammar.compile_blueprint(&blueprint);
    let quarry_core::statement::Statement::Sql { sql, .. } = &statements[0] else {
        panic!("expected a single SQL statement, got {statements:?}");
    };
    assert_eq!(sql, "DROP TABLE IF EXISTS \"widgets\"");
}

#[test]
fn drop_table_omits_the_if_exists_clause() {
    let blueprint = Blueprint::drop_table("widgets");
    let statements = SqliteGrammar.compile_blueprint(&blueprint);
    let quarry_core::statement::Statement::Sql { sql, .. } = &statements[0] else {
        panic!("expected a single SQL statement, got {statements:?}");
    };
    assert_eq!(sql, "DROP TABLE \"widgets\"");
}
