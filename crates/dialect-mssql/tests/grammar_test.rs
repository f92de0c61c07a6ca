use quarry_core::builder::QueryBuilder;
use quarry_core::expr::{Direction, LockMode};
use quarry_core::grammar::Grammar;
use quarry_core::migration::{Blueprint, ColumnType};
use quarry_core::statement::Statement;
use quarry_dialect_mssql::MssqlGrammar;

#[test]
fn compiles_a_filtered_paginated_select_with_fetch_syntax() {
    let builder = QueryBuilder::table("posts")
        .where_eq("author_id", 7i64)
        .order_by("created_at", Direction::Desc)
        .limit(10)
        .offset(20);
    let (sql, _) = MssqlGrammar.compile_select(&builder);
    assert_eq!(
        sql,
        "SELECT * FROM [posts] WHERE [posts].[author_id] = ? ORDER BY [posts].[created_at] DESC \
         OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

#[test]
fn lock_for_update_injects_a_table_hint_instead_of_a_trailing_clause() {
    let builder = QueryBuilder::table("accounts").where_eq("id", 1i64);
    let builder = builder.lock_for_update();
    let (sql, _) = MssqlGrammar.compile_select(&builder);
    assert!(sql.contains("[accounts] WITH (UPDLOCK, ROWLOCK)"), "{sql}");
    assert!(!sql.contains("FOR UPDATE"), "{sql}");
    assert_eq!(MssqlGrammar.lock_clause(LockMode::Update), "");
}

#[test]
fn blueprint_marks_increments_column_identity() {
    let mut blueprint = Blueprint::create("widgets");
    blueprint.increments("id");
    blueprint.string("name", 255);
    let statements = MssqlGrammar.compile_blueprint(&blueprint);
    let Statement::Sql { sql, .. } = &statements[0] else {
        panic!("expected a single SQL statement, got {statements:?}");
    };
    assert!(sql.contains("[id] INT IDENTITY(1,1) NOT NULL"), "{sql}");
    assert_eq!(MssqlGrammar.column_type_sql(&ColumnType::String(255)), "NVARCHAR(255)");
}
