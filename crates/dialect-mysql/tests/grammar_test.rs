use quarry_core::builder::QueryBuilder;
use quarry_core::grammar::Grammar;
use quarry_core::migration::{Blueprint, ColumnType};
use quarry_core::value::Value;
use quarry_dialect_mysql::MysqlGrammar;

#[test]
fn compiles_a_filtered_select_with_backtick_quoting() {
    let builder = QueryBuilder::table("posts").where_eq("author_id", 7i64);
    let (sql, bindings) = MysqlGrammar.compile_select(&builder);
    assert_eq!(sql, "SELECT * FROM `posts` WHERE `posts`.`author_id` = ?");
    assert_eq!(bindings, vec![Value::Integer(7)]);
}

#[test]
fn truncate_wraps_foreign_key_check_toggling() {
    let table = quarry_core::ident::TableRef::new("widgets");
    let sql = MysqlGrammar.compile_truncate(&table, true);
    assert!(sql.contains("FOREIGN_KEY_CHECKS"), "{sql}");
    assert!(sql.contains("TRUNCATE TABLE `widgets`"), "{sql}");
}

#[test]
fn blueprint_marks_increments_column_auto_increment() {
    let mut blueprint = Blueprint::create("widgets");
    blueprint.increments("id");
    let statements = MysqlGrammar.compile_blueprint(&blueprint);
    assert_eq!(statements.len(), 1);
    assert_eq!(MysqlGrammar.autoincrement_suffix(), "AUTO_INCREMENT");
    assert_eq!(MysqlGrammar.column_type_sql(&ColumnType::BigInteger), "BIGINT");
}
