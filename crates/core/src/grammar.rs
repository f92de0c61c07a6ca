//! Dialect compilation contract. A [`Grammar`]
//! implementation compiles [`crate::builder::QueryBuilder`] state into SQL
//! plus an ordered bindings vector. All four dialect crates implement this
//! trait and delegate the dialect-agnostic parts to [`shared`], overriding
//! only quoting, placeholder style, lock syntax, and limit/offset syntax.

use crate::builder::QueryBuilder;
use crate::expr::LockMode;
use crate::ident::{Ident, TableRef};
use crate::migration::Blueprint;
use crate::statement::Statement;
use crate::value::Value;

pub trait Grammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn quote_ident(&self, ident: &Ident) -> String;

    /// Placeholder text for the `n`th (1-indexed) bound parameter. `?` for
    /// MySQL/SQLite/MSSQL, `$n` for PostgreSQL.
    fn placeholder(&self, index: usize) -> String {
        let _ = index;
        "?".to_string()
    }

    /// MSSQL has no native `LIMIT`/`OFFSET` and must use
    /// `OFFSET ... ROWS FETCH NEXT ... ROWS ONLY` with a mandatory
    /// `ORDER BY`.
    fn supports_native_limit_offset(&self) -> bool {
        true
    }

    fn lock_clause(&self, mode: LockMode) -> &'static str {
        match mode {
            LockMode::None => "",
            LockMode::Shared => " LOCK IN SHARE MODE",
            LockMode::Update => " FOR UPDATE",
        }
    }

    /// MSSQL's `WITH (UPDLOCK, ROWLOCK)` table hint is injected after the
    /// table reference instead of at the end of the statement.
    fn table_lock_hint(&self, _mode: LockMode) -> &'static str {
        ""
    }

    fn batch_separator(&self) -> &str {
        ""
    }

    fn compile_select(&self, builder: &QueryBuilder) -> (String, Vec<Value>);
    fn compile_insert(&self, table: &TableRef, values: &[(String, Value)]) -> (String, Vec<Value>);
    fn compile_bulk_insert(&self, table: &TableRef, rows: &[Vec<(String, Value)>]) -> (String, Vec<Value>);
    fn compile_update(&self, builder: &QueryBuilder, values: &[(String, Value)]) -> (String, Vec<Value>);
    fn compile_delete(&self, builder: &QueryBuilder) -> (String, Vec<Value>);
    fn compile_truncate(&self, table: &TableRef, foreign_keys: bool) -> String;

    /// An insert that silently does nothing when the row already
    /// conflicts with an existing one: `INSERT IGNORE` (MySQL), `ON
    /// CONFLICT DO NOTHING` (Postgres/SQLite), a `MERGE ... WHEN NOT
    /// MATCHED` (MSSQL) keyed on every inserted column.
    fn compile_insert_or_ignore(&self, table: &TableRef, values: &[(String, Value)]) -> (String, Vec<Value>);

    /// Insert-or-update: on conflict with a row already unique on
    /// `unique_by`, updates `update_columns` from the incoming row instead
    /// of failing. `ON DUPLICATE KEY UPDATE` (MySQL), `ON CONFLICT (...)
    /// DO UPDATE` (Postgres/SQLite), `MERGE ... WHEN MATCHED` (MSSQL).
    fn compile_upsert(
        &self,
        table: &TableRef,
        values: &[(String, Value)],
        unique_by: &[String],
        update_columns: &[String],
    ) -> (String, Vec<Value>);

    /// Renders a column's declared type, e.g. `VARCHAR(255)` or
    /// `INTEGER`. The one piece of blueprint compilation every dialect
    /// must supply itself — column type names are the least portable
    /// part of DDL across the four dialects.
    fn column_type_sql(&self, data_type: &crate::migration::ColumnType) -> String;

    /// Keyword/clause marking a column as auto-incrementing, appended
    /// after its type (`AUTO_INCREMENT` for MySQL, empty for dialects
    /// that express it via a separate `SERIAL`/`IDENTITY` type instead).
    fn autoincrement_suffix(&self) -> &'static str {
        ""
    }

    /// Compiles a [`Blueprint`] into ordered DDL statements. The default
    /// implementation delegates to [`shared::compile_blueprint`]; a
    /// dialect only needs to override this when its DDL ordering or
    /// syntax diverges from the common shape (see `dialect-mssql`, which
    /// emits a `GO` batch boundary between statements).
    fn compile_blueprint(&self, blueprint: &Blueprint) -> Vec<Statement> {
        shared::compile_blueprint(self, blueprint)
    }
}

/// Rewrites the universal `?` placeholders the shared compiler produces
/// into a dialect's native placeholder syntax. Called once, at the end of
/// every `compile_*` entry point.
#[must_use]
pub fn rewrite_placeholders(grammar: &dyn Grammar, sql: &str) -> String {
    if grammar.placeholder(1) == "?" {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len());
    let mut index = 0usize;
    for ch in sql.chars() {
        if ch == '?' {
            index += 1;
            out.push_str(&grammar.placeholder(index));
        } else {
            out.push(ch);
        }
    }
    out
}

pub mod shared {
    use super::{rewrite_placeholders, Grammar};
    use crate::builder::QueryBuilder;
    use crate::expr::{
        AggregateClause, Boolean, Direction, GroupClause, JoinKind, LockMode, Operator,
        OrderTarget, SelectColumn, WhereClause,
    };
    use crate::ident::{ColumnRef, Ident, TableRef};
    use crate::value::Value;

    fn quote(g: &dyn Grammar, ident: &Ident) -> String {
        g.quote_ident(ident)
    }

    fn quote_column(g: &dyn Grammar, table: &str, column: &ColumnRef) -> String {
        match &column.table {
            Some(t) => format!("{}.{}", quote(g, t), quote(g, &column.name)),
            None => format!("{}.{}", quote(g, &Ident::new(table)), quote(g, &column.name)),
        }
    }

    fn operator_sql(op: Operator) -> &'static str {
        match op {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::Regexp => "REGEXP",
            Operator::NotRegexp => "NOT REGEXP",
        }
    }

    fn render_where_list(
        g: &dyn Grammar,
        table: &str,
        wheres: &[WhereClause],
        bindings: &mut Vec<Value>,
    ) -> String {
        let mut sql = String::new();
        for (i, clause) in wheres.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(match clause.boolean() {
                    Boolean::And => "AND",
                    Boolean::Or => "OR",
                });
                sql.push(' ');
            }
            sql.push_str(&render_where(g, table, clause, bindings));
        }
        sql
    }

    fn render_where(g: &dyn Grammar, table: &str, clause: &WhereClause, bindings: &mut Vec<Value>) -> String {
        match clause {
            WhereClause::Basic {
                column, op, value, negated, ..
            } => {
                bindings.push(value.clone());
                let expr = format!("{} {} ?", quote_column(g, table, column), operator_sql(*op));
                if *negated { format!("NOT ({expr})") } else { expr }
            }
            WhereClause::Column { left, op, right, .. } => {
                format!(
                    "{} {} {}",
                    quote_column(g, table, left),
                    operator_sql(*op),
                    quote_column(g, table, right)
                )
            }
            WhereClause::Between {
                column, low, high, negated, ..
            } => {
                bindings.push(low.clone());
                bindings.push(high.clone());
                let kw = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{} {kw} ? AND ?", quote_column(g, table, column))
            }
            WhereClause::In {
                column, values, negated, ..
            } => {
                if values.is_empty() {
                    // Empty IN short-circuits instead of emitting a syntax error.
                    return if *negated { "1 = 1".to_string() } else { "0 = 1".to_string() };
                }
                bindings.extend(values.iter().cloned());
                let placeholders = vec!["?"; values.len()].join(", ");
                let kw = if *negated { "NOT IN" } else { "IN" };
                format!("{} {kw} ({placeholders})", quote_column(g, table, column))
            }
            WhereClause::InSubquery {
                column, subquery, negated, ..
            } => {
                let (sub_sql, sub_bindings) = compile_select(g, subquery);
                bindings.extend(sub_bindings);
                let kw = if *negated { "NOT IN" } else { "IN" };
                format!("{} {kw} ({sub_sql})", quote_column(g, table, column))
            }
            WhereClause::Null { column, negated, .. } => {
                let kw = if *negated { "IS NOT NULL" } else { "IS NULL" };
                format!("{} {kw}", quote_column(g, table, column))
            }
            WhereClause::Exists { subquery, negated, .. } => {
                let (sub_sql, sub_bindings) = compile_select(g, subquery);
                bindings.extend(sub_bindings);
                let kw = if *negated { "NOT EXISTS" } else { "EXISTS" };
                format!("{kw} ({sub_sql})")
            }
            WhereClause::Nested { clauses, .. } => {
                format!("({})", render_where_list(g, table, clauses, bindings))
            }
            WhereClause::Raw { sql, bindings: raw_bindings, .. } => {
                bindings.extend(raw_bindings.iter().cloned());
                sql.clone()
            }
        }
    }

    fn render_join(g: &dyn Grammar, join: &crate::expr::JoinClause, bindings: &mut Vec<Value>) -> String {
        let kind = match join.kind {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        };
        let table_sql = render_table_ref(g, &join.table);
        let table_name = join.table.reference().0.clone();

        let mut on_sql = String::new();
        for (i, on) in join.on.iter().enumerate() {
            if i > 0 {
                on_sql.push(' ');
                on_sql.push_str(match on.boolean {
                    Boolean::And => "AND",
                    Boolean::Or => "OR",
                });
                on_sql.push(' ');
            }
            on_sql.push_str(&format!(
                "{} {} {}",
                quote_column(g, &table_name, &on.left),
                operator_sql(on.op),
                quote_column(g, &table_name, &on.right)
            ));
        }
        if !join.wheres.is_empty() {
            on_sql.push_str(" AND ");
            on_sql.push_str(&render_where_list(g, &table_name, &join.wheres, bindings));
        }

        format!("{kind} JOIN {table_sql} ON {on_sql}")
    }

    fn render_table_ref(g: &dyn Grammar, table: &TableRef) -> String {
        match &table.alias {
            Some(alias) => format!("{} AS {}", quote(g, &table.name), quote(g, alias)),
            None => quote(g, &table.name),
        }
    }

    fn render_select_column(g: &dyn Grammar, table: &str, column: &SelectColumn, bindings: &mut Vec<Value>) -> String {
        match column {
            SelectColumn::Column(c) => {
                let base = quote_column(g, table, c);
                match &c.alias {
                    Some(alias) => format!("{base} AS {}", quote(g, alias)),
                    None => base,
                }
            }
            SelectColumn::Raw(sql, raw_bindings) => {
                bindings.extend(raw_bindings.iter().cloned());
                sql.clone()
            }
            SelectColumn::Subquery { alias, subquery } => {
                let (sub_sql, sub_bindings) = compile_select(g, subquery);
                bindings.extend(sub_bindings);
                format!("({sub_sql}) AS {}", quote(g, &Ident::new(alias.clone())))
            }
        }
    }

    fn render_aggregate(g: &dyn Grammar, table: &str, agg: &AggregateClause) -> String {
        let column_sql = if agg.column.name.0 == "*" {
            "*".to_string()
        } else {
            quote_column(g, table, &agg.column)
        };
        let base = format!("{}({column_sql})", agg.func.sql_name());
        match &agg.alias {
            Some(alias) => format!("{base} AS {}", quote(g, &Ident::new(alias.clone()))),
            None => base,
        }
    }

    fn render_group(g: &dyn Grammar, table: &str, group: &GroupClause, bindings: &mut Vec<Value>) -> String {
        match group {
            GroupClause::Column(c) => quote_column(g, table, c),
            GroupClause::Raw(sql, raw_bindings) => {
                bindings.extend(raw_bindings.iter().cloned());
                sql.clone()
            }
        }
    }

    fn render_order(g: &dyn Grammar, table: &str, order: &crate::expr::OrderClause, bindings: &mut Vec<Value>) -> String {
        let dir = match order.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        let target = match &order.target {
            OrderTarget::Column(c) => quote_column(g, table, c),
            OrderTarget::Raw(sql, raw_bindings) => {
                bindings.extend(raw_bindings.iter().cloned());
                return sql.clone();
            }
        };
        format!("{target} {dir}")
    }

    /// Shared SELECT compiler: `SELECT [DISTINCT] <cols|aggregate> FROM
    /// <table> <joins> WHERE <wheres> GROUP BY <groups> HAVING <havings>
    /// ORDER BY <orders> LIMIT <n> OFFSET <m> <lock>`.
    #[must_use]
    pub fn compile_select(g: &dyn Grammar, builder: &QueryBuilder) -> (String, Vec<Value>) {
        let mut bindings = Vec::new();
        let table_name = builder.table_ref().reference().0.clone();
        let mut sql = String::from("SELECT ");
        if builder.distinct {
            sql.push_str("DISTINCT ");
        }

        // An explicit aggregate wins over any selected columns, which are
        // discarded.
        if let Some(agg) = &builder.aggregate {
            sql.push_str(&render_aggregate(g, &table_name, agg));
        } else if builder.columns.is_empty() {
            sql.push('*');
        } else {
            let rendered: Vec<String> = builder
                .columns
                .iter()
                .map(|c| render_select_column(g, &table_name, c, &mut bindings))
                .collect();
            sql.push_str(&rendered.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&render_table_ref(g, builder.table_ref()));

        let lock_hint = g.table_lock_hint(builder_lock(builder));
        if !lock_hint.is_empty() {
            sql.push(' ');
            sql.push_str(lock_hint);
        }

        for join in &builder.joins {
            sql.push(' ');
            sql.push_str(&render_join(g, join, &mut bindings));
        }

        if !builder.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_where_list(g, &table_name, &builder.wheres, &mut bindings));
        }

        if !builder.groups.is_empty() {
            sql.push_str(" GROUP BY ");
            let groups: Vec<String> = builder
                .groups
                .iter()
                .map(|gr| render_group(g, &table_name, gr, &mut bindings))
                .collect();
            sql.push_str(&groups.join(", "));
        }

        if !builder.havings.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&render_where_list(g, &table_name, &builder.havings, &mut bindings));
        }

        if !builder.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            let orders: Vec<String> = builder
                .orders
                .iter()
                .map(|o| render_order(g, &table_name, o, &mut bindings))
                .collect();
            sql.push_str(&orders.join(", "));
        } else if !g.supports_native_limit_offset() && builder.offset.is_some() {
            // MSSQL requires an ORDER BY whenever OFFSET/FETCH is used.
            sql.push_str(" ORDER BY (SELECT NULL)");
        }

        if g.supports_native_limit_offset() {
            if let Some(limit) = builder.limit {
                sql.push_str(&format!(" LIMIT {limit}"));
            }
            if let Some(offset) = builder.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        } else if builder.limit.is_some() || builder.offset.is_some() {
            let offset = builder.offset.unwrap_or(0);
            sql.push_str(&format!(" OFFSET {offset} ROWS"));
            if let Some(limit) = builder.limit {
                sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
            }
        }

        sql.push_str(g.lock_clause(builder_lock(builder)));

        for (union_builder, kind) in &builder.unions {
            let (union_sql, union_bindings) = compile_select(g, union_builder);
            bindings.extend(union_bindings);
            sql.push_str(match kind {
                crate::builder::UnionKind::Distinct => " UNION ",
                crate::builder::UnionKind::All => " UNION ALL ",
            });
            sql.push_str(&union_sql);
        }

        (rewrite_placeholders(g, &sql), bindings)
    }

    fn builder_lock(builder: &QueryBuilder) -> LockMode {
        builder.lock
    }

    #[must_use]
    pub fn compile_insert(g: &dyn Grammar, table: &TableRef, values: &[(String, Value)]) -> (String, Vec<Value>) {
        let columns: Vec<String> = values.iter().map(|(c, _)| quote(g, &Ident::new(c.clone()))).collect();
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        let bindings: Vec<Value> = values.iter().map(|(_, v)| v.clone()).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            render_table_ref(g, table),
            columns.join(", "),
            placeholders.join(", ")
        );
        (rewrite_placeholders(g, &sql), bindings)
    }

    /// Builds the `INSERT INTO table (cols) VALUES (?, ?, ...)` fragment
    /// shared by `compile_insert` and the conflict-handling inserts
    /// (`compile_insert_or_ignore`/`compile_upsert`), returning the bare
    /// column names alongside the rendered SQL so a dialect can append its
    /// own conflict clause and quote the columns again for that clause.
    #[must_use]
    pub fn insert_fragment(g: &dyn Grammar, table: &TableRef, values: &[(String, Value)]) -> (String, Vec<String>, Vec<Value>) {
        let names: Vec<String> = values.iter().map(|(c, _)| c.clone()).collect();
        let quoted_columns: Vec<String> = names.iter().map(|c| quote(g, &Ident::new(c.clone()))).collect();
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        let bindings: Vec<Value> = values.iter().map(|(_, v)| v.clone()).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            render_table_ref(g, table),
            quoted_columns.join(", "),
            placeholders.join(", ")
        );
        (sql, names, bindings)
    }

    #[must_use]
    pub fn compile_bulk_insert(g: &dyn Grammar, table: &TableRef, rows: &[Vec<(String, Value)>]) -> (String, Vec<Value>) {
        if rows.is_empty() {
            return (String::new(), Vec::new());
        }
        let columns: Vec<String> = rows[0].iter().map(|(c, _)| quote(g, &Ident::new(c.clone()))).collect();
        let mut bindings = Vec::new();
        let mut value_groups = Vec::new();
        for row in rows {
            let placeholders: Vec<&str> = row.iter().map(|_| "?").collect();
            value_groups.push(format!("({})", placeholders.join(", ")));
            bindings.extend(row.iter().map(|(_, v)| v.clone()));
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            render_table_ref(g, table),
            columns.join(", "),
            value_groups.join(", ")
        );
        (rewrite_placeholders(g, &sql), bindings)
    }

    #[must_use]
    pub fn compile_update(g: &dyn Grammar, builder: &QueryBuilder, values: &[(String, Value)]) -> (String, Vec<Value>) {
        let mut bindings = Vec::new();
        let table_name = builder.table_ref().reference().0.clone();
        let assignments: Vec<String> = values
            .iter()
            .map(|(column, value)| {
                if let Value::Text(expr) = value {
                    if is_increment_expr(column, expr) {
                        return format!("{} = {expr}", quote(g, &Ident::new(column.clone())));
                    }
                }
                bindings.push(value.clone());
                format!("{} = ?", quote(g, &Ident::new(column.clone())))
            })
            .collect();

        let mut sql = format!("UPDATE {} SET {}", render_table_ref(g, builder.table_ref()), assignments.join(", "));
        if !builder.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_where_list(g, &table_name, &builder.wheres, &mut bindings));
        }
        (rewrite_placeholders(g, &sql), bindings)
    }

    fn is_increment_expr(column: &str, expr: &str) -> bool {
        expr.starts_with(&format!("{column}+")) || expr.starts_with(&format!("{column}-"))
    }

    #[must_use]
    pub fn compile_delete(g: &dyn Grammar, builder: &QueryBuilder) -> (String, Vec<Value>) {
        let mut bindings = Vec::new();
        let table_name = builder.table_ref().reference().0.clone();
        let mut sql = format!("DELETE FROM {}", render_table_ref(g, builder.table_ref()));
        if !builder.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_where_list(g, &table_name, &builder.wheres, &mut bindings));
        }
        (rewrite_placeholders(g, &sql), bindings)
    }

    use crate::migration::{Blueprint, BlueprintMode, ColumnDef, ForeignAction, IndexDef, IndexKind};
    use crate::statement::Statement;

    fn render_column_definition(g: &dyn Grammar, column: &ColumnDef) -> String {
        let mut sql = format!("{} {}", quote(g, &Ident::new(column.name.clone())), g.column_type_sql(&column.data_type));
        if matches!(
            column.data_type,
            crate::migration::ColumnType::Increments | crate::migration::ColumnType::BigIncrements
        ) {
            let suffix = g.autoincrement_suffix();
            if !suffix.is_empty() {
                sql.push(' ');
                sql.push_str(suffix);
            }
        }
        if column.unsigned {
            sql.push_str(" UNSIGNED");
        }
        sql.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
        if column.use_current {
            sql.push_str(" DEFAULT CURRENT_TIMESTAMP");
        } else if let Some(default) = &column.default {
            sql.push_str(&format!(" DEFAULT {default}"));
        }
        if column.unique {
            sql.push_str(" UNIQUE");
        }
        if column.primary {
            sql.push_str(" PRIMARY KEY");
        }
        sql
    }

    fn render_index_definition(g: &dyn Grammar, table: &str, index: &IndexDef) -> Statement {
        let columns: Vec<String> = index.columns.iter().map(|c| quote(g, &Ident::new(c.clone()))).collect();
        let quoted_table = quote(g, &Ident::new(table));
        match index.kind {
            IndexKind::Primary => Statement::sql(format!(
                "ALTER TABLE {quoted_table} ADD PRIMARY KEY ({})",
                columns.join(", ")
            )),
            IndexKind::Unique => {
                let name = index_name(table, &index.columns, index.name.as_deref(), "unique");
                Statement::sql(format!(
                    "CREATE UNIQUE INDEX {} ON {quoted_table} ({})",
                    quote(g, &Ident::new(name)),
                    columns.join(", ")
                ))
            }
            IndexKind::Index => {
                let name = index_name(table, &index.columns, index.name.as_deref(), "index");
                Statement::sql(format!(
                    "CREATE INDEX {} ON {quoted_table} ({})",
                    quote(g, &Ident::new(name)),
                    columns.join(", ")
                ))
            }
            IndexKind::Fulltext => {
                let name = index_name(table, &index.columns, index.name.as_deref(), "fulltext");
                Statement::sql(format!(
                    "CREATE FULLTEXT INDEX {} ON {quoted_table} ({})",
                    quote(g, &Ident::new(name)),
                    columns.join(", ")
                ))
            }
            IndexKind::Foreign => {
                let (ref_table, ref_column) = index
                    .references
                    .clone()
                    .unwrap_or_else(|| ("_unknown".to_string(), "id".to_string()));
                let name = index_name(table, &index.columns, index.name.as_deref(), "foreign");
                let mut sql = format!(
                    "ALTER TABLE {quoted_table} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                    quote(g, &Ident::new(name)),
                    columns.join(", "),
                    quote(g, &Ident::new(ref_table)),
                    quote(g, &Ident::new(ref_column))
                );
                if let Some(action) = index.on_delete {
                    sql.push_str(&format!(" ON DELETE {}", action_sql(action)));
                }
                if let Some(action) = index.on_update {
                    sql.push_str(&format!(" ON UPDATE {}", action_sql(action)));
                }
                Statement::sql(sql)
            }
        }
    }

    fn action_sql(action: ForeignAction) -> &'static str {
        action.sql()
    }

    fn index_name(table: &str, columns: &[String], explicit: Option<&str>, suffix: &str) -> String {
        match explicit {
            Some(name) => name.to_string(),
            None => format!("{table}_{}_{suffix}", columns.join("_")),
        }
    }

    /// Shared blueprint compiler. DDL ordering: table statement first
    /// (`CREATE`/`ALTER ADD COLUMN`/`DROP TABLE`), then column
    /// drops/renames, then indexes, then foreign keys last so referenced
    /// columns already exist.
    #[must_use]
    pub fn compile_blueprint(g: &dyn Grammar, blueprint: &Blueprint) -> Vec<Statement> {
        let quoted_table = quote(g, &Ident::new(blueprint.table.clone()));
        let mut statements = Vec::new();

        match blueprint.mode {
            BlueprintMode::Create => {
                let columns: Vec<String> = blueprint.columns.iter().map(|c| render_column_definition(g, c)).collect();
                statements.push(Statement::sql(format!("CREATE TABLE {quoted_table} ({})", columns.join(", "))));
            }
            BlueprintMode::Drop => {
                let clause = if blueprint.if_exists { "DROP TABLE IF EXISTS" } else { "DROP TABLE" };
                statements.push(Statement::sql(format!("{clause} {quoted_table}")));
                return statements;
            }
            BlueprintMode::Alter => {
                for column in &blueprint.columns {
                    let verb = if column.change { "MODIFY COLUMN" } else { "ADD COLUMN" };
                    let mut sql = format!("ALTER TABLE {quoted_table} {verb} {}", render_column_definition(g, column));
                    if let Some(after) = &column.after {
                        sql.push_str(&format!(" AFTER {}", quote(g, &Ident::new(after.clone()))));
                    }
                    statements.push(Statement::sql(sql));
                }
                for (from, to) in &blueprint.rename_columns {
                    statements.push(Statement::sql(format!(
                        "ALTER TABLE {quoted_table} RENAME COLUMN {} TO {}",
                        quote(g, &Ident::new(from.clone())),
                        quote(g, &Ident::new(to.clone()))
                    )));
                }
                for name in &blueprint.drop_columns {
                    statements.push(Statement::sql(format!(
                        "ALTER TABLE {quoted_table} DROP COLUMN {}",
                        quote(g, &Ident::new(name.clone()))
                    )));
                }
                for name in &blueprint.drop_indexes {
                    statements.push(Statement::sql(format!("DROP INDEX {}", quote(g, &Ident::new(name.clone())))));
                }
            }
        }

        // Index creation before foreign key constraints: (3) indexes,
        // (4) foreign keys.
        for index in blueprint.indexes.iter().filter(|i| i.kind != IndexKind::Foreign) {
            statements.push(render_index_definition(g, &blueprint.table, index));
        }
        for index in blueprint.indexes.iter().filter(|i| i.kind == IndexKind::Foreign) {
            statements.push(render_index_definition(g, &blueprint.table, index));
        }

        statements
    }
}
