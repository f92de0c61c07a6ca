//! The `Blueprint` DSL. Columns and constraints
//! accumulate under one of three modes; a dialect's
//! [`crate::grammar::Grammar::compile_blueprint`] turns the accumulated
//! definition into an ordered list of DDL [`crate::statement::Statement`]s.
//!
//! The op shape here (`AddColumn`, `AlterColumn`, `AddIndex`,
//! `AddForeignKey`, ...) is narrowed to the column/index/foreign-key
//! surface a migration file actually needs.

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlueprintMode {
    Create,
    Alter,
    Drop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Increments,
    BigIncrements,
    Integer,
    BigInteger,
    String(u32),
    Text,
    Boolean,
    Date,
    DateTime,
    Timestamp,
    Float,
    Double,
    Decimal(u8, u8),
    Json,
    Uuid,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<Value>,
    pub use_current: bool,
    pub after: Option<String>,
    pub unsigned: bool,
    pub primary: bool,
    pub change: bool,
}

impl ColumnDef {
    fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        let primary = matches!(data_type, ColumnType::Increments | ColumnType::BigIncrements);
        Self {
            name: name.into(),
            data_type,
            nullable: false,
            unique: false,
            default: None,
            use_current: false,
            after: None,
            unsigned: false,
            primary,
            change: false,
        }
    }

    #[must_use]
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn default_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn use_current(&mut self) -> &mut Self {
        self.use_current = true;
        self
    }

    #[must_use]
    pub fn after(&mut self, column: impl Into<String>) -> &mut Self {
        self.after = Some(column.into());
        self
    }

    #[must_use]
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    #[must_use]
    pub fn change(&mut self) -> &mut Self {
        self.change = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
    Fulltext,
    Foreign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignAction {
    Cascade,
    SetNull,
    Restrict,
    NoAction,
}

impl ForeignAction {
    #[must_use]
    pub fn sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    pub kind: IndexKind,
    pub columns: Vec<String>,
    pub name: Option<String>,
    pub references: Option<(String, String)>,
    pub on_update: Option<ForeignAction>,
    pub on_delete: Option<ForeignAction>,
}

impl IndexDef {
    #[must_use]
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn on_update(&mut self, action: ForeignAction) -> &mut Self {
        self.on_update = Some(action);
        self
    }

    #[must_use]
    pub fn on_delete(&mut self, action: ForeignAction) -> &mut Self {
        self.on_delete = Some(action);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub table: String,
    pub mode: BlueprintMode,
    /// Only meaningful when `mode == BlueprintMode::Drop`: emits
    /// `DROP TABLE IF EXISTS` instead of a bare `DROP TABLE`.
    pub if_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub drop_columns: Vec<String>,
    pub rename_columns: Vec<(String, String)>,
    pub indexes: Vec<IndexDef>,
    pub drop_indexes: Vec<String>,
}

impl Blueprint {
    #[must_use]
    pub fn create(table: impl Into<String>) -> Self {
        Self::new(table, BlueprintMode::Create)
    }

    #[must_use]
    pub fn alter(table: impl Into<String>) -> Self {
        Self::new(table, BlueprintMode::Alter)
    }

    #[must_use]
    pub fn drop_table(table: impl Into<String>) -> Self {
        Self::new(table, BlueprintMode::Drop)
    }

    #[must_use]
    pub fn drop_table_if_exists(table: impl Into<String>) -> Self {
        let mut blueprint = Self::new(table, BlueprintMode::Drop);
        blueprint.if_exists = true;
        blueprint
    }

    fn new(table: impl Into<String>, mode: BlueprintMode) -> Self {
        Self {
            table: table.into(),
            mode,
            if_exists: false,
            columns: Vec::new(),
            drop_columns: Vec::new(),
            rename_columns: Vec::new(),
            indexes: Vec::new(),
            drop_indexes: Vec::new(),
        }
    }

    fn push_column(&mut self, name: impl Into<String>, data_type: ColumnType) -> &mut ColumnDef {
        self.columns.push(ColumnDef::new(name, data_type));
        self.columns.last_mut().expect("just pushed")
    }

    pub fn increments(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Increments)
    }

    pub fn big_increments(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::BigIncrements)
    }

    pub fn integer(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Integer)
    }

    pub fn big_integer(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::BigInteger)
    }

    pub fn string(&mut self, name: &str, length: u32) -> &mut ColumnDef {
        self.push_column(name, ColumnType::String(length))
    }

    pub fn text(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Text)
    }

    pub fn boolean(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Boolean)
    }

    pub fn date(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Date)
    }

    pub fn date_time(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::DateTime)
    }

    pub fn timestamp(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Timestamp)
    }

    pub fn float(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Float)
    }

    pub fn double(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Double)
    }

    pub fn decimal(&mut self, name: &str, precision: u8, scale: u8) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Decimal(precision, scale))
    }

    pub fn json(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Json)
    }

    pub fn uuid(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Uuid)
    }

    pub fn binary(&mut self, name: &str) -> &mut ColumnDef {
        self.push_column(name, ColumnType::Binary)
    }

    /// `created_at`/`updated_at` nullable timestamps — the common
    /// `__timestamps__` companion for §4.4's Model timestamps feature.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
    }

    /// The `SoftDeletes` mixin's backing column.
    pub fn soft_deletes(&mut self) -> &mut ColumnDef {
        self.push_column("deleted_at", ColumnType::Timestamp).nullable()
    }

    pub fn drop_column(&mut self, name: impl Into<String>) {
        self.drop_columns.push(name.into());
    }

    pub fn rename_column(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.rename_columns.push((from.into(), to.into()));
    }

    pub fn primary(&mut self, columns: &[&str]) -> &mut IndexDef {
        self.push_index(IndexKind::Primary, columns, None)
    }

    pub fn unique(&mut self, columns: &[&str], name: Option<&str>) -> &mut IndexDef {
        self.push_index(IndexKind::Unique, columns, name)
    }

    pub fn index(&mut self, columns: &[&str], name: Option<&str>) -> &mut IndexDef {
        self.push_index(IndexKind::Index, columns, name)
    }

    pub fn fulltext(&mut self, columns: &[&str], name: Option<&str>) -> &mut IndexDef {
        self.push_index(IndexKind::Fulltext, columns, name)
    }

    pub fn drop_index(&mut self, name: impl Into<String>) {
        self.drop_indexes.push(name.into());
    }

    pub fn foreign(&mut self, column: &str, references_table: &str, references_column: &str) -> &mut IndexDef {
        self.indexes.push(IndexDef {
            kind: IndexKind::Foreign,
            columns: vec![column.to_string()],
            name: None,
            references: Some((references_table.to_string(), references_column.to_string())),
            on_update: None,
            on_delete: None,
        });
        self.indexes.last_mut().expect("just pushed")
    }

    fn push_index(&mut self, kind: IndexKind, columns: &[&str], name: Option<&str>) -> &mut IndexDef {
        self.indexes.push(IndexDef {
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            name: name.map(ToString::to_string),
            references: None,
            on_update: None,
            on_delete: None,
        });
        self.indexes.last_mut().expect("just pushed")
    }
}
