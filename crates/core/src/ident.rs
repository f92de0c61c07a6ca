/// An unqualified SQL identifier (column, table, alias).
///
/// Kept distinct from a plain `String` so that grammars have a single
/// quoting seam (`Grammar::quote_ident`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(pub String);

impl Ident {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl<T: Into<String>> From<T> for Ident {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A table reference with an optional alias, and a qualified column
/// reference (`table.column`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: Ident,
    pub alias: Option<Ident>,
}

impl TableRef {
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<Ident>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name queries should reference: the alias when present, else the
    /// table name.
    #[must_use]
    pub fn reference(&self) -> &Ident {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<Ident>,
    pub name: Ident,
    pub alias: Option<Ident>,
}

impl ColumnRef {
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            table: None,
            name: name.into(),
            alias: None,
        }
    }

    pub fn qualified(table: impl Into<Ident>, name: impl Into<Ident>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn aliased(mut self, alias: impl Into<Ident>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Parses the `"col as alias"` shorthand by splitting on the first
    /// case-insensitive ` as `.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Some(idx) = find_as(raw) {
            let (col, alias) = raw.split_at(idx);
            let alias = alias[4..].trim();
            Self::from_dotted(col.trim()).aliased(alias)
        } else {
            Self::from_dotted(raw)
        }
    }

    fn from_dotted(raw: &str) -> Self {
        match raw.split_once('.') {
            Some((table, name)) => Self::qualified(table, name),
            None => Self::new(raw),
        }
    }
}

fn find_as(raw: &str) -> Option<usize> {
    let lower = raw.to_ascii_lowercase();
    lower.find(" as ")
}
