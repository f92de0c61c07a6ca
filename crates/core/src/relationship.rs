//! Relationship descriptors: tagged variants carrying the foreign/local key
//! names a [`crate::eager_load`] loader needs to batch-fetch related rows.
//! Each descriptor carries a `related_table` thunk (a plain
//! `fn() -> &'static str`, not a direct type reference) so two models can
//! reference each other regardless of declaration order.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Clone)]
pub struct BelongsTo {
    pub foreign_key: String,
    pub owner_key: String,
}

#[derive(Clone)]
pub struct HasOne {
    pub foreign_key: String,
    pub local_key: String,
}

#[derive(Clone)]
pub struct HasMany {
    pub foreign_key: String,
    pub local_key: String,
}

#[derive(Clone)]
pub struct BelongsToMany {
    pub pivot_table: Option<String>,
    pub foreign_pivot_key: String,
    pub related_pivot_key: String,
    pub parent_key: String,
    pub related_key: String,
    pub pivot_id: Option<String>,
    pub with_timestamps: bool,
    pub with_fields: Vec<String>,
    pub attribute_name: String,
}

impl BelongsToMany {
    #[must_use]
    pub fn new(foreign_pivot_key: impl Into<String>, related_pivot_key: impl Into<String>) -> Self {
        Self {
            pivot_table: None,
            foreign_pivot_key: foreign_pivot_key.into(),
            related_pivot_key: related_pivot_key.into(),
            parent_key: "id".to_string(),
            related_key: "id".to_string(),
            pivot_id: None,
            with_timestamps: false,
            with_fields: Vec::new(),
            attribute_name: "pivot".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ThroughOne {
    pub foreign_key_on_intermediate: String,
    pub foreign_key_on_far: String,
    pub local_key_on_parent: String,
    pub local_key_on_intermediate: String,
}

#[derive(Clone)]
pub struct ThroughMany {
    pub foreign_key_on_intermediate: String,
    pub foreign_key_on_far: String,
    pub local_key_on_parent: String,
    pub local_key_on_intermediate: String,
}

#[derive(Clone)]
pub enum RelationshipKind {
    BelongsTo(BelongsTo),
    HasOne(HasOne),
    HasMany(HasMany),
    BelongsToMany(BelongsToMany),
    HasOneThrough(ThroughOne),
    HasManyThrough(ThroughMany),
}

impl RelationshipKind {
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationshipKind::BelongsTo(_) | RelationshipKind::HasOne(_) | RelationshipKind::HasOneThrough(_) => {
                Cardinality::One
            }
            RelationshipKind::HasMany(_) | RelationshipKind::BelongsToMany(_) | RelationshipKind::HasManyThrough(_) => {
                Cardinality::Many
            }
        }
    }
}

/// A registered relationship: its kind plus the tables it spans. The
/// thunk cycle-breaker is `related_table`/`through_table`, resolved lazily
/// at eager-load time rather than at registration time.
#[derive(Clone)]
pub struct RelationshipDescriptor {
    pub name: String,
    pub kind: RelationshipKind,
    pub related_table: fn() -> &'static str,
    /// Intermediate table for `*_through` relationships.
    pub through_table: Option<fn() -> &'static str>,
}

impl RelationshipDescriptor {
    #[must_use]
    pub fn belongs_to(name: impl Into<String>, related_table: fn() -> &'static str, foreign_key: impl Into<String>, owner_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RelationshipKind::BelongsTo(BelongsTo {
                foreign_key: foreign_key.into(),
                owner_key: owner_key.into(),
            }),
            related_table,
            through_table: None,
        }
    }

    #[must_use]
    pub fn has_one(name: impl Into<String>, related_table: fn() -> &'static str, foreign_key: impl Into<String>, local_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RelationshipKind::HasOne(HasOne {
                foreign_key: foreign_key.into(),
                local_key: local_key.into(),
            }),
            related_table,
            through_table: None,
        }
    }

    #[must_use]
    pub fn has_many(name: impl Into<String>, related_table: fn() -> &'static str, foreign_key: impl Into<String>, local_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RelationshipKind::HasMany(HasMany {
                foreign_key: foreign_key.into(),
                local_key: local_key.into(),
            }),
            related_table,
            through_table: None,
        }
    }

    #[must_use]
    pub fn belongs_to_many(name: impl Into<String>, related_table: fn() -> &'static str, pivot: BelongsToMany) -> Self {
        Self {
            name: name.into(),
            kind: RelationshipKind::BelongsToMany(pivot),
            related_table,
            through_table: None,
        }
    }

    #[must_use]
    pub fn has_one_through(
        name: impl Into<String>,
        related_table: fn() -> &'static str,
        through_table: fn() -> &'static str,
        descriptor: ThroughOne,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationshipKind::HasOneThrough(descriptor),
            related_table,
            through_table: Some(through_table),
        }
    }

    #[must_use]
    pub fn has_many_through(
        name: impl Into<String>,
        related_table: fn() -> &'static str,
        through_table: fn() -> &'static str,
        descriptor: ThroughMany,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationshipKind::HasManyThrough(descriptor),
            related_table,
            through_table: Some(through_table),
        }
    }
}
