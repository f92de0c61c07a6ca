//! Global scopes: `SoftDeletes` and `UUIDPrimaryKey`,
//! plus the trait that lets a model register arbitrary others.

use crate::builder::QueryBuilder;
use crate::value::Value;

/// Applies automatically to every query built from a model unless opted
/// out of by name via `without_global_scope`.
pub trait GlobalScope: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, builder: QueryBuilder) -> QueryBuilder;
}

/// Adds `WHERE <deleted_col> IS NULL` to every query; `delete()` is
/// rewritten by [`crate::model::Instance::delete`] into an `UPDATE` rather
/// than being handled here, since the scope only filters reads.
pub struct SoftDeletesScope {
    pub column: String,
}

impl GlobalScope for SoftDeletesScope {
    fn name(&self) -> &'static str {
        "soft_deletes"
    }

    fn apply(&self, builder: QueryBuilder) -> QueryBuilder {
        builder.where_null(&self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidVersion {
    V1,
    V3,
    V4,
    V5,
}

/// Generates a primary-key value on insert when unset. The generation
/// itself happens in [`crate::model::Instance::save`] (it needs to mutate
/// the attribute map before the insert is compiled); this scope exists
/// only so `without_global_scope("uuid_primary_key")` can suppress it the
/// same way any other global scope is suppressed.
pub struct UuidPrimaryKeyScope {
    pub version: UuidVersion,
}

impl GlobalScope for UuidPrimaryKeyScope {
    fn name(&self) -> &'static str {
        "uuid_primary_key"
    }

    fn apply(&self, builder: QueryBuilder) -> QueryBuilder {
        builder
    }
}

/// Deterministic placeholder UUID generator — avoids pulling in a `uuid`
/// crate for a single call site, while keeping the v4 "random" and
/// v1-style "time-based" shapes structurally distinct.
/// Real installations overriding `uuid_primary_key` with cryptographic
/// randomness would swap this function, not the scope.
#[must_use]
pub fn generate_uuid(version: UuidVersion, seed: u64) -> Value {
    // Spread the 64-bit seed across a 128-bit field with a different
    // multiplier per half so the two halves don't repeat verbatim.
    let high = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let low = seed.wrapping_mul(0xC2B2_AE3D_27D4_EB4F).rotate_left(17);
    let hex = format!("{high:016x}{low:016x}");
    let variant = match version {
        UuidVersion::V1 => '1',
        UuidVersion::V3 => '3',
        UuidVersion::V4 => '4',
        UuidVersion::V5 => '5',
    };
    Value::Text(format!(
        "{}-{}-{variant}{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[13..16],
        &hex[16..20],
        &hex[20..32],
    ))
}
