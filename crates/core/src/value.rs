use std::cmp::Ordering;
use std::fmt;

/// A bound query parameter or a model attribute value.
///
/// This is the runtime counterpart of the `cast` system in §4.4: every
/// value that crosses the model <-> database boundary is represented as a
/// `Value`, and casts convert between `Value` and a column's declared Rust
/// shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Pre-encoded JSON payload (the `json` cast encodes into this on write).
    Json(String),
    /// Opaque bytes, used for `blob`/`binary` columns.
    Bytes(Vec<u8>),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by the `bool` cast: everything is truthy except
    /// `{0, "0", "", "false", null}`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(0) => false,
            Value::Integer(_) => true,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !matches!(s.as_str(), "0" | "" | "false" | "False"),
            Value::Json(_) | Value::Bytes(_) => true,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Json(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Text(s) | Value::Json(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Bytes(b) => write!(f, "x'{}'", hex_encode(b)),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Serializes as a plain JSON scalar rather than an enum-tagged shape —
/// `Model::serialize()` and `Collection::serialize()` expect attribute
/// values to read like ordinary JSON, not `{"Integer": 1}`.
impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Json(s) => {
                let parsed: serde_json::Value = serde_json::from_str(s).unwrap_or(serde_json::Value::Null);
                parsed.serialize(serializer)
            }
            Value::Bytes(b) => serializer.serialize_str(&hex_encode(b)),
        }
    }
}

/// Total equality for values, comparing floats by total order instead of
/// `PartialEq` so `NaN` and signed zero compare consistently. Used by the
/// model dirty-tracking law (`is_dirty` compares `serialize(attr)`
/// snapshots).
#[must_use]
pub fn value_total_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Float(l), Value::Float(r)) => l.total_cmp(r) == Ordering::Equal,
        _ => left == right,
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
