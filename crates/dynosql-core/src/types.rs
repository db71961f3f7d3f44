//! Core types: type tags, key descriptors, table schemas, primary keys, records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A native record: attribute name to native value.
pub type Record = serde_json::Map<String, Value>;

/// The one-letter type discriminator carried by every wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// Text.
    S,
    /// Number, transmitted as decimal text.
    N,
    /// Map of attribute name to tagged value.
    M,
    /// Ordered list of tagged values.
    L,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::S => "S",
            TypeTag::N => "N",
            TypeTag::M => "M",
            TypeTag::L => "L",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(TypeTag::S),
            "N" => Ok(TypeTag::N),
            "M" => Ok(TypeTag::M),
            "L" => Ok(TypeTag::L),
            other => Err(format!("unknown type tag: {other}")),
        }
    }
}

/// A key attribute definition (name + tag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub name: String,
    pub kind: TypeTag,
}

impl KeyDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeTag) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Schema definition for a table.
///
/// Immutable once the table exists. When attaching to a table created
/// elsewhere it is re-derived from the store's table description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub partition_key: KeyDescriptor,
    pub sort_key: Option<KeyDescriptor>,
}

impl TableSchema {
    /// Whether records in this table are addressed by a `(partition, sort)` pair.
    pub fn is_composite(&self) -> bool {
        self.sort_key.is_some()
    }

    /// Names of the key attributes, partition key first.
    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.name.as_str())
            .chain(self.sort_key.as_ref().map(|sk| sk.name.as_str()))
    }

    /// Whether `attribute` is one of the table's key attributes.
    pub fn is_key_attribute(&self, attribute: &str) -> bool {
        self.key_names().any(|name| name == attribute)
    }
}

/// A primary key value.
///
/// The arity is explicit: `Single` addresses partition-only tables and
/// `Composite` addresses tables with a sort key. A string is always a
/// `Single` key, never a sequence of characters.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryKey {
    Single(Value),
    Composite(Value, Value),
}

impl PrimaryKey {
    pub fn single(value: impl Into<Value>) -> Self {
        PrimaryKey::Single(value.into())
    }

    pub fn composite(partition: impl Into<Value>, sort: impl Into<Value>) -> Self {
        PrimaryKey::Composite(partition.into(), sort.into())
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Single(v) => write!(f, "{v}"),
            PrimaryKey::Composite(pk, sk) => write!(f, "({pk}, {sk})"),
        }
    }
}

impl From<Value> for PrimaryKey {
    fn from(value: Value) -> Self {
        PrimaryKey::Single(value)
    }
}

impl From<&str> for PrimaryKey {
    fn from(value: &str) -> Self {
        PrimaryKey::Single(Value::from(value))
    }
}

impl From<String> for PrimaryKey {
    fn from(value: String) -> Self {
        PrimaryKey::Single(Value::from(value))
    }
}

impl From<i64> for PrimaryKey {
    fn from(value: i64) -> Self {
        PrimaryKey::Single(Value::from(value))
    }
}

impl From<i32> for PrimaryKey {
    fn from(value: i32) -> Self {
        PrimaryKey::Single(Value::from(value))
    }
}

impl From<u64> for PrimaryKey {
    fn from(value: u64) -> Self {
        PrimaryKey::Single(Value::from(value))
    }
}

impl From<f64> for PrimaryKey {
    fn from(value: f64) -> Self {
        PrimaryKey::Single(Value::from(value))
    }
}

impl<P: Into<Value>, S: Into<Value>> From<(P, S)> for PrimaryKey {
    fn from((partition, sort): (P, S)) -> Self {
        PrimaryKey::Composite(partition.into(), sort.into())
    }
}
