//! Filter compiler for scans, and unwrapping of item/items responses.
//!
//! A [`Condition`] is a single `(attribute, operator, value)` comparison. It
//! compiles to the store's named-parameter syntax:
//!
//! ```text
//! Condition::eq("released", 1983)
//!   => FilterExpression:          "released = :a"
//!      ExpressionAttributeValues: {":a": {"N": "1983"}}
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::encoding::{self, AttributeValue, Item};
use crate::error::{Error, FilterError};
use crate::types::Record;

/// Reserved placeholder names for bound values, in allocation order.
const PLACEHOLDER_NAMES: &str = "abcdefghijklmnopqrstuvwxyz";

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparison {
    /// Look up an operator by its caller-side symbol (`==`, `!=`, `<`, `>`, `<=`, `>=`).
    pub fn from_symbol(symbol: &str) -> Result<Self, FilterError> {
        match symbol {
            "==" => Ok(Comparison::Eq),
            "!=" => Ok(Comparison::Ne),
            "<" => Ok(Comparison::Lt),
            ">" => Ok(Comparison::Gt),
            "<=" => Ok(Comparison::Le),
            ">=" => Ok(Comparison::Ge),
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }

    /// The caller-side symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
        }
    }

    /// The store's textual operator.
    pub fn expression_operator(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
        }
    }

    /// Look up an operator by the store's textual form (`=`, `<>`, ...).
    pub fn from_expression_operator(op: &str) -> Result<Self, FilterError> {
        match op {
            "=" => Ok(Comparison::Eq),
            "<>" => Ok(Comparison::Ne),
            "<" => Ok(Comparison::Lt),
            ">" => Ok(Comparison::Gt),
            "<=" => Ok(Comparison::Le),
            ">=" => Ok(Comparison::Ge),
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }
}

impl FromStr for Comparison {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Comparison::from_symbol(s)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single attribute comparison used as a scan filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub op: Comparison,
    pub value: Value,
}

impl Condition {
    pub fn new(attribute: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            value: value.into(),
        }
    }

    /// Build a condition from a caller-side operator symbol such as `"=="`.
    pub fn parse(
        attribute: impl Into<String>,
        symbol: &str,
        value: impl Into<Value>,
    ) -> Result<Self, FilterError> {
        Ok(Self::new(attribute, Comparison::from_symbol(symbol)?, value))
    }

    /// `attribute == value`
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparison::Eq, value)
    }

    /// `attribute != value`
    pub fn ne(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparison::Ne, value)
    }

    /// `attribute < value`
    pub fn lt(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparison::Lt, value)
    }

    /// `attribute > value`
    pub fn gt(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparison::Gt, value)
    }

    /// `attribute <= value`
    pub fn le(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparison::Le, value)
    }

    /// `attribute >= value`
    pub fn ge(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Comparison::Ge, value)
    }
}

/// A filter in the store's named-parameter form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFilter {
    pub expression: String,
    pub values: BTreeMap<String, AttributeValue>,
}

/// Compile a condition into a filter string and its bound values.
pub fn compile(condition: &Condition) -> Result<CompiledFilter, Error> {
    let placeholder = format!(":{}", &PLACEHOLDER_NAMES[..1]);
    let value = encoding::encode(&condition.value)
        .map_err(|e| encoding::with_attribute(e, &condition.attribute))?;

    let expression = format!(
        "{} {} {}",
        condition.attribute,
        condition.op.expression_operator(),
        placeholder
    );

    let mut values = BTreeMap::new();
    values.insert(placeholder, value);

    Ok(CompiledFilter { expression, values })
}

// ---------------------------------------------------------------------------
// Response unwrapping
// ---------------------------------------------------------------------------

/// A raw store read response: a single item or a list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemResponse {
    Item(Item),
    Items(Vec<Item>),
}

/// A decoded read response.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    One(Record),
    Many(Vec<Record>),
}

impl ItemResponse {
    /// Inspect a raw JSON response for `"Items"` or `"Item"`.
    ///
    /// Returns `Ok(None)` when neither key is present (e.g. a get for an
    /// absent record). Extra keys such as `"Count"` are ignored.
    pub fn from_json(resp: &Value) -> Result<Option<Self>, Error> {
        if let Some(items) = resp.get("Items") {
            let items = items
                .as_array()
                .ok_or_else(|| {
                    crate::error::EncodingError::MalformedValue(
                        "'Items' is not an array".to_string(),
                    )
                })?
                .iter()
                .map(encoding::item_from_json)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Some(ItemResponse::Items(items)));
        }
        match resp.get("Item") {
            Some(item) => Ok(Some(ItemResponse::Item(encoding::item_from_json(item)?))),
            None => Ok(None),
        }
    }

    /// Decode the tagged payload into native records.
    pub fn decode(&self) -> Decoded {
        match self {
            ItemResponse::Item(item) => Decoded::One(encoding::decode_item(item)),
            ItemResponse::Items(items) => {
                Decoded::Many(items.iter().map(encoding::decode_item).collect())
            }
        }
    }
}

impl Decoded {
    /// Flatten into a list of records regardless of shape.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Decoded::One(record) => vec![record],
            Decoded::Many(records) => records,
        }
    }
}
