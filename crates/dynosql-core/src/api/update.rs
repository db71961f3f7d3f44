//! Single-attribute update expressions for `update_item`.
//!
//! The attribute name travels through an expression attribute name so that
//! reserved words (`name`, `year`, ...) can be updated:
//!
//! ```text
//! UpdateExpression:          "SET #X = :y"
//! ExpressionAttributeNames:  {"#X": "released"}
//! ExpressionAttributeValues: {":y": {"N": "2001"}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encoding::AttributeValue;
use crate::error::StoreError;

const NAME_PLACEHOLDER: &str = "#X";
const VALUE_PLACEHOLDER: &str = ":y";

/// A `SET` update in the store's expression form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledUpdate {
    pub expression: String,
    pub names: BTreeMap<String, String>,
    pub values: BTreeMap<String, AttributeValue>,
}

/// Compile a single-attribute assignment.
pub fn compile_update(attribute: &str, value: AttributeValue) -> CompiledUpdate {
    let mut names = BTreeMap::new();
    names.insert(NAME_PLACEHOLDER.to_string(), attribute.to_string());
    let mut values = BTreeMap::new();
    values.insert(VALUE_PLACEHOLDER.to_string(), value);
    CompiledUpdate {
        expression: format!("SET {NAME_PLACEHOLDER} = {VALUE_PLACEHOLDER}"),
        names,
        values,
    }
}

impl CompiledUpdate {
    /// Parse a `SET <name> = <value>` expression back into the attribute name
    /// and the tagged value, resolving placeholders.
    ///
    /// Only single assignments are understood.
    pub fn resolve(&self) -> Result<(String, AttributeValue), StoreError> {
        let invalid =
            || StoreError::Validation(format!("unsupported update expression: {}", self.expression));

        let tokens: Vec<&str> = self.expression.split_whitespace().collect();
        let [set, name, "=", value] = tokens.as_slice() else {
            return Err(invalid());
        };
        if !set.eq_ignore_ascii_case("SET") {
            return Err(invalid());
        }

        let attribute = if name.starts_with('#') {
            self.names.get(*name).cloned().ok_or_else(|| {
                StoreError::Validation(format!("unbound expression attribute name: {name}"))
            })?
        } else {
            name.to_string()
        };

        let value = self.values.get(*value).cloned().ok_or_else(|| {
            StoreError::Validation(format!("unbound expression attribute value: {value}"))
        })?;

        Ok((attribute, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_update() {
        let update = compile_update("released", AttributeValue::N("2001".to_string()));
        assert_eq!(update.expression, "SET #X = :y");
        assert_eq!(update.names["#X"], "released");
        assert_eq!(update.values[":y"], AttributeValue::N("2001".to_string()));
    }

    #[test]
    fn test_resolve_roundtrip() {
        let update = compile_update("album", AttributeValue::S("1999".to_string()));
        let (attribute, value) = update.resolve().unwrap();
        assert_eq!(attribute, "album");
        assert_eq!(value, AttributeValue::S("1999".to_string()));
    }

    #[test]
    fn test_resolve_literal_name() {
        let mut update = compile_update("album", AttributeValue::S("1999".to_string()));
        update.expression = "set album = :y".to_string();
        assert_eq!(update.resolve().unwrap().0, "album");
    }

    #[test]
    fn test_resolve_rejects_other_forms() {
        let mut update = compile_update("album", AttributeValue::S("x".to_string()));
        update.expression = "REMOVE #X".to_string();
        assert!(update.resolve().is_err());

        update.expression = "SET #X = :z".to_string();
        assert!(update.resolve().is_err());

        update.expression = "SET #Y = :y".to_string();
        assert!(update.resolve().is_err());
    }
}
