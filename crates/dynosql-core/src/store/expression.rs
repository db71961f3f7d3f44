//! Store-side evaluation of compiled filter expressions.
//!
//! Understands exactly the single-comparison form the compiler emits:
//! `<attribute> <op> :<placeholder>`.

use std::cmp::Ordering;

use crate::api::filter::{Comparison, CompiledFilter};
use crate::encoding::{AttributeValue, Item, number};
use crate::error::StoreError;

/// A parsed filter ready to evaluate against items.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub attribute: String,
    pub op: Comparison,
    pub value: AttributeValue,
}

impl Predicate {
    /// Parse a compiled filter, resolving its placeholder.
    pub fn parse(filter: &CompiledFilter) -> Result<Self, StoreError> {
        let invalid = || {
            StoreError::Validation(format!(
                "invalid filter expression: {}",
                filter.expression
            ))
        };

        // Split from the right: attribute names may contain spaces.
        let mut tokens = filter.expression.trim().rsplitn(3, ' ');
        let (Some(placeholder), Some(op), Some(attribute)) =
            (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(invalid());
        };
        let attribute = attribute.trim_end();
        if attribute.is_empty() || !placeholder.starts_with(':') {
            return Err(invalid());
        }

        let op = Comparison::from_expression_operator(op).map_err(|e| {
            StoreError::Validation(format!("invalid filter expression: {e}"))
        })?;
        let value = filter.values.get(placeholder).cloned().ok_or_else(|| {
            StoreError::Validation(format!(
                "unbound expression attribute value: {placeholder}"
            ))
        })?;

        Ok(Self {
            attribute: attribute.to_string(),
            op,
            value,
        })
    }

    /// Evaluate against an item. A missing attribute never matches.
    pub fn matches(&self, item: &Item) -> bool {
        let Some(actual) = item.get(&self.attribute) else {
            return false;
        };
        let ordering = compare_values(actual, &self.value);
        match self.op {
            Comparison::Eq => ordering == Some(Ordering::Equal),
            Comparison::Ne => ordering != Some(Ordering::Equal),
            Comparison::Lt => ordering == Some(Ordering::Less),
            Comparison::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Comparison::Gt => ordering == Some(Ordering::Greater),
            Comparison::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

/// Compare two tagged values, returning an ordering if the types are comparable.
///
/// - `N`: integers compared exactly, other numbers as floats (falls back to
///   text if either side doesn't parse)
/// - `S`: compared lexicographically by bytes
/// - `M`/`L`: only equal or not; never ordered
/// - Mismatched tags: `None`
pub fn compare_values(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            if let (Some(ia), Some(ib)) = (number::integral_value(a), number::integral_value(b)) {
                return Some(ia.cmp(&ib));
            }
            match (a.parse::<f64>(), b.parse::<f64>()) {
                (Ok(fa), Ok(fb)) => fa.partial_cmp(&fb),
                _ => Some(a.cmp(b)),
            }
        }
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
        (AttributeValue::M(_), AttributeValue::M(_)) | (AttributeValue::L(_), AttributeValue::L(_)) => {
            if left == right {
                Some(Ordering::Equal)
            } else {
                None
            }
        }
        _ => None,
    }
}
