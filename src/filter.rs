//! Backend-agnostic query filter expressions.
//!
//! A [`Filter`] is a boolean predicate tree over document metadata
//! fields. It carries no backend knowledge; [`crate::dialect`] compiles
//! it into a concrete store's native query representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scalar value usable in filter comparisons.
///
/// Filter values are pre-validated upstream: strings, numbers, and
/// booleans (or arrays of them for [`Filter::In`]) are the full universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A string value.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Bool(bool),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<&FilterValue> for serde_json::Value {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::String(s) => serde_json::Value::from(s.clone()),
            FilterValue::Number(n) => serde_json::Value::from(*n),
            FilterValue::Bool(b) => serde_json::Value::from(*b),
        }
    }
}

/// A backend-agnostic boolean filter over document metadata.
///
/// Field maps are ordered (`BTreeMap`) so serialized filters are
/// deterministic; the retrieval cache keys on the serialized form.
/// Multiple fields inside one `Equals`/range arm are independently
/// tested and ANDed together.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit::{Filter, FilterValue};
///
/// let filter = Filter::And(vec![
///     Filter::equals("category", "tech"),
///     Filter::greater_than("views", 1000.0),
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Field equals value, per field.
    Equals(BTreeMap<String, FilterValue>),
    /// Field strictly greater than value, per field.
    GreaterThan(BTreeMap<String, f64>),
    /// Field strictly less than value, per field.
    LessThan(BTreeMap<String, f64>),
    /// Field greater than or equal to value, per field.
    GreaterOrEqual(BTreeMap<String, f64>),
    /// Field less than or equal to value, per field.
    LessOrEqual(BTreeMap<String, f64>),
    /// Field value is a member of the given set.
    In {
        /// The metadata field to test.
        field: String,
        /// The allowed values.
        values: Vec<FilterValue>,
    },
    /// All child filters must match.
    And(Vec<Filter>),
    /// At least one child filter must match.
    Or(Vec<Filter>),
    /// The child filter must not match.
    Not(Box<Filter>),
}

impl Filter {
    /// The canonical empty filter, which compiles to "match everything"
    /// in every dialect.
    pub fn match_all() -> Self {
        Filter::And(Vec::new())
    }

    /// Single-field equality filter.
    pub fn equals(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Equals(BTreeMap::from([(field.into(), value.into())]))
    }

    /// Single-field strict greater-than filter.
    pub fn greater_than(field: impl Into<String>, value: f64) -> Self {
        Filter::GreaterThan(BTreeMap::from([(field.into(), value)]))
    }

    /// Single-field strict less-than filter.
    pub fn less_than(field: impl Into<String>, value: f64) -> Self {
        Filter::LessThan(BTreeMap::from([(field.into(), value)]))
    }

    /// Single-field greater-or-equal filter.
    pub fn greater_or_equal(field: impl Into<String>, value: f64) -> Self {
        Filter::GreaterOrEqual(BTreeMap::from([(field.into(), value)]))
    }

    /// Single-field less-or-equal filter.
    pub fn less_or_equal(field: impl Into<String>, value: f64) -> Self {
        Filter::LessOrEqual(BTreeMap::from([(field.into(), value)]))
    }

    /// Set-membership filter.
    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::match_all()
    }
}
