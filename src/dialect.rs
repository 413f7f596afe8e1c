//! Compilation of [`Filter`] trees into backend-native query dialects.
//!
//! The traversal in [`compile`] is shared by every backend; a
//! [`QueryDialect`] only renders leaf clauses and groups. Adding a new
//! store backend means adding one renderer here — the AND/OR/NOT
//! recursion never changes.
//!
//! Two reference dialects ship with the crate:
//!
//! - [`PointMatchDialect`] — the `must`/`should`/`must_not` filter grammar
//!   of point-based vector indexes (Qdrant-style)
//! - [`BoolQueryDialect`] — the `bool` query DSL of full-text search
//!   engines (Elasticsearch-style), with metadata fields namespaced under
//!   a `metadata.` prefix

use serde_json::{json, Map, Value};

use crate::error::{RagError, Result};
use crate::filter::{Filter, FilterValue};

/// A range comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    /// Strictly greater than.
    Gt,
    /// Strictly less than.
    Lt,
    /// Greater than or equal.
    Gte,
    /// Less than or equal.
    Lte,
}

impl RangeOp {
    /// The operator's key in rendered range clauses.
    pub fn key(self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Lt => "lt",
            RangeOp::Gte => "gte",
            RangeOp::Lte => "lte",
        }
    }
}

/// The three clause lists a compiled filter group is built from.
#[derive(Debug, Default)]
pub struct CompiledGroup {
    /// Clauses that must all match (AND).
    pub must: Vec<Value>,
    /// Clauses of which at least one must match (OR).
    pub should: Vec<Value>,
    /// Clauses that must not match (NOT).
    pub must_not: Vec<Value>,
}

impl CompiledGroup {
    fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }
}

/// Renders leaf clauses and clause groups for one backend's query dialect.
///
/// Implementations are stateless; rendering the same input twice yields
/// the same output with no side effects.
pub trait QueryDialect: Send + Sync {
    /// The dialect's canonical name.
    fn name(&self) -> &'static str;

    /// Render a field-equals-value clause.
    fn equals(&self, field: &str, value: &FilterValue) -> Value;

    /// Render a numeric range clause.
    fn range(&self, field: &str, op: RangeOp, bound: f64) -> Value;

    /// Render a set-membership clause.
    ///
    /// Dialects without a native membership operator lower this to an
    /// OR-of-equals group.
    fn one_of(&self, field: &str, values: &[FilterValue]) -> Value;

    /// Render a clause group. An empty group renders the dialect's
    /// "match everything" query.
    fn group(&self, group: CompiledGroup) -> Value;
}

/// Compile a [`Filter`] into a backend-native query value.
///
/// Total function: every filter shape compiles. The empty filter
/// ([`Filter::match_all`]) compiles to the dialect's match-everything
/// query.
pub fn compile(filter: &Filter, dialect: &dyn QueryDialect) -> Value {
    dialect.group(compile_group(filter, dialect))
}

/// Structural recursion over the filter tree, building one clause group.
fn compile_group(filter: &Filter, dialect: &dyn QueryDialect) -> CompiledGroup {
    let mut group = CompiledGroup::default();
    match filter {
        Filter::Equals(fields) => {
            for (field, value) in fields {
                group.must.push(dialect.equals(field, value));
            }
        }
        Filter::GreaterThan(fields) => push_ranges(&mut group, dialect, RangeOp::Gt, fields),
        Filter::LessThan(fields) => push_ranges(&mut group, dialect, RangeOp::Lt, fields),
        Filter::GreaterOrEqual(fields) => push_ranges(&mut group, dialect, RangeOp::Gte, fields),
        Filter::LessOrEqual(fields) => push_ranges(&mut group, dialect, RangeOp::Lte, fields),
        Filter::In { field, values } => {
            group.must.push(dialect.one_of(field, values));
        }
        Filter::And(children) => {
            for child in children {
                let sub = compile_group(child, dialect);
                if sub.should.is_empty() && sub.must_not.is_empty() {
                    // Conjunction is associative: leaf-only children are
                    // spliced instead of nested.
                    group.must.extend(sub.must);
                } else {
                    group.must.push(dialect.group(sub));
                }
            }
        }
        Filter::Or(children) => {
            for child in children {
                let sub = compile_group(child, dialect);
                if sub.is_empty() {
                    // An always-true child makes the whole disjunction
                    // true; it must stay in the should list as the
                    // dialect's match-everything clause, not vanish.
                    group.should.push(dialect.group(sub));
                } else if sub.must.is_empty() && sub.must_not.is_empty() {
                    group.should.extend(sub.should);
                } else if sub.must.len() == 1 && sub.must_not.is_empty() && sub.should.is_empty() {
                    group.should.push(sub.must.into_iter().next().unwrap_or_default());
                } else {
                    group.should.push(dialect.group(sub));
                }
            }
        }
        Filter::Not(child) => {
            let sub = compile_group(child, dialect);
            if sub.must.len() == 1 && sub.should.is_empty() && sub.must_not.is_empty() {
                group.must_not.push(sub.must.into_iter().next().unwrap_or_default());
            } else {
                group.must_not.push(dialect.group(sub));
            }
        }
    }
    group
}

fn push_ranges(
    group: &mut CompiledGroup,
    dialect: &dyn QueryDialect,
    op: RangeOp,
    fields: &std::collections::BTreeMap<String, f64>,
) {
    for (field, bound) in fields {
        group.must.push(dialect.range(field, op, *bound));
    }
}

/// The `must`/`should`/`must_not` filter grammar of point-based vector
/// indexes.
///
/// Leaves are `{"key": field, "match": {"value": ...}}` and
/// `{"key": field, "range": {...}}` clauses. Membership is lowered to a
/// `should`-wrapped OR-of-matches because the grammar has no native set
/// operator. The empty filter renders as `{}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointMatchDialect;

impl QueryDialect for PointMatchDialect {
    fn name(&self) -> &'static str {
        "point_match"
    }

    fn equals(&self, field: &str, value: &FilterValue) -> Value {
        json!({ "key": field, "match": { "value": Value::from(value) } })
    }

    fn range(&self, field: &str, op: RangeOp, bound: f64) -> Value {
        json!({ "key": field, "range": { (op.key()): bound } })
    }

    fn one_of(&self, field: &str, values: &[FilterValue]) -> Value {
        if values.len() == 1 {
            return self.equals(field, &values[0]);
        }
        let matches: Vec<Value> = values.iter().map(|v| self.equals(field, v)).collect();
        json!({ "should": matches })
    }

    fn group(&self, group: CompiledGroup) -> Value {
        let mut object = Map::new();
        if !group.must.is_empty() {
            object.insert("must".to_string(), Value::Array(group.must));
        }
        if !group.should.is_empty() {
            object.insert("should".to_string(), Value::Array(group.should));
        }
        if !group.must_not.is_empty() {
            object.insert("must_not".to_string(), Value::Array(group.must_not));
        }
        Value::Object(object)
    }
}

/// The `bool` query DSL of full-text search engines.
///
/// Metadata fields are namespaced under the fixed `metadata.` prefix to
/// keep them apart from core document fields. OR groups carry
/// `minimum_should_match: 1` to force at-least-one-of semantics. The
/// empty filter renders as `{"match_all": {}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolQueryDialect;

/// Fixed prefix separating metadata fields from core document fields in
/// the bool-query dialect.
pub const METADATA_FIELD_PREFIX: &str = "metadata.";

impl BoolQueryDialect {
    fn field(&self, field: &str) -> String {
        format!("{METADATA_FIELD_PREFIX}{field}")
    }
}

impl QueryDialect for BoolQueryDialect {
    fn name(&self) -> &'static str {
        "bool_query"
    }

    fn equals(&self, field: &str, value: &FilterValue) -> Value {
        json!({ "term": { (self.field(field)): Value::from(value) } })
    }

    fn range(&self, field: &str, op: RangeOp, bound: f64) -> Value {
        json!({ "range": { (self.field(field)): { (op.key()): bound } } })
    }

    fn one_of(&self, field: &str, values: &[FilterValue]) -> Value {
        let values: Vec<Value> = values.iter().map(Value::from).collect();
        json!({ "terms": { (self.field(field)): values } })
    }

    fn group(&self, group: CompiledGroup) -> Value {
        if group.is_empty() {
            return json!({ "match_all": {} });
        }
        let mut bool_object = Map::new();
        if !group.must.is_empty() {
            bool_object.insert("must".to_string(), Value::Array(group.must));
        }
        if !group.should.is_empty() {
            bool_object.insert("should".to_string(), Value::Array(group.should));
            bool_object.insert("minimum_should_match".to_string(), Value::from(1));
        }
        if !group.must_not.is_empty() {
            bool_object.insert("must_not".to_string(), Value::Array(group.must_not));
        }
        json!({ "bool": bool_object })
    }
}

/// The query dialects known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectKind {
    /// [`PointMatchDialect`].
    PointMatch,
    /// [`BoolQueryDialect`].
    BoolQuery,
}

static POINT_MATCH: PointMatchDialect = PointMatchDialect;
static BOOL_QUERY: BoolQueryDialect = BoolQueryDialect;

impl DialectKind {
    /// Look up a dialect by name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::FilterError`] for an unknown dialect name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "point_match" => Ok(DialectKind::PointMatch),
            "bool_query" => Ok(DialectKind::BoolQuery),
            other => Err(RagError::FilterError(format!("unsupported query dialect '{other}'"))),
        }
    }

    /// The renderer for this dialect.
    pub fn renderer(self) -> &'static dyn QueryDialect {
        match self {
            DialectKind::PointMatch => &POINT_MATCH,
            DialectKind::BoolQuery => &BOOL_QUERY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tech_and_views() -> Filter {
        Filter::And(vec![
            Filter::equals("category", "tech"),
            Filter::greater_than("views", 1000.0),
        ])
    }

    #[test]
    fn and_of_leaves_flattens_into_must() {
        let compiled = compile(&tech_and_views(), &PointMatchDialect);
        let must = compiled["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0], json!({ "key": "category", "match": { "value": "tech" } }));
        assert_eq!(must[1], json!({ "key": "views", "range": { "gt": 1000.0 } }));

        let compiled = compile(&tech_and_views(), &BoolQueryDialect);
        let must = compiled["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0], json!({ "term": { "metadata.category": "tech" } }));
        assert_eq!(must[1], json!({ "range": { "metadata.views": { "gt": 1000.0 } } }));
    }

    #[test]
    fn compilation_is_idempotent() {
        let filter = tech_and_views();
        for dialect in [DialectKind::PointMatch, DialectKind::BoolQuery] {
            let first = compile(&filter, dialect.renderer());
            let second = compile(&filter, dialect.renderer());
            assert_eq!(first, second);
        }
    }

    #[test]
    fn or_compiles_to_should_with_minimum_should_match() {
        let filter = Filter::Or(vec![
            Filter::equals("category", "tech"),
            Filter::equals("category", "literature"),
        ]);

        let compiled = compile(&filter, &PointMatchDialect);
        assert_eq!(compiled["should"].as_array().unwrap().len(), 2);
        assert!(compiled.get("must").is_none());

        let compiled = compile(&filter, &BoolQueryDialect);
        assert_eq!(compiled["bool"]["should"].as_array().unwrap().len(), 2);
        assert_eq!(compiled["bool"]["minimum_should_match"], json!(1));
    }

    #[test]
    fn not_compiles_to_must_not() {
        let filter = Filter::Not(Box::new(Filter::equals("archived", true)));

        let compiled = compile(&filter, &PointMatchDialect);
        assert_eq!(
            compiled["must_not"],
            json!([{ "key": "archived", "match": { "value": true } }])
        );

        let compiled = compile(&filter, &BoolQueryDialect);
        assert_eq!(
            compiled["bool"]["must_not"],
            json!([{ "term": { "metadata.archived": true } }])
        );
    }

    #[test]
    fn or_keeps_always_true_children() {
        let filter = Filter::Or(vec![Filter::match_all(), Filter::equals("category", "tech")]);

        let compiled = compile(&filter, &PointMatchDialect);
        let should = compiled["should"].as_array().unwrap();
        assert_eq!(should.len(), 2);
        assert_eq!(should[0], json!({}));

        let compiled = compile(&filter, &BoolQueryDialect);
        let should = compiled["bool"]["should"].as_array().unwrap();
        assert_eq!(should.len(), 2);
        assert_eq!(should[0], json!({ "match_all": {} }));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert_eq!(compile(&Filter::match_all(), &PointMatchDialect), json!({}));
        assert_eq!(compile(&Filter::match_all(), &BoolQueryDialect), json!({ "match_all": {} }));
    }

    #[test]
    fn membership_lowering_differs_per_dialect() {
        let filter = Filter::is_in("lang", ["en", "fr"]);

        let compiled = compile(&filter, &PointMatchDialect);
        let lowered = &compiled["must"][0];
        assert_eq!(lowered["should"].as_array().unwrap().len(), 2);

        let compiled = compile(&filter, &BoolQueryDialect);
        assert_eq!(
            compiled["bool"]["must"][0],
            json!({ "terms": { "metadata.lang": ["en", "fr"] } })
        );
    }

    #[test]
    fn single_value_membership_lowers_to_match_in_point_dialect() {
        let filter = Filter::is_in("lang", ["en"]);
        let compiled = compile(&filter, &PointMatchDialect);
        assert_eq!(
            compiled["must"][0],
            json!({ "key": "lang", "match": { "value": "en" } })
        );
    }

    #[test]
    fn multi_field_equals_is_anded() {
        let filter = Filter::Equals(std::collections::BTreeMap::from([
            ("a".to_string(), FilterValue::from("x")),
            ("b".to_string(), FilterValue::from("y")),
        ]));
        let compiled = compile(&filter, &PointMatchDialect);
        assert_eq!(compiled["must"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn nested_or_inside_and_keeps_grouping() {
        let filter = Filter::And(vec![
            Filter::equals("category", "tech"),
            Filter::Or(vec![
                Filter::equals("lang", "en"),
                Filter::equals("lang", "fr"),
            ]),
        ]);

        let compiled = compile(&filter, &PointMatchDialect);
        let must = compiled["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[1]["should"].as_array().unwrap().len(), 2);

        let compiled = compile(&filter, &BoolQueryDialect);
        let must = compiled["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[1]["bool"]["minimum_should_match"], json!(1));
    }

    #[test]
    fn unknown_dialect_name_is_rejected() {
        assert!(DialectKind::from_name("point_match").is_ok());
        assert!(DialectKind::from_name("bool_query").is_ok());
        assert!(matches!(
            DialectKind::from_name("graph_query"),
            Err(crate::error::RagError::FilterError(_))
        ));
    }
}
