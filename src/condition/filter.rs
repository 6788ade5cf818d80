//! Compiled filters and their evaluation
//!
//! `Filter::compile` validates every operator and operand of a
//! `ConditionSet` and turns the chain into a boolean tree. The left fold
//! becomes a specific tree shape:
//!
//! ```text
//! a AND b OR c AND d   =>   All[ Any[ All[a, b], c ], d ]
//! ```
//!
//! A comparison against an absent field is false for every operator.

use std::str::FromStr;

use serde_json::Value;

use super::ast::{Comparison, Condition, ConditionSet, Expr, JoinType};
use super::compare::{truthy, EqualityPolicy};
use super::glob::GlobPattern;
use crate::query::{check_field, QueryError, QueryResult, Stage};
use crate::record::{self, Record};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Like,
    Between,
    NotBetween,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Like => "like",
            Operator::Between => "between",
            Operator::NotBetween => "notBetween",
        }
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "<=" => Ok(Operator::Lte),
            ">=" => Ok(Operator::Gte),
            "like" | "LIKE" => Ok(Operator::Like),
            "between" | "BETWEEN" => Ok(Operator::Between),
            "notBetween" | "not between" | "NOT BETWEEN" => Ok(Operator::NotBetween),
            _ => Err(()),
        }
    }
}

/// Validated test applied to a field value
#[derive(Debug, Clone)]
enum Test {
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Gt(Value),
    Lte(Value),
    Gte(Value),
    Like(GlobPattern),
    Between(Value, Value),
    NotBetween(Value, Value),
}

/// A validated comparison
#[derive(Debug, Clone)]
pub struct Predicate {
    field: String,
    test: Test,
}

impl Predicate {
    /// Validates a comparison for use in `stage`
    pub fn compile(comparison: &Comparison, stage: Stage) -> QueryResult<Self> {
        check_field(stage, &comparison.field)?;

        let operator = Operator::from_str(&comparison.operator).map_err(|_| {
            QueryError::InvalidOperator {
                operator: comparison.operator.clone(),
                stage,
            }
        })?;

        let value = comparison.value.clone();
        let test = match operator {
            Operator::Eq => Test::Eq(value),
            Operator::Ne => Test::Ne(value),
            Operator::Lt => Test::Lt(value),
            Operator::Gt => Test::Gt(value),
            Operator::Lte => Test::Lte(value),
            Operator::Gte => Test::Gte(value),
            Operator::Like => {
                let pattern = value.as_str().ok_or_else(|| QueryError::InvalidOperand {
                    operator: operator.as_str().to_string(),
                    reason: "pattern must be a string".to_string(),
                    stage,
                })?;
                let glob = GlobPattern::new(pattern).map_err(|reason| QueryError::InvalidOperand {
                    operator: operator.as_str().to_string(),
                    reason,
                    stage,
                })?;
                Test::Like(glob)
            }
            Operator::Between | Operator::NotBetween => {
                let (start, end) = range_bounds(operator, value, stage)?;
                if operator == Operator::Between {
                    Test::Between(start, end)
                } else {
                    Test::NotBetween(start, end)
                }
            }
        };

        Ok(Self {
            field: comparison.field.clone(),
            test,
        })
    }

    /// Field this predicate reads
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Evaluates against a record. Absent field is always false.
    pub fn matches(&self, record: &Record, policy: EqualityPolicy) -> bool {
        match record::field(record, &self.field) {
            Some(actual) => self.test_value(actual, policy),
            None => false,
        }
    }

    fn test_value(&self, actual: &Value, policy: EqualityPolicy) -> bool {
        use std::cmp::Ordering::*;

        match &self.test {
            Test::Eq(v) => policy.equals(actual, v),
            Test::Ne(v) => !policy.equals(actual, v),
            Test::Lt(v) => policy.compare(actual, v) == Some(Less),
            Test::Gt(v) => policy.compare(actual, v) == Some(Greater),
            Test::Lte(v) => matches!(policy.compare(actual, v), Some(Less | Equal)),
            Test::Gte(v) => matches!(policy.compare(actual, v), Some(Greater | Equal)),
            Test::Like(glob) => like_text(actual, policy)
                .map(|text| glob.is_match(&text))
                .unwrap_or(false),
            Test::Between(start, end) => {
                matches!(policy.compare(actual, start), Some(Greater | Equal))
                    && matches!(policy.compare(actual, end), Some(Less | Equal))
            }
            Test::NotBetween(start, end) => {
                match (policy.compare(actual, start), policy.compare(actual, end)) {
                    (Some(lo), Some(hi)) => lo == Less || hi == Greater,
                    _ => false,
                }
            }
        }
    }
}

fn range_bounds(operator: Operator, value: Value, stage: Stage) -> QueryResult<(Value, Value)> {
    match value {
        Value::Array(mut pair) if pair.len() == 2 => {
            let end = pair.pop().unwrap_or(Value::Null);
            let start = pair.pop().unwrap_or(Value::Null);
            Ok((start, end))
        }
        _ => Err(QueryError::InvalidOperand {
            operator: operator.as_str().to_string(),
            reason: "expected a [start, end] pair".to_string(),
            stage,
        }),
    }
}

/// Text a value offers to `like`. Strict only matches strings; loose also
/// stringifies scalars.
fn like_text(value: &Value, policy: EqualityPolicy) -> Option<String> {
    match (value, policy) {
        (Value::String(s), _) => Some(s.clone()),
        (Value::Number(n), EqualityPolicy::Loose) => Some(n.to_string()),
        (Value::Bool(_), EqualityPolicy::Loose) | (Value::Null, EqualityPolicy::Loose) => {
            Some(if truthy(value) { "1" } else { "" }.to_string())
        }
        _ => None,
    }
}

/// A compiled boolean filter tree
#[derive(Debug, Clone)]
pub enum Filter {
    Compare(Predicate),
    All(Vec<Filter>),
    Any(Vec<Filter>),
}

impl Filter {
    /// Filter that keeps every record
    pub fn always() -> Self {
        Filter::All(Vec::new())
    }

    /// Compiles a condition chain with left-fold semantics.
    pub fn compile(conditions: &ConditionSet, stage: Stage) -> QueryResult<Self> {
        let mut acc = Filter::always();

        for condition in conditions.conditions() {
            let node = match condition {
                Condition::Leaf { comparison, .. } => {
                    Filter::Compare(Predicate::compile(comparison, stage)?)
                }
                Condition::Group { conditions, .. } => Filter::compile(conditions, stage)?,
                Condition::Tree { expr, .. } => Filter::from_expr(expr, stage)?,
            };
            acc = acc.fold(condition.join(), node);
        }

        Ok(acc)
    }

    /// Compiles an explicit expression tree.
    pub fn from_expr(expr: &Expr, stage: Stage) -> QueryResult<Self> {
        Ok(match expr {
            Expr::Compare(comparison) => Filter::Compare(Predicate::compile(comparison, stage)?),
            Expr::All(children) => Filter::All(
                children
                    .iter()
                    .map(|c| Filter::from_expr(c, stage))
                    .collect::<QueryResult<_>>()?,
            ),
            Expr::Any(children) => Filter::Any(
                children
                    .iter()
                    .map(|c| Filter::from_expr(c, stage))
                    .collect::<QueryResult<_>>()?,
            ),
        })
    }

    /// `self JOIN node`, flattening same-kind nodes instead of nesting.
    fn fold(self, join: JoinType, node: Filter) -> Filter {
        match (join, self) {
            (JoinType::And, Filter::All(mut children)) => {
                children.push(node);
                Filter::All(children)
            }
            (JoinType::Or, Filter::Any(mut children)) => {
                children.push(node);
                Filter::Any(children)
            }
            (JoinType::And, acc) => Filter::All(vec![acc, node]),
            (JoinType::Or, acc) => Filter::Any(vec![acc, node]),
        }
    }

    /// Evaluates the tree against a record
    pub fn matches(&self, record: &Record, policy: EqualityPolicy) -> bool {
        match self {
            Filter::Compare(predicate) => predicate.matches(record, policy),
            Filter::All(children) => children.iter().all(|c| c.matches(record, policy)),
            Filter::Any(children) => children.iter().any(|c| c.matches(record, policy)),
        }
    }
}

/// Compiles `conditions` and tests one record.
pub fn matches(record: &Record, conditions: &ConditionSet, policy: EqualityPolicy) -> QueryResult<bool> {
    Ok(Filter::compile(conditions, Stage::Filter)?.matches(record, policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn check(record: &Record, set: ConditionSet) -> bool {
        matches(record, &set, EqualityPolicy::Strict).unwrap()
    }

    #[test]
    fn test_empty_set_matches() {
        assert!(check(&rec(json!({"id": 1})), ConditionSet::new()));
    }

    #[test]
    fn test_left_fold_is_order_sensitive() {
        let r = rec(json!({"a": 1, "b": 0, "c": 1}));

        // ((true AND a=1) OR b=1) AND c=0  => false
        let first = ConditionSet::new()
            .and_where("a", "=", json!(1))
            .or_where("b", "=", json!(1))
            .and_where("c", "=", json!(0));
        assert!(!check(&r, first));

        // ((true AND c=0) AND a=1) OR b=0  => true
        let second = ConditionSet::new()
            .and_where("c", "=", json!(0))
            .and_where("a", "=", json!(1))
            .or_where("b", "=", json!(0));
        assert!(check(&r, second));
    }

    #[test]
    fn test_leading_or_is_absorbed_by_true() {
        // (true OR x) is true regardless of x
        let r = rec(json!({"a": 1}));
        let set = ConditionSet::new().or_where("a", "=", json!(2));
        assert!(check(&r, set));
    }

    #[test]
    fn test_group_folds_as_one_value() {
        let r = rec(json!({"age": 30, "name": "John"}));
        let inner = ConditionSet::new()
            .and_where("name", "=", json!("Jane"))
            .or_where("name", "=", json!("John"));
        let set = ConditionSet::new()
            .and_where("age", ">", json!(40))
            .or_group(inner);
        assert!(check(&r, set));
    }

    #[test]
    fn test_expr_tree() {
        let r = rec(json!({"age": 30, "city": "Oslo"}));
        let expr = Expr::all([
            Expr::cmp("age", ">=", json!(18)),
            Expr::any([Expr::eq("city", json!("Bergen")), Expr::like("city", "O*")]),
        ]);
        assert!(check(&r, ConditionSet::new().and_expr(expr)));
        assert!(!check(&r, ConditionSet::new().and_expr(Expr::any([]))));
    }

    #[test]
    fn test_absent_field_false_for_every_operator() {
        let r = rec(json!({"id": 1}));
        for op in ["=", "!=", "<", ">", "<=", ">="] {
            let set = ConditionSet::new().and_where("age", op, json!(10));
            assert!(!check(&r, set), "operator {} matched an absent field", op);
        }
        assert!(!check(&r, ConditionSet::new().like("age", "*")));
        assert!(!check(&r, ConditionSet::new().between("age", json!(0), json!(99))));
        assert!(!check(&r, ConditionSet::new().not_between("age", json!(0), json!(1))));
    }

    #[test]
    fn test_present_null_is_comparable() {
        let r = rec(json!({"deleted_at": null}));
        assert!(check(&r, ConditionSet::new().and_where("deleted_at", "=", Value::Null)));
    }

    #[test]
    fn test_between_inclusive() {
        let r = rec(json!({"age": 25}));
        assert!(check(&r, ConditionSet::new().between("age", json!(25), json!(30))));
        assert!(check(&r, ConditionSet::new().between("age", json!(20), json!(25))));
        assert!(!check(&r, ConditionSet::new().not_between("age", json!(20), json!(25))));
        assert!(check(&r, ConditionSet::new().not_between("age", json!(26), json!(30))));
    }

    #[test]
    fn test_between_point_agrees_with_equality() {
        let r = rec(json!({"n": 9007199254740993_i64}));
        let point = json!(9007199254740992.0);
        assert!(!check(&r, ConditionSet::new().and_where("n", "=", point.clone())));
        assert!(!check(&r, ConditionSet::new().between("n", point.clone(), point.clone())));
        assert!(!check(&r, ConditionSet::new().and_where("n", "<=", point)));
    }

    #[test]
    fn test_invalid_operator_surfaces() {
        let r = rec(json!({"age": 25}));
        let set = ConditionSet::new().and_where("age", "~=", json!(1));
        let err = matches(&r, &set, EqualityPolicy::Strict).unwrap_err();
        assert_eq!(err.code(), "JSONSQL_INVALID_OPERATOR");
    }

    #[test]
    fn test_invalid_between_operand() {
        let set = ConditionSet::new().and_where("age", "between", json!(5));
        let err = Filter::compile(&set, Stage::Filter).unwrap_err();
        assert_eq!(err.code(), "JSONSQL_INVALID_OPERAND");
    }

    #[test]
    fn test_like_on_numbers_depends_on_policy() {
        let r = rec(json!({"zip": 12345}));
        let set = ConditionSet::new().like("zip", "123*");
        assert!(!matches(&r, &set, EqualityPolicy::Strict).unwrap());
        assert!(matches(&r, &set, EqualityPolicy::Loose).unwrap());
    }
}
