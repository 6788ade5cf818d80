//! Condition structures
//!
//! Two ways to describe a filter:
//!
//! - `ConditionSet`: the flat chain. Each entry carries its own join type
//!   and is folded left-to-right into an accumulator that starts at
//!   `true`. `a AND b OR c` therefore means `((true AND a) AND b) OR c`.
//!   Insertion order matters.
//! - `Expr`: an explicit boolean tree of AND/OR nodes. Preferred when
//!   mixing AND and OR, because nothing depends on insertion order.
//!
//! Both are pure accumulation. Operators and operands are validated when
//! the filter is compiled at execution time.

use serde_json::Value;

/// How a chained condition combines with everything before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    And,
    Or,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::And => "AND",
            JoinType::Or => "OR",
        }
    }
}

/// A single `field operator value` comparison, unvalidated.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Field name
    pub field: String,
    /// Operator text, e.g. `"="`, `"like"`, `"between"`
    pub operator: String,
    /// Operand; `between`/`notBetween` take a two-element array
    pub value: Value,
}

impl Comparison {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value,
        }
    }
}

/// One entry of a condition chain
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A comparison
    Leaf { comparison: Comparison, join: JoinType },
    /// A nested chain, folded on its own and then joined as one value
    Group { conditions: ConditionSet, join: JoinType },
    /// An explicit boolean tree, joined as one value
    Tree { expr: Expr, join: JoinType },
}

impl Condition {
    /// Returns the join type of this entry
    pub fn join(&self) -> JoinType {
        match self {
            Condition::Leaf { join, .. }
            | Condition::Group { join, .. }
            | Condition::Tree { join, .. } => *join,
        }
    }
}

/// Ordered condition chain with left-fold semantics.
///
/// An empty set matches every record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chain in insertion order
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Appends a raw condition
    pub fn push(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    fn leaf(self, join: JoinType, field: impl Into<String>, op: impl Into<String>, value: Value) -> Self {
        self.push(Condition::Leaf {
            comparison: Comparison::new(field, op, value),
            join,
        })
    }

    /// `AND field op value`
    pub fn and_where(self, field: impl Into<String>, op: impl Into<String>, value: Value) -> Self {
        self.leaf(JoinType::And, field, op, value)
    }

    /// `OR field op value`
    pub fn or_where(self, field: impl Into<String>, op: impl Into<String>, value: Value) -> Self {
        self.leaf(JoinType::Or, field, op, value)
    }

    /// `AND field like pattern`
    pub fn like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.leaf(JoinType::And, field, "like", Value::String(pattern.into()))
    }

    /// `OR field like pattern`
    pub fn or_like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.leaf(JoinType::Or, field, "like", Value::String(pattern.into()))
    }

    /// `AND start <= field <= end`
    pub fn between(self, field: impl Into<String>, start: Value, end: Value) -> Self {
        self.leaf(JoinType::And, field, "between", Value::Array(vec![start, end]))
    }

    /// `AND (field < start OR field > end)`
    pub fn not_between(self, field: impl Into<String>, start: Value, end: Value) -> Self {
        self.leaf(JoinType::And, field, "notBetween", Value::Array(vec![start, end]))
    }

    /// `AND ( nested chain )`
    pub fn and_group(self, conditions: ConditionSet) -> Self {
        self.push(Condition::Group {
            conditions,
            join: JoinType::And,
        })
    }

    /// `OR ( nested chain )`
    pub fn or_group(self, conditions: ConditionSet) -> Self {
        self.push(Condition::Group {
            conditions,
            join: JoinType::Or,
        })
    }

    /// `AND expr`
    pub fn and_expr(self, expr: Expr) -> Self {
        self.push(Condition::Tree {
            expr,
            join: JoinType::And,
        })
    }

    /// `OR expr`
    pub fn or_expr(self, expr: Expr) -> Self {
        self.push(Condition::Tree {
            expr,
            join: JoinType::Or,
        })
    }
}

/// Explicit boolean expression tree.
///
/// `All` of nothing is true, `Any` of nothing is false.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare(Comparison),
    All(Vec<Expr>),
    Any(Vec<Expr>),
}

impl Expr {
    /// `field op value`
    pub fn cmp(field: impl Into<String>, op: impl Into<String>, value: Value) -> Self {
        Expr::Compare(Comparison::new(field, op, value))
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::cmp(field, "=", value)
    }

    /// `field like pattern`
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::cmp(field, "like", Value::String(pattern.into()))
    }

    /// `start <= field <= end`
    pub fn between(field: impl Into<String>, start: Value, end: Value) -> Self {
        Self::cmp(field, "between", Value::Array(vec![start, end]))
    }

    /// Conjunction
    pub fn all(children: impl IntoIterator<Item = Expr>) -> Self {
        Expr::All(children.into_iter().collect())
    }

    /// Disjunction
    pub fn any(children: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Any(children.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chain_keeps_insertion_order() {
        let set = ConditionSet::new()
            .and_where("age", ">", json!(20))
            .or_like("name", "Alice%");

        assert_eq!(set.len(), 2);
        assert_eq!(set.conditions()[0].join(), JoinType::And);
        assert_eq!(set.conditions()[1].join(), JoinType::Or);
    }

    #[test]
    fn test_between_stores_pair() {
        let set = ConditionSet::new().between("age", json!(20), json!(30));
        match &set.conditions()[0] {
            Condition::Leaf { comparison, .. } => {
                assert_eq!(comparison.operator, "between");
                assert_eq!(comparison.value, json!([20, 30]));
            }
            other => panic!("unexpected condition {:?}", other),
        }
    }

    #[test]
    fn test_builder_accepts_unknown_operator() {
        // Validation happens at execution time
        let set = ConditionSet::new().and_where("age", "~=", json!(1));
        assert_eq!(set.len(), 1);
    }
}
