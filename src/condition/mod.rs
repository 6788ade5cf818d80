//! Condition evaluator for jsonsql
//!
//! Builds and evaluates record predicates.
//!
//! # Semantics
//!
//! - A chain folds left-to-right from `true`; each entry's join type says
//!   how it combines with everything before it
//! - Groups fold their own chain, then join the outer chain as one value
//! - A comparison against an absent field is false
//! - Equality and ordering follow the configured `EqualityPolicy`

mod ast;
mod compare;
mod filter;
mod glob;

pub use ast::{Comparison, Condition, ConditionSet, Expr, JoinType};
pub use compare::{sort_order, EqualityPolicy};
pub(crate) use compare::truthy;
pub use filter::{matches, Filter, Operator, Predicate};
pub use glob::GlobPattern;
