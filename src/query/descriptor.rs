//! Query descriptor
//!
//! An owned value describing one execution: the filter chain plus the
//! pipeline options. It is built step by step with consuming builder
//! calls and handed to `Pipeline::execute`; nothing is attached to a table
//! selection, so conditions never leak from one query into the next.

use serde_json::Value;

use crate::condition::{Comparison, ConditionSet, Expr};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Inner join against a second table.
///
/// Only inner joins exist: a left record with no partner is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// Table to join with, loaded fresh at execution time
    pub table: String,
    /// Field on the left (queried) table
    pub local_key: String,
    /// Field on the joined table
    pub foreign_key: String,
}

/// Output field selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    Fields(Vec<String>),
}

/// Accumulated configuration for one query execution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryDescriptor {
    pub(crate) conditions: ConditionSet,
    pub(crate) join: Option<JoinSpec>,
    pub(crate) group_by: Option<String>,
    pub(crate) order_by: Option<SortSpec>,
    pub(crate) offset: Option<usize>,
    pub(crate) limit: Option<usize>,
    pub(crate) distinct: Option<Vec<String>>,
    pub(crate) having: Vec<Comparison>,
    pub(crate) projection: Projection,
}

impl QueryDescriptor {
    /// Selects every field of every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing condition chain
    pub fn with_conditions(conditions: ConditionSet) -> Self {
        Self {
            conditions,
            ..Self::default()
        }
    }

    /// Restricts output to the listed fields
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Projection::Fields(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Outputs every field (the default)
    pub fn select_all(mut self) -> Self {
        self.projection = Projection::All;
        self
    }

    fn map_conditions(mut self, f: impl FnOnce(ConditionSet) -> ConditionSet) -> Self {
        self.conditions = f(std::mem::take(&mut self.conditions));
        self
    }

    /// `AND field op value`
    pub fn and_where(self, field: impl Into<String>, op: impl Into<String>, value: Value) -> Self {
        self.map_conditions(|c| c.and_where(field, op, value))
    }

    /// `OR field op value`
    pub fn or_where(self, field: impl Into<String>, op: impl Into<String>, value: Value) -> Self {
        self.map_conditions(|c| c.or_where(field, op, value))
    }

    /// `AND field like pattern`
    pub fn like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.map_conditions(|c| c.like(field, pattern))
    }

    /// `OR field like pattern`
    pub fn or_like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.map_conditions(|c| c.or_like(field, pattern))
    }

    /// `AND start <= field <= end`
    pub fn between(self, field: impl Into<String>, start: Value, end: Value) -> Self {
        self.map_conditions(|c| c.between(field, start, end))
    }

    /// `AND field outside [start, end]`
    pub fn not_between(self, field: impl Into<String>, start: Value, end: Value) -> Self {
        self.map_conditions(|c| c.not_between(field, start, end))
    }

    /// `AND ( nested chain )`
    pub fn and_group(self, group: ConditionSet) -> Self {
        self.map_conditions(|c| c.and_group(group))
    }

    /// `OR ( nested chain )`
    pub fn or_group(self, group: ConditionSet) -> Self {
        self.map_conditions(|c| c.or_group(group))
    }

    /// `AND expr`
    pub fn and_expr(self, expr: Expr) -> Self {
        self.map_conditions(|c| c.and_expr(expr))
    }

    /// `OR expr`
    pub fn or_expr(self, expr: Expr) -> Self {
        self.map_conditions(|c| c.or_expr(expr))
    }

    /// Inner join with another table on `local_key == foreign_key`
    pub fn join(
        mut self,
        table: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.join = Some(JoinSpec {
            table: table.into(),
            local_key: local_key.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    /// Partitions results by the value of `field`
    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    /// Stable sort by one field
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    /// Skips the first `offset` results
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Keeps at most `limit` results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Dedupes by the listed fields; an empty list dedupes whole records
    pub fn distinct<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.distinct = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Post-shaping filter; every having comparison must hold
    pub fn having(mut self, field: impl Into<String>, op: impl Into<String>, value: Value) -> Self {
        self.having.push(Comparison::new(field, op, value));
        self
    }

    /// The filter chain
    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn join_spec(&self) -> Option<&JoinSpec> {
        self.join.as_ref()
    }

    pub fn group_field(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.order_by.as_ref()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}
