//! Query pipeline subsystem for jsonsql
//!
//! A `QueryDescriptor` is built step by step and handed to
//! `Pipeline::execute`, which reads a table snapshot and produces a
//! `QueryOutput` without touching the snapshot.
//!
//! # Execution Flow (strict order)
//!
//! 1. Filter
//! 2. Join (inner only)
//! 3. Group by
//! 4. Order by
//! 5. Offset, then limit
//! 6. Distinct
//! 7. Having
//! 8. Projection
//!
//! # Limitations
//!
//! - Joins are inner joins; there are no left or outer joins
//! - Having filters shaped rows, not aggregates
//! - After grouping, stages 4-8 apply to each group separately

pub mod aggregate;
mod descriptor;
mod errors;
mod output;
mod pipeline;

pub use aggregate::ColumnStats;
pub use descriptor::{JoinSpec, Projection, QueryDescriptor, SortDirection, SortSpec};
pub use errors::{QueryError, QueryResult, Stage};
pub use output::{Group, QueryOutput};
pub use pipeline::{distinct, group_by, sort_records, Pipeline};

pub(crate) use errors::check_field;
