//! Table selection façade for jsonsql
//!
//! `Database` owns a snapshot store; `Database::table` loads one table's
//! snapshot into a `TableSession`, which owns the working copy, the
//! session's indexes and a mutation version.
//!
//! # Usage
//!
//! ```ignore
//! let db = Database::open(&DbConfig::new("./data"))?;
//! let mut users = db.table("users")?;
//! users.insert(vec![record])?;
//!
//! let query = QueryDescriptor::new()
//!     .and_where("age", ">", json!(20))
//!     .order_by("age", SortDirection::Desc)
//!     .limit(2);
//! let rows = users.rows(&query)?;
//! ```
//!
//! # Limitations
//!
//! - Every mutation rewrites the whole snapshot immediately
//! - No transaction spans two calls; no table spans two files
//! - No locking: concurrent sessions on one table lose updates silently
//! - No schema: records in one table may have any fields

mod database;
mod files;
mod mutate;
mod table;

pub use database::Database;
pub use mutate::MergeSummary;
pub use table::TableSession;
