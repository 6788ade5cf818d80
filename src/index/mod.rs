//! Secondary index subsystem for jsonsql
//!
//! An index is derived from one table snapshot at one point in time:
//! - Built on demand, one field per index
//! - In memory only, never persisted
//! - Never refreshed automatically; callers rebuild after mutations
//! - Tagged with the table version it was built from so staleness is
//!   observable

mod errors;
mod manager;
mod secondary;

pub use errors::{IndexError, IndexResult};
pub use manager::IndexManager;
pub use secondary::SecondaryIndex;
