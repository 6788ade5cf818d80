//! Observability subsystem for jsonsql
//!
//! - Structured logging (one JSON object per line)
//! - Typed lifecycle events
//! - Begin/complete scopes around whole-snapshot writes and file transfers
//!
//! # Principles
//!
//! 1. Observability is read-only and never changes a result
//! 2. No async or background threads
//! 3. Logging failures are swallowed, never surfaced to callers
//!
//! # Usage
//!
//! ```ignore
//! use jsonsql::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::TableLoaded, &[("table", "users"), ("records", "3")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
