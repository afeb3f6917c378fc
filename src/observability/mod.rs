//! Observability for the clause engine
//!
//! Structured JSON line logging of typed events. Observability is read-only
//! and never fails the operation being observed.
//!
//! ```ignore
//! use clause_engine::observability::{log_event, Event};
//!
//! log_event(Event::IncludeDispatch, &[("relation", "author")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log an engine event.
///
/// Failures are warnings, everything else is trace.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    let severity = match event {
        Event::IncludeFailed => Severity::Warn,
        _ => Severity::Trace,
    };
    Logger::log(severity, event.as_str(), fields);
}
