//! Observable clause engine events

use std::fmt;

/// Events emitted while filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A relation resolution was dispatched
    IncludeDispatch,
    /// A relation resolution finished and was attached
    IncludeResolved,
    /// A relation resolution failed
    IncludeFailed,
    /// A full filter ran through the engine
    FilterApplied,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::IncludeDispatch => "INCLUDE_DISPATCH",
            Event::IncludeResolved => "INCLUDE_RESOLVED",
            Event::IncludeFailed => "INCLUDE_FAILED",
            Event::FilterApplied => "FILTER_APPLIED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
