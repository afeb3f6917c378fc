//! Clause error types
//!
//! Error codes:
//! - FILTER_INVALID_ARGUMENT
//! - FILTER_INVALID_OPERATOR_VALUE
//! - FILTER_RESOLUTION_FAILED

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Stable error codes for clause failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterErrorCode {
    /// Wrong argument shape or type
    InvalidArgument,
    /// Operator payload does not fit the operator
    InvalidOperatorValue,
    /// A relation resolver failed
    ResolutionFailed,
}

impl FilterErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            FilterErrorCode::InvalidArgument => "FILTER_INVALID_ARGUMENT",
            FilterErrorCode::InvalidOperatorValue => "FILTER_INVALID_OPERATOR_VALUE",
            FilterErrorCode::ResolutionFailed => "FILTER_RESOLUTION_FAILED",
        }
    }
}

impl fmt::Display for FilterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by the clause tools
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Generic validation error with a rendered message
    #[error("{0}")]
    InvalidArgument(String),

    /// Operator clause payload mismatch
    #[error("The operator \"{operator}\" expects {expected}, but {value} was given.")]
    InvalidOperatorValue {
        operator: String,
        expected: String,
        value: String,
    },

    /// Failure reported by a relation resolver
    #[error("Unable to resolve the relation \"{relation}\": {message}")]
    Resolution { relation: String, message: String },
}

impl FilterError {
    /// Create a generic validation error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        FilterError::InvalidArgument(message.into())
    }

    /// Create an operator value error, rendering the offending value
    pub fn invalid_operator_value(
        operator: impl Into<String>,
        expected: impl Into<String>,
        value: &Value,
    ) -> Self {
        FilterError::InvalidOperatorValue {
            operator: operator.into(),
            expected: expected.into(),
            value: describe_value(value),
        }
    }

    /// Create a resolver failure
    pub fn resolution(relation: impl Into<String>, message: impl Into<String>) -> Self {
        FilterError::Resolution {
            relation: relation.into(),
            message: message.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> FilterErrorCode {
        match self {
            FilterError::InvalidArgument(_) => FilterErrorCode::InvalidArgument,
            FilterError::InvalidOperatorValue { .. } => FilterErrorCode::InvalidOperatorValue,
            FilterError::Resolution { .. } => FilterErrorCode::ResolutionFailed,
        }
    }

    /// Returns the rendered message
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Result type for clause operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Renders a value for error messages.
///
/// Strings are quoted, scalars printed as-is, containers by kind.
pub fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(items) if items.is_empty() => "Array(empty)".to_string(),
        Value::Array(items) => format!("Array({})", items.len()),
        Value::Object(_) => "Object".to_string(),
    }
}

/// Renders a possibly absent value for error messages
pub fn describe_optional(value: Option<&Value>) -> String {
    match value {
        Some(v) => describe_value(v),
        None => "undefined".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            FilterError::invalid_argument("x").code().code(),
            "FILTER_INVALID_ARGUMENT"
        );
        assert_eq!(
            FilterError::invalid_operator_value("inq", "an Array", &json!(1))
                .code()
                .code(),
            "FILTER_INVALID_OPERATOR_VALUE"
        );
        assert_eq!(
            FilterError::resolution("author", "boom").code(),
            FilterErrorCode::ResolutionFailed
        );
    }

    #[test]
    fn test_operator_value_display() {
        let err = FilterError::invalid_operator_value("between", "an Array of 2 elements", &json!([5]));
        let display = err.to_string();
        assert!(display.contains("\"between\""));
        assert!(display.contains("an Array of 2 elements"));
        assert!(display.contains("Array(1)"));
    }

    #[test]
    fn test_describe_value() {
        assert_eq!(describe_value(&json!("a")), "\"a\"");
        assert_eq!(describe_value(&json!(null)), "null");
        assert_eq!(describe_value(&json!({"a": 1})), "Object");
        assert_eq!(describe_value(&json!([])), "Array(empty)");
        assert_eq!(describe_optional(None), "undefined");
    }
}
