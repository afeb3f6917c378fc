//! Skip/limit pagination.

use serde_json::Value;

use super::errors::{describe_value, FilterError, FilterResult};

/// Slice clause tool
pub struct SliceClauseTool;

impl SliceClauseTool {
    /// Returns `records[skip .. skip + limit)`.
    ///
    /// A missing or zero `limit` means "everything after `skip`".
    pub fn slice<T: Clone>(records: &[T], skip: Option<usize>, limit: Option<usize>) -> Vec<T> {
        let start = skip.unwrap_or(0).min(records.len());
        let end = match limit {
            Some(limit) if limit > 0 => start.saturating_add(limit).min(records.len()),
            _ => records.len(),
        };
        records[start..end].to_vec()
    }

    /// Slices a JSON sequence, rejecting anything that is not an array
    pub fn slice_value(records: &Value, skip: Option<usize>, limit: Option<usize>) -> FilterResult<Vec<Value>> {
        let items = records.as_array().ok_or_else(|| {
            FilterError::invalid_argument(format!(
                "The first argument of SliceClauseTool::slice should be an Array, but {} was given.",
                describe_value(records)
            ))
        })?;
        Ok(Self::slice(items, skip, limit))
    }

    /// Parses a JSON `skip` value
    pub fn parse_skip_clause(value: &Value) -> FilterResult<Option<usize>> {
        Self::parse_count("skip", value)
    }

    /// Parses a JSON `limit` value
    pub fn parse_limit_clause(value: &Value) -> FilterResult<Option<usize>> {
        Self::parse_count("limit", value)
    }

    fn parse_count(option: &str, value: &Value) -> FilterResult<Option<usize>> {
        let invalid = || {
            FilterError::invalid_argument(format!(
                "The provided option \"{}\" should be a non-negative Number, but {} was given.",
                option,
                describe_value(value)
            ))
        };
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => {
                if let Some(count) = n.as_u64() {
                    return usize::try_from(count).map(Some).map_err(|_| invalid());
                }
                match n.as_f64() {
                    // Fractional counts truncate toward zero
                    Some(f) if f >= 0.0 && f.is_finite() => Ok(Some(f.trunc() as usize)),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }
}
