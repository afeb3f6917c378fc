//! Order sorting
//!
//! Entries look like `"path"`, `"path ASC"` or `"path DESC"` (suffix is
//! case-insensitive, default ascending). Keys are compared left to right and
//! the first non-tie decides.
//!
//! A value absent on one side only is the smaller one before the direction is
//! applied, so it sorts first ascending and last descending.

use std::cmp::Ordering;

use serde_json::Value;

use super::errors::{describe_value, FilterError, FilterResult};
use super::value::{get_value_by_path, to_number};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A parsed order entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: String,
    pub direction: SortDirection,
}

impl SortKey {
    /// Parses `"path [ASC|DESC]"`
    pub fn parse(entry: &str) -> Self {
        let trimmed = entry.trim();
        if let Some((path, suffix)) = trimmed.rsplit_once(char::is_whitespace) {
            let direction = if suffix.eq_ignore_ascii_case("desc") {
                Some(SortDirection::Desc)
            } else if suffix.eq_ignore_ascii_case("asc") {
                Some(SortDirection::Asc)
            } else {
                None
            };
            if let Some(direction) = direction {
                return Self {
                    path: path.trim_end().to_string(),
                    direction,
                };
            }
        }
        Self {
            path: trimmed.to_string(),
            direction: SortDirection::Asc,
        }
    }
}

/// Ordered list of order entries
pub type OrderClause = Vec<String>;

/// Order clause tool
pub struct OrderClauseTool;

impl OrderClauseTool {
    /// Sorts the records in place.
    ///
    /// Prior ordering is not preserved beyond what the keys dictate (the sort
    /// is stable). No-op without a clause.
    pub fn sort(records: &mut [Value], clause: Option<&[String]>) -> FilterResult<()> {
        let Some(entries) = clause else {
            return Ok(());
        };
        Self::validate_order_clause(entries)?;
        let keys: Vec<SortKey> = entries.iter().map(|e| SortKey::parse(e)).collect();
        if keys.is_empty() {
            return Ok(());
        }

        records.sort_by(|a, b| Self::compare_records(a, b, &keys));
        Ok(())
    }

    fn compare_records(a: &Value, b: &Value, keys: &[SortKey]) -> Ordering {
        for key in keys {
            let a_val = get_value_by_path(a, &key.path);
            let b_val = get_value_by_path(b, &key.path);
            let ordering = Self::compare_values(a_val, b_val);
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => Self::relational(a, b),
        }
    }

    /// Relational ordering that stays total.
    ///
    /// Values with a numeric reading (null as 0, booleans, numbers, numeric
    /// strings) compare numerically and come first, then the remaining strings
    /// lexicographically, then arrays, then objects. Arrays tie with arrays and
    /// objects with objects.
    fn relational(a: &Value, b: &Value) -> Ordering {
        match (Self::numeric(a), Self::numeric(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => match (a, b) {
                (Value::String(x), Value::String(y)) => x.as_str().cmp(y.as_str()),
                _ => Self::rank(a).cmp(&Self::rank(b)),
            },
        }
    }

    fn numeric(value: &Value) -> Option<f64> {
        match value {
            Value::Null => Some(0.0),
            // -0.0 would sort below 0 under total_cmp
            other => to_number(other).map(|n| if n == 0.0 { 0.0 } else { n }),
        }
    }

    /// Rank of a value without a numeric reading
    fn rank(value: &Value) -> u8 {
        match value {
            Value::String(_) => 1,
            Value::Array(_) => 2,
            _ => 3,
        }
    }

    /// Entries must be non-empty strings
    pub fn validate_order_clause(entries: &[String]) -> FilterResult<()> {
        if let Some(bad) = entries.iter().find(|e| e.trim().is_empty()) {
            return Err(FilterError::invalid_argument(format!(
                "The provided option \"order\" should be a non-empty String or an Array of non-empty String, but \"{}\" was given.",
                bad
            )));
        }
        Ok(())
    }

    /// Parses a JSON order clause: a string or an array of strings
    pub fn parse_order_clause(value: &Value) -> FilterResult<OrderClause> {
        let invalid = |v: &Value| {
            FilterError::invalid_argument(format!(
                "The provided option \"order\" should be a non-empty String or an Array of non-empty String, but {} was given.",
                describe_value(v)
            ))
        };
        let entries = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(|| invalid(item)))
                .collect::<FilterResult<Vec<_>>>()?,
            other => return Err(invalid(other)),
        };
        Self::validate_order_clause(&entries)?;
        Ok(entries)
    }
}
