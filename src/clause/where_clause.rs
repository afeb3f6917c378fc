//! Where matching
//!
//! A where clause is either a predicate function or a list of conditions
//! joined with AND. Conditions are `and`/`or` groups of nested clauses or a
//! field path paired with a matcher.
//!
//! Sequence-valued fields use array semantics: a `neq` operator clause must
//! hold for every element (an empty sequence matches), any other matcher needs
//! at least one matching element.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

use super::errors::{describe_value, FilterError, FilterResult};
use super::operators::{OperatorClause, OperatorClauseTool};
use super::value::get_value_by_path;

/// Record predicate supplied by the caller
pub type WherePredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// How a single field is matched
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches absent or null
    Null,
    /// Matches strings accepted by the pattern
    Pattern(Regex),
    /// Defers to the operator evaluator
    Operators(OperatorClause),
    /// Loose equality
    Value(Value),
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Matcher::Null, Matcher::Null) => true,
            (Matcher::Pattern(a), Matcher::Pattern(b)) => a.as_str() == b.as_str(),
            (Matcher::Operators(a), Matcher::Operators(b)) => a == b,
            (Matcher::Value(a), Matcher::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Value> for Matcher {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Matcher::Null,
            Value::Object(map) => match OperatorClause::from_object(&map) {
                Some(clause) => Matcher::Operators(clause),
                None => Matcher::Value(Value::Object(map)),
            },
            other => Matcher::Value(other),
        }
    }
}

impl From<OperatorClause> for Matcher {
    fn from(clause: OperatorClause) -> Self {
        Matcher::Operators(clause)
    }
}

impl From<Regex> for Matcher {
    fn from(pattern: Regex) -> Self {
        Matcher::Pattern(pattern)
    }
}

/// One entry of a mapping-form where clause
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Vec<WhereClause>),
    Or(Vec<WhereClause>),
    Field { path: String, matcher: Matcher },
}

/// A where clause
#[derive(Clone)]
pub enum WhereClause {
    Predicate(WherePredicate),
    Conditions(Vec<Condition>),
}

impl fmt::Debug for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhereClause::Predicate(_) => f.write_str("Predicate(<fn>)"),
            WhereClause::Conditions(conditions) => {
                f.debug_tuple("Conditions").field(conditions).finish()
            }
        }
    }
}

impl PartialEq for WhereClause {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (WhereClause::Predicate(a), WhereClause::Predicate(b)) => Arc::ptr_eq(a, b),
            (WhereClause::Conditions(a), WhereClause::Conditions(b)) => a == b,
            _ => false,
        }
    }
}

impl WhereClause {
    /// An empty clause, matching every record
    pub fn new() -> Self {
        WhereClause::Conditions(Vec::new())
    }

    /// Wrap a predicate function
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        WhereClause::Predicate(Arc::new(f))
    }

    /// Add a field condition (builder style)
    pub fn field(self, path: impl Into<String>, matcher: impl Into<Matcher>) -> Self {
        self.push(Condition::Field {
            path: path.into(),
            matcher: matcher.into(),
        })
    }

    /// Add an `and` group
    pub fn and(self, clauses: Vec<WhereClause>) -> Self {
        self.push(Condition::And(clauses))
    }

    /// Add an `or` group
    pub fn or(self, clauses: Vec<WhereClause>) -> Self {
        self.push(Condition::Or(clauses))
    }

    fn push(self, condition: Condition) -> Self {
        match self {
            WhereClause::Conditions(mut conditions) => {
                conditions.push(condition);
                WhereClause::Conditions(conditions)
            }
            // A predicate cannot carry conditions, combine both
            predicate @ WhereClause::Predicate(_) => {
                WhereClause::Conditions(vec![Condition::And(vec![predicate]), condition])
            }
        }
    }

    /// Returns true if the clause has no effect
    pub fn is_empty(&self) -> bool {
        matches!(self, WhereClause::Conditions(c) if c.is_empty())
    }
}

impl Default for WhereClause {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<&Value> for WhereClause {
    type Error = FilterError;

    fn try_from(value: &Value) -> FilterResult<Self> {
        WhereClauseTool::parse_where_clause(value)
    }
}

/// Where clause tool
pub struct WhereClauseTool;

impl WhereClauseTool {
    /// Returns the records matching the clause, in input order.
    ///
    /// Every element must be a record (JSON object).
    pub fn filter(records: &[Value], clause: Option<&WhereClause>) -> FilterResult<Vec<Value>> {
        if let Some(bad) = records.iter().find(|r| !r.is_object()) {
            return Err(FilterError::invalid_argument(format!(
                "The first argument of WhereClauseTool::filter should be an Array of Object, but {} was given.",
                describe_value(bad)
            )));
        }
        let Some(clause) = clause else {
            return Ok(records.to_vec());
        };

        let predicate = Self::create_filter(clause);
        let mut matched = Vec::new();
        for record in records {
            if predicate(record)? {
                matched.push(record.clone());
            }
        }
        Ok(matched)
    }

    /// Builds a reusable record predicate
    pub fn create_filter(clause: &WhereClause) -> impl Fn(&Value) -> FilterResult<bool> + '_ {
        move |record| Self::test(clause, record)
    }

    /// Tests a single record against the clause
    pub fn test(clause: &WhereClause, record: &Value) -> FilterResult<bool> {
        match clause {
            WhereClause::Predicate(f) => Ok(f(record)),
            WhereClause::Conditions(conditions) => {
                for condition in conditions {
                    if !Self::test_condition(condition, record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn test_condition(condition: &Condition, record: &Value) -> FilterResult<bool> {
        match condition {
            Condition::And(clauses) => {
                for clause in clauses {
                    if !Self::test(clause, record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Or(clauses) => {
                for clause in clauses {
                    if Self::test(clause, record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Field { path, matcher } => {
                let value = get_value_by_path(record, path);
                match value {
                    Some(Value::Array(items)) => {
                        let negated = matches!(matcher, Matcher::Operators(c) if c.has_neq());
                        if negated {
                            for item in items {
                                if !Self::test_matcher(matcher, Some(item))? {
                                    return Ok(false);
                                }
                            }
                            Ok(true)
                        } else {
                            for item in items {
                                if Self::test_matcher(matcher, Some(item))? {
                                    return Ok(true);
                                }
                            }
                            Ok(false)
                        }
                    }
                    _ => Self::test_matcher(matcher, value),
                }
            }
        }
    }

    fn test_matcher(matcher: &Matcher, value: Option<&Value>) -> FilterResult<bool> {
        match matcher {
            Matcher::Null => Ok(value.map_or(true, Value::is_null)),
            Matcher::Pattern(pattern) => Ok(value
                .and_then(Value::as_str)
                .is_some_and(|text| pattern.is_match(text))),
            Matcher::Operators(clause) => match OperatorClauseTool::test_all(clause, value)? {
                Some(result) => Ok(result),
                None => Ok(false),
            },
            Matcher::Value(expected) => Ok(OperatorClauseTool::loose_eq(Some(expected), value)),
        }
    }

    /// Parses a JSON where clause.
    ///
    /// `and`/`or` must hold arrays of objects; any other key is a field path.
    pub fn parse_where_clause(value: &Value) -> FilterResult<WhereClause> {
        let map = value.as_object().ok_or_else(|| {
            FilterError::invalid_argument(format!(
                "The provided option \"where\" should be an Object, but {} was given.",
                describe_value(value)
            ))
        })?;
        Self::parse_map(map)
    }

    fn parse_map(map: &Map<String, Value>) -> FilterResult<WhereClause> {
        let mut conditions = Vec::with_capacity(map.len());
        for (key, value) in map {
            let condition = match key.as_str() {
                "and" => Condition::And(Self::parse_group("and", value)?),
                "or" => Condition::Or(Self::parse_group("or", value)?),
                path => Condition::Field {
                    path: path.to_string(),
                    matcher: Matcher::from(value.clone()),
                },
            };
            conditions.push(condition);
        }
        Ok(WhereClause::Conditions(conditions))
    }

    fn parse_group(key: &str, value: &Value) -> FilterResult<Vec<WhereClause>> {
        let items = value.as_array().ok_or_else(|| {
            FilterError::invalid_argument(format!(
                "The provided option \"{}\" should be an Array, but {} was given.",
                key,
                describe_value(value)
            ))
        })?;
        items.iter().map(Self::parse_where_clause).collect()
    }
}
