//! Operator evaluation
//!
//! A comparison algebra with loose, left-driven coercion plus one test per
//! operator. `compare` is intentionally asymmetric: the left operand decides
//! how the right one is coerced.
//!
//! # Dispatch order
//!
//! `test_all` tries the operator groups in a fixed order and returns the first
//! defined result:
//!
//! eq/neq → gt/gte/lt/lte → inq → nin → between → exists → like → nlike →
//! ilike → nilike → regexp

use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Value};

use super::errors::{describe_value, FilterError, FilterResult};
use super::patterns::{like_to_regexp, string_to_regexp};
use super::value::{is_digit_string, to_number};

/// Operator keys recognised inside an operator clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Inq,
    Nin,
    Between,
    Exists,
    Like,
    Nlike,
    Ilike,
    Nilike,
    Regexp,
}

impl Operator {
    /// All operators, in evaluation order
    pub const ALL: [Operator; 15] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Inq,
        Operator::Nin,
        Operator::Between,
        Operator::Exists,
        Operator::Like,
        Operator::Nlike,
        Operator::Ilike,
        Operator::Nilike,
        Operator::Regexp,
    ];

    /// Get the operator key
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Inq => "inq",
            Operator::Nin => "nin",
            Operator::Between => "between",
            Operator::Exists => "exists",
            Operator::Like => "like",
            Operator::Nlike => "nlike",
            Operator::Ilike => "ilike",
            Operator::Nilike => "nilike",
            Operator::Regexp => "regexp",
        }
    }

    /// Look up an operator by key
    pub fn from_key(key: &str) -> Option<Operator> {
        Operator::ALL.iter().copied().find(|op| op.as_str() == key)
    }
}

/// Operand of a pattern operator: plain value or precompiled pattern
#[derive(Debug, Clone)]
pub enum Operand {
    Value(Value),
    Pattern(Regex),
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operand::Value(a), Operand::Value(b)) => a == b,
            (Operand::Pattern(a), Operand::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<Regex> for Operand {
    fn from(pattern: Regex) -> Self {
        Operand::Pattern(pattern)
    }
}

/// A mapping of operator keys to their payloads.
///
/// `Some(Value::Null)` is a present key with a null payload; `None` is an
/// absent key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorClause {
    pub eq: Option<Value>,
    pub neq: Option<Value>,
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
    pub inq: Option<Value>,
    pub nin: Option<Value>,
    pub between: Option<Value>,
    pub exists: Option<Value>,
    pub like: Option<Operand>,
    pub nlike: Option<Value>,
    pub ilike: Option<Operand>,
    pub nilike: Option<Value>,
    pub regexp: Option<Operand>,
    pub flags: Option<Value>,
}

impl OperatorClause {
    /// Create an empty clause
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an operator payload, replacing any previous one
    pub fn with(mut self, operator: Operator, operand: impl Into<Operand>) -> Self {
        let operand = operand.into();
        let plain = |operand: Operand| match operand {
            Operand::Value(v) => v,
            Operand::Pattern(re) => Value::String(re.as_str().to_string()),
        };
        match operator {
            Operator::Eq => self.eq = Some(plain(operand)),
            Operator::Neq => self.neq = Some(plain(operand)),
            Operator::Gt => self.gt = Some(plain(operand)),
            Operator::Gte => self.gte = Some(plain(operand)),
            Operator::Lt => self.lt = Some(plain(operand)),
            Operator::Lte => self.lte = Some(plain(operand)),
            Operator::Inq => self.inq = Some(plain(operand)),
            Operator::Nin => self.nin = Some(plain(operand)),
            Operator::Between => self.between = Some(plain(operand)),
            Operator::Exists => self.exists = Some(plain(operand)),
            Operator::Like => self.like = Some(operand),
            Operator::Nlike => self.nlike = Some(plain(operand)),
            Operator::Ilike => self.ilike = Some(operand),
            Operator::Nilike => self.nilike = Some(plain(operand)),
            Operator::Regexp => self.regexp = Some(operand),
        }
        self
    }

    /// Set the `regexp` flags
    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = Some(Value::String(flags.into()));
        self
    }

    /// Builds a clause from a JSON mapping.
    ///
    /// Returns `None` unless the value is an object holding at least one
    /// operator key. Unknown keys are ignored.
    pub fn from_object(map: &Map<String, Value>) -> Option<Self> {
        let mut clause = OperatorClause::new();
        let mut found = false;
        for (key, value) in map {
            if let Some(op) = Operator::from_key(key) {
                clause = clause.with(op, value.clone());
                found = true;
            }
        }
        if !found {
            return None;
        }
        if let Some(flags) = map.get("flags") {
            clause.flags = Some(flags.clone());
        }
        Some(clause)
    }

    /// Returns true if the clause carries a `neq` payload
    pub fn has_neq(&self) -> bool {
        self.neq.is_some()
    }
}

/// Stateless operator evaluator
pub struct OperatorClauseTool;

impl OperatorClauseTool {
    /// Compares two possibly absent values.
    ///
    /// `None` means incomparable. Absent and null are loosely equal to each
    /// other and incomparable with anything else.
    pub fn compare(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
        let a = a.filter(|v| !v.is_null());
        let b = b.filter(|v| !v.is_null());
        let (a, b) = match (a, b) {
            (None, None) => return Some(Ordering::Equal),
            (Some(a), Some(b)) => (a, b),
            _ => return None,
        };

        match a {
            Value::Number(n) => Self::compare_number(n.as_f64()?, a, b),
            Value::String(s) if is_digit_string(s) => {
                let n = s.parse::<f64>().ok()?;
                Self::compare_number(n, a, b)
            }
            Value::String(s) => match b {
                Value::String(t) => Some(s.as_str().cmp(t.as_str())),
                Value::Number(_) | Value::Bool(_) => {
                    let left = to_number(a)?;
                    let right = to_number(b)?;
                    left.partial_cmp(&right)
                }
                _ => None,
            },
            Value::Bool(flag) => {
                let left = if *flag { 1.0 } else { 0.0 };
                let right = to_number(b)?;
                left.partial_cmp(&right)
            }
            _ => (a == b).then_some(Ordering::Equal),
        }
    }

    fn compare_number(left: f64, raw_left: &Value, right: &Value) -> Option<Ordering> {
        match right {
            Value::Number(_) | Value::String(_) | Value::Bool(_) => {
                if raw_left == right {
                    return Some(Ordering::Equal);
                }
                left.partial_cmp(&to_number(right)?)
            }
            _ => None,
        }
    }

    /// Loose equality: comparable and equal
    pub fn loose_eq(a: Option<&Value>, b: Option<&Value>) -> bool {
        Self::compare(a, b) == Some(Ordering::Equal)
    }

    /// Runs the first applicable operator test.
    ///
    /// Returns `Ok(None)` when the clause holds no operator.
    pub fn test_all(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let tests: [fn(&OperatorClause, Option<&Value>) -> FilterResult<Option<bool>>; 11] = [
            Self::test_eq_neq,
            Self::test_gt_lt,
            Self::test_inq,
            Self::test_nin,
            Self::test_between,
            Self::test_exists,
            Self::test_like,
            Self::test_nlike,
            Self::test_ilike,
            Self::test_nilike,
            Self::test_regexp,
        ];
        for test in tests {
            if let Some(result) = test(clause, value)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// `eq` / `neq`
    pub fn test_eq_neq(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        if let Some(expected) = &clause.eq {
            return Ok(Some(Self::loose_eq(Some(expected), value)));
        }
        if let Some(expected) = &clause.neq {
            return Ok(Some(!Self::loose_eq(Some(expected), value)));
        }
        Ok(None)
    }

    /// `gt` / `gte` / `lt` / `lte`
    pub fn test_gt_lt(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        if let Some(threshold) = &clause.gt {
            let ord = Self::compare(value, Some(threshold));
            return Ok(Some(ord == Some(Ordering::Greater)));
        }
        if let Some(threshold) = &clause.gte {
            let ord = Self::compare(value, Some(threshold));
            return Ok(Some(matches!(ord, Some(Ordering::Greater | Ordering::Equal))));
        }
        if let Some(threshold) = &clause.lt {
            let ord = Self::compare(value, Some(threshold));
            return Ok(Some(ord == Some(Ordering::Less)));
        }
        if let Some(threshold) = &clause.lte {
            let ord = Self::compare(value, Some(threshold));
            return Ok(Some(matches!(ord, Some(Ordering::Less | Ordering::Equal))));
        }
        Ok(None)
    }

    /// `inq`
    pub fn test_inq(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let Some(operand) = &clause.inq else {
            return Ok(None);
        };
        let candidates = operand.as_array().ok_or_else(|| {
            FilterError::invalid_operator_value("inq", "an Array of possible values", operand)
        })?;
        Ok(Some(
            candidates.iter().any(|c| Self::loose_eq(Some(c), value)),
        ))
    }

    /// `nin`
    pub fn test_nin(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let Some(operand) = &clause.nin else {
            return Ok(None);
        };
        let candidates = operand.as_array().ok_or_else(|| {
            FilterError::invalid_operator_value("nin", "an Array of possible values", operand)
        })?;
        Ok(Some(
            !candidates.iter().any(|c| Self::loose_eq(Some(c), value)),
        ))
    }

    /// `between` as `gte low` and `lte high`
    pub fn test_between(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let Some(operand) = &clause.between else {
            return Ok(None);
        };
        let bounds = match operand.as_array() {
            Some(bounds) if bounds.len() == 2 => bounds,
            _ => {
                return Err(FilterError::invalid_operator_value(
                    "between",
                    "an Array of 2 elements",
                    operand,
                ))
            }
        };
        let low = OperatorClause::new().with(Operator::Gte, bounds[0].clone());
        let high = OperatorClause::new().with(Operator::Lte, bounds[1].clone());
        let above = Self::test_gt_lt(&low, value)?.unwrap_or(false);
        let below = Self::test_gt_lt(&high, value)?.unwrap_or(false);
        Ok(Some(above && below))
    }

    /// `exists`: null counts as present
    pub fn test_exists(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let Some(operand) = &clause.exists else {
            return Ok(None);
        };
        let expected = operand.as_bool().ok_or_else(|| {
            FilterError::invalid_operator_value("exists", "a Boolean", operand)
        })?;
        Ok(Some(value.is_some() == expected))
    }

    /// `like`, case-sensitive
    pub fn test_like(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let Some(operand) = &clause.like else {
            return Ok(None);
        };
        let pattern = Self::like_pattern("like", operand, false)?;
        Ok(Some(Self::is_match(&pattern, value).unwrap_or(false)))
    }

    /// `nlike`, case-sensitive
    pub fn test_nlike(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let Some(operand) = &clause.nlike else {
            return Ok(None);
        };
        let pattern = Self::like_string("nlike", operand, false)?;
        Ok(Some(!Self::is_match(&pattern, value).unwrap_or(false)))
    }

    /// `ilike`, case-insensitive
    pub fn test_ilike(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let Some(operand) = &clause.ilike else {
            return Ok(None);
        };
        let pattern = Self::like_pattern("ilike", operand, true)?;
        Ok(Some(Self::is_match(&pattern, value).unwrap_or(false)))
    }

    /// `nilike`, case-insensitive
    pub fn test_nilike(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let Some(operand) = &clause.nilike else {
            return Ok(None);
        };
        let pattern = Self::like_string("nilike", operand, true)?;
        Ok(Some(!Self::is_match(&pattern, value).unwrap_or(false)))
    }

    /// `regexp` with optional `flags`; non-string values never match
    pub fn test_regexp(clause: &OperatorClause, value: Option<&Value>) -> FilterResult<Option<bool>> {
        let Some(operand) = &clause.regexp else {
            return Ok(None);
        };
        let Some(text) = value.and_then(Value::as_str) else {
            return Ok(Some(false));
        };

        let flags = match &clause.flags {
            None | Some(Value::Null) => None,
            Some(Value::String(flags)) => Some(flags.as_str()),
            Some(other) => {
                return Err(FilterError::invalid_argument(format!(
                    "RegExp flags should be a String, but {} was given.",
                    describe_value(other)
                )))
            }
        };

        let pattern = match operand {
            Operand::Value(Value::String(source)) => string_to_regexp(source, flags)?,
            Operand::Pattern(re) if flags.is_some() => string_to_regexp(re.as_str(), flags)?,
            Operand::Pattern(re) => re.clone(),
            Operand::Value(other) => {
                return Err(FilterError::invalid_operator_value(
                    "regexp",
                    "a String or RegExp",
                    other,
                ))
            }
        };
        Ok(Some(pattern.is_match(text)))
    }

    fn like_pattern(operator: &str, operand: &Operand, case_insensitive: bool) -> FilterResult<Regex> {
        match operand {
            Operand::Pattern(re) => Ok(re.clone()),
            Operand::Value(Value::String(source)) => like_to_regexp(source, case_insensitive),
            Operand::Value(other) => Err(FilterError::invalid_operator_value(
                operator,
                "a String or RegExp",
                other,
            )),
        }
    }

    fn like_string(operator: &str, operand: &Value, case_insensitive: bool) -> FilterResult<Regex> {
        match operand {
            Value::String(source) => like_to_regexp(source, case_insensitive),
            other => Err(FilterError::invalid_operator_value(operator, "a String", other)),
        }
    }

    /// `None` when the value is not a string
    fn is_match(pattern: &Regex, value: Option<&Value>) -> Option<bool> {
        value.and_then(Value::as_str).map(|text| pattern.is_match(text))
    }
}
