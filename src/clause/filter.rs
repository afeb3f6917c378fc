//! Filter clause: the composite of where, order, skip, limit, fields and
//! include. Every part is optional and parsed by its own tool.

use serde_json::Value;

use super::errors::{describe_value, FilterError, FilterResult};
use super::fields::{FieldsClause, FieldsClauseTool};
use super::include::{IncludeClause, IncludeClauseTool};
use super::order::{OrderClause, OrderClauseTool};
use super::slice::SliceClauseTool;
use super::where_clause::{WhereClause, WhereClauseTool};

/// A filter description
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterClause {
    pub where_clause: Option<WhereClause>,
    pub order: Option<OrderClause>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub fields: Option<FieldsClause>,
    pub include: Option<IncludeClause>,
}

impl FilterClause {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_where(mut self, clause: WhereClause) -> Self {
        self.where_clause = Some(clause);
        self
    }

    pub fn with_order<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = Some(entries.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_include(mut self, include: impl Into<IncludeClause>) -> Self {
        self.include = Some(include.into());
        self
    }

    /// True when no part is set
    pub fn is_empty(&self) -> bool {
        self.where_clause.is_none()
            && self.order.is_none()
            && self.skip.is_none()
            && self.limit.is_none()
            && self.fields.is_none()
            && self.include.is_none()
    }
}

impl TryFrom<&Value> for FilterClause {
    type Error = FilterError;

    /// Parses a JSON filter object; unknown keys are ignored
    fn try_from(value: &Value) -> FilterResult<Self> {
        let map = value.as_object().ok_or_else(|| {
            FilterError::invalid_argument(format!(
                "The provided option \"filter\" should be an Object, but {} was given.",
                describe_value(value)
            ))
        })?;

        let present = |key: &str| map.get(key).filter(|v| !v.is_null());
        let mut filter = FilterClause::new();
        if let Some(v) = present("where") {
            filter.where_clause = Some(WhereClauseTool::parse_where_clause(v)?);
        }
        if let Some(v) = present("order") {
            filter.order = Some(OrderClauseTool::parse_order_clause(v)?);
        }
        if let Some(v) = present("skip") {
            filter.skip = SliceClauseTool::parse_skip_clause(v)?;
        }
        if let Some(v) = present("limit") {
            filter.limit = SliceClauseTool::parse_limit_clause(v)?;
        }
        if let Some(v) = present("fields") {
            filter.fields = Some(FieldsClauseTool::parse_fields_clause(v)?);
        }
        if let Some(v) = present("include") {
            filter.include = IncludeClauseTool::parse_include_clause(v)?;
        }
        Ok(filter)
    }
}
