//! Field projection
//!
//! Keeps only the listed fields of one record or a sequence of records. The
//! model's primary key is always kept.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::errors::{describe_value, FilterError, FilterResult};
use crate::model::ModelDefinitions;

/// Ordered list of field names
pub type FieldsClause = Vec<String>;

/// Fields clause tool
#[derive(Clone)]
pub struct FieldsClauseTool {
    models: Arc<dyn ModelDefinitions>,
}

impl FieldsClauseTool {
    /// Create a tool backed by the given metamodel
    pub fn new(models: Arc<dyn ModelDefinitions>) -> Self {
        Self { models }
    }

    /// Projects a record or an array of records, keeping the input shape.
    /// Kept keys stay in the record's own order.
    ///
    /// Without a clause (or with an empty one) the input is returned as is.
    pub fn filter(&self, input: &Value, model: &str, clause: Option<&[String]>) -> FilterResult<Value> {
        if model.is_empty() {
            return Err(FilterError::invalid_argument(
                "The second argument of FieldsClauseTool::filter should be a non-empty String, but \"\" was given.",
            ));
        }
        let records: Vec<&Value> = match input {
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        };
        if let Some(bad) = records.iter().find(|r| !r.is_object()) {
            return Err(FilterError::invalid_argument(format!(
                "The first argument of FieldsClauseTool::filter should be an Object or an Array of Object, but {} was given.",
                describe_value(bad)
            )));
        }

        let fields = match clause {
            Some(fields) if !fields.is_empty() => fields,
            _ => return Ok(input.clone()),
        };
        Self::validate_fields_clause(fields)?;

        let primary_key = self.models.primary_key_property_name(model)?;
        let mut keep: Vec<&str> = fields.iter().map(String::as_str).collect();
        if !keep.contains(&primary_key.as_str()) {
            keep.push(primary_key.as_str());
        }

        let project = |record: &Value| -> Value {
            let mut projected = Map::new();
            if let Some(source) = record.as_object() {
                for (key, value) in source {
                    if keep.contains(&key.as_str()) {
                        projected.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(projected)
        };

        Ok(match input {
            Value::Array(items) => Value::Array(items.iter().map(project).collect()),
            single => project(single),
        })
    }

    /// Field names must be non-empty
    pub fn validate_fields_clause(fields: &[String]) -> FilterResult<()> {
        if fields.iter().any(String::is_empty) {
            return Err(FilterError::invalid_argument(
                "The provided option \"fields\" should be a non-empty String or an Array of non-empty String, but \"\" was given.",
            ));
        }
        Ok(())
    }

    /// Parses a JSON fields clause: a string or an array of strings
    pub fn parse_fields_clause(value: &Value) -> FilterResult<FieldsClause> {
        let invalid = |v: &Value| {
            FilterError::invalid_argument(format!(
                "The provided option \"fields\" should be a non-empty String or an Array of non-empty String, but {} was given.",
                describe_value(v)
            ))
        };
        let fields = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(|| invalid(item)))
                .collect::<FilterResult<Vec<_>>>()?,
            other => return Err(invalid(other)),
        };
        Self::validate_fields_clause(&fields)?;
        Ok(fields)
    }
}
