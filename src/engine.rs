//! Filter engine
//!
//! Runs a full filter over in-memory records of one model:
//! where → order → slice → include → fields.
//!
//! Projection runs last so inclusion still sees the foreign keys.

use std::sync::Arc;

use serde_json::Value;

use crate::clause::{
    FieldsClauseTool, FilterClause, FilterResult, IncludeClauseTool, OrderClauseTool,
    SliceClauseTool, WhereClauseTool,
};
use crate::config::EngineConfig;
use crate::model::ModelDefinitions;
use crate::observability::{log_event, Event};
use crate::relations::RelationResolvers;

/// Filter engine over one metamodel and one resolver set
pub struct FilterEngine {
    fields: FieldsClauseTool,
    include: IncludeClauseTool,
    config: EngineConfig,
}

impl FilterEngine {
    /// Create an engine. Resolvers are fixed for the engine's lifetime.
    ///
    /// Installs the configured log level process-wide.
    pub fn new(models: Arc<dyn ModelDefinitions>, resolvers: RelationResolvers, config: EngineConfig) -> Self {
        config.apply_logging();
        Self {
            fields: FieldsClauseTool::new(Arc::clone(&models)),
            include: IncludeClauseTool::new(models, resolvers).with_max_depth(config.max_include_depth),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Applies `filter` to `records` of `model` and returns the result set.
    ///
    /// The input is never modified.
    pub async fn apply(
        &self,
        model: &str,
        records: &[Value],
        filter: Option<&FilterClause>,
    ) -> FilterResult<Vec<Value>> {
        let Some(filter) = filter else {
            return WhereClauseTool::filter(records, None);
        };

        let mut result = WhereClauseTool::filter(records, filter.where_clause.as_ref())?;
        let matched = result.len();

        OrderClauseTool::sort(&mut result, filter.order.as_deref())?;

        let mut result = SliceClauseTool::slice(&result, filter.skip, filter.limit);

        if filter.include.is_some() {
            self.include.include_to(&mut result, model, filter.include.as_ref()).await?;
        }

        let result = match self.fields.filter(&Value::Array(result), model, filter.fields.as_deref())? {
            Value::Array(items) => items,
            other => vec![other],
        };

        log_event(
            Event::FilterApplied,
            &[
                ("input", records.len().to_string().as_str()),
                ("matched", matched.to_string().as_str()),
                ("model", model),
                ("returned", result.len().to_string().as_str()),
            ],
        );
        Ok(result)
    }

    /// Parses a JSON filter and applies it. `null` applies no filter.
    pub async fn apply_json(&self, model: &str, records: &[Value], filter: &Value) -> FilterResult<Vec<Value>> {
        if filter.is_null() {
            return self.apply(model, records, None).await;
        }
        let filter = FilterClause::try_from(filter)?;
        self.apply(model, records, Some(&filter)).await
    }

    /// Validates a filter without running it
    pub fn validate(filter: &FilterClause) -> FilterResult<()> {
        if let Some(order) = &filter.order {
            OrderClauseTool::validate_order_clause(order)?;
        }
        if let Some(fields) = &filter.fields {
            FieldsClauseTool::validate_fields_clause(fields)?;
        }
        IncludeClauseTool::validate_include_clause(filter.include.as_ref())
    }
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine").field("config", &self.config).finish()
    }
}
