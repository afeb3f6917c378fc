//! Model definition lookups
//!
//! The clause tools only read from the metamodel: primary key names for field
//! projection and relation definitions for inclusion.

use std::collections::HashMap;

use crate::clause::{FilterError, FilterResult};

use super::types::{ModelDefinition, RelationDefinition};

/// Default primary key property
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Read-only metamodel queries
pub trait ModelDefinitions: Send + Sync {
    /// Returns the primary key property of a model
    fn primary_key_property_name(&self, model: &str) -> FilterResult<String>;

    /// Returns a relation definition of a model
    fn relation_definition(&self, model: &str, relation: &str) -> FilterResult<RelationDefinition>;
}

/// In-memory model registry
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: HashMap<String, ModelDefinition>,
    default_primary_key: String,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_default_primary_key(DEFAULT_PRIMARY_KEY)
    }

    /// Create an empty registry with a custom default primary key
    pub fn with_default_primary_key(primary_key: impl Into<String>) -> Self {
        Self {
            models: HashMap::new(),
            default_primary_key: primary_key.into(),
        }
    }

    /// Register a model definition.
    ///
    /// Rejects empty and duplicate names.
    pub fn register(&mut self, model: ModelDefinition) -> FilterResult<()> {
        if model.name.is_empty() {
            return Err(FilterError::invalid_argument(
                "A model name should be a non-empty String.",
            ));
        }
        if self.models.contains_key(&model.name) {
            return Err(FilterError::invalid_argument(format!(
                "The model \"{}\" is already defined.",
                model.name
            )));
        }
        self.models.insert(model.name.clone(), model);
        Ok(())
    }

    /// Get a model definition
    pub fn get(&self, model: &str) -> FilterResult<&ModelDefinition> {
        self.models.get(model).ok_or_else(|| {
            FilterError::invalid_argument(format!("The model \"{}\" is not defined.", model))
        })
    }

    /// Number of registered models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True if no models are registered
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelDefinitions for ModelRegistry {
    fn primary_key_property_name(&self, model: &str) -> FilterResult<String> {
        let definition = self.get(model)?;
        Ok(definition
            .primary_key
            .clone()
            .unwrap_or_else(|| self.default_primary_key.clone()))
    }

    fn relation_definition(&self, model: &str, relation: &str) -> FilterResult<RelationDefinition> {
        let definition = self.get(model)?;
        definition.relations.get(relation).cloned().ok_or_else(|| {
            FilterError::invalid_argument(format!(
                "The model \"{}\" does not have the relation \"{}\".",
                model, relation
            ))
        })
    }
}
