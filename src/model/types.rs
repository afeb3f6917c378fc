//! Model and relation definitions
//!
//! Relation kinds:
//! - belongsTo: the source holds the foreign key
//! - hasOne / hasMany: the target holds the foreign key
//! - referencesMany: the source holds an array of target keys

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    #[serde(rename = "belongsTo")]
    BelongsTo,
    #[serde(rename = "hasOne")]
    HasOne,
    #[serde(rename = "hasMany")]
    HasMany,
    #[serde(rename = "referencesMany")]
    ReferencesMany,
}

impl RelationType {
    /// Get the relation type name
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::BelongsTo => "belongsTo",
            RelationType::HasOne => "hasOne",
            RelationType::HasMany => "hasMany",
            RelationType::ReferencesMany => "referencesMany",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Polymorphism mode of a relation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polymorphism {
    /// Fixed target model
    #[default]
    None,
    /// Target model name is read from a discriminator property
    Discriminator,
    /// Resolved through a polymorphic relation of the target model
    ByRelationName(String),
}

/// Relation definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// Relation kind
    #[serde(rename = "type")]
    pub kind: RelationType,
    /// Target model
    #[serde(default)]
    pub model: Option<String>,
    /// Foreign key property
    #[serde(default, rename = "foreignKey")]
    pub foreign_key: Option<String>,
    /// Discriminator property for polymorphic relations
    #[serde(default)]
    pub discriminator: Option<String>,
    /// Polymorphism mode
    #[serde(default)]
    pub polymorphic: Polymorphism,
}

impl RelationDefinition {
    fn new(kind: RelationType, model: Option<String>, foreign_key: Option<String>) -> Self {
        Self {
            kind,
            model,
            foreign_key,
            discriminator: None,
            polymorphic: Polymorphism::None,
        }
    }

    /// belongsTo with a fixed target
    pub fn belongs_to(model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationType::BelongsTo, Some(model.into()), Some(foreign_key.into()))
    }

    /// belongsTo whose target is named by a discriminator property
    pub fn belongs_to_polymorphic(foreign_key: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self {
            discriminator: Some(discriminator.into()),
            polymorphic: Polymorphism::Discriminator,
            ..Self::new(RelationType::BelongsTo, None, Some(foreign_key.into()))
        }
    }

    /// hasOne with a fixed target
    pub fn has_one(model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationType::HasOne, Some(model.into()), Some(foreign_key.into()))
    }

    /// hasMany with a fixed target
    pub fn has_many(model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationType::HasMany, Some(model.into()), Some(foreign_key.into()))
    }

    /// referencesMany with a fixed target
    pub fn references_many(model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationType::ReferencesMany, Some(model.into()), Some(foreign_key.into()))
    }

    /// Switch to discriminator-column polymorphism
    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = Some(discriminator.into());
        self.polymorphic = Polymorphism::Discriminator;
        self
    }

    /// Switch to polymorphism through a named relation of the target
    pub fn by_relation_name(mut self, relation_name: impl Into<String>) -> Self {
        self.polymorphic = Polymorphism::ByRelationName(relation_name.into());
        self
    }
}

/// Model definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Model name
    pub name: String,
    /// Primary key property; the configured default applies when absent
    #[serde(default, rename = "primaryKey")]
    pub primary_key: Option<String>,
    /// Relations by name
    #[serde(default)]
    pub relations: HashMap<String, RelationDefinition>,
}

impl ModelDefinition {
    /// Create a model without relations
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            relations: HashMap::new(),
        }
    }

    /// Set the primary key property
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = Some(primary_key.into());
        self
    }

    /// Add a relation
    pub fn with_relation(mut self, name: impl Into<String>, relation: RelationDefinition) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relation_type_names() {
        assert_eq!(RelationType::BelongsTo.as_str(), "belongsTo");
        assert_eq!(RelationType::ReferencesMany.to_string(), "referencesMany");
    }

    #[test]
    fn test_deserialize_model() {
        let model: ModelDefinition = serde_json::from_value(json!({
            "name": "comment",
            "relations": {
                "author": {"type": "belongsTo", "model": "user", "foreignKey": "authorId"},
                "parent": {
                    "type": "belongsTo",
                    "foreignKey": "parentId",
                    "discriminator": "parentType",
                    "polymorphic": "discriminator"
                }
            }
        }))
        .unwrap();

        assert_eq!(model.primary_key, None);
        assert_eq!(model.relations["author"], RelationDefinition::belongs_to("user", "authorId"));
        assert_eq!(
            model.relations["parent"],
            RelationDefinition::belongs_to_polymorphic("parentId", "parentType")
        );
    }

    #[test]
    fn test_builders() {
        let rel = RelationDefinition::has_many("comment", "parentId").by_relation_name("parent");
        assert_eq!(rel.polymorphic, Polymorphism::ByRelationName("parent".into()));
        let rel = RelationDefinition::has_one("avatar", "ownerId").with_discriminator("ownerType");
        assert_eq!(rel.polymorphic, Polymorphism::Discriminator);
        assert_eq!(rel.discriminator.as_deref(), Some("ownerType"));
    }
}
