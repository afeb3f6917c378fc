//! Resolution strategy selection
//!
//! | kind           | none  | discriminator | by relation name |
//! |----------------|-------|---------------|------------------|
//! | belongsTo      | Plain | Discriminator | ByRelationName   |
//! | hasOne         | Plain | Discriminator | ByRelationName   |
//! | hasMany        | Plain | Discriminator | ByRelationName   |
//! | referencesMany | Plain | Plain         | Plain            |

use std::fmt;

use crate::clause::{FilterError, FilterResult};
use crate::model::{Polymorphism, RelationDefinition, RelationType};

/// Strategy family, without its configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Plain,
    Discriminator,
    ByRelationName,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Plain,
        StrategyKind::Discriminator,
        StrategyKind::ByRelationName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Plain => "plain",
            StrategyKind::Discriminator => "discriminator",
            StrategyKind::ByRelationName => "by_relation_name",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a relation is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Fixed target model joined on a foreign key
    Plain {
        target_model: String,
        foreign_key: String,
    },
    /// Target model named by a discriminator property.
    ///
    /// belongsTo relations carry no fixed target model.
    Discriminator {
        target_model: Option<String>,
        foreign_key: String,
        discriminator: String,
    },
    /// Resolved through a polymorphic relation declared on the target
    ByRelationName {
        target_model: String,
        target_relation: String,
    },
}

impl ResolutionStrategy {
    /// Selects the strategy for a relation definition
    pub fn select(relation_name: &str, definition: &RelationDefinition) -> FilterResult<Self> {
        let require = |value: &Option<String>, option: &str| {
            value.clone().ok_or_else(|| {
                FilterError::invalid_argument(format!(
                    "The relation \"{}\" of type \"{}\" requires the option \"{}\".",
                    relation_name, definition.kind, option
                ))
            })
        };

        if definition.kind == RelationType::ReferencesMany {
            return Ok(ResolutionStrategy::Plain {
                target_model: require(&definition.model, "model")?,
                foreign_key: require(&definition.foreign_key, "foreignKey")?,
            });
        }

        match &definition.polymorphic {
            Polymorphism::None => Ok(ResolutionStrategy::Plain {
                target_model: require(&definition.model, "model")?,
                foreign_key: require(&definition.foreign_key, "foreignKey")?,
            }),
            Polymorphism::Discriminator => {
                let target_model = match definition.kind {
                    RelationType::BelongsTo => None,
                    _ => Some(require(&definition.model, "model")?),
                };
                Ok(ResolutionStrategy::Discriminator {
                    target_model,
                    foreign_key: require(&definition.foreign_key, "foreignKey")?,
                    discriminator: require(&definition.discriminator, "discriminator")?,
                })
            }
            Polymorphism::ByRelationName(target_relation) => {
                if target_relation.is_empty() {
                    return Err(FilterError::invalid_argument(format!(
                        "The relation \"{}\" has an empty polymorphic relation name.",
                        relation_name
                    )));
                }
                Ok(ResolutionStrategy::ByRelationName {
                    target_model: require(&definition.model, "model")?,
                    target_relation: target_relation.clone(),
                })
            }
        }
    }

    /// Strategy family, used to pick a resolver
    pub fn kind(&self) -> StrategyKind {
        match self {
            ResolutionStrategy::Plain { .. } => StrategyKind::Plain,
            ResolutionStrategy::Discriminator { .. } => StrategyKind::Discriminator,
            ResolutionStrategy::ByRelationName { .. } => StrategyKind::ByRelationName,
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
