//! clause-engine - Storage-agnostic filter clauses for record sequences
//!
//! Records are JSON objects. A filter selects (where), orders (order),
//! paginates (skip/limit), attaches related data (include) and projects
//! fields (fields). Storage and relation fetching stay behind the
//! `ModelDefinitions` and `RelationResolver` traits.

pub mod clause;
pub mod config;
pub mod engine;
pub mod model;
pub mod observability;
pub mod relations;

pub use clause::{
    FieldsClauseTool, FilterClause, FilterError, FilterErrorCode, FilterResult, IncludeClause,
    IncludeClauseTool, Inclusion, OperatorClause, OperatorClauseTool, OrderClauseTool,
    SliceClauseTool, WhereClause, WhereClauseTool,
};
pub use config::{ConfigError, EngineConfig};
pub use engine::FilterEngine;
pub use model::{ModelDefinition, ModelDefinitions, ModelRegistry, RelationDefinition, RelationType};
pub use relations::{RelationResolver, RelationResolvers, Resolution, ResolutionStrategy, StrategyKind};
