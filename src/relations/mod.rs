//! Relation resolution seam
//!
//! The include dispatcher selects a `ResolutionStrategy` for every inclusion
//! and hands it to the `RelationResolver` registered for the relation kind.
//! Fetching related data is up to the resolver.

mod resolver;
mod strategy;

pub use resolver::{RelationResolver, RelationResolvers, Resolution};
pub use strategy::{ResolutionStrategy, StrategyKind};
