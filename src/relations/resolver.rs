//! Relation resolver capability
//!
//! Resolvers fetch related data for a batch of entities. They only read the
//! entities; the include dispatcher attaches what they return.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::clause::{FilterClause, FilterResult};
use crate::model::RelationType;

use super::strategy::{ResolutionStrategy, StrategyKind};

/// One inclusion to resolve
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Model of the entities
    pub source_model: String,
    /// Relation name, also the key the result is attached under
    pub relation_name: String,
    /// Selected strategy
    pub strategy: ResolutionStrategy,
    /// Nested filter for the related model
    pub scope: Option<FilterClause>,
}

/// Resolves one relation for a batch of entities.
///
/// Implementations return one slot per entity, in entity order. `None` leaves
/// the entity untouched.
pub trait RelationResolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        entities: &'a [Value],
        resolution: &'a Resolution,
    ) -> BoxFuture<'a, FilterResult<Vec<Option<Value>>>>;
}

/// Resolvers keyed by relation kind and strategy family.
///
/// A resolver registered with `with` serves every strategy of its kind;
/// `with_strategy` narrows it to one.
#[derive(Clone, Default)]
pub struct RelationResolvers {
    resolvers: HashMap<(RelationType, StrategyKind), Arc<dyn RelationResolver>>,
}

impl RelationResolvers {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver for every strategy of a relation kind (builder style)
    pub fn with(self, kind: RelationType, resolver: Arc<dyn RelationResolver>) -> Self {
        StrategyKind::ALL
            .into_iter()
            .fold(self, |set, strategy| set.with_strategy(kind, strategy, Arc::clone(&resolver)))
    }

    /// Register a resolver for one (kind, strategy) pair
    pub fn with_strategy(
        mut self,
        kind: RelationType,
        strategy: StrategyKind,
        resolver: Arc<dyn RelationResolver>,
    ) -> Self {
        self.resolvers.insert((kind, strategy), resolver);
        self
    }

    /// Register one resolver for every relation kind
    pub fn with_all(self, resolver: Arc<dyn RelationResolver>) -> Self {
        [
            RelationType::BelongsTo,
            RelationType::HasOne,
            RelationType::HasMany,
            RelationType::ReferencesMany,
        ]
        .into_iter()
        .fold(self, |set, kind| set.with(kind, Arc::clone(&resolver)))
    }

    /// Resolver for a (kind, strategy) pair, if registered
    pub fn get(&self, kind: RelationType, strategy: StrategyKind) -> Option<&Arc<dyn RelationResolver>> {
        self.resolvers.get(&(kind, strategy))
    }

    /// True if any strategy of the kind has a resolver
    pub fn supports(&self, kind: RelationType) -> bool {
        self.resolvers.keys().any(|(k, _)| *k == kind)
    }

    /// Number of registered pairs
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    impl RelationResolver for Nothing {
        fn resolve<'a>(
            &'a self,
            entities: &'a [Value],
            _resolution: &'a Resolution,
        ) -> BoxFuture<'a, FilterResult<Vec<Option<Value>>>> {
            Box::pin(async move { Ok(vec![None; entities.len()]) })
        }
    }

    #[test]
    fn test_registration() {
        let set = RelationResolvers::new().with(RelationType::HasMany, Arc::new(Nothing));
        for strategy in StrategyKind::ALL {
            assert!(set.get(RelationType::HasMany, strategy).is_some());
        }
        assert!(set.get(RelationType::BelongsTo, StrategyKind::Plain).is_none());
        assert!(!set.supports(RelationType::BelongsTo));

        let set = RelationResolvers::new().with_all(Arc::new(Nothing));
        assert_eq!(set.len(), 12);
    }

    #[test]
    fn test_registration_per_strategy() {
        let set = RelationResolvers::new().with_strategy(
            RelationType::HasOne,
            StrategyKind::Discriminator,
            Arc::new(Nothing),
        );
        assert!(set.supports(RelationType::HasOne));
        assert!(set.get(RelationType::HasOne, StrategyKind::Discriminator).is_some());
        assert!(set.get(RelationType::HasOne, StrategyKind::ByRelationName).is_none());
        assert_eq!(set.len(), 1);
    }
}
