//! Include Dispatch Tests
//!
//! Tests for relation inclusion:
//! - Strategy selection per relation kind and polymorphism
//! - Resolver lookup by relation kind and strategy
//! - Results attached under the relation name after all resolutions finish
//! - First failure is returned and nothing is attached

use std::sync::{Arc, Mutex};

use clause_engine::clause::{FilterErrorCode, IncludeClause, IncludeClauseTool, Inclusion};
use clause_engine::{
    FilterClause, FilterError, FilterResult, ModelDefinition, ModelRegistry, RelationDefinition,
    RelationResolver, RelationResolvers, RelationType, Resolution, ResolutionStrategy, StrategyKind,
    WhereClause,
};
use futures_util::future::{self, BoxFuture};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// Records every resolution and answers with a value describing it
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<Resolution>>,
}

impl Recorder {
    fn seen(&self) -> Vec<Resolution> {
        self.seen.lock().unwrap().clone()
    }
}

impl RelationResolver for Recorder {
    fn resolve<'a>(
        &'a self,
        entities: &'a [Value],
        resolution: &'a Resolution,
    ) -> BoxFuture<'a, FilterResult<Vec<Option<Value>>>> {
        self.seen.lock().unwrap().push(resolution.clone());
        Box::pin(async move {
            Ok(entities
                .iter()
                .map(|entity| {
                    Some(json!({
                        "strategy": resolution.strategy.name(),
                        "for": entity["id"].clone(),
                    }))
                })
                .collect())
        })
    }
}

/// Always fails
struct Failing;

impl RelationResolver for Failing {
    fn resolve<'a>(
        &'a self,
        _entities: &'a [Value],
        resolution: &'a Resolution,
    ) -> BoxFuture<'a, FilterResult<Vec<Option<Value>>>> {
        Box::pin(async move { Err(FilterError::resolution(resolution.relation_name.clone(), "backend down")) })
    }
}

/// Never finishes
struct Stalled;

impl RelationResolver for Stalled {
    fn resolve<'a>(
        &'a self,
        _entities: &'a [Value],
        _resolution: &'a Resolution,
    ) -> BoxFuture<'a, FilterResult<Vec<Option<Value>>>> {
        Box::pin(future::pending())
    }
}

/// Returns the wrong number of slots
struct Short;

impl RelationResolver for Short {
    fn resolve<'a>(
        &'a self,
        _entities: &'a [Value],
        _resolution: &'a Resolution,
    ) -> BoxFuture<'a, FilterResult<Vec<Option<Value>>>> {
        Box::pin(async { Ok(vec![None]) })
    }
}

fn registry() -> Arc<ModelRegistry> {
    let mut registry = ModelRegistry::new();
    registry
        .register(
            ModelDefinition::new("comment")
                .with_relation("author", RelationDefinition::belongs_to("user", "authorId"))
                .with_relation("target", RelationDefinition::belongs_to_polymorphic("targetId", "targetType"))
                .with_relation(
                    "likes",
                    RelationDefinition::has_many("like", "parentId").with_discriminator("parentType"),
                )
                .with_relation(
                    "attachments",
                    RelationDefinition::has_many("file", "ownerId").by_relation_name("owner"),
                )
                .with_relation("tags", RelationDefinition::references_many("tag", "tagIds"))
                .with_relation("reply", RelationDefinition::has_one("comment", "parentId")),
        )
        .unwrap();
    registry
        .register(
            ModelDefinition::new("broken").with_relation(
                "owner",
                RelationDefinition {
                    model: None,
                    ..RelationDefinition::belongs_to("user", "ownerId")
                },
            ),
        )
        .unwrap();
    Arc::new(registry)
}

fn comments() -> Vec<Value> {
    vec![
        json!({"id": 1, "authorId": 10, "targetType": "post", "targetId": 5}),
        json!({"id": 2, "authorId": 11, "targetType": "photo", "targetId": 6}),
    ]
}

fn tool_with(resolvers: RelationResolvers) -> IncludeClauseTool {
    IncludeClauseTool::new(registry(), resolvers)
}

// =============================================================================
// Strategy Selection
// =============================================================================

#[tokio::test]
async fn test_strategy_per_relation() {
    let recorder = Arc::new(Recorder::default());
    let tool = tool_with(RelationResolvers::new().with_all(recorder.clone()));
    let mut entities = comments();

    let clause = IncludeClause::from(vec!["author", "target", "likes", "attachments", "tags", "reply"]);
    tool.include_to(&mut entities, "comment", Some(&clause)).await.unwrap();

    let strategies: Vec<(String, ResolutionStrategy)> = recorder
        .seen()
        .into_iter()
        .map(|r| (r.relation_name, r.strategy))
        .collect();
    assert_eq!(
        strategies,
        vec![
            (
                "author".to_string(),
                ResolutionStrategy::Plain {
                    target_model: "user".to_string(),
                    foreign_key: "authorId".to_string(),
                }
            ),
            (
                "target".to_string(),
                ResolutionStrategy::Discriminator {
                    target_model: None,
                    foreign_key: "targetId".to_string(),
                    discriminator: "targetType".to_string(),
                }
            ),
            (
                "likes".to_string(),
                ResolutionStrategy::Discriminator {
                    target_model: Some("like".to_string()),
                    foreign_key: "parentId".to_string(),
                    discriminator: "parentType".to_string(),
                }
            ),
            (
                "attachments".to_string(),
                ResolutionStrategy::ByRelationName {
                    target_model: "file".to_string(),
                    target_relation: "owner".to_string(),
                }
            ),
            (
                "tags".to_string(),
                ResolutionStrategy::Plain {
                    target_model: "tag".to_string(),
                    foreign_key: "tagIds".to_string(),
                }
            ),
            (
                "reply".to_string(),
                ResolutionStrategy::Plain {
                    target_model: "comment".to_string(),
                    foreign_key: "parentId".to_string(),
                }
            ),
        ]
    );
}

#[tokio::test]
async fn test_results_attached_under_relation_name() {
    let recorder = Arc::new(Recorder::default());
    let tool = tool_with(RelationResolvers::new().with_all(recorder));
    let mut entities = comments();

    tool.include_to(&mut entities, "comment", Some(&IncludeClause::from("target")))
        .await
        .unwrap();

    assert_eq!(entities[0]["target"], json!({"strategy": "discriminator", "for": 1}));
    assert_eq!(entities[1]["target"], json!({"strategy": "discriminator", "for": 2}));
    assert_eq!(entities[0]["authorId"], 10);
}

#[tokio::test]
async fn test_scope_is_normalized_before_dispatch() {
    let recorder = Arc::new(Recorder::default());
    let tool = tool_with(RelationResolvers::new().with_all(recorder.clone()));
    let mut entities = comments();

    let scope = FilterClause::new()
        .with_where(WhereClause::new().field("active", json!(true)))
        .with_limit(3)
        .with_include(IncludeClause::nested([("profile", IncludeClause::from("avatar"))]));
    let clause = IncludeClause::from(Inclusion::new("author").with_scope(scope));
    tool.include_to(&mut entities, "comment", Some(&clause)).await.unwrap();

    let seen = recorder.seen();
    assert_eq!(seen.len(), 1);
    let scope = seen[0].scope.clone().unwrap();
    assert_eq!(scope.limit, Some(3));
    assert!(scope.where_clause.is_some());
    assert_eq!(
        scope.include,
        Some(IncludeClause::from(vec![Inclusion::new("profile").with_scope(
            FilterClause::new().with_include(vec![Inclusion::new("avatar")])
        )]))
    );
}

#[tokio::test]
async fn test_empty_clause_dispatches_nothing() {
    let recorder = Arc::new(Recorder::default());
    let tool = tool_with(RelationResolvers::new().with_all(recorder.clone()));
    let mut entities = comments();

    tool.include_to(&mut entities, "comment", None).await.unwrap();
    tool.include_to(&mut entities, "comment", Some(&IncludeClause::empty()))
        .await
        .unwrap();

    assert!(recorder.seen().is_empty());
    assert_eq!(entities, comments());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_missing_resolver_for_kind() {
    let tool = tool_with(RelationResolvers::new().with(RelationType::HasMany, Arc::new(Recorder::default())));
    let mut entities = comments();

    let err = tool
        .include_to(&mut entities, "comment", Some(&IncludeClause::from("author")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), FilterErrorCode::InvalidArgument);
    assert!(err
        .to_string()
        .contains("The relation type \"belongsTo\" does not have an inclusion resolver."));
}

#[tokio::test]
async fn test_missing_resolver_for_strategy() {
    let recorder = Arc::new(Recorder::default());
    let resolvers = RelationResolvers::new().with_strategy(RelationType::HasMany, StrategyKind::Plain, recorder.clone());
    let tool = tool_with(resolvers);
    let mut entities = comments();

    let err = tool
        .include_to(&mut entities, "comment", Some(&IncludeClause::from("attachments")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), FilterErrorCode::InvalidArgument);
    assert!(err
        .to_string()
        .contains("The relation type \"hasMany\" does not support the \"by_relation_name\" resolution strategy."));

    let err = tool
        .include_to(&mut entities, "comment", Some(&IncludeClause::from("likes")))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("\"discriminator\""));

    assert!(recorder.seen().is_empty());
    assert_eq!(entities, comments());
}

#[tokio::test]
async fn test_unknown_relation() {
    let tool = tool_with(RelationResolvers::new().with_all(Arc::new(Recorder::default())));
    let mut entities = comments();

    let err = tool
        .include_to(&mut entities, "comment", Some(&IncludeClause::from("votes")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), FilterErrorCode::InvalidArgument);
}

#[tokio::test]
async fn test_missing_relation_option() {
    let tool = tool_with(RelationResolvers::new().with_all(Arc::new(Recorder::default())));
    let mut entities = vec![json!({"id": 1, "ownerId": 2})];

    let err = tool
        .include_to(&mut entities, "broken", Some(&IncludeClause::from("owner")))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("requires the option \"model\""));
}

#[tokio::test]
async fn test_failure_attaches_nothing() {
    let resolvers = RelationResolvers::new()
        .with_all(Arc::new(Recorder::default()))
        .with(RelationType::HasMany, Arc::new(Failing));
    let tool = tool_with(resolvers);
    let mut entities = comments();

    let clause = IncludeClause::from(vec!["author", "likes", "tags"]);
    let err = tool
        .include_to(&mut entities, "comment", Some(&clause))
        .await
        .unwrap_err();

    assert_eq!(err.code(), FilterErrorCode::ResolutionFailed);
    assert_eq!(entities, comments());
}

#[tokio::test]
async fn test_failure_drops_pending_siblings() {
    let resolvers = RelationResolvers::new()
        .with(RelationType::BelongsTo, Arc::new(Stalled))
        .with(RelationType::HasMany, Arc::new(Failing));
    let tool = tool_with(resolvers);
    let mut entities = comments();

    let clause = IncludeClause::from(vec!["author", "likes"]);
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        tool.include_to(&mut entities, "comment", Some(&clause)),
    )
    .await
    .expect("dispatch should not wait for stalled siblings");

    assert!(result.is_err());
    assert_eq!(entities, comments());
}

#[tokio::test]
async fn test_result_count_mismatch() {
    let tool = tool_with(RelationResolvers::new().with_all(Arc::new(Short)));
    let mut entities = comments();

    let err = tool
        .include_to(&mut entities, "comment", Some(&IncludeClause::from("author")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), FilterErrorCode::ResolutionFailed);
    assert_eq!(entities, comments());
}

#[tokio::test]
async fn test_non_object_entities_rejected() {
    let tool = tool_with(RelationResolvers::new().with_all(Arc::new(Recorder::default())));
    let mut entities = vec![json!({"id": 1}), json!(2)];

    let err = tool
        .include_to(&mut entities, "comment", Some(&IncludeClause::from("author")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), FilterErrorCode::InvalidArgument);
}

#[tokio::test]
async fn test_depth_limit_applies_to_dispatch() {
    let tool = tool_with(RelationResolvers::new().with_all(Arc::new(Recorder::default()))).with_max_depth(2);
    let mut entities = comments();

    let clause = IncludeClause::nested([(
        "author",
        IncludeClause::nested([("profile", IncludeClause::from("avatar"))]),
    )]);
    let err = tool
        .include_to(&mut entities, "comment", Some(&clause))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("nested deeper than 2 levels"));
}
