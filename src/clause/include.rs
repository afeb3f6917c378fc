//! Relation inclusion
//!
//! Accepted shapes of an include clause:
//!
//! - `"author"`: a relation name
//! - `["author", ["tags"]]`: a list, nested lists are flattened
//! - `{"author": "company", "tags": null}`: relation name → nested include
//! - `{"relation": "author", "scope": {...}}`: a normalized inclusion
//!
//! Normalization produces an ordered list of `Inclusion` with unique relation
//! names at every level. Normalizing a normalized clause changes nothing.
//!
//! `include_to` resolves every inclusion concurrently and attaches the results
//! once all of them have finished.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::{Map, Value};

use super::errors::{describe_value, FilterError, FilterResult};
use super::fields::FieldsClauseTool;
use super::filter::FilterClause;
use super::order::OrderClauseTool;
use crate::model::ModelDefinitions;
use crate::observability::{log_event, Event};
use crate::relations::{RelationResolvers, Resolution, ResolutionStrategy};

/// Default limit on nested scope depth
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// A normalized inclusion
#[derive(Debug, Clone, PartialEq)]
pub struct Inclusion {
    pub relation: String,
    pub scope: Option<Box<FilterClause>>,
}

impl Inclusion {
    /// Inclusion without scope
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            scope: None,
        }
    }

    /// Attach a scope
    pub fn with_scope(mut self, scope: FilterClause) -> Self {
        self.scope = Some(Box::new(scope));
        self
    }
}

/// An include clause in any accepted shape
#[derive(Debug, Clone, PartialEq)]
pub enum IncludeClause {
    Relation(String),
    List(Vec<IncludeClause>),
    Nested(Vec<(String, IncludeClause)>),
    Inclusion(Inclusion),
}

impl IncludeClause {
    /// The empty clause
    pub fn empty() -> Self {
        IncludeClause::List(Vec::new())
    }

    /// Shorthand mapping from pairs
    pub fn nested<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, IncludeClause)>,
        S: Into<String>,
    {
        IncludeClause::Nested(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<&str> for IncludeClause {
    fn from(relation: &str) -> Self {
        IncludeClause::Relation(relation.to_string())
    }
}

impl From<String> for IncludeClause {
    fn from(relation: String) -> Self {
        IncludeClause::Relation(relation)
    }
}

impl From<Inclusion> for IncludeClause {
    fn from(inclusion: Inclusion) -> Self {
        IncludeClause::Inclusion(inclusion)
    }
}

impl From<Vec<Inclusion>> for IncludeClause {
    fn from(inclusions: Vec<Inclusion>) -> Self {
        IncludeClause::List(inclusions.into_iter().map(IncludeClause::Inclusion).collect())
    }
}

impl From<Vec<IncludeClause>> for IncludeClause {
    fn from(items: Vec<IncludeClause>) -> Self {
        IncludeClause::List(items)
    }
}

impl From<Vec<&str>> for IncludeClause {
    fn from(relations: Vec<&str>) -> Self {
        IncludeClause::List(relations.into_iter().map(IncludeClause::from).collect())
    }
}

impl TryFrom<&Value> for IncludeClause {
    type Error = FilterError;

    fn try_from(value: &Value) -> FilterResult<Self> {
        IncludeClauseTool::parse_include_clause(value)?.ok_or_else(|| {
            FilterError::invalid_argument("The provided option \"include\" should not be null.")
        })
    }
}

/// Include clause tool
#[derive(Clone)]
pub struct IncludeClauseTool {
    models: Arc<dyn ModelDefinitions>,
    resolvers: RelationResolvers,
    max_depth: usize,
}

impl IncludeClauseTool {
    /// Create a dispatcher over a metamodel and a resolver set
    pub fn new(models: Arc<dyn ModelDefinitions>, resolvers: RelationResolvers) -> Self {
        Self {
            models,
            resolvers,
            max_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Override the nested scope depth limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validates the clause shape without building output
    pub fn validate_include_clause(clause: Option<&IncludeClause>) -> FilterResult<()> {
        let Some(clause) = clause else {
            return Ok(());
        };
        match clause {
            IncludeClause::Relation(name) => Self::validate_relation_name(name),
            IncludeClause::List(items) => {
                for item in items {
                    Self::validate_include_clause(Some(item))?;
                }
                let mut names = Vec::new();
                for item in items {
                    Self::collect_relation_names(item, &mut names);
                }
                Self::ensure_unique(names)
            }
            IncludeClause::Nested(entries) => {
                for (name, nested) in entries {
                    Self::validate_relation_name(name)?;
                    Self::validate_include_clause(Some(nested))?;
                }
                Self::ensure_unique(entries.iter().map(|(name, _)| name.as_str()))
            }
            IncludeClause::Inclusion(inclusion) => {
                Self::validate_relation_name(&inclusion.relation)?;
                match &inclusion.scope {
                    Some(scope) => Self::validate_scope_clause(scope),
                    None => Ok(()),
                }
            }
        }
    }

    /// Validates every part of a scope with its own tool
    pub fn validate_scope_clause(scope: &FilterClause) -> FilterResult<()> {
        if let Some(order) = &scope.order {
            OrderClauseTool::validate_order_clause(order)?;
        }
        if let Some(fields) = &scope.fields {
            FieldsClauseTool::validate_fields_clause(fields)?;
        }
        Self::validate_include_clause(scope.include.as_ref())
    }

    fn validate_relation_name(name: &str) -> FilterResult<()> {
        if name.is_empty() {
            return Err(FilterError::invalid_argument(
                "The provided option \"include\" should have a non-empty String, but \"\" was given.",
            ));
        }
        Ok(())
    }

    /// Names a list element contributes at its own level. A nested list is
    /// checked on its own and contributes none.
    fn collect_relation_names<'a>(clause: &'a IncludeClause, names: &mut Vec<&'a str>) {
        match clause {
            IncludeClause::Relation(name) => names.push(name),
            IncludeClause::List(_) => {}
            IncludeClause::Nested(entries) => {
                names.extend(entries.iter().map(|(name, _)| name.as_str()));
            }
            IncludeClause::Inclusion(inclusion) => names.push(&inclusion.relation),
        }
    }

    fn ensure_unique<'a>(names: impl IntoIterator<Item = &'a str>) -> FilterResult<()> {
        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name) {
                return Err(FilterError::invalid_argument(format!(
                    "The provided option \"include\" has duplicates of \"{}\".",
                    name
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Normalization
    // =========================================================================

    /// Normalizes a clause into the canonical inclusion list
    pub fn normalize_include_clause(clause: Option<&IncludeClause>) -> FilterResult<Vec<Inclusion>> {
        Self::normalize_at(clause, 1, DEFAULT_MAX_INCLUDE_DEPTH)
    }

    /// Normalizes a scope: copies where/order/skip/limit/fields after
    /// validation and normalizes the nested include
    pub fn normalize_scope_clause(scope: &FilterClause) -> FilterResult<FilterClause> {
        Self::normalize_scope_at(scope, 1, DEFAULT_MAX_INCLUDE_DEPTH)
    }

    fn normalize_at(clause: Option<&IncludeClause>, depth: usize, max_depth: usize) -> FilterResult<Vec<Inclusion>> {
        let Some(clause) = clause else {
            return Ok(Vec::new());
        };
        if depth > max_depth {
            return Err(FilterError::invalid_argument(format!(
                "The provided option \"include\" is nested deeper than {} levels.",
                max_depth
            )));
        }

        let inclusions = match clause {
            IncludeClause::Relation(name) => {
                Self::validate_relation_name(name)?;
                vec![Inclusion::new(name.clone())]
            }
            IncludeClause::List(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(Self::normalize_at(Some(item), depth, max_depth)?);
                }
                out
            }
            IncludeClause::Nested(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (name, nested) in entries {
                    Self::validate_relation_name(name)?;
                    let nested = Self::normalize_at(Some(nested), depth + 1, max_depth)?;
                    let mut inclusion = Inclusion::new(name.clone());
                    if !nested.is_empty() {
                        inclusion = inclusion.with_scope(FilterClause::new().with_include(nested));
                    }
                    out.push(inclusion);
                }
                out
            }
            IncludeClause::Inclusion(inclusion) => {
                Self::validate_relation_name(&inclusion.relation)?;
                let mut normalized = Inclusion::new(inclusion.relation.clone());
                if let Some(scope) = &inclusion.scope {
                    let scope = Self::normalize_scope_at(scope, depth, max_depth)?;
                    if !scope.is_empty() {
                        normalized = normalized.with_scope(scope);
                    }
                }
                vec![normalized]
            }
        };

        Self::ensure_unique(inclusions.iter().map(|i| i.relation.as_str()))?;
        Ok(inclusions)
    }

    fn normalize_scope_at(scope: &FilterClause, depth: usize, max_depth: usize) -> FilterResult<FilterClause> {
        let mut normalized = FilterClause::new();
        normalized.where_clause = scope.where_clause.clone();
        if let Some(order) = &scope.order {
            OrderClauseTool::validate_order_clause(order)?;
            normalized.order = Some(order.clone());
        }
        normalized.skip = scope.skip;
        normalized.limit = scope.limit;
        if let Some(fields) = &scope.fields {
            FieldsClauseTool::validate_fields_clause(fields)?;
            normalized.fields = Some(fields.clone());
        }
        let nested = Self::normalize_at(scope.include.as_ref(), depth + 1, max_depth)?;
        if !nested.is_empty() {
            normalized.include = Some(IncludeClause::from(nested));
        }
        Ok(normalized)
    }

    // =========================================================================
    // JSON boundary
    // =========================================================================

    /// Parses a JSON include clause. `null` is absent.
    pub fn parse_include_clause(value: &Value) -> FilterResult<Option<IncludeClause>> {
        match value {
            Value::Null => Ok(None),
            Value::String(name) => {
                Self::validate_relation_name(name)?;
                Ok(Some(IncludeClause::Relation(name.clone())))
            }
            Value::Array(items) => {
                let parsed = items
                    .iter()
                    .map(|item| -> FilterResult<IncludeClause> {
                        Ok(Self::parse_include_clause(item)?.unwrap_or_else(IncludeClause::empty))
                    })
                    .collect::<FilterResult<Vec<_>>>()?;
                Ok(Some(IncludeClause::List(parsed)))
            }
            Value::Object(map) if map.contains_key("relation") => Self::parse_inclusion(map).map(Some),
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (name, nested) in map {
                    Self::validate_relation_name(name)?;
                    let nested = Self::parse_include_clause(nested)?.unwrap_or_else(IncludeClause::empty);
                    entries.push((name.clone(), nested));
                }
                Ok(Some(IncludeClause::Nested(entries)))
            }
            other => Err(FilterError::invalid_argument(format!(
                "The provided option \"include\" should have a non-empty String, an Object or an Array, but {} was given.",
                describe_value(other)
            ))),
        }
    }

    fn parse_inclusion(map: &Map<String, Value>) -> FilterResult<IncludeClause> {
        let relation = match map.get("relation") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            other => {
                return Err(FilterError::invalid_argument(format!(
                    "The provided option \"relation\" should be a non-empty String, but {} was given.",
                    other.map_or_else(|| "undefined".to_string(), describe_value)
                )))
            }
        };
        let mut inclusion = Inclusion::new(relation);
        match map.get("scope") {
            None | Some(Value::Null) => {}
            Some(scope @ Value::Object(_)) => {
                inclusion = inclusion.with_scope(FilterClause::try_from(scope)?);
            }
            Some(other) => {
                return Err(FilterError::invalid_argument(format!(
                    "The provided option \"scope\" should be an Object, but {} was given.",
                    describe_value(other)
                )))
            }
        }
        Ok(IncludeClause::Inclusion(inclusion))
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Resolves the inclusions of `clause` and attaches the related data to
    /// every entity under the relation name.
    ///
    /// Resolutions run concurrently. The first failure is returned and nothing
    /// is attached in that case.
    pub async fn include_to(
        &self,
        entities: &mut [Value],
        model: &str,
        clause: Option<&IncludeClause>,
    ) -> FilterResult<()> {
        if model.is_empty() {
            return Err(FilterError::invalid_argument(
                "The second argument of IncludeClauseTool::include_to should be a non-empty String, but \"\" was given.",
            ));
        }
        if let Some(bad) = entities.iter().find(|e| !e.is_object()) {
            return Err(FilterError::invalid_argument(format!(
                "The first argument of IncludeClauseTool::include_to should be an Array of Object, but {} was given.",
                describe_value(bad)
            )));
        }

        let inclusions = Self::normalize_at(clause, 1, self.max_depth)?;
        if inclusions.is_empty() {
            return Ok(());
        }

        let mut plans = Vec::with_capacity(inclusions.len());
        for inclusion in inclusions {
            let definition = self.models.relation_definition(model, &inclusion.relation)?;
            let strategy = ResolutionStrategy::select(&inclusion.relation, &definition)?;
            let resolver = match self.resolvers.get(definition.kind, strategy.kind()) {
                Some(resolver) => resolver,
                None if self.resolvers.supports(definition.kind) => {
                    return Err(FilterError::invalid_argument(format!(
                        "The relation type \"{}\" does not support the \"{}\" resolution strategy.",
                        definition.kind,
                        strategy.kind()
                    )))
                }
                None => {
                    return Err(FilterError::invalid_argument(format!(
                        "The relation type \"{}\" does not have an inclusion resolver.",
                        definition.kind
                    )))
                }
            };
            let resolution = Resolution {
                source_model: model.to_string(),
                relation_name: inclusion.relation,
                strategy,
                scope: inclusion.scope.map(|scope| *scope),
            };
            plans.push((Arc::clone(resolver), resolution));
        }

        let shared: &[Value] = entities;
        let tasks = plans.iter().map(|(resolver, resolution)| async move {
            log_event(
                Event::IncludeDispatch,
                &[
                    ("model", resolution.source_model.as_str()),
                    ("relation", resolution.relation_name.as_str()),
                    ("strategy", resolution.strategy.name()),
                ],
            );
            let values = resolver.resolve(shared, resolution).await.inspect_err(|e| {
                log_event(
                    Event::IncludeFailed,
                    &[
                        ("error", e.to_string().as_str()),
                        ("relation", resolution.relation_name.as_str()),
                    ],
                );
            })?;
            if values.len() != shared.len() {
                return Err(FilterError::resolution(
                    resolution.relation_name.clone(),
                    format!("expected {} results, got {}", shared.len(), values.len()),
                ));
            }
            Ok::<_, FilterError>((resolution.relation_name.as_str(), values))
        });
        let resolved = try_join_all(tasks).await?;

        for (relation, values) in resolved {
            for (entity, value) in entities.iter_mut().zip(values) {
                if let (Some(object), Some(value)) = (entity.as_object_mut(), value) {
                    object.insert(relation.to_string(), value);
                }
            }
            log_event(Event::IncludeResolved, &[("model", model), ("relation", relation)]);
        }
        Ok(())
    }
}
