//! The resolver pipeline.
//!
//! Every call walks the value graph through one [`Pipeline`]: for a value and
//! its descriptor node, each registered [`Resolver`] whose
//! [`Resolver::supports`] predicate holds runs in ascending priority order, and
//! each one may replace the value the next one sees. Resolvers recurse by
//! calling [`Context::resolve`] on sub-values.
//!
//! The built-in order is fixed by [`priority`]:
//!
//! ```text
//! bound -> sequence -> map -> array -> marker -> cascade
//! ```
//!
//! Bounds are unwrapped before anything else inspects the node. Containers
//! visit their elements before any marker on the container itself fires.
//! Marker dispatch beats structural descent. Cascading into an object's fields
//! runs last, and only when requested.

mod array;
mod bound;
mod cascade;
mod map;
mod marker;
mod sequence;

use std::sync::Arc;

pub use array::ArrayResolver;
pub use bound::BoundResolver;
pub use cascade::CascadeResolver;
pub use map::MapResolver;
pub use marker::MarkerResolver;
pub use sequence::SequenceResolver;

use crate::{
    descriptor::TypeNode,
    engine::Engine,
    error::{DesensitizeError, FieldFailure, Result},
    marker::{Marker, Reference},
    transform::{Condition, Transformer},
    value::Value,
    visited::VisitedSet,
};

/// Priorities of the built-in resolvers. Lower runs first.
pub mod priority {
    pub const BOUND: i32 = 100;
    pub const SEQUENCE: i32 = 200;
    pub const MAP: i32 = 300;
    pub const ARRAY: i32 = 400;
    pub const MARKER: i32 = 500;
    pub const CASCADE: i32 = 600;
}

/// One stage of the pipeline.
pub trait Resolver: Send + Sync {
    /// Name used in logs and in duplicate-priority errors.
    fn name(&self) -> &str;

    /// Whether this resolver handles `value` at `node`.
    fn supports(&self, value: &Value, node: &TypeNode) -> bool;

    /// Produces the value the next stage sees.
    fn resolve(&self, value: Value, node: &TypeNode, cx: &mut Context<'_>) -> Result<Value>;
}

struct Stage {
    priority: i32,
    resolver: Arc<dyn Resolver>,
}

/// Resolvers sorted by priority.
pub(crate) struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Sorts the stages, rejecting two resolvers sharing a priority.
    pub(crate) fn new(resolvers: Vec<(i32, Arc<dyn Resolver>)>) -> Result<Self> {
        let pipeline = Self::sorted(resolvers);
        if let Some(pair) = pipeline
            .stages
            .windows(2)
            .find(|pair| pair[0].priority == pair[1].priority)
        {
            return Err(DesensitizeError::DuplicatePriority {
                priority: pair[0].priority,
                existing: pair[0].resolver.name().to_owned(),
            });
        }
        Ok(pipeline)
    }

    /// Sorts the stages without checking for shared priorities.
    pub(crate) fn sorted(resolvers: Vec<(i32, Arc<dyn Resolver>)>) -> Self {
        let mut stages: Vec<Stage> = resolvers
            .into_iter()
            .map(|(priority, resolver)| Stage { priority, resolver })
            .collect();
        stages.sort_by_key(|stage| stage.priority);
        Self { stages }
    }

    fn run(&self, value: Value, node: &TypeNode, cx: &mut Context<'_>) -> Result<Value> {
        let mut value = value;
        for stage in &self.stages {
            if stage.resolver.supports(&value, node) {
                tracing::trace!(
                    resolver = stage.resolver.name(),
                    priority = stage.priority,
                    value_type = %value.type_name(),
                    "resolving"
                );
                value = stage.resolver.resolve(value, node, cx)?;
            }
        }
        Ok(value)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = (i32, &str)> {
        self.stages
            .iter()
            .map(|stage| (stage.priority, stage.resolver.name()))
    }
}

/// State of one top-level call.
///
/// Owns the call's [`VisitedSet`]; it is created when the call starts and
/// dropped when it returns, whatever the outcome.
pub struct Context<'e> {
    engine: &'e Engine,
    visited: VisitedSet,
}

impl<'e> Context<'e> {
    pub(crate) fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            visited: VisitedSet::new(),
        }
    }

    /// Runs the full pipeline on a sub-value.
    pub fn resolve(&mut self, value: Value, node: &TypeNode) -> Result<Value> {
        let engine = self.engine;
        engine.pipeline().run(value, node, self)
    }

    /// A fresh, empty instance of `template`'s runtime type.
    pub fn instantiate(&self, template: &Value) -> Result<Value> {
        self.engine.instantiator().instantiate(template)
    }

    /// The transformer that handles `marker`: its override, else the one
    /// registered for its kind.
    pub fn transformer(&self, marker: &Marker) -> Result<Arc<dyn Transformer>> {
        match marker.transformer() {
            Some(Reference::Instance(transformer)) => Ok(Arc::clone(transformer)),
            Some(Reference::Named(kind)) => self.engine.transformer(kind),
            None => self.engine.transformer(marker.kind().as_str()),
        }
    }

    /// The condition gating `marker`, if it has one.
    pub fn condition(&self, marker: &Marker) -> Result<Option<Arc<dyn Condition>>> {
        match marker.condition() {
            Some(Reference::Instance(condition)) => Ok(Some(Arc::clone(condition))),
            Some(Reference::Named(name)) => self.engine.condition(name).map(Some),
            None => Ok(None),
        }
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn visited_mut(&mut self) -> &mut VisitedSet {
        &mut self.visited
    }

    /// Hands a recovered field failure to the engine's reporter.
    pub fn report(&self, failure: &FieldFailure) {
        self.engine.reporter().report(failure);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{priority, BoundResolver, MarkerResolver, Pipeline, Resolver};
    use crate::error::DesensitizeError;

    #[test]
    fn builtin_priorities_follow_required_order() {
        let order = [
            priority::BOUND,
            priority::SEQUENCE,
            priority::MAP,
            priority::ARRAY,
            priority::MARKER,
            priority::CASCADE,
        ];
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn stages_are_sorted_by_priority() {
        let pipeline = Pipeline::new(vec![
            (5, Arc::new(MarkerResolver) as Arc<dyn Resolver>),
            (1, Arc::new(BoundResolver)),
        ])
        .unwrap();
        let names: Vec<_> = pipeline.names().map(|(_, name)| name.to_owned()).collect();
        assert_eq!(names, ["bound", "marker"]);
    }

    #[test]
    fn duplicate_priorities_are_rejected() {
        let err = Pipeline::new(vec![
            (5, Arc::new(MarkerResolver) as Arc<dyn Resolver>),
            (5, Arc::new(BoundResolver)),
        ])
        .err()
        .unwrap();
        assert!(matches!(err, DesensitizeError::DuplicatePriority { priority: 5, .. }));
    }
}
