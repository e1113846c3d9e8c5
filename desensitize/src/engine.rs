//! The engine: registries, the resolver pipeline and the entry API.
//!
//! An [`Engine`] is assembled once through [`EngineBuilder`] and is immutable
//! afterwards, so concurrent calls only ever read it. Each call owns its own
//! cycle guard.
//!
//! ```rust
//! use desensitize::{Engine, Marker, TypeNode, Value};
//!
//! let engine = Engine::default();
//! let phone = TypeNode::string().with_marker(Marker::mask(3, 4));
//! let out = engine
//!     .desensitize_value_with(&Value::from("19962000001"), &phone)
//!     .unwrap();
//! assert_eq!(out, Value::from("199****0001"));
//! ```
//!
//! Most programs use the process-wide engine through [`crate::desensitize`];
//! call [`install`] once at startup to replace its configuration.

use std::{borrow::Cow, collections::HashMap, fmt, sync::Arc};

use once_cell::sync::OnceCell;

use crate::{
    construct::{ConstructionStrategy, Instantiator},
    descriptor::TypeNode,
    error::{DesensitizeError, FailureReporter, Result, TracingReporter},
    marker::MarkerKind,
    resolve::{
        priority, ArrayResolver, BoundResolver, CascadeResolver, Context, MapResolver,
        MarkerResolver, Pipeline, Resolver, SequenceResolver,
    },
    transform::{Always, Condition, EmailTransformer, MaskTransformer, NonEmpty, Transformer},
    typed::SensitiveType,
    value::{TypeName, Value},
};

type Transformers = HashMap<Cow<'static, str>, Arc<dyn Transformer>>;
type Conditions = HashMap<Cow<'static, str>, Arc<dyn Condition>>;

/// Configures an [`Engine`].
///
/// [`EngineBuilder::new`] starts from the built-in resolvers, transformers and
/// conditions; registering under an existing name replaces the entry.
#[must_use]
pub struct EngineBuilder {
    resolvers: Vec<(i32, Arc<dyn Resolver>)>,
    transformers: Transformers,
    conditions: Conditions,
    strategies: HashMap<TypeName, Arc<dyn ConstructionStrategy>>,
    reporter: Arc<dyn FailureReporter>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        let resolvers: Vec<(i32, Arc<dyn Resolver>)> = vec![
            (priority::BOUND, Arc::new(BoundResolver)),
            (priority::SEQUENCE, Arc::new(SequenceResolver)),
            (priority::MAP, Arc::new(MapResolver)),
            (priority::ARRAY, Arc::new(ArrayResolver)),
            (priority::MARKER, Arc::new(MarkerResolver)),
            (priority::CASCADE, Arc::new(CascadeResolver)),
        ];
        let builder = Self {
            resolvers,
            transformers: HashMap::new(),
            conditions: HashMap::new(),
            strategies: HashMap::new(),
            reporter: Arc::new(TracingReporter),
        }
        .transformer(MarkerKind::MASK, MaskTransformer)
        .transformer(MarkerKind::EMAIL, EmailTransformer)
        .condition("always", Always)
        .condition("non_empty", NonEmpty);

        #[cfg(feature = "catalog")]
        let builder = crate::catalog::register(builder);

        builder
    }

    /// Adds a resolver at `priority`. Lower priorities run first; two
    /// resolvers may not share a priority.
    pub fn resolver<R>(mut self, priority: i32, resolver: R) -> Self
    where
        R: Resolver + 'static,
    {
        self.resolvers.push((priority, Arc::new(resolver)));
        self
    }

    /// Registers the transformer handling markers of `kind`.
    pub fn transformer<T>(mut self, kind: impl Into<MarkerKind>, transformer: T) -> Self
    where
        T: Transformer + 'static,
    {
        let kind = kind.into();
        self.transformers
            .insert(Cow::Owned(kind.as_str().to_owned()), Arc::new(transformer));
        self
    }

    /// Registers a condition markers can name.
    pub fn condition<C>(mut self, name: impl Into<Cow<'static, str>>, condition: C) -> Self
    where
        C: Condition + 'static,
    {
        self.conditions.insert(name.into(), Arc::new(condition));
        self
    }

    /// Uses `strategy` to build empty instances of `type_name`, bypassing the
    /// default strategies.
    pub fn construction_strategy<S>(mut self, type_name: impl Into<TypeName>, strategy: S) -> Self
    where
        S: ConstructionStrategy + 'static,
    {
        self.strategies.insert(type_name.into(), Arc::new(strategy));
        self
    }

    /// Receives field failures recovered at object boundaries.
    pub fn failure_reporter<R>(mut self, reporter: R) -> Self
    where
        R: FailureReporter + 'static,
    {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`DesensitizeError::DuplicatePriority`] when two resolvers share
    /// a priority.
    pub fn build(self) -> Result<Engine> {
        let pipeline = Pipeline::new(self.resolvers)?;
        for (priority, name) in pipeline.names() {
            tracing::debug!(priority, resolver = name, "registered resolver");
        }
        Ok(Engine {
            pipeline,
            transformers: self.transformers,
            conditions: self.conditions,
            instantiator: Instantiator::new(self.strategies),
            reporter: self.reporter,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("resolvers", &self.resolvers.len())
            .field("transformers", &self.transformers.keys().collect::<Vec<_>>())
            .field("conditions", &self.conditions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A configured desensitization engine.
pub struct Engine {
    pipeline: Pipeline,
    transformers: Transformers,
    conditions: Conditions,
    instantiator: Instantiator,
    reporter: Arc<dyn FailureReporter>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Returns a desensitized copy of `value`.
    ///
    /// The descriptor comes from `T`'s static shape, with cascading requested
    /// at every leaf so nested composite values are walked.
    pub fn desensitize<T: SensitiveType>(&self, value: T) -> Result<T> {
        let node = T::type_node().cascade_leaves();
        T::from_value(self.run(value.into_value(), &node)?)
    }

    /// Returns a desensitized copy of `value` described by `node`.
    ///
    /// `node` is used as given; markers absent from it are not applied.
    pub fn desensitize_with<T: SensitiveType>(&self, value: T, node: &TypeNode) -> Result<T> {
        T::from_value(self.run(value.into_value(), node)?)
    }

    /// Desensitizes a dynamic value, inferring its descriptor from its runtime
    /// shape.
    pub fn desensitize_value(&self, value: &Value) -> Result<Value> {
        self.run(value.clone(), &TypeNode::infer(value))
    }

    /// Desensitizes a dynamic value described by `node`.
    pub fn desensitize_value_with(&self, value: &Value, node: &TypeNode) -> Result<Value> {
        self.run(value.clone(), node)
    }

    fn run(&self, value: Value, node: &TypeNode) -> Result<Value> {
        node.validate()?;
        tracing::debug!(value_type = %value.type_name(), "desensitizing");
        let mut cx = Context::new(self);
        let out = cx.resolve(value, node).map(|out| cx.visited().relink(out));
        tracing::trace!(objects = cx.visited().len(), "desensitize call finished");
        out
    }

    /// Registered resolvers as `(priority, name)`, in execution order.
    pub fn resolvers(&self) -> impl Iterator<Item = (i32, &str)> {
        self.pipeline.names()
    }

    pub(crate) fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub(crate) fn instantiator(&self) -> &Instantiator {
        &self.instantiator
    }

    pub(crate) fn reporter(&self) -> &dyn FailureReporter {
        self.reporter.as_ref()
    }

    pub(crate) fn transformer(&self, kind: &str) -> Result<Arc<dyn Transformer>> {
        self.transformers
            .get(kind)
            .cloned()
            .ok_or_else(|| DesensitizeError::UnknownTransformer(kind.to_owned()))
    }

    pub(crate) fn condition(&self, name: &str) -> Result<Arc<dyn Condition>> {
        self.conditions
            .get(name)
            .cloned()
            .ok_or_else(|| DesensitizeError::UnknownCondition(name.to_owned()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        let builder = EngineBuilder::new();
        Self {
            pipeline: Pipeline::sorted(builder.resolvers),
            transformers: builder.transformers,
            conditions: builder.conditions,
            instantiator: Instantiator::new(builder.strategies),
            reporter: builder.reporter,
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("resolvers", &self.resolvers().collect::<Vec<_>>())
            .field("transformers", &self.transformers.keys().collect::<Vec<_>>())
            .field("conditions", &self.conditions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

static GLOBAL: OnceCell<Engine> = OnceCell::new();

/// Installs the process-wide engine.
///
/// Must run before the first call that uses the global engine; afterwards the
/// engine is fixed and the rejected one is handed back.
///
/// # Errors
///
/// Returns `engine` unchanged when a global engine already exists.
pub fn install(engine: Engine) -> std::result::Result<(), Engine> {
    GLOBAL.set(engine)
}

/// The process-wide engine, created with defaults on first use.
pub fn global() -> &'static Engine {
    GLOBAL.get_or_init(Engine::default)
}

/// Returns a desensitized copy of `value` using the global engine.
pub fn desensitize<T: SensitiveType>(value: T) -> Result<T> {
    global().desensitize(value)
}

/// Returns a desensitized copy of `value` described by `node`, using the
/// global engine.
pub fn desensitize_with<T: SensitiveType>(value: T, node: &TypeNode) -> Result<T> {
    global().desensitize_with(value, node)
}

#[cfg(test)]
mod tests {
    use super::{Engine, EngineBuilder};
    use crate::{
        descriptor::TypeNode,
        error::DesensitizeError,
        marker::Marker,
        resolve::{priority, MarkerResolver},
        value::{Sequence, Value},
        Result,
    };

    #[test]
    fn default_engine_runs_builtins_in_order() {
        let names: Vec<_> = Engine::default()
            .resolvers()
            .map(|(_, name)| name.to_owned())
            .collect();
        assert_eq!(names, ["bound", "sequence", "map", "array", "marker", "cascade"]);
    }

    #[test]
    fn duplicate_priority_fails_build() {
        let err = EngineBuilder::new()
            .resolver(priority::MARKER, MarkerResolver)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            DesensitizeError::DuplicatePriority { priority: 500, ref existing } if existing == "marker"
        ));
    }

    #[test]
    fn custom_transformers_register_by_kind() {
        let reverse = |value: Value, _: &Marker| -> Result<Value> {
            let reversed: Option<String> = value.as_str().map(|s| s.chars().rev().collect());
            Ok(reversed.into())
        };
        let engine = Engine::builder()
            .transformer("reverse", reverse)
            .build()
            .unwrap();
        let node = TypeNode::string().with_marker(Marker::new("reverse"));
        let out = engine
            .desensitize_value_with(&Value::from("abc"), &node)
            .unwrap();
        assert_eq!(out, Value::from("cba"));
    }

    #[test]
    fn malformed_descriptor_is_rejected_before_running() {
        let node = TypeNode::sequence(TypeNode::bounded(Vec::new()));
        let list = Value::Seq(Sequence::new("Vec"));
        let err = Engine::default()
            .desensitize_value_with(&list, &node)
            .unwrap_err();
        assert!(matches!(err, DesensitizeError::MalformedDescriptor(_)));
    }

    #[test]
    fn the_input_value_is_left_untouched() {
        let node = TypeNode::string().with_marker(Marker::mask(0, 0));
        let input = Value::from("secret");
        let out = Engine::default()
            .desensitize_value_with(&input, &node)
            .unwrap();
        assert_eq!(input, Value::from("secret"));
        assert_eq!(out, Value::from("******"));
    }

    #[test]
    fn typed_entry_uses_static_shape() {
        let engine = Engine::default();
        let marker = Marker::mask(1, 0).with_condition_named("non_empty");
        let node = TypeNode::sequence(TypeNode::string().with_marker(marker));
        let out = engine
            .desensitize_with(vec!["ann".to_owned(), String::new()], &node)
            .unwrap();
        assert_eq!(out, ["a**", ""]);
    }
}
