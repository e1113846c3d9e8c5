//! Instance construction.
//!
//! When the engine rebuilds a composite object or a container it first asks
//! for an empty instance of the same concrete runtime type. Strategies are
//! tried in order:
//!
//! 1. a strategy registered for the type name via
//!    [`crate::EngineBuilder::construction_strategy`];
//! 2. [`ZeroArgConstructor`]: the class's zero-argument constructor;
//! 3. [`FamilyCopyConstructor`]: for sequences and maps, an empty container of
//!    the same family.
//!
//! There is no constructor-bypassing fallback. A class without a constructor
//! and without a registered strategy is a configuration error.
//!
//! The strategy chosen for a type name is cached.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{
    error::{DesensitizeError, Result},
    value::{ObjectRef, TypeName, Value},
};

/// Produces an empty instance shaped like a template value.
pub trait ConstructionStrategy: Send + Sync {
    /// Returns a fresh, empty instance of `template`'s runtime type.
    fn construct(&self, template: &Value) -> Result<Value>;
}

impl<F> ConstructionStrategy for F
where
    F: Fn(&Value) -> Result<Value> + Send + Sync,
{
    fn construct(&self, template: &Value) -> Result<Value> {
        self(template)
    }
}

/// Runs the class's zero-argument constructor.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroArgConstructor;

impl ZeroArgConstructor {
    fn applies(template: &Value) -> bool {
        template
            .as_object()
            .is_some_and(|object| object.borrow().class().has_constructor())
    }
}

impl ConstructionStrategy for ZeroArgConstructor {
    fn construct(&self, template: &Value) -> Result<Value> {
        let class = template
            .as_object()
            .map(ObjectRef::class)
            .ok_or_else(|| DesensitizeError::NoConstructionStrategy(template.type_name()))?;
        class
            .construct()
            .map(Value::object)
            .ok_or_else(|| DesensitizeError::NoConstructionStrategy(class.name().clone()))
    }
}

/// Builds an empty container of the template's family.
#[derive(Clone, Copy, Debug, Default)]
pub struct FamilyCopyConstructor;

impl FamilyCopyConstructor {
    fn applies(template: &Value) -> bool {
        matches!(template, Value::Seq(_) | Value::Map(_))
    }
}

impl ConstructionStrategy for FamilyCopyConstructor {
    fn construct(&self, template: &Value) -> Result<Value> {
        match template {
            Value::Seq(seq) => Ok(Value::Seq(seq.empty_like())),
            Value::Map(map) => Ok(Value::Map(map.empty_like())),
            other => Err(DesensitizeError::NoConstructionStrategy(other.type_name())),
        }
    }
}

/// Resolves and caches the construction strategy per runtime type.
pub(crate) struct Instantiator {
    custom: HashMap<TypeName, Arc<dyn ConstructionStrategy>>,
    cache: RwLock<HashMap<TypeName, Arc<dyn ConstructionStrategy>>>,
}

impl Instantiator {
    pub(crate) fn new(custom: HashMap<TypeName, Arc<dyn ConstructionStrategy>>) -> Self {
        Self {
            custom,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a fresh, empty instance of `template`'s runtime type.
    pub(crate) fn instantiate(&self, template: &Value) -> Result<Value> {
        let type_name = template.type_name();
        if let Some(strategy) = self.custom.get(&type_name) {
            return strategy.construct(template);
        }

        let cached = self.cache.read().get(&type_name).cloned();
        let strategy = match cached {
            Some(strategy) => strategy,
            None => {
                let strategy = Self::default_for(template)
                    .ok_or_else(|| DesensitizeError::NoConstructionStrategy(type_name.clone()))?;
                tracing::debug!(type_name = %type_name, "caching construction strategy");
                self.cache
                    .write()
                    .entry(type_name)
                    .or_insert(strategy)
                    .clone()
            }
        };
        strategy.construct(template)
    }

    fn default_for(template: &Value) -> Option<Arc<dyn ConstructionStrategy>> {
        if ZeroArgConstructor::applies(template) {
            Some(Arc::new(ZeroArgConstructor))
        } else if FamilyCopyConstructor::applies(template) {
            Some(Arc::new(FamilyCopyConstructor))
        } else {
            None
        }
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.cache.read().len()
    }
}
