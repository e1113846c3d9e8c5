use super::{Context, Resolver};
use crate::{
    descriptor::{NodeKind, TypeNode},
    error::{DesensitizeError, Result},
    value::{Array, Value},
};

/// Rebuilds a fixed-length array with the same component type and length.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArrayResolver;

impl Resolver for ArrayResolver {
    fn name(&self) -> &str {
        "array"
    }

    fn supports(&self, value: &Value, node: &TypeNode) -> bool {
        node.kind() == NodeKind::Array && matches!(value, Value::Array(_))
    }

    fn resolve(&self, value: Value, node: &TypeNode, cx: &mut Context<'_>) -> Result<Value> {
        let element = node.element().ok_or_else(|| {
            DesensitizeError::MalformedDescriptor("array node without element".into())
        })?;
        let Value::Array(array) = value else {
            return Ok(value);
        };
        let component = array.component().clone();
        let items = array
            .into_items()
            .into_iter()
            .map(|item| cx.resolve(item, element))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(Array::new(component, items)))
    }
}
