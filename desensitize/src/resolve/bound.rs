use super::{Context, Resolver};
use crate::{
    descriptor::{NodeKind, TypeNode},
    error::{DesensitizeError, Result},
    value::Value,
};

/// Unwraps a bounded variable into the bound that fits the runtime value.
///
/// The first bound accepting the value wins; when none does, the first bound
/// is used. Markers and cascade requests on the variable itself carry over to
/// the chosen bound, which is then resolved through the whole pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundResolver;

impl Resolver for BoundResolver {
    fn name(&self) -> &str {
        "bound"
    }

    fn supports(&self, _value: &Value, node: &TypeNode) -> bool {
        node.kind() == NodeKind::Bounded
    }

    fn resolve(&self, value: Value, node: &TypeNode, cx: &mut Context<'_>) -> Result<Value> {
        let bounds = node.elements();
        let bound = bounds
            .iter()
            .find(|bound| bound.accepts(&value))
            .or_else(|| bounds.first())
            .ok_or_else(|| {
                DesensitizeError::MalformedDescriptor("bounded node without bounds".into())
            })?;
        cx.resolve(value, &bound.merged_with(node))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        class::Class,
        descriptor::TypeNode,
        engine::Engine,
        marker::Marker,
        value::{Object, Sequence, Value},
    };

    #[test]
    fn picks_the_bound_matching_the_value() {
        let engine = Engine::default();
        let node = TypeNode::bounded([
            TypeNode::sequence(TypeNode::string().with_marker(Marker::mask(1, 0))),
            TypeNode::string().with_marker(Marker::mask(0, 1)),
        ]);

        let list = Value::Seq(Sequence::from_items("Vec", vec!["abc".into()]));
        let out = engine.desensitize_value_with(&list, &node).unwrap();
        assert_eq!(
            out,
            Value::Seq(Sequence::from_items("Vec", vec!["a**".into()]))
        );

        let out = engine
            .desensitize_value_with(&Value::from("abc"), &node)
            .unwrap();
        assert_eq!(out, Value::from("**c"));
    }

    #[test]
    fn variable_markers_apply_to_the_chosen_bound() {
        let engine = Engine::default();
        let node = TypeNode::bounded([TypeNode::string()]).with_marker(Marker::mask(2, 0));
        let out = engine
            .desensitize_value_with(&Value::from("abcd"), &node)
            .unwrap();
        assert_eq!(out, Value::from("ab**"));
    }

    #[test]
    fn bounds_select_by_class_ancestry() {
        let base = Class::builder("Base")
            .field("secret", TypeNode::string().with_marker(Marker::mask(0, 0)))
            .zeroed()
            .build();
        let derived = Class::builder("Derived").parent(base).zeroed().build();
        let object = Object::from_slots(derived, vec!["xyz".into()]);
        let node = TypeNode::bounded([
            TypeNode::string(),
            TypeNode::scalar("Base").cascading(),
        ]);

        let out = Engine::default()
            .desensitize_value_with(&Value::object(object), &node)
            .unwrap();
        assert_eq!(out.as_object().unwrap().get("secret"), Some(Value::from("***")));
    }
}
