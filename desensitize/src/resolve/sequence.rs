use super::{Context, Resolver};
use crate::{
    descriptor::{NodeKind, TypeNode},
    error::{DesensitizeError, Result},
    value::Value,
};

/// Rebuilds an ordered container element by element.
///
/// The output container is a fresh instance of the input's runtime type; each
/// element is resolved against the node's element descriptor.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceResolver;

impl Resolver for SequenceResolver {
    fn name(&self) -> &str {
        "sequence"
    }

    fn supports(&self, value: &Value, node: &TypeNode) -> bool {
        node.kind() == NodeKind::Sequence && matches!(value, Value::Seq(_))
    }

    fn resolve(&self, value: Value, node: &TypeNode, cx: &mut Context<'_>) -> Result<Value> {
        let element = node.element().ok_or_else(|| {
            DesensitizeError::MalformedDescriptor("sequence node without element".into())
        })?;
        let fresh = cx.instantiate(&value)?;
        let (Value::Seq(input), Value::Seq(mut output)) = (value, fresh) else {
            return Err(DesensitizeError::mismatch(
                "sequence",
                "a different container family",
            ));
        };
        for item in input.into_items() {
            output.push(cx.resolve(item, element)?);
        }
        Ok(Value::Seq(output))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        descriptor::TypeNode,
        engine::Engine,
        marker::Marker,
        value::{Sequence, Value},
    };

    #[test]
    fn elements_are_resolved_in_order() {
        let node = TypeNode::sequence(TypeNode::string().with_marker(Marker::mask(1, 1)));
        let list = Value::Seq(Sequence::from_items(
            "VecDeque",
            vec!["abc".into(), Value::Null, "wxyz".into()],
        ));
        let out = Engine::default().desensitize_value_with(&list, &node).unwrap();
        assert_eq!(
            out,
            Value::Seq(Sequence::from_items(
                "VecDeque",
                vec!["a*c".into(), Value::Null, "w**z".into()],
            ))
        );
    }

    #[test]
    fn nested_sequences_recurse() {
        let node = TypeNode::sequence(TypeNode::sequence(
            TypeNode::string().with_marker(Marker::mask(0, 0)),
        ));
        let inner = Value::Seq(Sequence::from_items("Vec", vec!["ab".into()]));
        let outer = Value::Seq(Sequence::from_items("Vec", vec![inner]));
        let out = Engine::default().desensitize_value_with(&outer, &node).unwrap();
        let expected = Value::Seq(Sequence::from_items(
            "Vec",
            vec![Value::Seq(Sequence::from_items("Vec", vec!["**".into()]))],
        ));
        assert_eq!(out, expected);
    }
}
