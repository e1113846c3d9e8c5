use super::{Context, Resolver};
use crate::{
    descriptor::{NodeKind, TypeNode},
    error::Result,
    marker::Marker,
    value::Value,
};

/// Applies the transformers of the markers attached to a node, in order.
///
/// Null values are absent values: no transformer runs on them. A transformer
/// that does not support the value's runtime class is skipped with a warning.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkerResolver;

impl MarkerResolver {
    fn dispatch(value: Value, marker: &Marker, cx: &Context<'_>) -> Result<Value> {
        let transformer = cx.transformer(marker)?;
        if !transformer.supports(value.class()) {
            tracing::warn!(
                marker = %marker.kind(),
                value_class = %value.class(),
                "transformer does not support value class, leaving value untouched"
            );
            return Ok(value);
        }
        if let Some(condition) = cx.condition(marker)? {
            if !condition.test(&value) {
                return Ok(value);
            }
        }
        if !transformer.should_transform(&value) {
            return Ok(value);
        }
        transformer.transform(value, marker)
    }
}

impl Resolver for MarkerResolver {
    fn name(&self) -> &str {
        "marker"
    }

    fn supports(&self, value: &Value, node: &TypeNode) -> bool {
        node.kind() != NodeKind::Bounded && node.has_markers() && !value.is_null()
    }

    fn resolve(&self, value: Value, node: &TypeNode, cx: &mut Context<'_>) -> Result<Value> {
        node.markers()
            .iter()
            .try_fold(value, |value, marker| Self::dispatch(value, marker, cx))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        descriptor::TypeNode,
        engine::Engine,
        error::DesensitizeError,
        marker::Marker,
        transform::NonEmpty,
        value::{Sequence, Value},
        Result,
    };

    fn run(value: Value, marker: Marker) -> Result<Value> {
        Engine::default().desensitize_value_with(&value, &TypeNode::any().with_marker(marker))
    }

    #[test]
    fn offsets_are_idempotent() {
        let once = run("19962000001".into(), Marker::mask(3, 4)).unwrap();
        assert_eq!(once, Value::from("199****0001"));
        let twice = run(once.clone(), Marker::mask(3, 4)).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn pattern_overrides_offsets() {
        let out = run("a1b2".into(), Marker::mask(1, 1).with_regexp(r"\d")).unwrap();
        assert_eq!(out, Value::from("a*b*"));
    }

    #[test]
    fn conditions_gate_each_element() {
        let node = TypeNode::sequence(
            TypeNode::string().with_marker(Marker::mask(0, 0).with_condition(NonEmpty)),
        );
        let list = Value::Seq(Sequence::from_items(
            "Vec",
            vec!["".into(), Value::Null, "123456".into()],
        ));
        let out = Engine::default().desensitize_value_with(&list, &node).unwrap();
        assert_eq!(
            out,
            Value::Seq(Sequence::from_items(
                "Vec",
                vec!["".into(), Value::Null, "******".into()],
            ))
        );
    }

    #[test]
    fn named_conditions_come_from_the_registry() {
        let out = run("".into(), Marker::mask(3, 4).with_condition_named("non_empty")).unwrap();
        assert_eq!(out, Value::from(""));

        let err = run("x".into(), Marker::mask(0, 0).with_condition_named("nope")).unwrap_err();
        assert!(matches!(err, DesensitizeError::UnknownCondition(name) if name == "nope"));
    }

    #[test]
    fn offsets_past_length_fail_fast() {
        let err = run("0123456789".into(), Marker::mask(6, 20)).unwrap_err();
        assert!(matches!(err, DesensitizeError::OffsetOutOfRange { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn unsupported_class_is_a_no_op() {
        let out = run(Value::Int(12345), Marker::mask(1, 1)).unwrap();
        assert_eq!(out, Value::Int(12345));
    }

    #[test]
    fn unknown_kind_is_a_configuration_error() {
        let err = run("x".into(), Marker::new("nobody")).unwrap_err();
        assert!(matches!(err, DesensitizeError::UnknownTransformer(kind) if kind == "nobody"));
    }

    #[test]
    fn inline_transformer_overrides_kind() {
        let upper = |value: Value, _: &Marker| -> Result<Value> {
            Ok(value.as_str().map_or(value.clone(), |s| s.to_uppercase().into()))
        };
        let out = run("abc".into(), Marker::new("nobody").with_transformer(upper)).unwrap();
        assert_eq!(out, Value::from("ABC"));
    }

    #[test]
    fn markers_apply_in_declaration_order() {
        let node = TypeNode::string()
            .with_marker(Marker::mask(0, 2))
            .with_marker(Marker::mask(0, 0).with_placeholder('#'));
        let out = Engine::default()
            .desensitize_value_with(&Value::from("abcd"), &node)
            .unwrap();
        assert_eq!(out, Value::from("####"));
    }
}
