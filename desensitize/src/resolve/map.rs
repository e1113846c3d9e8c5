use super::{Context, Resolver};
use crate::{
    descriptor::{NodeKind, TypeNode},
    error::{DesensitizeError, Result},
    value::Value,
};

/// Rebuilds a map entry by entry, resolving keys against the key descriptor
/// and values against the value descriptor.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapResolver;

impl Resolver for MapResolver {
    fn name(&self) -> &str {
        "map"
    }

    fn supports(&self, value: &Value, node: &TypeNode) -> bool {
        node.kind() == NodeKind::Map && matches!(value, Value::Map(_))
    }

    fn resolve(&self, value: Value, node: &TypeNode, cx: &mut Context<'_>) -> Result<Value> {
        let (Some(key_node), Some(value_node)) = (node.key(), node.value()) else {
            return Err(DesensitizeError::MalformedDescriptor(
                "map node without key and value".into(),
            ));
        };
        let fresh = cx.instantiate(&value)?;
        let (Value::Map(input), Value::Map(mut output)) = (value, fresh) else {
            return Err(DesensitizeError::mismatch("map", "a different container family"));
        };
        for (key, entry) in input.into_entries() {
            let key = cx.resolve(key, key_node)?;
            let entry = cx.resolve(entry, value_node)?;
            output.insert(key, entry);
        }
        Ok(Value::Map(output))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        descriptor::TypeNode,
        engine::Engine,
        marker::Marker,
        value::{Mapping, Value},
    };

    #[test]
    fn values_are_masked_and_keys_kept() {
        let node = TypeNode::map(
            TypeNode::string(),
            TypeNode::string().with_marker(Marker::mask(3, 4)),
        );
        let map = Value::Map(Mapping::from_entries(
            "BTreeMap",
            vec![("home".into(), "19962000001".into())],
        ));
        let out = Engine::default().desensitize_value_with(&map, &node).unwrap();
        let out = out.as_map().unwrap();
        assert_eq!(out.type_name().as_str(), "BTreeMap");
        assert_eq!(out.get(&"home".into()), Some(&Value::from("199****0001")));
    }

    #[test]
    fn keys_can_carry_markers() {
        let node = TypeNode::map(
            TypeNode::string().with_marker(Marker::mask(1, 0)),
            TypeNode::any(),
        );
        let map = Value::Map(Mapping::from_entries(
            "HashMap",
            vec![("secret".into(), Value::Int(7))],
        ));
        let out = Engine::default().desensitize_value_with(&map, &node).unwrap();
        assert_eq!(
            out.as_map().unwrap().entries(),
            &[(Value::from("s*****"), Value::Int(7))]
        );
    }
}
