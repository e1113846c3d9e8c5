//! JSON-friendly view of the value graph.
//!
//! Objects serialize as maps from field name to value, fields of ancestors
//! first. A field shadowed by a descendant is keyed `Ancestor::field`. An
//! object met again while it is still being serialized (a cycle) is written as
//! the string `"<cycle Class>"`.

use std::cell::RefCell;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::value::{ObjectRef, Value};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let path = RefCell::new(Vec::new());
        Guarded { value: self, path: &path }.serialize(serializer)
    }
}

struct Guarded<'a> {
    value: &'a Value,
    path: &'a RefCell<Vec<usize>>,
}

impl Guarded<'_> {
    fn child<'b>(&'b self, value: &'b Value) -> Guarded<'b> {
        Guarded {
            value,
            path: self.path,
        }
    }
}

impl Serialize for Guarded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Array(array) => self.items(array.items(), serializer),
            Value::Seq(seq) => self.items(seq.items(), serializer),
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.entries() {
                    out.serialize_entry(&self.child(key), &self.child(value))?;
                }
                out.end()
            }
            Value::Object(object) => self.object(object, serializer),
        }
    }
}

impl Guarded<'_> {
    fn items<S: Serializer>(&self, items: &[Value], serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            out.serialize_element(&self.child(item))?;
        }
        out.end()
    }

    fn object<S: Serializer>(&self, object: &ObjectRef, serializer: S) -> Result<S::Ok, S::Error> {
        let identity = object.identity();
        if self.path.borrow().contains(&identity) {
            return serializer.serialize_str(&format!("<cycle {}>", object.class().name()));
        }

        self.path.borrow_mut().push(identity);
        let result = self.fields(object, serializer);
        self.path.borrow_mut().pop();
        result
    }

    fn fields<S: Serializer>(&self, object: &ObjectRef, serializer: S) -> Result<S::Ok, S::Error> {
        let class = object.class();
        let object = object.borrow();
        let mut out = serializer.serialize_map(Some(class.slot_count()))?;
        let mut chain: Vec<_> = class.chain().collect();
        chain.reverse();
        for declaring in chain {
            for (index, field) in declaring.own_fields().iter().enumerate() {
                let slot = declaring.base_slot() + index;
                let value = self.child(object.slot(slot));
                if class.slot_of(field.name()) == Some(slot) {
                    out.serialize_entry(field.name(), &value)?;
                } else {
                    let key = format!("{}::{}", declaring.name(), field.name());
                    out.serialize_entry(&key, &value)?;
                }
            }
        }
        out.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        class::Class,
        descriptor::TypeNode,
        value::{Mapping, Object, ObjectRef, Sequence, Value},
    };

    #[test]
    fn containers_serialize_as_json() {
        let value = Value::Map(Mapping::from_entries(
            "BTreeMap",
            vec![(
                "tags".into(),
                Value::Seq(Sequence::from_items("Vec", vec!["a".into(), Value::Null])),
            )],
        ));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({"tags": ["a", null]}));
    }

    #[test]
    fn shadowed_fields_are_qualified() {
        let base = Class::builder("Base")
            .field("id", TypeNode::string())
            .zeroed()
            .build();
        let child = Class::builder("Child")
            .parent(base)
            .field("id", TypeNode::string())
            .zeroed()
            .build();
        let object = Value::object(Object::from_slots(child, vec!["b".into(), "c".into()]));
        assert_eq!(
            serde_json::to_value(&object).unwrap(),
            json!({"Base::id": "b", "id": "c"})
        );
    }

    #[test]
    fn cycles_are_cut() {
        let class = Class::builder("Node")
            .field("next", TypeNode::scalar("Node"))
            .zeroed()
            .build();
        let node = ObjectRef::new(Object::zeroed(class));
        node.set("next", Value::Object(node.clone()));
        assert_eq!(
            serde_json::to_value(Value::Object(node)).unwrap(),
            json!({"next": "<cycle Node>"})
        );
    }
}
