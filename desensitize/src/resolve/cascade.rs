use super::{Context, Resolver};
use crate::{
    descriptor::{NodeKind, TypeNode},
    error::{DesensitizeError, FieldFailure, Result},
    value::{ObjectRef, Value},
};

/// Walks a composite object's fields and produces a desensitized copy.
///
/// Runs when the node or the object's class requests cascading and nothing
/// earlier marked the position. Fields of the whole class chain are visited;
/// null and immutable fields are copied as-is.
///
/// An object already entered during this call resolves to the copy recorded
/// for it, so shared references and cycles survive in the output.
///
/// A recoverable failure on any field abandons the copy: the original object
/// is returned and the failure is reported. Copies that linked to the
/// abandoned one during the call are pointed at the original before the call
/// returns. Configuration errors propagate.
#[derive(Clone, Copy, Debug, Default)]
pub struct CascadeResolver;

impl CascadeResolver {
    /// Fills `copy` field by field. `Ok(Some(_))` carries the first
    /// recoverable field failure.
    fn copy_fields(
        original: &ObjectRef,
        copy: &ObjectRef,
        cx: &mut Context<'_>,
    ) -> Result<Option<FieldFailure>> {
        let class = original.class();
        for (slot, field) in class.all_fields() {
            let current = original.borrow().slot(slot).clone();
            let resolved = if field.is_immutable() || current.is_null() {
                current
            } else {
                match cx.resolve(current, field.node()) {
                    Ok(resolved) => resolved,
                    Err(error) if error.is_configuration() => return Err(error),
                    Err(error) => {
                        return Ok(Some(FieldFailure {
                            class: class.name().clone(),
                            field: field.name().to_owned(),
                            error,
                        }))
                    }
                }
            };
            copy.borrow_mut().set_slot(slot, resolved);
        }
        Ok(None)
    }
}

impl Resolver for CascadeResolver {
    fn name(&self) -> &str {
        "cascade"
    }

    fn supports(&self, value: &Value, node: &TypeNode) -> bool {
        let Value::Object(object) = value else {
            return false;
        };
        node.kind() == NodeKind::Scalar
            && !node.has_markers()
            && (node.cascades() || object.class().cascades())
    }

    fn resolve(&self, value: Value, _node: &TypeNode, cx: &mut Context<'_>) -> Result<Value> {
        let Value::Object(original) = value else {
            return Ok(value);
        };
        if let Some(copy) = cx.visited().get(&original) {
            return Ok(Value::Object(copy));
        }

        let slot_count = original.class().slot_count();
        let copy = match cx.instantiate(&Value::Object(original.clone()))? {
            Value::Object(copy) if copy.class().slot_count() == slot_count => copy,
            other => {
                return Err(DesensitizeError::mismatch(
                    "an instance with the same fields",
                    other.type_name(),
                ))
            }
        };
        cx.visited_mut().insert(&original, copy.clone());

        let Some(failure) = Self::copy_fields(&original, &copy, cx)? else {
            return Ok(Value::Object(copy));
        };

        cx.visited_mut().abandon(&original);
        cx.report(&failure);
        Ok(Value::Object(original))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::{
        class::Class,
        descriptor::TypeNode,
        engine::Engine,
        error::{DesensitizeError, FieldFailure},
        marker::Marker,
        value::{Object, ObjectRef, Value},
        Result,
    };

    fn user() -> Arc<Class> {
        Class::builder("User")
            .field("name", TypeNode::string().with_marker(Marker::mask(1, 0)))
            .field("phone", TypeNode::string().with_marker(Marker::mask(3, 4)))
            .field("friend", TypeNode::scalar("User").cascading())
            .cascade(true)
            .zeroed()
            .build()
    }

    fn new_user(name: &str, phone: &str) -> ObjectRef {
        ObjectRef::new(Object::from_slots(user(), vec![name.into(), phone.into()]))
    }

    #[test]
    fn produces_a_copy_and_leaves_the_original_alone() {
        let original = new_user("Ann", "19962000001");
        let out = Engine::default()
            .desensitize_value(&Value::Object(original.clone()))
            .unwrap();
        let copy = out.as_object().unwrap();
        assert!(!copy.ptr_eq(&original));
        assert_eq!(copy.get("name"), Some(Value::from("A**")));
        assert_eq!(copy.get("phone"), Some(Value::from("199****0001")));
        assert_eq!(copy.get("friend"), Some(Value::Null));
        assert_eq!(original.get("phone"), Some(Value::from("19962000001")));
    }

    #[test]
    fn self_reference_points_at_the_copy() {
        let original = new_user("Ann", "19962000001");
        original.set("friend", Value::Object(original.clone()));
        let out = Engine::default()
            .desensitize_value(&Value::Object(original.clone()))
            .unwrap();
        let copy = out.as_object().unwrap();
        let friend = copy.get("friend").unwrap();
        assert!(friend.as_object().unwrap().ptr_eq(copy));
    }

    #[test]
    fn immutable_fields_are_copied_verbatim() {
        let class = Class::builder("Token")
            .immutable_field("value", TypeNode::string().with_marker(Marker::mask(0, 0)))
            .cascade(true)
            .zeroed()
            .build();
        let object = Value::object(Object::from_slots(class, vec!["abc".into()]));
        let out = Engine::default().desensitize_value(&object).unwrap();
        assert_eq!(out.as_object().unwrap().get("value"), Some(Value::from("abc")));
    }

    #[test]
    fn field_failure_returns_original_and_reports() {
        let failing = |_: Value, _: &Marker| -> Result<Value> { Err(DesensitizeError::failed("boom")) };
        let class = Class::builder("Card")
            .field("holder", TypeNode::string().with_marker(Marker::mask(1, 0)))
            .field("number", TypeNode::string().with_marker(Marker::new("boom").with_transformer(failing)))
            .cascade(true)
            .zeroed()
            .build();
        let original = ObjectRef::new(Object::from_slots(class, vec!["Ann".into(), "4111".into()]));

        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let engine = Engine::builder()
            .failure_reporter(move |failure: &FieldFailure| {
                sink.lock().unwrap().push(format!("{}.{}", failure.class, failure.field));
            })
            .build()
            .unwrap();

        let out = engine.desensitize_value(&Value::Object(original.clone())).unwrap();
        assert!(out.as_object().unwrap().ptr_eq(&original));
        assert_eq!(original.get("holder"), Some(Value::from("Ann")));
        assert_eq!(seen.lock().unwrap().as_slice(), ["Card.number"]);
    }

    #[test]
    fn links_to_an_abandoned_copy_point_at_the_original() {
        let failing = |_: Value, _: &Marker| -> Result<Value> { Err(DesensitizeError::failed("boom")) };
        let account = Class::builder("Account")
            .field("owner", TypeNode::scalar("Owner").cascading())
            .field("number", TypeNode::string().with_marker(Marker::new("boom").with_transformer(failing)))
            .cascade(true)
            .zeroed()
            .build();
        let owner = Class::builder("Owner")
            .field("phone", TypeNode::string().with_marker(Marker::mask(3, 4)))
            .field("account", TypeNode::scalar("Account").cascading())
            .cascade(true)
            .zeroed()
            .build();
        let account = ObjectRef::new(Object::from_slots(account, vec![Value::Null, "4111".into()]));
        let owner = ObjectRef::new(Object::from_slots(
            owner,
            vec!["19962000001".into(), Value::Object(account.clone())],
        ));
        account.set("owner", Value::Object(owner.clone()));

        let engine = Engine::builder()
            .failure_reporter(|_: &FieldFailure| {})
            .build()
            .unwrap();
        let list = Value::Seq(crate::value::Sequence::from_items(
            "Vec",
            vec![Value::Object(account.clone()), Value::Object(owner.clone())],
        ));
        let out = engine.desensitize_value(&list).unwrap();
        let items = out.as_seq().unwrap().items();

        assert!(items[0].as_object().unwrap().ptr_eq(&account));
        let owner_copy = items[1].as_object().unwrap();
        assert!(!owner_copy.ptr_eq(&owner));
        assert_eq!(owner_copy.get("phone"), Some(Value::from("199****0001")));
        let linked = owner_copy.get("account").unwrap();
        assert!(linked.as_object().unwrap().ptr_eq(&account));
        assert_eq!(owner.get("phone"), Some(Value::from("19962000001")));
    }

    #[test]
    fn configuration_errors_are_not_recovered() {
        let class = Class::builder("Short")
            .field("code", TypeNode::string().with_marker(Marker::mask(6, 20)))
            .cascade(true)
            .zeroed()
            .build();
        let object = Value::object(Object::from_slots(class, vec!["0123456789".into()]));
        let err = Engine::default().desensitize_value(&object).unwrap_err();
        assert!(matches!(err, DesensitizeError::OffsetOutOfRange { start: 6, end: 20, len: 10 }));
    }

    #[test]
    fn classes_without_constructor_are_a_configuration_error() {
        let class = Class::builder("Opaque")
            .field("x", TypeNode::string())
            .cascade(true)
            .build();
        let object = Value::object(Object::zeroed(class));
        let err = Engine::default().desensitize_value(&object).unwrap_err();
        assert!(matches!(err, DesensitizeError::NoConstructionStrategy(_)));
    }
}
