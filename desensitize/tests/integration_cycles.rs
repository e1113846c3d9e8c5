//! Object graphs with shared and cyclic references.
//!
//! Every object reachable from the input is copied at most once per call; a
//! reference back to an object already being copied resolves to its copy.

use desensitize::{Class, Engine, Marker, Object, ObjectRef, Sequence, TypeNode, Value};

fn node_class() -> std::sync::Arc<Class> {
    Class::builder("Node")
        .field("phone", TypeNode::string().with_marker(Marker::mask(3, 4)))
        .field("next", TypeNode::scalar("Node").cascading())
        .zeroed()
        .build()
}

fn node(class: &std::sync::Arc<Class>, phone: &str) -> ObjectRef {
    ObjectRef::new(Object::from_slots(
        class.clone(),
        vec![Value::from(phone), Value::Null],
    ))
}

fn next_of(object: &ObjectRef) -> ObjectRef {
    object
        .get("next")
        .and_then(|v| v.as_object().cloned())
        .expect("next is an object")
}

#[test]
fn test_self_reference_points_at_the_copy() {
    let class = node_class();
    let original = node(&class, "19962000001");
    original.set("next", Value::Object(original.clone()));

    let out = Engine::default()
        .desensitize_value(&Value::Object(original.clone()))
        .unwrap();
    let copy = out.as_object().unwrap();

    assert!(!copy.ptr_eq(&original));
    assert!(next_of(copy).ptr_eq(copy));
    assert_eq!(copy.get("phone"), Some(Value::from("199****0001")));
    assert_eq!(original.get("phone"), Some(Value::from("19962000001")));
}

#[test]
fn test_mutual_references_terminate() {
    let class = node_class();
    let a = node(&class, "13800138000");
    let b = node(&class, "13900139000");
    a.set("next", Value::Object(b.clone()));
    b.set("next", Value::Object(a.clone()));

    let out = Engine::default()
        .desensitize_value(&Value::Object(a.clone()))
        .unwrap();
    let a_copy = out.as_object().unwrap();
    let b_copy = next_of(a_copy);

    assert!(!b_copy.ptr_eq(&b));
    assert!(next_of(&b_copy).ptr_eq(a_copy));
    assert_eq!(a_copy.get("phone"), Some(Value::from("138****8000")));
    assert_eq!(b_copy.get("phone"), Some(Value::from("139****9000")));
}

#[test]
fn test_shared_object_is_copied_once() {
    let class = node_class();
    let shared = node(&class, "13800138000");
    let list = Value::Seq(Sequence::from_items(
        "Vec",
        vec![Value::Object(shared.clone()), Value::Object(shared.clone())],
    ));

    let out = Engine::default().desensitize_value(&list).unwrap();
    let items = out.as_seq().unwrap().items();
    let first = items[0].as_object().unwrap();
    let second = items[1].as_object().unwrap();

    assert!(first.ptr_eq(second));
    assert!(!first.ptr_eq(&shared));
    assert_eq!(first.get("phone"), Some(Value::from("138****8000")));
}

#[test]
fn test_long_chain_is_fully_copied() {
    let class = node_class();
    let head = node(&class, "10000000000");
    let mut tail = head.clone();
    for n in 1..50 {
        let next = node(&class, &format!("1{n:010}"));
        tail.set("next", Value::Object(next.clone()));
        tail = next;
    }
    tail.set("next", Value::Object(head.clone()));

    let out = Engine::default()
        .desensitize_value(&Value::Object(head.clone()))
        .unwrap();
    let copy_head = out.as_object().unwrap().clone();

    let mut cursor = copy_head.clone();
    for _ in 0..50 {
        let phone = cursor.get("phone").unwrap();
        assert!(phone.as_str().unwrap().contains("****"));
        cursor = next_of(&cursor);
    }
    assert!(cursor.ptr_eq(&copy_head));
}
