//! Identity-keyed cycle guard.
//!
//! One [`VisitedSet`] lives for exactly one top-level call. It maps every
//! object the cascade resolver has entered to the copy produced for it, so an
//! object reached through a second path (or through a cycle) resolves to that
//! same copy. Membership is reference identity, never equality.
//!
//! A copy abandoned after a recovered failure may already be linked from
//! other copies. [`VisitedSet::relink`] swaps every such link for the
//! original before the call returns.

use std::collections::HashMap;

use crate::value::{ObjectRef, Value};

#[derive(Default)]
pub struct VisitedSet {
    entries: HashMap<usize, Entry>,
    // Abandoned copy identity -> the original it stood in for.
    abandoned: HashMap<usize, Abandoned>,
}

struct Abandoned {
    _copy: ObjectRef,
    original: ObjectRef,
}

struct Entry {
    // Holding the original keeps its address from being reused mid-call.
    original: ObjectRef,
    copy: ObjectRef,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `original` has already been entered during this call.
    pub fn contains(&self, original: &ObjectRef) -> bool {
        self.entries.contains_key(&original.identity())
    }

    /// The object that stands in for `original` in the output graph.
    pub fn get(&self, original: &ObjectRef) -> Option<ObjectRef> {
        self.entries
            .get(&original.identity())
            .map(|entry| entry.copy.clone())
    }

    /// Records `copy` as the stand-in for `original`, replacing any earlier
    /// record.
    pub fn insert(&mut self, original: &ObjectRef, copy: ObjectRef) {
        self.entries.insert(
            original.identity(),
            Entry {
                original: original.clone(),
                copy,
            },
        );
    }

    /// Gives up on the copy recorded for `original`: later visits resolve to
    /// `original` itself, and links to the copy are rewritten by
    /// [`relink`](Self::relink).
    pub fn abandon(&mut self, original: &ObjectRef) {
        if let Some(copy) = self.get(original) {
            if !copy.ptr_eq(original) {
                self.abandoned.insert(
                    copy.identity(),
                    Abandoned {
                        _copy: copy,
                        original: original.clone(),
                    },
                );
            }
        }
        self.insert(original, original.clone());
    }

    /// Replaces every link to an abandoned copy, inside `value` and inside
    /// every copy made during this call, with the original object.
    ///
    /// Originals are never touched.
    pub fn relink(&self, mut value: Value) -> Value {
        if self.abandoned.is_empty() {
            return value;
        }
        for entry in self.entries.values() {
            if entry.copy.ptr_eq(&entry.original) {
                continue;
            }
            let mut copy = entry.copy.borrow_mut();
            for slot in copy.slots_mut() {
                self.relink_in_place(slot);
            }
        }
        self.relink_in_place(&mut value);
        value
    }

    fn relink_in_place(&self, value: &mut Value) {
        match value {
            Value::Object(object) => {
                if let Some(abandoned) = self.abandoned.get(&object.identity()) {
                    *object = abandoned.original.clone();
                }
            }
            Value::Seq(seq) => seq.items_mut().iter_mut().for_each(|v| self.relink_in_place(v)),
            Value::Array(array) => array
                .items_mut()
                .iter_mut()
                .for_each(|v| self.relink_in_place(v)),
            Value::Map(map) => {
                for (key, entry) in map.entries_mut() {
                    self.relink_in_place(key);
                    self.relink_in_place(entry);
                }
            }
            _ => {}
        }
    }

    /// Number of distinct objects entered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for VisitedSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitedSet")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::VisitedSet;
    use crate::{
        class::Class,
        value::{Object, ObjectRef, Value},
    };

    fn object() -> ObjectRef {
        ObjectRef::new(Object::zeroed(Class::builder("Node").zeroed().build()))
    }

    #[test]
    fn membership_is_by_identity() {
        let a = object();
        let b = object();
        let mut visited = VisitedSet::new();
        visited.insert(&a, a.clone());
        assert!(visited.contains(&a));
        assert!(visited.contains(&a.clone()));
        assert!(!visited.contains(&b));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn relink_swaps_abandoned_copies_for_originals() {
        let class = Class::builder("Node").field("next", crate::TypeNode::any()).zeroed().build();
        let original = ObjectRef::new(Object::zeroed(class.clone()));
        let abandoned = ObjectRef::new(Object::zeroed(class.clone()));
        let holder_original = ObjectRef::new(Object::zeroed(class.clone()));
        let holder_copy = ObjectRef::new(Object::zeroed(class));
        holder_copy.set("next", Value::Object(abandoned.clone()));

        let mut visited = VisitedSet::new();
        visited.insert(&original, abandoned.clone());
        visited.insert(&holder_original, holder_copy.clone());
        visited.abandon(&original);
        assert!(visited.get(&original).unwrap().ptr_eq(&original));

        let out = visited.relink(Value::Seq(crate::Sequence::from_items(
            "Vec",
            vec![Value::Object(abandoned), Value::Object(holder_copy.clone())],
        )));
        let items = out.as_seq().unwrap().items();
        assert!(items[0].as_object().unwrap().ptr_eq(&original));
        let next = holder_copy.get("next").unwrap();
        assert!(next.as_object().unwrap().ptr_eq(&original));
        assert_eq!(holder_original.get("next"), Some(Value::Null));
    }

    #[test]
    fn revisits_return_the_recorded_copy() {
        let original = object();
        let copy = object();
        let mut visited = VisitedSet::new();
        visited.insert(&original, copy.clone());
        assert!(visited.get(&original).unwrap().ptr_eq(&copy));

        visited.insert(&original, original.clone());
        assert!(visited.get(&original).unwrap().ptr_eq(&original));
        assert_eq!(visited.len(), 1);
    }
}
