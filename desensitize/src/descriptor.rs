//! Type descriptors: the declared shape of a value plus its markers.
//!
//! A [`TypeNode`] describes one generic position. Nodes nest the way generic
//! parameters do:
//!
//! | Kind | Elements | Example |
//! |------|----------|---------|
//! | `Scalar` | 0 | `String`, `User` |
//! | `Array` | 1 | `[String; 4]` |
//! | `Sequence` | 1 | `Vec<String>` |
//! | `Map` | 2 (key, value) | `HashMap<String, User>` |
//! | `Bounded` | N bounds | a variable bounded by one of several shapes |
//!
//! Descriptors are immutable and cheap to clone; build one per call site and
//! reuse it across calls. Rust types produce theirs through
//! [`crate::SensitiveType::type_node`]; this module's builders cover the
//! positions a static type cannot express, such as "this particular list holds
//! emails".

use std::{fmt, sync::Arc};

use crate::{
    error::{DesensitizeError, Result},
    marker::Marker,
    value::{TypeName, Value, ValueClass},
};

/// Shape of a generic position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Array,
    Sequence,
    Map,
    Bounded,
}

impl NodeKind {
    fn arity_ok(self, elements: usize) -> bool {
        match self {
            Self::Scalar => elements == 0,
            Self::Array | Self::Sequence => elements == 1,
            Self::Map => elements == 2,
            Self::Bounded => elements > 0,
        }
    }
}

#[derive(Clone)]
struct NodeInner {
    kind: NodeKind,
    type_name: Option<TypeName>,
    elements: Vec<TypeNode>,
    markers: Vec<Marker>,
    cascade: bool,
}

/// One generic position of a declared shape.
#[derive(Clone)]
pub struct TypeNode(Arc<NodeInner>);

impl TypeNode {
    fn build(kind: NodeKind, elements: Vec<TypeNode>) -> Self {
        Self(Arc::new(NodeInner {
            kind,
            type_name: None,
            elements,
            markers: Vec::new(),
            cascade: false,
        }))
    }

    /// A scalar or composite position of the named runtime type.
    pub fn scalar(type_name: impl Into<TypeName>) -> Self {
        Self::build(NodeKind::Scalar, Vec::new()).named(type_name)
    }

    /// A scalar position accepting any runtime type.
    pub fn any() -> Self {
        Self::build(NodeKind::Scalar, Vec::new())
    }

    /// A `String` position.
    pub fn string() -> Self {
        Self::scalar(ValueClass::Str.as_str())
    }

    pub fn array(element: TypeNode) -> Self {
        Self::build(NodeKind::Array, vec![element])
    }

    pub fn sequence(element: TypeNode) -> Self {
        Self::build(NodeKind::Sequence, vec![element])
    }

    pub fn map(key: TypeNode, value: TypeNode) -> Self {
        Self::build(NodeKind::Map, vec![key, value])
    }

    /// A variable position bounded by `bounds`.
    ///
    /// At least one bound is required; an empty list is rejected when the
    /// descriptor is first used.
    pub fn bounded(bounds: impl IntoIterator<Item = TypeNode>) -> Self {
        Self::build(NodeKind::Bounded, bounds.into_iter().collect())
    }

    /// Builds a node from raw parts, enforcing the arity of `kind`.
    pub fn from_parts(kind: NodeKind, elements: Vec<TypeNode>) -> Result<Self> {
        if kind.arity_ok(elements.len()) {
            Ok(Self::build(kind, elements))
        } else {
            Err(DesensitizeError::MalformedDescriptor(format!(
                "{kind:?} node cannot have {} element node(s)",
                elements.len()
            )))
        }
    }

    /// Descriptor inferred from a value's runtime shape.
    ///
    /// Container element shapes come from the first non-null element. Every
    /// leaf requests cascading, so composite objects anywhere in the value are
    /// walked.
    pub fn infer(value: &Value) -> Self {
        fn first(items: impl Iterator<Item = Value>) -> TypeNode {
            let mut items = items;
            items
                .find(|item| !item.is_null())
                .map_or_else(|| TypeNode::any().cascading(), |item| TypeNode::infer(&item))
        }

        match value {
            Value::Seq(seq) => {
                Self::sequence(first(seq.items().iter().cloned())).named(seq.type_name().clone())
            }
            Value::Map(map) => Self::map(
                first(map.entries().iter().map(|(k, _)| k.clone())),
                first(map.entries().iter().map(|(_, v)| v.clone())),
            )
            .named(map.type_name().clone()),
            Value::Array(array) => Self::array(first(array.items().iter().cloned())),
            _ => Self::any().cascading(),
        }
    }

    fn inner_mut(&mut self) -> &mut NodeInner {
        Arc::make_mut(&mut self.0)
    }

    /// Sets the runtime type this position declares.
    #[must_use]
    pub fn named(mut self, type_name: impl Into<TypeName>) -> Self {
        self.inner_mut().type_name = Some(type_name.into());
        self
    }

    /// Attaches a marker to this position.
    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.inner_mut().markers.push(marker);
        self
    }

    #[must_use]
    pub fn with_markers(mut self, markers: impl IntoIterator<Item = Marker>) -> Self {
        self.inner_mut().markers.extend(markers);
        self
    }

    /// Requests cascading into a composite object found at this position.
    #[must_use]
    pub fn cascading(mut self) -> Self {
        self.inner_mut().cascade = true;
        self
    }

    /// Attaches `marker` to every leaf reachable through arrays, sequences,
    /// map values and bounds. Map keys are left alone.
    #[must_use]
    pub fn mark_leaves(self, marker: &Marker) -> Self {
        self.map_leaves(&|leaf: TypeNode| leaf.with_marker(marker.clone()))
    }

    /// Requests cascading at every leaf, as [`TypeNode::mark_leaves`] does for
    /// markers.
    #[must_use]
    pub fn cascade_leaves(self) -> Self {
        self.map_leaves(&TypeNode::cascading)
    }

    fn map_leaves(mut self, f: &dyn Fn(TypeNode) -> TypeNode) -> Self {
        match self.kind() {
            NodeKind::Scalar => f(self),
            NodeKind::Map => {
                let inner = self.inner_mut();
                let value = inner.elements[1].clone();
                inner.elements[1] = value.map_leaves(f);
                self
            }
            NodeKind::Array | NodeKind::Sequence | NodeKind::Bounded => {
                let inner = self.inner_mut();
                let elements = std::mem::take(&mut inner.elements);
                inner.elements = elements.into_iter().map(|e| e.map_leaves(f)).collect();
                self
            }
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    pub fn type_name(&self) -> Option<&TypeName> {
        self.0.type_name.as_ref()
    }

    pub fn elements(&self) -> &[TypeNode] {
        &self.0.elements
    }

    /// Element node of an array or sequence.
    pub fn element(&self) -> Option<&TypeNode> {
        match self.kind() {
            NodeKind::Array | NodeKind::Sequence => self.0.elements.first(),
            _ => None,
        }
    }

    /// Key node of a map.
    pub fn key(&self) -> Option<&TypeNode> {
        match self.kind() {
            NodeKind::Map => self.0.elements.first(),
            _ => None,
        }
    }

    /// Value node of a map.
    pub fn value(&self) -> Option<&TypeNode> {
        match self.kind() {
            NodeKind::Map => self.0.elements.get(1),
            _ => None,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.0.markers
    }

    pub fn has_markers(&self) -> bool {
        !self.0.markers.is_empty()
    }

    pub fn cascades(&self) -> bool {
        self.0.cascade
    }

    /// Checks arity invariants over the whole tree.
    pub fn validate(&self) -> Result<()> {
        if !self.kind().arity_ok(self.elements().len()) {
            return Err(DesensitizeError::MalformedDescriptor(format!(
                "{:?} node cannot have {} element node(s)",
                self.kind(),
                self.elements().len()
            )));
        }
        self.elements().iter().try_for_each(TypeNode::validate)
    }

    /// Whether `value` fits this position's declared shape.
    ///
    /// Used to choose among the bounds of a [`NodeKind::Bounded`] node. Null
    /// fits everywhere; an object fits a scalar position naming its class or
    /// any ancestor.
    pub fn accepts(&self, value: &Value) -> bool {
        let named = |actual: &TypeName| self.type_name().map_or(true, |name| name == actual);
        match (self.kind(), value) {
            (_, Value::Null) | (NodeKind::Bounded, _) => true,
            (NodeKind::Sequence, Value::Seq(seq)) => named(seq.type_name()),
            (NodeKind::Map, Value::Map(map)) => named(map.type_name()),
            (NodeKind::Array, Value::Array(_)) => true,
            (NodeKind::Scalar, Value::Seq(_) | Value::Map(_) | Value::Array(_)) => false,
            (NodeKind::Scalar, Value::Object(object)) => self
                .type_name()
                .map_or(true, |name| object.class().is_a(name.as_str())),
            (NodeKind::Scalar, other) => named(&other.type_name()),
            _ => false,
        }
    }

    /// Copy of this node with `extra` markers appended and cascade OR-ed in.
    pub(crate) fn merged_with(&self, extra: &TypeNode) -> Self {
        if !extra.has_markers() && !extra.cascades() {
            return self.clone();
        }
        let mut node = self.clone().with_markers(extra.markers().iter().cloned());
        if extra.cascades() {
            node = node.cascading();
        }
        node
    }
}

impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("TypeNode");
        debug.field("kind", &self.kind());
        if let Some(name) = self.type_name() {
            debug.field("type_name", name);
        }
        if !self.elements().is_empty() {
            debug.field("elements", &self.elements());
        }
        if self.has_markers() {
            debug.field("markers", &self.markers());
        }
        if self.cascades() {
            debug.field("cascade", &true);
        }
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeKind, TypeNode};
    use crate::{
        marker::Marker,
        value::{Mapping, Sequence, Value},
    };

    #[test]
    fn from_parts_enforces_arity() {
        assert!(TypeNode::from_parts(NodeKind::Map, vec![TypeNode::string()]).is_err());
        assert!(TypeNode::from_parts(NodeKind::Scalar, vec![TypeNode::string()]).is_err());
        assert!(TypeNode::from_parts(NodeKind::Bounded, vec![]).is_err());
        let node = TypeNode::from_parts(
            NodeKind::Map,
            vec![TypeNode::string(), TypeNode::string()],
        )
        .unwrap();
        assert!(node.key().is_some());
        assert!(node.value().is_some());
    }

    #[test]
    fn validate_walks_nested_nodes() {
        let node = TypeNode::sequence(TypeNode::bounded(Vec::new()));
        assert!(node.validate().is_err());
        assert!(TypeNode::map(TypeNode::string(), TypeNode::any())
            .validate()
            .is_ok());
    }

    #[test]
    fn mark_leaves_skips_map_keys() {
        let node = TypeNode::map(
            TypeNode::string(),
            TypeNode::sequence(TypeNode::string()),
        )
        .mark_leaves(&Marker::mask(1, 1));
        assert!(!node.key().unwrap().has_markers());
        let leaf = node.value().unwrap().element().unwrap();
        assert_eq!(leaf.markers().len(), 1);
        assert!(!node.has_markers());
    }

    #[test]
    fn descriptors_are_shared_and_unchanged_by_modifiers() {
        let base = TypeNode::string();
        let marked = base.clone().with_marker(Marker::mask(0, 0));
        assert!(!base.has_markers());
        assert!(marked.has_markers());
    }

    #[test]
    fn accepts_matches_shape_and_name() {
        let list = Value::Seq(Sequence::new("Vec"));
        let map = Value::Map(Mapping::new("HashMap"));
        assert!(TypeNode::sequence(TypeNode::any()).accepts(&list));
        assert!(!TypeNode::sequence(TypeNode::any()).named("VecDeque").accepts(&list));
        assert!(TypeNode::map(TypeNode::any(), TypeNode::any()).accepts(&map));
        assert!(!TypeNode::string().accepts(&list));
        assert!(TypeNode::string().accepts(&Value::from("x")));
        assert!(!TypeNode::string().accepts(&Value::Int(1)));
        assert!(TypeNode::string().accepts(&Value::Null));
    }

    #[test]
    fn inference_follows_first_present_element() {
        let list = Value::Seq(Sequence::from_items(
            "Vec",
            vec![Value::Null, Value::Seq(Sequence::new("Vec"))],
        ));
        let node = TypeNode::infer(&list);
        assert_eq!(node.kind(), NodeKind::Sequence);
        assert_eq!(node.element().unwrap().kind(), NodeKind::Sequence);
        assert!(TypeNode::infer(&Value::from("x")).cascades());
    }
}
