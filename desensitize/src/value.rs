//! The dynamic value graph the engine walks.
//!
//! Rust values enter the engine through [`crate::SensitiveType`], which lowers
//! them into [`Value`]s. Callers that assemble graphs by hand (for example to
//! build self-referential objects) use this module directly.
//!
//! Composite objects are reference types: an [`ObjectRef`] is a shared handle,
//! and cloning the handle shares identity. Everything else is a plain value.

use std::{
    borrow::Cow,
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
    sync::Arc,
};

use crate::class::{Class, SlotIter};

// =============================================================================
// TypeName
// =============================================================================

/// Name of a runtime type: a class, a container family or a scalar class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Cow<'static, str>);

impl TypeName {
    /// Wraps a type name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeName {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

// =============================================================================
// ValueClass
// =============================================================================

/// Coarse runtime class of a [`Value`].
///
/// Transformers declare which classes they support; dispatch on any other class
/// is skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueClass {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    Char,
    Str,
    Array,
    Seq,
    Map,
    Object,
}

impl ValueClass {
    /// Name used as the runtime type name of scalar values.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "i64",
            Self::UInt => "u64",
            Self::Float => "f64",
            Self::Char => "char",
            Self::Str => "String",
            Self::Array => "array",
            Self::Seq => "sequence",
            Self::Map => "map",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Containers
// =============================================================================

/// An ordered container tagged with its concrete runtime type.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    type_name: TypeName,
    items: Vec<Value>,
}

impl Sequence {
    /// Creates an empty sequence of the given runtime type.
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self {
            type_name: type_name.into(),
            items: Vec::new(),
        }
    }

    /// Creates a sequence from its elements.
    pub fn from_items(type_name: impl Into<TypeName>, items: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            items,
        }
    }

    /// An empty sequence of the same runtime type.
    pub fn empty_like(&self) -> Self {
        Self::new(self.type_name.clone())
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Value] {
        &mut self.items
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

/// A key/value container preserving iteration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Mapping {
    type_name: TypeName,
    entries: Vec<(Value, Value)>,
}

impl Mapping {
    /// Creates an empty map of the given runtime type.
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self {
            type_name: type_name.into(),
            entries: Vec::new(),
        }
    }

    /// Creates a map from its entries.
    pub fn from_entries(type_name: impl Into<TypeName>, entries: Vec<(Value, Value)>) -> Self {
        Self {
            type_name: type_name.into(),
            entries,
        }
    }

    /// An empty map of the same runtime type.
    pub fn empty_like(&self) -> Self {
        Self::new(self.type_name.clone())
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [(Value, Value)] {
        &mut self.entries
    }

    /// Returns the value stored under the first key equal to `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Appends an entry, keeping insertion order.
    pub fn insert(&mut self, key: Value, value: Value) {
        self.entries.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(Value, Value)> {
        self.entries
    }
}

/// A fixed-length array with a declared component type.
#[derive(Clone, Debug, PartialEq)]
pub struct Array {
    component: TypeName,
    items: Vec<Value>,
}

impl Array {
    pub fn new(component: impl Into<TypeName>, items: Vec<Value>) -> Self {
        Self {
            component: component.into(),
            items,
        }
    }

    pub fn component(&self) -> &TypeName {
        &self.component
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Value] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

// =============================================================================
// Objects
// =============================================================================

/// A composite object: a class plus one slot per field in its class chain.
#[derive(Clone)]
pub struct Object {
    class: Arc<Class>,
    slots: Vec<Value>,
}

impl Object {
    /// Creates an instance with every slot set to [`Value::Null`].
    ///
    /// This is the zero-value constructor registered by
    /// [`crate::ClassBuilder::zeroed`].
    pub fn zeroed(class: Arc<Class>) -> Self {
        let slots = vec![Value::Null; class.slot_count()];
        Self { class, slots }
    }

    /// Creates an instance from slots laid out ancestors-first.
    ///
    /// Missing trailing slots are filled with [`Value::Null`]; extra slots are
    /// dropped.
    pub fn from_slots(class: Arc<Class>, mut slots: Vec<Value>) -> Self {
        slots.resize(class.slot_count(), Value::Null);
        Self { class, slots }
    }

    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Reads a field by name, preferring the most-derived declaration.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.class.slot_of(name).map(|slot| &self.slots[slot])
    }

    /// Writes a field by name. Returns `false` if no such field exists.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.class.slot_of(name) {
            Some(slot) => {
                self.slots[slot] = value;
                true
            }
            None => false,
        }
    }

    /// Reads the field `name` as declared on the ancestor `class_name`.
    pub fn get_declared(&self, class_name: &str, name: &str) -> Option<&Value> {
        self.class
            .declared_slot_of(class_name, name)
            .map(|slot| &self.slots[slot])
    }

    pub fn slot(&self, index: usize) -> &Value {
        &self.slots[index]
    }

    pub(crate) fn set_slot(&mut self, index: usize, value: Value) {
        self.slots[index] = value;
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Value] {
        &mut self.slots
    }

    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<Value> {
        self.slots
    }

    /// Iterates `(slot, field)` pairs over the whole class chain.
    pub fn fields(&self) -> SlotIter<'_> {
        self.class.all_fields()
    }
}

/// Shared, identity-bearing handle to an [`Object`].
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    /// Reference identity of the underlying object.
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn class(&self) -> Arc<Class> {
        Arc::clone(self.0.borrow().class())
    }

    /// Reads a field by name, cloning the value out of the object.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.borrow().get(name).cloned()
    }

    /// Writes a field by name. Returns `false` if no such field exists.
    pub fn set(&self, name: &str, value: Value) -> bool {
        self.0.borrow_mut().set(name, value)
    }

    /// Takes the slots out, avoiding a copy when this is the only handle.
    pub fn into_slots(self) -> Vec<Value> {
        match Rc::try_unwrap(self.0) {
            Ok(cell) => cell.into_inner().into_slots(),
            Err(shared) => shared.borrow().slots().to_vec(),
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => write!(f, "{}@{:#x}", object.class().name(), self.identity()),
            Err(_) => write!(f, "<borrowed>@{:#x}", self.identity()),
        }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// =============================================================================
// Value
// =============================================================================

/// A node of the value graph.
///
/// Equality on objects is reference identity; it never recurses into fields,
/// which may be cyclic.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(String),
    Array(Array),
    Seq(Sequence),
    Map(Mapping),
    Object(ObjectRef),
}

impl Value {
    /// Wraps an object in a fresh handle.
    pub fn object(object: Object) -> Self {
        Self::Object(ObjectRef::new(object))
    }

    pub fn class(&self) -> ValueClass {
        match self {
            Self::Null => ValueClass::Null,
            Self::Bool(_) => ValueClass::Bool,
            Self::Int(_) => ValueClass::Int,
            Self::UInt(_) => ValueClass::UInt,
            Self::Float(_) => ValueClass::Float,
            Self::Char(_) => ValueClass::Char,
            Self::Str(_) => ValueClass::Str,
            Self::Array(_) => ValueClass::Array,
            Self::Seq(_) => ValueClass::Seq,
            Self::Map(_) => ValueClass::Map,
            Self::Object(_) => ValueClass::Object,
        }
    }

    /// Concrete runtime type name.
    pub fn type_name(&self) -> TypeName {
        match self {
            Self::Seq(seq) => seq.type_name().clone(),
            Self::Map(map) => map.type_name().clone(),
            Self::Array(array) => TypeName::new(format!("[{}]", array.component())),
            Self::Object(object) => object.class().name().clone(),
            other => TypeName::new(other.class().as_str()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&Sequence> {
        match self {
            Self::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    /// `false` for null, empty strings and empty containers.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Str(s) => !s.is_empty(),
            Self::Array(array) => !array.is_empty(),
            Self::Seq(seq) => !seq.is_empty(),
            Self::Map(map) => !map.is_empty(),
            _ => true,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl From<Sequence> for Value {
    fn from(value: Sequence) -> Self {
        Self::Seq(value)
    }
}

impl From<Mapping> for Value {
    fn from(value: Mapping) -> Self {
        Self::Map(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Self::Array(value)
    }
}
