//! Composite type schemas.
//!
//! A [`Class`] is the explicit stand-in for runtime reflection: it lists the
//! fields a composite type declares, links to its parent class, and carries the
//! zero-argument constructor used when the engine rebuilds an instance.
//!
//! ## Slot layout
//!
//! An object stores one slot per field of its whole class chain, ancestors
//! first:
//!
//! ```text
//! class Base    { phone }            slots: [phone]
//! class Child   : Base { id_card }   slots: [phone, id_card]
//! ```
//!
//! A subclass may re-declare a name its parent already uses. Name lookups
//! resolve to the most-derived declaration; [`Class::declared_slot_of`] reaches
//! the shadowed one.

use std::{borrow::Cow, fmt, sync::Arc};

use crate::{descriptor::TypeNode, value::Object, value::TypeName};

type Constructor = Arc<dyn Fn(&Arc<Class>) -> Object + Send + Sync>;

/// One declared field of a class.
#[derive(Clone, Debug)]
pub struct Field {
    name: Cow<'static, str>,
    node: TypeNode,
    immutable: bool,
}

impl Field {
    /// A mutable field whose value is resolved against `node`.
    pub fn new(name: impl Into<Cow<'static, str>>, node: TypeNode) -> Self {
        Self {
            name: name.into(),
            node,
            immutable: false,
        }
    }

    /// Marks the field immutable: it is copied verbatim and never resolved.
    #[must_use]
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &TypeNode {
        &self.node
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }
}

/// Schema of a composite type.
pub struct Class {
    name: TypeName,
    parent: Option<Arc<Class>>,
    fields: Vec<Field>,
    cascade: bool,
    constructor: Option<Constructor>,
    base_slot: usize,
}

impl Class {
    pub fn builder(name: impl Into<TypeName>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            cascade: false,
            constructor: None,
        }
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref()
    }

    /// Fields declared on this class only.
    pub fn own_fields(&self) -> &[Field] {
        &self.fields
    }

    /// Whether instances request cascading wherever they appear.
    pub fn cascades(&self) -> bool {
        self.cascade
    }

    /// Number of slots an instance of this class carries.
    pub fn slot_count(&self) -> usize {
        self.base_slot + self.fields.len()
    }

    /// Slot of the first slot owned by this class (after all ancestors).
    pub fn base_slot(&self) -> usize {
        self.base_slot
    }

    /// Returns `true` if `name` is this class or one of its ancestors.
    pub fn is_a(&self, name: &str) -> bool {
        self.chain().any(|class| class.name.as_str() == name)
    }

    /// Iterates this class and its ancestors, most-derived first.
    pub fn chain(&self) -> impl Iterator<Item = &Class> {
        std::iter::successors(Some(self), |class| class.parent.as_deref())
    }

    /// Iterates every field of the class chain with its slot, ancestors first.
    pub fn all_fields(&self) -> SlotIter<'_> {
        let mut chain: Vec<&Class> = self.chain().collect();
        chain.reverse();
        SlotIter {
            chain,
            class: 0,
            field: 0,
        }
    }

    /// Slot of `name`, preferring the most-derived declaration.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.chain().find_map(|class| class.own_slot_of(name))
    }

    /// Slot of `name` as declared on the ancestor called `class_name`.
    pub fn declared_slot_of(&self, class_name: &str, name: &str) -> Option<usize> {
        self.chain()
            .find(|class| class.name.as_str() == class_name)
            .and_then(|class| class.own_slot_of(name))
    }

    fn own_slot_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|field| field.name() == name)
            .map(|index| self.base_slot + index)
    }

    /// Runs the zero-argument constructor, if the class has one.
    pub fn construct(self: &Arc<Self>) -> Option<Object> {
        self.constructor.as_ref().map(|ctor| ctor(self))
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .field("fields", &self.fields)
            .field("cascade", &self.cascade)
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

/// Iterator over `(slot, field)` pairs of a class chain.
pub struct SlotIter<'a> {
    chain: Vec<&'a Class>,
    class: usize,
    field: usize,
}

impl<'a> Iterator for SlotIter<'a> {
    type Item = (usize, &'a Field);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let class = *self.chain.get(self.class)?;
            if let Some(field) = class.fields.get(self.field) {
                let slot = class.base_slot + self.field;
                self.field += 1;
                return Some((slot, field));
            }
            self.class += 1;
            self.field = 0;
        }
    }
}

/// Builder for [`Class`].
#[must_use]
pub struct ClassBuilder {
    name: TypeName,
    parent: Option<Arc<Class>>,
    fields: Vec<Field>,
    cascade: bool,
    constructor: Option<Constructor>,
}

impl ClassBuilder {
    /// Declares the parent class whose fields this class inherits.
    pub fn parent(mut self, parent: Arc<Class>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn field(self, name: impl Into<Cow<'static, str>>, node: TypeNode) -> Self {
        self.push_field(Field::new(name, node))
    }

    pub fn immutable_field(self, name: impl Into<Cow<'static, str>>, node: TypeNode) -> Self {
        self.push_field(Field::new(name, node).immutable())
    }

    pub fn push_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Requests cascading into instances of this class wherever they appear.
    pub fn cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    /// Registers the zero-argument constructor.
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&Arc<Class>) -> Object + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// Registers a constructor producing an instance with every slot null.
    pub fn zeroed(self) -> Self {
        self.constructor(|class| Object::zeroed(Arc::clone(class)))
    }

    pub fn build(self) -> Arc<Class> {
        let base_slot = self.parent.as_ref().map_or(0, |parent| parent.slot_count());
        Arc::new(Class {
            name: self.name,
            parent: self.parent,
            fields: self.fields,
            cascade: self.cascade,
            constructor: self.constructor,
            base_slot,
        })
    }
}
