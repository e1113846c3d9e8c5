//! Typed bridge: Rust values in and out of the value graph.
//!
//! - [`SensitiveType`]: a type with a static descriptor that can be lowered to
//!   a [`Value`] and rebuilt from one.
//! - [`Composite`]: the class schema of a struct, generated by
//!   `#[derive(Sensitive)]`.
//! - [`Desensitize`]: user-facing `.desensitize()` method.
//!
//! ## Shapes
//!
//! Monomorphisation recovers the full nested shape of a field type:
//! `Vec<HashMap<String, User>>` describes itself as a sequence of maps from
//! `String` to `User`, so markers reach every leaf without runtime type
//! inspection.
//!
//! | Rust type | Descriptor |
//! |-----------|------------|
//! | `String`, integers, floats, `bool`, `char` | scalar |
//! | `Option<T>`, `Box<T>` | same as `T` (`None` is null) |
//! | `Vec<T>`, `VecDeque<T>`, `BTreeSet<T>`, `HashSet<T>` | sequence of `T` |
//! | `HashMap<K, V>`, `BTreeMap<K, V>` | map of `K` to `V` |
//! | `[T; N]` | array of `T` |
//! | `PhantomData<T>` | null, never walked |
//! | `#[derive(Sensitive)]` structs | scalar naming the struct's class |

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    hash::{BuildHasher, Hash},
    marker::PhantomData,
    sync::Arc,
};

use crate::{
    class::Class,
    descriptor::TypeNode,
    engine::Engine,
    error::{DesensitizeError, Result},
    value::{Array, Mapping, Object, Sequence, Value, ValueClass},
};

// =============================================================================
// SensitiveType - static shape plus conversion to and from the value graph
// =============================================================================

/// A Rust type the engine can walk.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `SensitiveType`",
    label = "this type cannot be lowered into the value graph",
    note = "use `#[derive(Sensitive)]` on the type definition"
)]
pub trait SensitiveType: Sized {
    /// Declared shape of this type, without markers.
    fn type_node() -> TypeNode;

    /// Lowers the value into the graph.
    fn into_value(self) -> Value;

    /// Rebuilds the value from the graph.
    ///
    /// # Errors
    ///
    /// Returns [`DesensitizeError::Mismatch`] when `value` does not have this
    /// type's shape.
    fn from_value(value: Value) -> Result<Self>;
}

// =============================================================================
// Composite - derive-generated class schema
// =============================================================================

/// A struct described by a [`Class`].
///
/// Implemented by `#[derive(Sensitive)]`. Slots are written and read
/// ancestors-first, so a struct embedding its parent with
/// `#[sensitive(parent)]` stores the parent's fields before its own.
#[doc(hidden)]
pub trait Composite: Sized {
    fn class() -> Arc<Class>;

    /// Appends this value's slots.
    fn into_slots(self, slots: &mut Vec<Value>);

    /// Reads this value's slots in the order `into_slots` wrote them.
    fn from_slots(slots: &mut dyn Iterator<Item = Value>) -> Result<Self>;
}

/// Lowers a composite into an object of its class.
#[doc(hidden)]
pub fn composite_into_value<T: Composite>(value: T) -> Value {
    let class = T::class();
    let mut slots = Vec::with_capacity(class.slot_count());
    value.into_slots(&mut slots);
    Value::object(Object::from_slots(class, slots))
}

/// Rebuilds a composite from an object of its class.
#[doc(hidden)]
pub fn composite_from_value<T: Composite>(value: Value) -> Result<T> {
    let class = T::class();
    let Value::Object(object) = value else {
        return Err(DesensitizeError::mismatch("object", value.type_name()));
    };
    let actual = object.class();
    if actual.name() != class.name() {
        return Err(DesensitizeError::Mismatch {
            expected: "object of the declared class",
            found: actual.name().to_string(),
        });
    }
    let mut slots = object.into_slots().into_iter();
    T::from_slots(&mut slots)
}

/// Next slot, null once exhausted.
#[doc(hidden)]
pub fn next_slot(slots: &mut dyn Iterator<Item = Value>) -> Value {
    slots.next().unwrap_or_default()
}

// =============================================================================
// Desensitize - user-facing .desensitize() method
// =============================================================================

/// Public entrypoint on typed values.
///
/// Blanket-implemented for every [`SensitiveType`].
pub trait Desensitize: SensitiveType {
    /// Returns a desensitized copy using the global engine.
    ///
    /// # Errors
    ///
    /// Configuration errors and unrecovered failures.
    fn desensitize(self) -> Result<Self> {
        crate::engine::global().desensitize(self)
    }

    /// Returns a desensitized copy using `engine`.
    ///
    /// # Errors
    ///
    /// Configuration errors and unrecovered failures.
    fn desensitize_with(self, engine: &Engine) -> Result<Self> {
        engine.desensitize(self)
    }
}

impl<T> Desensitize for T where T: SensitiveType {}

// =============================================================================
// SensitiveType implementations for standard library types
// =============================================================================

/// Dynamic values describe themselves as "anything, cascading".
impl SensitiveType for Value {
    fn type_node() -> TypeNode {
        TypeNode::any().cascading()
    }

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl SensitiveType for String {
    fn type_node() -> TypeNode {
        TypeNode::string()
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(DesensitizeError::mismatch("String", other.type_name())),
        }
    }
}

impl SensitiveType for Cow<'static, str> {
    fn type_node() -> TypeNode {
        TypeNode::string()
    }

    fn into_value(self) -> Value {
        Value::Str(self.into_owned())
    }

    fn from_value(value: Value) -> Result<Self> {
        String::from_value(value).map(Cow::Owned)
    }
}

impl SensitiveType for bool {
    fn type_node() -> TypeNode {
        TypeNode::scalar(ValueClass::Bool.as_str())
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(DesensitizeError::mismatch("bool", other.type_name())),
        }
    }
}

impl SensitiveType for char {
    fn type_node() -> TypeNode {
        TypeNode::scalar(ValueClass::Char.as_str())
    }

    fn into_value(self) -> Value {
        Value::Char(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(c) => Ok(c),
            other => Err(DesensitizeError::mismatch("char", other.type_name())),
        }
    }
}

macro_rules! impl_sensitive_type_integer {
    ($class:ident, $variant:ident => $($ty:ty),+) => {
        $(
            impl SensitiveType for $ty {
                fn type_node() -> TypeNode {
                    TypeNode::scalar(ValueClass::$class.as_str())
                }

                #[allow(clippy::cast_lossless, clippy::cast_possible_wrap)]
                fn into_value(self) -> Value {
                    Value::$variant(self as _)
                }

                fn from_value(value: Value) -> Result<Self> {
                    let narrowed = match value {
                        Value::Int(n) => Self::try_from(n).ok(),
                        Value::UInt(n) => Self::try_from(n).ok(),
                        other => {
                            return Err(DesensitizeError::mismatch(
                                stringify!($ty),
                                other.type_name(),
                            ))
                        }
                    };
                    narrowed.ok_or_else(|| {
                        DesensitizeError::mismatch(stringify!($ty), "an out-of-range integer")
                    })
                }
            }
        )+
    };
}

impl_sensitive_type_integer!(Int, Int => i8, i16, i32, i64, isize);
impl_sensitive_type_integer!(UInt, UInt => u8, u16, u32, u64, usize);

impl SensitiveType for f64 {
    fn type_node() -> TypeNode {
        TypeNode::scalar(ValueClass::Float.as_str())
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            other => Err(DesensitizeError::mismatch("f64", other.type_name())),
        }
    }
}

impl SensitiveType for f32 {
    fn type_node() -> TypeNode {
        f64::type_node()
    }

    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl<T> SensitiveType for Option<T>
where
    T: SensitiveType,
{
    fn type_node() -> TypeNode {
        T::type_node()
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, SensitiveType::into_value)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T> SensitiveType for Box<T>
where
    T: SensitiveType,
{
    fn type_node() -> TypeNode {
        T::type_node()
    }

    fn into_value(self) -> Value {
        (*self).into_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

fn sequence_items(value: Value, family: &'static str) -> Result<Vec<Value>> {
    match value {
        Value::Seq(seq) => Ok(seq.into_items()),
        other => Err(DesensitizeError::mismatch(family, other.type_name())),
    }
}

macro_rules! impl_sensitive_type_sequence {
    ($family:ident $(, $bound:path)*) => {
        impl<T> SensitiveType for $family<T>
        where
            T: SensitiveType $(+ $bound)*,
        {
            fn type_node() -> TypeNode {
                TypeNode::sequence(T::type_node()).named(stringify!($family))
            }

            fn into_value(self) -> Value {
                let items = self.into_iter().map(SensitiveType::into_value).collect();
                Value::Seq(Sequence::from_items(stringify!($family), items))
            }

            fn from_value(value: Value) -> Result<Self> {
                sequence_items(value, stringify!($family))?
                    .into_iter()
                    .map(T::from_value)
                    .collect()
            }
        }
    };
}

impl_sensitive_type_sequence!(Vec);
impl_sensitive_type_sequence!(VecDeque);
impl_sensitive_type_sequence!(BTreeSet, Ord);

impl<T, S> SensitiveType for HashSet<T, S>
where
    T: SensitiveType + Hash + Eq,
    S: BuildHasher + Default,
{
    fn type_node() -> TypeNode {
        TypeNode::sequence(T::type_node()).named("HashSet")
    }

    fn into_value(self) -> Value {
        let items = self.into_iter().map(SensitiveType::into_value).collect();
        Value::Seq(Sequence::from_items("HashSet", items))
    }

    fn from_value(value: Value) -> Result<Self> {
        sequence_items(value, "HashSet")?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

fn map_entries(value: Value, family: &'static str) -> Result<Vec<(Value, Value)>> {
    match value {
        Value::Map(map) => Ok(map.into_entries()),
        other => Err(DesensitizeError::mismatch(family, other.type_name())),
    }
}

impl<K, V, S> SensitiveType for HashMap<K, V, S>
where
    K: SensitiveType + Hash + Eq,
    V: SensitiveType,
    S: BuildHasher + Default,
{
    fn type_node() -> TypeNode {
        TypeNode::map(K::type_node(), V::type_node()).named("HashMap")
    }

    fn into_value(self) -> Value {
        let entries = self
            .into_iter()
            .map(|(k, v)| (k.into_value(), v.into_value()))
            .collect();
        Value::Map(Mapping::from_entries("HashMap", entries))
    }

    fn from_value(value: Value) -> Result<Self> {
        map_entries(value, "HashMap")?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl<K, V> SensitiveType for BTreeMap<K, V>
where
    K: SensitiveType + Ord,
    V: SensitiveType,
{
    fn type_node() -> TypeNode {
        TypeNode::map(K::type_node(), V::type_node()).named("BTreeMap")
    }

    fn into_value(self) -> Value {
        let entries = self
            .into_iter()
            .map(|(k, v)| (k.into_value(), v.into_value()))
            .collect();
        Value::Map(Mapping::from_entries("BTreeMap", entries))
    }

    fn from_value(value: Value) -> Result<Self> {
        map_entries(value, "BTreeMap")?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl<T, const N: usize> SensitiveType for [T; N]
where
    T: SensitiveType,
{
    fn type_node() -> TypeNode {
        TypeNode::array(T::type_node())
    }

    fn into_value(self) -> Value {
        let items = self.into_iter().map(SensitiveType::into_value).collect();
        Value::Array(Array::new(std::any::type_name::<T>(), items))
    }

    fn from_value(value: Value) -> Result<Self> {
        let Value::Array(array) = value else {
            return Err(DesensitizeError::mismatch("array", value.type_name()));
        };
        let items = array
            .into_items()
            .into_iter()
            .map(T::from_value)
            .collect::<Result<Vec<T>>>()?;
        let len = items.len();
        Self::try_from(items).map_err(|_| {
            DesensitizeError::mismatch("array of the declared length", format!("length {len}"))
        })
    }
}

impl<T: ?Sized> SensitiveType for PhantomData<T> {
    fn type_node() -> TypeNode {
        TypeNode::scalar("PhantomData")
    }

    fn into_value(self) -> Value {
        Value::Null
    }

    fn from_value(_: Value) -> Result<Self> {
        Ok(PhantomData)
    }
}
