//! Runtime values flowing through constraint streams.
//!
//! Facts, mapped keys, collector results and justifications are all carried
//! as [`Value`]. Equality, hashing and ordering are total so values can be
//! grouped, indexed and sorted: facts compare by identity, floats by their
//! bit pattern, and user objects through [`ValueObject`].

use std::any::Any;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::FactRef;

/// A user-defined value that can travel through a stream.
///
/// Implemented for every `Eq + Hash + Debug` type, so custom justification
/// or key types only need the usual derives.
pub trait ValueObject: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn type_label(&self) -> &'static str;

    fn eq_object(&self, other: &dyn ValueObject) -> bool;

    fn hash_object(&self, state: &mut dyn Hasher);
}

impl<T> ValueObject for T
where
    T: Any + fmt::Debug + Eq + Hash + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_label(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn eq_object(&self, other: &dyn ValueObject) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn hash_object(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Str(Arc<str>),
    Fact(FactRef),
    List(Arc<Vec<Value>>),
    Set(Arc<BTreeSet<Value>>),
    Map(Arc<BTreeMap<Value, Value>>),
    Object(Arc<dyn ValueObject>),
}

impl Value {
    /// Wraps a user object.
    pub fn object<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + Eq + Hash + Send + Sync,
    {
        Value::Object(Arc::new(value))
    }

    pub fn list(values: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Arc::new(values.into_iter().collect()))
    }

    pub fn set(values: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(Arc::new(values.into_iter().collect()))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns true for lists, sets and maps.
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::List(_) | Value::Set(_) | Value::Map(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of ints, decimals and finite floats.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            Value::Float(f) => Decimal::try_from(*f).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_fact(&self) -> Option<&FactRef> {
        match self {
            Value::Fact(f) => Some(f),
            _ => None,
        }
    }

    /// Downcasts a fact payload, a user object or a primitive.
    ///
    /// Primitives are reachable through their Rust representation (`i64`,
    /// `bool`, `f64`, `Decimal`, `Arc<str>`), and every value downcasts to
    /// `Value` itself.
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        if let Some(value) = (self as &dyn Any).downcast_ref::<T>() {
            return Some(value);
        }
        match self {
            Value::Fact(f) => f.downcast::<T>(),
            Value::Object(o) => o.as_any().downcast_ref::<T>(),
            Value::Bool(b) => (b as &dyn Any).downcast_ref::<T>(),
            Value::Int(i) => (i as &dyn Any).downcast_ref::<T>(),
            Value::Float(x) => (x as &dyn Any).downcast_ref::<T>(),
            Value::Decimal(d) => (d as &dyn Any).downcast_ref::<T>(),
            Value::Str(s) => (s as &dyn Any).downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Iterates the elements of a list or set, or the keys of a map.
    pub fn elements(&self) -> Option<Box<dyn Iterator<Item = &Value> + '_>> {
        match self {
            Value::List(items) => Some(Box::new(items.iter())),
            Value::Set(items) => Some(Box::new(items.iter())),
            Value::Map(entries) => Some(Box::new(entries.keys())),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "str",
            Value::Fact(f) => f.type_name(),
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(o) => o.type_label(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) | Value::Decimal(_) => 2,
            Value::Str(_) => 3,
            Value::Fact(_) => 4,
            Value::List(_) => 5,
            Value::Set(_) => 6,
            Value::Map(_) => 7,
            Value::Object(_) => 8,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Fact(a), Value::Fact(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.eq_object(b.as_ref()),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::None => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Fact(f) => f.hash(state),
            Value::List(items) => items.hash(state),
            Value::Set(items) => items.hash(state),
            Value::Map(entries) => entries.hash(state),
            Value::Object(o) => o.hash_object(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Numbers of different representations compare numerically, falling back
    /// on the variant order when they are numerically equal so that `Ord`
    /// stays consistent with `Eq`. User objects order by type name, then by
    /// their debug form.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Fact(a), Value::Fact(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Object(a), Value::Object(b)) => {
                if a.eq_object(b.as_ref()) {
                    return Ordering::Equal;
                }
                a.type_label()
                    .cmp(b.type_label())
                    .then_with(|| format!("{:?}", a).cmp(&format!("{:?}", b)))
            }
            _ if self.rank() == 2 && other.rank() == 2 => {
                let numeric = match (self.as_decimal(), other.as_decimal()) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    // Floats beyond the decimal range, or NaN.
                    _ => numeric_float(self).total_cmp(&numeric_float(other)),
                };
                numeric.then_with(|| numeric_variant(self).cmp(&numeric_variant(other)))
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn numeric_float(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Decimal(d) => d.to_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn numeric_variant(value: &Value) -> u8 {
    match value {
        Value::Int(_) => 0,
        Value::Decimal(_) => 1,
        _ => 2,
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Fact(fact) => write!(f, "{:?}", fact),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Set(items) => f.debug_set().entries(items.iter()).finish(),
            Value::Map(entries) => f.debug_map().entries(entries.iter()).finish(),
            Value::Object(o) => write!(f, "{:?}", o),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => write!(f, "{:?}", other),
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )+
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Value {
    /// Saturates at `i64::MAX`.
    fn from(v: usize) -> Self {
        Value::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<Arc<str>> for Value {
    fn from(v: Arc<str>) -> Self {
        Value::Str(v)
    }
}

impl From<FactRef> for Value {
    fn from(v: FactRef) -> Self {
        Value::Fact(v)
    }
}

impl From<&FactRef> for Value {
    fn from(v: &FactRef) -> Self {
        Value::Fact(v.clone())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(Arc::new(v))
    }
}

impl From<BTreeSet<Value>> for Value {
    fn from(v: BTreeSet<Value>) -> Self {
        Value::Set(Arc::new(v))
    }
}

impl From<BTreeMap<Value, Value>> for Value {
    fn from(v: BTreeMap<Value, Value>) -> Self {
        Value::Map(Arc::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Decimal(d) => serializer.collect_str(d),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Fact(fact) => serializer.collect_str(&format_args!("{:?}", fact)),
            Value::List(items) => serializer.collect_seq(items.iter()),
            Value::Set(items) => serializer.collect_seq(items.iter()),
            Value::Map(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for entry in entries.iter() {
                    seq.serialize_element(&entry)?;
                }
                seq.end()
            }
            Value::Object(o) => serializer.collect_str(&format_args!("{:?}", o)),
        }
    }
}
