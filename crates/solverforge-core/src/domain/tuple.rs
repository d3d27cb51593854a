//! Fixed-arity tuples flowing through stream nodes.

use std::any::Any;
use std::fmt;

use smallvec::SmallVec;

use super::fact::short_type_name;
use super::{FactRef, Value};

/// Largest arity a stream can carry.
pub const MAX_ARITY: usize = 4;

/// An ordered group of one to four values.
///
/// Tuples are compared element-wise, so two tuples holding the same facts
/// (by identity) in the same positions are equal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tuple {
    values: SmallVec<[Value; MAX_ARITY]>,
}

impl Tuple {
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// A 1-tuple.
    pub fn single(value: impl Into<Value>) -> Self {
        let mut values = SmallVec::new();
        values.push(value.into());
        Self { values }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range.
    pub fn get(&self, index: usize) -> &Value {
        match self.values.get(index) {
            Some(value) => value,
            None => panic!(
                "tuple of arity {} has no element {}",
                self.values.len(),
                index
            ),
        }
    }

    pub fn last(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Returns the fact payload at `index` as `T`.
    ///
    /// # Panics
    ///
    /// Panics when the element is not a fact of type `T`.
    pub fn fact<T: Any>(&self, index: usize) -> &T {
        match self.get(index) {
            Value::Fact(fact) => fact.get::<T>(),
            other => panic!(
                "tuple element {} is a {}, not a {}",
                index,
                other.type_label(),
                short_type_name::<T>()
            ),
        }
    }

    pub fn try_fact<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index).and_then(Value::downcast::<T>)
    }

    pub fn fact_ref(&self, index: usize) -> Option<&FactRef> {
        self.values.get(index).and_then(Value::as_fact)
    }

    /// Returns the integer at `index`.
    ///
    /// # Panics
    ///
    /// Panics when the element is not an integer.
    pub fn int(&self, index: usize) -> i64 {
        match self.get(index) {
            Value::Int(i) => *i,
            other => panic!("tuple element {} is a {}, not an int", index, other.type_label()),
        }
    }

    /// Returns a copy with `extra` appended.
    pub fn extended(&self, extra: impl IntoIterator<Item = Value>) -> Self {
        let mut values = self.values.clone();
        values.extend(extra);
        Self { values }
    }

    /// Returns the concatenation of two tuples.
    pub fn joined(&self, right: &Tuple) -> Self {
        self.extended(right.values.iter().cloned())
    }

    /// Returns a copy whose last element is `value`.
    pub fn with_last(&self, value: Value) -> Self {
        let mut values = self.values.clone();
        values.pop();
        values.push(value);
        Self { values }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values.into_vec()
    }

    /// All facts referenced directly by the tuple.
    pub fn facts(&self) -> impl Iterator<Item = &FactRef> {
        self.values.iter().filter_map(Value::as_fact)
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(values: Vec<Value>) -> Self {
        Self {
            values: SmallVec::from_vec(values),
        }
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut t = f.debug_tuple("");
        for value in &self.values {
            t.field(value);
        }
        t.finish()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FactId;

    #[derive(Debug)]
    struct Lesson {
        subject: &'static str,
    }

    #[test]
    fn test_typed_access() {
        let lesson = FactRef::new(FactId(1), Lesson { subject: "Math" }, None);
        let tuple = Tuple::new([Value::Fact(lesson), Value::Int(3)]);
        assert_eq!(tuple.arity(), 2);
        assert_eq!(tuple.fact::<Lesson>(0).subject, "Math");
        assert_eq!(tuple.int(1), 3);
        assert!(tuple.try_fact::<Lesson>(1).is_none());
    }

    #[test]
    #[should_panic(expected = "tuple element 1 is a int, not a Lesson")]
    fn test_wrong_type_panics() {
        let tuple = Tuple::new([Value::Int(1), Value::Int(2)]);
        tuple.fact::<Lesson>(1);
    }

    #[test]
    fn test_extend_and_replace_last() {
        let tuple = Tuple::single(1);
        let wider = tuple.extended([Value::Int(2)]);
        assert_eq!(wider, Tuple::new([Value::Int(1), Value::Int(2)]));
        assert_eq!(wider.with_last(Value::Int(9)).int(1), 9);
        assert_eq!(wider.joined(&tuple).arity(), 3);
        assert_eq!(wider.to_string(), "(1, 2)");
    }
}
