//! User functions attached to stream operators.
//!
//! Every function in a stream graph is a shared closure over a [`Tuple`].
//! The typed constructors (`of`, `of_bi`, `of_tri`, `of_quad`) downcast the
//! tuple elements before calling the user closure, so constraint authors work
//! with their own domain types:
//!
//! ```
//! use solverforge_core::{FactId, FactRef, Tuple, Value};
//! use solverforge_scoring::stream::Mapping;
//!
//! #[derive(Debug)]
//! struct Shift { employee: &'static str, hours: i64 }
//!
//! let hours = Mapping::of(|s: &Shift| s.hours);
//! let shift = FactRef::new(FactId(1), Shift { employee: "Ann", hours: 8 }, None);
//! assert_eq!(hours.apply(&Tuple::single(shift)), Value::Int(8));
//! ```

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use solverforge_core::domain::short_type_name;
use solverforge_core::{Tuple, Value};

/// Reads tuple element `index` as `T`.
///
/// Panics with a descriptive message when the element has another type;
/// the panic is reported against the constraint being evaluated.
pub(crate) fn element<T: Any>(tuple: &Tuple, index: usize) -> &T {
    let value = tuple.get(index);
    match value.downcast::<T>() {
        Some(element) => element,
        None => panic!(
            "tuple element {} is a {}, not a {}",
            index,
            value.type_label(),
            short_type_name::<T>()
        ),
    }
}

type TupleFn = dyn Fn(&Tuple) -> Value + Send + Sync;
type TupleTest = dyn Fn(&Tuple) -> bool + Send + Sync;

/// Maps a tuple to a value: keys, padding, joiner properties, collector inputs.
#[derive(Clone)]
pub struct Mapping {
    f: Arc<TupleFn>,
    identity: bool,
}

impl Mapping {
    /// Wraps a closure over the whole tuple.
    pub fn new<F, V>(f: F) -> Self
    where
        F: Fn(&Tuple) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self {
            f: Arc::new(move |t: &Tuple| f(t).into()),
            identity: false,
        }
    }

    /// The first tuple element itself.
    pub fn identity() -> Self {
        Self {
            f: Arc::new(|t: &Tuple| t.get(0).clone()),
            identity: true,
        }
    }

    /// Element `index` of the tuple.
    pub fn element(index: usize) -> Self {
        Self::new(move |t: &Tuple| t.get(index).clone())
    }

    /// A constant, mostly useful as padding.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(move |_: &Tuple| value.clone())
    }

    pub fn of<A, F, V>(f: F) -> Self
    where
        A: Any,
        F: Fn(&A) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::new(move |t: &Tuple| f(element::<A>(t, 0)))
    }

    pub fn of_bi<A, B, F, V>(f: F) -> Self
    where
        A: Any,
        B: Any,
        F: Fn(&A, &B) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::new(move |t: &Tuple| f(element::<A>(t, 0), element::<B>(t, 1)))
    }

    pub fn of_tri<A, B, C, F, V>(f: F) -> Self
    where
        A: Any,
        B: Any,
        C: Any,
        F: Fn(&A, &B, &C) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::new(move |t: &Tuple| {
            f(element::<A>(t, 0), element::<B>(t, 1), element::<C>(t, 2))
        })
    }

    pub fn of_quad<A, B, C, D, F, V>(f: F) -> Self
    where
        A: Any,
        B: Any,
        C: Any,
        D: Any,
        F: Fn(&A, &B, &C, &D) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::new(move |t: &Tuple| {
            f(
                element::<A>(t, 0),
                element::<B>(t, 1),
                element::<C>(t, 2),
                element::<D>(t, 3),
            )
        })
    }

    #[inline]
    pub fn apply(&self, tuple: &Tuple) -> Value {
        (self.f)(tuple)
    }

    /// True for [`Mapping::identity`].
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// True when both handles share one closure.
    pub fn same_as(&self, other: &Mapping) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.identity {
            f.write_str("Mapping(identity)")
        } else {
            f.write_str("Mapping(..)")
        }
    }
}

/// A boolean test over a tuple.
#[derive(Clone)]
pub struct Predicate {
    f: Arc<TupleTest>,
}

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Tuple) -> bool + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    pub fn of<A, F>(f: F) -> Self
    where
        A: Any,
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self::new(move |t: &Tuple| f(element::<A>(t, 0)))
    }

    pub fn of_bi<A, B, F>(f: F) -> Self
    where
        A: Any,
        B: Any,
        F: Fn(&A, &B) -> bool + Send + Sync + 'static,
    {
        Self::new(move |t: &Tuple| f(element::<A>(t, 0), element::<B>(t, 1)))
    }

    pub fn of_tri<A, B, C, F>(f: F) -> Self
    where
        A: Any,
        B: Any,
        C: Any,
        F: Fn(&A, &B, &C) -> bool + Send + Sync + 'static,
    {
        Self::new(move |t: &Tuple| {
            f(element::<A>(t, 0), element::<B>(t, 1), element::<C>(t, 2))
        })
    }

    pub fn of_quad<A, B, C, D, F>(f: F) -> Self
    where
        A: Any,
        B: Any,
        C: Any,
        D: Any,
        F: Fn(&A, &B, &C, &D) -> bool + Send + Sync + 'static,
    {
        Self::new(move |t: &Tuple| {
            f(
                element::<A>(t, 0),
                element::<B>(t, 1),
                element::<C>(t, 2),
                element::<D>(t, 3),
            )
        })
    }

    #[inline]
    pub fn test(&self, tuple: &Tuple) -> bool {
        (self.f)(tuple)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Orders two collected values.
pub type Comparator = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// Maps one value to another, e.g. a collector result.
pub type Finisher = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Combines two values: monoid adders and subtractors, map value mergers.
pub type BinaryOperator = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;

/// Combines the results of composed collectors.
pub type Combiner = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;
