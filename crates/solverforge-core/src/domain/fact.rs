//! Identity-carrying handles to facts and entities in working memory.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::Value;

/// Session-assigned identity of a fact.
///
/// Ids are never reused within a session, so they also give a stable
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactId(pub u64);

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of a fact: any `Debug` type that can be shared across threads.
pub trait FactData: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> FactData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct FactInner {
    id: FactId,
    type_id: TypeId,
    type_name: &'static str,
    planning_id: Option<Value>,
    data: Box<dyn FactData>,
}

impl FactInner {
    // `as_any` on the box itself would downcast the box, not the payload.
    fn payload(&self) -> &dyn Any {
        <dyn FactData as FactData>::as_any(self.data.as_ref())
    }
}

/// Shared handle to a fact or entity.
///
/// Two handles are equal when they carry the same [`FactId`], even if one of
/// them holds a newer payload after an update. Handles order by planning id
/// when both sides declare one, and by id otherwise.
#[derive(Clone)]
pub struct FactRef {
    inner: Arc<FactInner>,
}

impl FactRef {
    pub fn new<T: FactData>(id: FactId, data: T, planning_id: Option<Value>) -> Self {
        Self {
            inner: Arc::new(FactInner {
                id,
                type_id: TypeId::of::<T>(),
                type_name: short_type_name::<T>(),
                planning_id,
                data: Box::new(data),
            }),
        }
    }

    /// Returns a handle with the same identity and a new payload.
    pub fn replaced<T: FactData>(&self, data: T, planning_id: Option<Value>) -> Self {
        Self::new(self.inner.id, data, planning_id)
    }

    #[inline]
    pub fn id(&self) -> FactId {
        self.inner.id
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.inner.type_id
    }

    /// Unqualified type name of the payload.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name
    }

    pub fn planning_id(&self) -> Option<&Value> {
        self.inner.planning_id.as_ref()
    }

    pub fn data(&self) -> &dyn Any {
        self.inner.payload()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.type_id == TypeId::of::<T>()
    }

    pub fn downcast<T: Any>(&self) -> Option<&T> {
        self.inner.payload().downcast_ref::<T>()
    }

    /// Returns the payload as `T`.
    ///
    /// # Panics
    ///
    /// Panics when the payload is another type. Stream nodes catch the panic
    /// and report it against the constraint being evaluated.
    pub fn get<T: Any>(&self) -> &T {
        match self.downcast::<T>() {
            Some(data) => data,
            None => panic!(
                "fact {} is a {}, not a {}",
                self.inner.id,
                self.inner.type_name,
                short_type_name::<T>()
            ),
        }
    }
}

impl PartialEq for FactRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for FactRef {}

impl Hash for FactRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl PartialOrd for FactRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FactRef {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.inner.id == other.inner.id {
            return Ordering::Equal;
        }
        // Facts without a planning id come first, in insertion order.
        self.inner
            .planning_id
            .cmp(&other.inner.planning_id)
            .then(self.inner.id.cmp(&other.inner.id))
    }
}

impl fmt::Debug for FactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.inner.data)
    }
}

impl fmt::Display for FactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.planning_id {
            Some(id) => write!(f, "{}({})", self.inner.type_name, id),
            None => write!(f, "{}{}", self.inner.type_name, self.inner.id),
        }
    }
}

/// Last path segment of a type name, without generic arguments.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Read access to the facts currently in working memory.
pub trait FactSource {
    /// Facts whose payload has the given type, in insertion order.
    fn facts_of(&self, type_id: TypeId) -> Vec<FactRef>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Room {
        name: &'static str,
    }

    #[test]
    fn test_identity_survives_replacement() {
        let original = FactRef::new(FactId(7), Room { name: "A" }, None);
        let updated = original.replaced(Room { name: "B" }, None);
        assert_eq!(original, updated);
        assert_eq!(updated.get::<Room>().name, "B");
        assert_eq!(original.get::<Room>().name, "A");
    }

    #[test]
    fn test_ordering_prefers_planning_id() {
        let a = FactRef::new(FactId(1), Room { name: "A" }, Some(Value::Int(20)));
        let b = FactRef::new(FactId(2), Room { name: "B" }, Some(Value::Int(10)));
        assert!(b < a);
        let c = FactRef::new(FactId(3), Room { name: "C" }, None);
        assert!(c < b);
        let d = FactRef::new(FactId(4), Room { name: "D" }, None);
        assert!(c < d);
    }

    #[test]
    fn test_ordering_is_transitive_with_mixed_ids() {
        let x = FactRef::new(FactId(1), Room { name: "X" }, Some(Value::Int(20)));
        let y = FactRef::new(FactId(2), Room { name: "Y" }, None);
        let z = FactRef::new(FactId(3), Room { name: "Z" }, Some(Value::Int(10)));
        let mut facts = vec![x.clone(), y.clone(), z.clone()];
        facts.sort();
        assert_eq!(facts, vec![y.clone(), z.clone(), x.clone()]);
        assert!(y < z && z < x && y < x);
    }

    #[test]
    fn test_downcast_and_names() {
        let fact = FactRef::new(FactId(1), Room { name: "A" }, None);
        assert!(fact.is::<Room>());
        assert!(fact.downcast::<String>().is_none());
        assert_eq!(fact.type_name(), "Room");
        assert_eq!(fact.to_string(), "Room#1");
        assert_eq!(format!("{:?}", fact), "Room { name: \"A\" }");
    }
}
