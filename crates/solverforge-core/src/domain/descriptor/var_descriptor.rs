//! Variable descriptor.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::domain::variable::{ShadowVariableKind, VariableType};
use crate::domain::Value;

pub(crate) type AssignedFn = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;
pub(crate) type ElementsFn = Arc<dyn Fn(&dyn Any) -> Vec<Value> + Send + Sync>;

/// Describes a planning variable at runtime.
///
/// Accessors are supplied as closures over the owning type; the descriptor
/// erases them so schemas can hold many classes.
#[derive(Clone)]
pub struct VariableDescriptor {
    /// Name of the variable (field name).
    pub name: &'static str,
    /// Type of the variable.
    pub variable_type: VariableType,
    /// Whether entities with this variable unassigned still flow through `for_each`.
    pub allows_unassigned: bool,
    /// For list variables: the element type.
    pub element_type: Option<TypeId>,
    pub(crate) assigned: Option<AssignedFn>,
    pub(crate) elements: Option<ElementsFn>,
}

impl VariableDescriptor {
    /// A genuine variable; `is_assigned` reports whether it currently holds a value.
    pub fn genuine<E, F>(name: &'static str, is_assigned: F) -> Self
    where
        E: Any,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        VariableDescriptor {
            name,
            variable_type: VariableType::Genuine,
            allows_unassigned: false,
            element_type: None,
            assigned: Some(erase_predicate(is_assigned)),
            elements: None,
        }
    }

    /// A list variable of `E` whose elements are `V`, identified by planning id.
    pub fn list<E, V, F>(name: &'static str, elements: F) -> Self
    where
        E: Any,
        V: Any,
        F: Fn(&E) -> Vec<Value> + Send + Sync + 'static,
    {
        VariableDescriptor {
            name,
            variable_type: VariableType::List,
            allows_unassigned: false,
            element_type: Some(TypeId::of::<V>()),
            assigned: None,
            elements: Some(Arc::new(move |owner: &dyn Any| {
                owner.downcast_ref::<E>().map(&elements).unwrap_or_default()
            })),
        }
    }

    /// Inverse-relation shadow on a list element: whether some list holds it.
    pub fn inverse_relation<E, F>(name: &'static str, is_assigned: F) -> Self
    where
        E: Any,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        VariableDescriptor {
            name,
            variable_type: VariableType::Shadow(ShadowVariableKind::InverseRelation),
            allows_unassigned: true,
            element_type: None,
            assigned: Some(erase_predicate(is_assigned)),
            elements: None,
        }
    }

    /// A shadow variable without an assignment role.
    pub fn shadow(name: &'static str) -> Self {
        VariableDescriptor {
            name,
            variable_type: VariableType::Shadow(ShadowVariableKind::Custom),
            allows_unassigned: true,
            element_type: None,
            assigned: None,
            elements: None,
        }
    }

    /// Sets whether unassigned values are allowed.
    pub fn with_allows_unassigned(mut self, allows: bool) -> Self {
        self.allows_unassigned = allows;
        self
    }

    pub(crate) fn is_assigned(&self, data: &dyn Any) -> bool {
        self.assigned.as_ref().map_or(true, |f| f(data))
    }

    pub(crate) fn elements_of(&self, owner: &dyn Any) -> Vec<Value> {
        self.elements.as_ref().map(|f| f(owner)).unwrap_or_default()
    }
}

fn erase_predicate<E, F>(f: F) -> AssignedFn
where
    E: Any,
    F: Fn(&E) -> bool + Send + Sync + 'static,
{
    Arc::new(move |data: &dyn Any| data.downcast_ref::<E>().map_or(false, &f))
}

impl fmt::Debug for VariableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableDescriptor")
            .field("name", &self.name)
            .field("variable_type", &self.variable_type)
            .field("allows_unassigned", &self.allows_unassigned)
            .finish()
    }
}
