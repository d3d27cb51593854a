//! Class descriptor.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use super::VariableDescriptor;
use crate::domain::fact::short_type_name;
use crate::domain::variable::{ShadowVariableKind, VariableType};
use crate::domain::Value;

type PlanningIdFn = Arc<dyn Fn(&dyn Any) -> Value + Send + Sync>;

/// Whether instances of a class are planned or only read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Input data that never changes during solving.
    ProblemFact,
    /// A class carrying genuine or shadow variables.
    PlanningEntity,
}

/// Describes one fact or entity class at runtime.
#[derive(Clone)]
pub struct ClassDescriptor {
    /// Name of the class.
    pub type_name: &'static str,
    /// TypeId of the class.
    pub type_id: TypeId,
    pub kind: ClassKind,
    /// Variable descriptors for this class.
    pub variable_descriptors: Vec<VariableDescriptor>,
    planning_id: Option<PlanningIdFn>,
}

impl ClassDescriptor {
    /// Describes a planning entity class.
    pub fn entity<E: Any>() -> Self {
        Self::new::<E>(ClassKind::PlanningEntity)
    }

    /// Describes a problem fact class.
    pub fn problem_fact<F: Any>() -> Self {
        Self::new::<F>(ClassKind::ProblemFact)
    }

    fn new<T: Any>(kind: ClassKind) -> Self {
        ClassDescriptor {
            type_name: short_type_name::<T>(),
            type_id: TypeId::of::<T>(),
            kind,
            variable_descriptors: Vec::new(),
            planning_id: None,
        }
    }

    /// Sets the planning id accessor.
    ///
    /// Planning ids give facts a stable order (used by unique pairs) and
    /// identify list elements.
    pub fn with_planning_id<T, F, V>(mut self, id: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.planning_id = Some(Arc::new(move |data: &dyn Any| {
            data.downcast_ref::<T>()
                .map_or(Value::None, |t| id(t).into())
        }));
        self
    }

    /// Adds a variable descriptor.
    pub fn with_variable(mut self, descriptor: VariableDescriptor) -> Self {
        self.kind = ClassKind::PlanningEntity;
        self.variable_descriptors.push(descriptor);
        self
    }

    /// Returns genuine (non-shadow) variable descriptors.
    pub fn genuine_variable_descriptors(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variable_descriptors
            .iter()
            .filter(|v| v.variable_type.is_genuine())
    }

    /// Returns shadow variable descriptors.
    pub fn shadow_variable_descriptors(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variable_descriptors
            .iter()
            .filter(|v| v.variable_type.is_shadow())
    }

    /// Finds a variable descriptor by name.
    pub fn find_variable(&self, name: &str) -> Option<&VariableDescriptor> {
        self.variable_descriptors.iter().find(|v| v.name == name)
    }

    /// Returns true if this class has any genuine variables.
    pub fn has_genuine_variables(&self) -> bool {
        self.genuine_variable_descriptors().next().is_some()
    }

    pub fn has_planning_id(&self) -> bool {
        self.planning_id.is_some()
    }

    /// The inverse-relation shadow, if the class is a list element declaring one.
    pub fn inverse_relation(&self) -> Option<&VariableDescriptor> {
        self.variable_descriptors.iter().find(|v| {
            v.variable_type == VariableType::Shadow(ShadowVariableKind::InverseRelation)
        })
    }

    pub fn planning_id_of(&self, data: &dyn Any) -> Option<Value> {
        self.planning_id.as_ref().map(|f| f(data))
    }

    /// Whether every basic genuine variable that must be assigned is assigned.
    pub fn basic_variables_assigned(&self, data: &dyn Any) -> bool {
        self.variable_descriptors
            .iter()
            .filter(|v| v.variable_type == VariableType::Genuine && !v.allows_unassigned)
            .all(|v| v.is_assigned(data))
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("variables", &self.variable_descriptors.len())
            .field("planning_id", &self.planning_id.is_some())
            .finish()
    }
}
