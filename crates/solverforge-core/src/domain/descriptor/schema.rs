//! Domain schema: the explicit description of fact and entity classes.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use super::{ClassDescriptor, VariableDescriptor};
use crate::domain::{FactRef, FactSource};
use crate::error::{Result, SolverForgeError};

/// Describes the classes a constraint session can hold.
///
/// The schema is supplied by the domain layer as data. It decides which
/// facts are "assigned" (and therefore visible to `for_each`) and how
/// planning ids are read. Classes that are not registered behave as plain
/// problem facts.
///
/// # Examples
///
/// ```
/// use solverforge_core::domain::{ClassDescriptor, DomainSchema, VariableDescriptor};
///
/// #[derive(Debug)]
/// struct Shift { id: i64, employee: Option<String> }
///
/// let schema = DomainSchema::new().with_class(
///     ClassDescriptor::entity::<Shift>()
///         .with_planning_id(|s: &Shift| s.id)
///         .with_variable(VariableDescriptor::genuine("employee", |s: &Shift| s.employee.is_some())),
/// );
/// assert!(schema.validate().is_ok());
/// assert!(schema.class_of::<Shift>().is_some());
/// ```
#[derive(Clone, Default)]
pub struct DomainSchema {
    classes: Vec<ClassDescriptor>,
    index: HashMap<TypeId, usize>,
    // element type -> (owner type, list variable)
    list_owners: HashMap<TypeId, Vec<(TypeId, VariableDescriptor)>>,
}

impl DomainSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class descriptor, replacing any earlier one for the same type.
    pub fn with_class(mut self, descriptor: ClassDescriptor) -> Self {
        for variable in descriptor.genuine_variable_descriptors() {
            if let Some(element) = variable.element_type {
                self.list_owners
                    .entry(element)
                    .or_default()
                    .push((descriptor.type_id, variable.clone()));
            }
        }
        match self.index.get(&descriptor.type_id) {
            Some(&i) => self.classes[i] = descriptor,
            None => {
                self.index.insert(descriptor.type_id, self.classes.len());
                self.classes.push(descriptor);
            }
        }
        self
    }

    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }

    pub fn class(&self, type_id: TypeId) -> Option<&ClassDescriptor> {
        self.index.get(&type_id).map(|&i| &self.classes[i])
    }

    pub fn class_of<T: Any>(&self) -> Option<&ClassDescriptor> {
        self.class(TypeId::of::<T>())
    }

    /// Finds a variable of a class by name.
    pub fn find_variable(&self, type_id: TypeId, name: &str) -> Option<&VariableDescriptor> {
        self.class(type_id)?.find_variable(name)
    }

    /// True when the class is the element type of some list variable.
    pub fn is_list_element(&self, type_id: TypeId) -> bool {
        self.list_owners.contains_key(&type_id)
    }

    /// Element classes held by the list variables of `owner`.
    ///
    /// Only element classes without an inverse relation are returned: their
    /// assignment depends on the owners' list contents.
    pub fn scanned_element_types(&self, owner: TypeId) -> Vec<TypeId> {
        self.list_owners
            .iter()
            .filter(|(element, owners)| {
                owners.iter().any(|(o, _)| *o == owner)
                    && self
                        .class(**element)
                        .and_then(ClassDescriptor::inverse_relation)
                        .is_none()
            })
            .map(|(element, _)| *element)
            .collect()
    }

    /// Reads the planning id of a payload, if its class declares one.
    pub fn planning_id(&self, type_id: TypeId, data: &dyn Any) -> Option<crate::domain::Value> {
        self.class(type_id)?.planning_id_of(data)
    }

    /// Checks the schema for descriptions that cannot be evaluated.
    pub fn validate(&self) -> Result<()> {
        for (element, owners) in &self.list_owners {
            let class = self.class(*element);
            let has_inverse = class.and_then(ClassDescriptor::inverse_relation).is_some();
            let has_id = class.map_or(false, ClassDescriptor::has_planning_id);
            if !has_inverse && !has_id {
                let variables: Vec<&str> = owners.iter().map(|(_, v)| v.name).collect();
                return Err(SolverForgeError::Config(format!(
                    "list variable(s) {:?} hold elements whose class declares neither an \
                     inverse relation nor a planning id",
                    variables
                )));
            }
        }
        Ok(())
    }

    /// Whether a fact is assigned and so visible to `for_each`.
    ///
    /// Entities need every non-nullable basic variable assigned. List
    /// elements need to be held by some list: the inverse-relation shadow
    /// answers that directly; without one, the owners in `facts` are scanned.
    pub fn is_assigned(&self, fact: &FactRef, facts: &dyn FactSource) -> bool {
        let class = self.class(fact.type_id());
        if let Some(class) = class {
            if !class.basic_variables_assigned(fact.data()) {
                return false;
            }
        }
        let Some(owners) = self.list_owners.get(&fact.type_id()) else {
            return true;
        };
        if let Some(inverse) = class.and_then(ClassDescriptor::inverse_relation) {
            return inverse.is_assigned(fact.data());
        }
        let Some(id) = fact.planning_id() else {
            return false;
        };
        owners.iter().any(|(owner_type, variable)| {
            facts
                .facts_of(*owner_type)
                .iter()
                .any(|owner| variable.elements_of(owner.data()).contains(id))
        })
    }
}

impl fmt::Debug for DomainSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainSchema")
            .field("classes", &self.classes)
            .finish()
    }
}
