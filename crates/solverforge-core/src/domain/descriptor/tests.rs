use std::any::TypeId;

use super::*;
use crate::domain::{FactId, FactRef, FactSource, Value};

#[derive(Debug)]
struct Vehicle {
    visits: Vec<i64>,
}

#[derive(Debug)]
struct Visit {
    id: i64,
    vehicle: Option<usize>,
}

#[derive(Debug)]
struct Lesson {
    room: Option<&'static str>,
    teacher: Option<&'static str>,
}

struct Memory(Vec<FactRef>);

impl FactSource for Memory {
    fn facts_of(&self, type_id: TypeId) -> Vec<FactRef> {
        self.0
            .iter()
            .filter(|f| f.type_id() == type_id)
            .cloned()
            .collect()
    }
}

fn lesson_schema() -> DomainSchema {
    DomainSchema::new().with_class(
        ClassDescriptor::entity::<Lesson>()
            .with_variable(VariableDescriptor::genuine("room", |l: &Lesson| l.room.is_some()))
            .with_variable(
                VariableDescriptor::genuine("teacher", |l: &Lesson| l.teacher.is_some())
                    .with_allows_unassigned(true),
            ),
    )
}

#[test]
fn test_basic_variable_assignment() {
    let schema = lesson_schema();
    let memory = Memory(Vec::new());
    let placed = FactRef::new(FactId(1), Lesson { room: Some("A"), teacher: None }, None);
    let unplaced = FactRef::new(FactId(2), Lesson { room: None, teacher: Some("T") }, None);
    assert!(schema.is_assigned(&placed, &memory));
    assert!(!schema.is_assigned(&unplaced, &memory));
}

#[test]
fn test_unregistered_class_is_problem_fact() {
    let schema = lesson_schema();
    let fact = FactRef::new(FactId(1), 42i64, None);
    assert!(schema.class(fact.type_id()).is_none());
    assert!(schema.is_assigned(&fact, &Memory(Vec::new())));
}

#[test]
fn test_list_element_falls_back_to_owner_scan() {
    let schema = DomainSchema::new()
        .with_class(ClassDescriptor::entity::<Vehicle>().with_variable(
            VariableDescriptor::list::<Vehicle, Visit, _>("visits", |v: &Vehicle| {
                v.visits.iter().map(|id| Value::Int(*id)).collect()
            }),
        ))
        .with_class(ClassDescriptor::problem_fact::<Visit>().with_planning_id(|v: &Visit| v.id));
    assert!(schema.validate().is_ok());
    assert!(schema.is_list_element(TypeId::of::<Visit>()));

    let visit = |id: i64| {
        FactRef::new(
            FactId(id as u64),
            Visit { id, vehicle: None },
            schema.planning_id(TypeId::of::<Visit>(), &Visit { id, vehicle: None }),
        )
    };
    let owner = FactRef::new(FactId(100), Vehicle { visits: vec![1] }, None);
    let memory = Memory(vec![owner]);
    assert!(schema.is_assigned(&visit(1), &memory));
    assert!(!schema.is_assigned(&visit(2), &memory));
}

#[test]
fn test_inverse_relation_preferred_over_scan() {
    let schema = DomainSchema::new()
        .with_class(ClassDescriptor::entity::<Vehicle>().with_variable(
            VariableDescriptor::list::<Vehicle, Visit, _>("visits", |v: &Vehicle| {
                v.visits.iter().map(|id| Value::Int(*id)).collect()
            }),
        ))
        .with_class(ClassDescriptor::entity::<Visit>().with_variable(
            VariableDescriptor::inverse_relation("vehicle", |v: &Visit| v.vehicle.is_some()),
        ));
    assert!(schema.validate().is_ok());
    // The owner claims the visit, but the shadow says otherwise and wins.
    let memory = Memory(vec![FactRef::new(FactId(100), Vehicle { visits: vec![1] }, None)]);
    let visit = FactRef::new(FactId(1), Visit { id: 1, vehicle: None }, None);
    assert!(!schema.is_assigned(&visit, &memory));
    let visit = visit.replaced(Visit { id: 1, vehicle: Some(0) }, None);
    assert!(schema.is_assigned(&visit, &memory));
}

#[test]
fn test_validate_rejects_unidentifiable_list_elements() {
    let schema = DomainSchema::new().with_class(ClassDescriptor::entity::<Vehicle>().with_variable(
        VariableDescriptor::list::<Vehicle, Visit, _>("visits", |_: &Vehicle| Vec::new()),
    ));
    let err = schema.validate().unwrap_err();
    assert!(err.to_string().contains("visits"));
}

#[test]
fn test_find_variable() {
    let schema = lesson_schema();
    let class = schema.class_of::<Lesson>().unwrap();
    assert_eq!(class.kind, ClassKind::PlanningEntity);
    assert_eq!(class.genuine_variable_descriptors().count(), 2);
    assert!(schema.find_variable(TypeId::of::<Lesson>(), "room").is_some());
    assert!(schema.find_variable(TypeId::of::<Lesson>(), "colour").is_none());
}

#[test]
fn test_scanned_element_types() {
    let scanned = DomainSchema::new()
        .with_class(ClassDescriptor::entity::<Vehicle>().with_variable(
            VariableDescriptor::list::<Vehicle, Visit, _>("visits", |_: &Vehicle| Vec::new()),
        ))
        .with_class(ClassDescriptor::problem_fact::<Visit>().with_planning_id(|v: &Visit| v.id));
    assert_eq!(
        scanned.scanned_element_types(TypeId::of::<Vehicle>()),
        vec![TypeId::of::<Visit>()]
    );
    assert!(scanned.scanned_element_types(TypeId::of::<Visit>()).is_empty());

    let shadowed = scanned.with_class(ClassDescriptor::entity::<Visit>().with_variable(
        VariableDescriptor::inverse_relation("vehicle", |v: &Visit| v.vehicle.is_some()),
    ));
    assert!(shadowed.scanned_element_types(TypeId::of::<Vehicle>()).is_empty());
}
