//! Session and registry tests.

use solverforge_config::{ConstraintConfig, EnvironmentMode, FetchPolicy};
use solverforge_core::domain::{ClassDescriptor, VariableDescriptor};
use solverforge_core::{DomainSchema, HardSoftScore, Result, SolverForgeError, Value};

use super::*;
use crate::constraint::Constraint;
use crate::stream::joiner::equal_bi;
use crate::stream::{ConstraintFactory, Mapping, Predicate};

#[derive(Debug, Clone)]
struct Lesson {
    id: i64,
    teacher: &'static str,
    room: Option<&'static str>,
}

#[derive(Debug, Clone)]
struct Vehicle {
    visits: Vec<i64>,
}

#[derive(Debug, Clone)]
struct Visit {
    id: i64,
}

fn schema() -> DomainSchema {
    DomainSchema::new()
        .with_class(
            ClassDescriptor::entity::<Lesson>()
                .with_planning_id(|l: &Lesson| l.id)
                .with_variable(VariableDescriptor::genuine("room", |l: &Lesson| {
                    l.room.is_some()
                })),
        )
        .with_class(ClassDescriptor::entity::<Vehicle>().with_variable(
            VariableDescriptor::list::<Vehicle, Visit, _>("visits", |v: &Vehicle| {
                v.visits.iter().copied().map(Value::from).collect()
            }),
        ))
        .with_class(ClassDescriptor::entity::<Visit>().with_planning_id(|v: &Visit| v.id))
}

struct Timetable;

impl ConstraintProvider<HardSoftScore> for Timetable {
    fn define_constraints(&self, factory: &ConstraintFactory) -> Result<Vec<Constraint<HardSoftScore>>> {
        Ok(vec![
            factory
                .for_each_unique_pair::<Lesson>(vec![
                    equal_bi(
                        Mapping::of(|l: &Lesson| l.teacher),
                        Mapping::of(|l: &Lesson| l.teacher),
                    ),
                    equal_bi(
                        Mapping::of(|l: &Lesson| l.room),
                        Mapping::of(|l: &Lesson| l.room),
                    ),
                ])
                .penalize(HardSoftScore::ONE_HARD)
                .as_constraint("Teacher conflict")?,
            factory
                .for_each_including_unassigned::<Lesson>()
                .filter(Predicate::of(|l: &Lesson| l.room.is_none()))
                .penalize(HardSoftScore::ONE_SOFT)
                .as_constraint("Unassigned lesson")?,
            factory
                .for_each::<Visit>()
                .reward(HardSoftScore::ONE_SOFT)
                .as_constraint("Visited")?,
        ])
    }

    fn package(&self) -> String {
        "school".into()
    }
}

fn session_with(config: ConstraintConfig) -> ConstraintSession<HardSoftScore> {
    ConstraintRegistry::new(schema(), config, &Timetable)
        .unwrap()
        .create_session()
}

fn session() -> ConstraintSession<HardSoftScore> {
    session_with(ConstraintConfig::default())
}

fn lesson(id: i64, teacher: &'static str, room: Option<&'static str>) -> Lesson {
    Lesson { id, teacher, room }
}

#[test]
fn test_default_package_is_module_path() {
    struct Unnamed;
    impl ConstraintProvider<HardSoftScore> for Unnamed {
        fn define_constraints(&self, _: &ConstraintFactory) -> Result<Vec<Constraint<HardSoftScore>>> {
            Ok(Vec::new())
        }
    }
    assert_eq!(
        Unnamed.package(),
        "solverforge_scoring::director::tests::test_default_package_is_module_path"
    );
}

#[test]
fn test_registry_uses_configured_package() {
    let registry =
        ConstraintRegistry::new(schema(), ConstraintConfig::new().with_package("campus"), &Timetable)
            .unwrap();
    assert!(registry.constraint("campus/Teacher conflict").is_some());
    assert!(registry.constraint("school/Teacher conflict").is_none());
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_registry_rejects_duplicate_ids() {
    let factory = ConstraintFactory::new("school");
    let build = || {
        factory
            .for_each::<Lesson>()
            .penalize(HardSoftScore::ONE_SOFT)
            .as_constraint("Lesson")
            .unwrap()
    };
    let err = ConstraintRegistry::from_constraints(
        schema(),
        ConstraintConfig::default(),
        vec![build(), build()],
    )
    .unwrap_err();
    assert!(err.to_string().contains("school/Lesson"));
}

#[test]
fn test_registry_applies_weight_overrides() {
    let config = ConstraintConfig::new()
        .with_weight("Teacher conflict", "5hard/0soft")
        .with_weight("school/Unassigned lesson", "0hard/7soft");
    let registry = ConstraintRegistry::new(schema(), config, &Timetable).unwrap();
    assert_eq!(
        registry.weight_of("school/Teacher conflict"),
        Some(HardSoftScore::of(5, 0))
    );
    assert_eq!(
        registry.weight_of("school/Unassigned lesson"),
        Some(HardSoftScore::of(0, 7))
    );
    assert_eq!(registry.weight_of("school/Visited"), Some(HardSoftScore::ONE_SOFT));

    let bad = ConstraintConfig::new().with_weight("Visited", "heavy");
    assert!(matches!(
        ConstraintRegistry::new(schema(), bad, &Timetable),
        Err(SolverForgeError::Config(_))
    ));
    let negative = ConstraintConfig::new().with_weight("Visited", "0hard/-1soft");
    assert!(matches!(
        ConstraintRegistry::new(schema(), negative, &Timetable),
        Err(SolverForgeError::Config(_))
    ));
}

#[test]
fn test_unassigned_entities_follow_updates() {
    let mut session = session();
    let a = session.insert(lesson(1, "Ann", None)).unwrap();
    let b = session.insert(lesson(2, "Ann", Some("R1"))).unwrap();
    assert!(!session.is_assigned(&a));
    assert!(!session.is_solution_initialized());
    assert_eq!(session.score(), HardSoftScore::of(0, -1));

    let a = session
        .update_variable(&a, "room", lesson(1, "Ann", Some("R1")))
        .unwrap();
    assert!(session.is_assigned(&a));
    assert!(session.is_solution_initialized());
    assert_eq!(session.score(), HardSoftScore::of(-1, 0));

    session.retract(&b).unwrap();
    assert_eq!(session.score(), HardSoftScore::ZERO);
    assert_eq!(session.fact_count(), 1);
}

#[test]
fn test_update_checks_variable_and_type() {
    let mut session = session();
    let a = session.insert(lesson(1, "Ann", None)).unwrap();
    assert!(matches!(
        session.update_variable(&a, "teacher", lesson(1, "Bob", None)),
        Err(SolverForgeError::Config(_))
    ));
    assert!(matches!(
        session.update(&a, Visit { id: 1 }),
        Err(SolverForgeError::Type(_))
    ));
    session.retract(&a).unwrap();
    assert!(matches!(
        session.retract(&a),
        Err(SolverForgeError::UnknownFact(_))
    ));
}

#[test]
fn test_list_elements_are_assigned_by_their_owner() {
    let mut session = session();
    let v1 = session.insert(Visit { id: 1 }).unwrap();
    session.insert(Visit { id: 2 }).unwrap();
    assert!(!session.is_assigned(&v1));
    assert_eq!(session.score(), HardSoftScore::ZERO);

    let vehicle = session.insert(Vehicle { visits: vec![1] }).unwrap();
    assert!(session.is_assigned(&v1));
    assert_eq!(session.score(), HardSoftScore::of(0, 1));

    let vehicle = session
        .update(&vehicle, Vehicle { visits: vec![1, 2] })
        .unwrap();
    assert_eq!(session.score(), HardSoftScore::of(0, 2));

    session.retract(&vehicle).unwrap();
    assert_eq!(session.score(), HardSoftScore::ZERO);
}

#[test]
fn test_explain_and_analyze() {
    let mut session = session();
    session.insert(lesson(1, "Ann", Some("R1"))).unwrap();
    session.insert(lesson(2, "Ann", Some("R1"))).unwrap();
    session.insert(lesson(3, "Bob", None)).unwrap();

    let explanation = session.explain();
    assert_eq!(explanation.score, HardSoftScore::of(-1, -1));
    let conflict = explanation
        .constraint_match_total("school/Teacher conflict")
        .unwrap();
    assert_eq!(conflict.match_count(), 1);
    assert_eq!(conflict.score, HardSoftScore::of(-1, 0));
    assert_eq!(explanation.indictment_map.len(), 3);

    let all = session.analyze(FetchPolicy::FetchAll);
    assert_eq!(all.score, session.score());
    let unassigned = all.constraint_analysis("school", "Unassigned lesson").unwrap();
    assert_eq!(unassigned.matches.as_ref().map(Vec::len), Some(1));
    assert!(!all.is_solution_initialized);

    let counted = session.analyze(FetchPolicy::FetchMatchCount);
    let conflict = counted.constraint_analysis_by_name("Teacher conflict").unwrap();
    assert!(conflict.matches.is_none());
    assert_eq!(conflict.match_count, Some(1));

    let shallow = session.analyze(FetchPolicy::FetchShallow);
    assert!(shallow.constraint_analyses().iter().all(|c| c.match_count.is_none()));

    assert!(matches!(
        session.constraint_match_total("school/Missing"),
        Err(SolverForgeError::NoSuchConstraint(_))
    ));
}

#[test]
fn test_constraint_weight_swap() {
    let mut session = session();
    session.insert(lesson(1, "Ann", Some("R1"))).unwrap();
    session.insert(lesson(2, "Ann", Some("R1"))).unwrap();
    assert_eq!(session.score(), HardSoftScore::of(-1, 0));

    session
        .set_constraint_weight("school/Teacher conflict", HardSoftScore::of(3, 0))
        .unwrap();
    assert_eq!(session.score(), HardSoftScore::of(-3, 0));

    session
        .set_constraint_weight("school/Teacher conflict", HardSoftScore::ZERO)
        .unwrap();
    assert_eq!(session.score(), HardSoftScore::ZERO);
    session.insert(lesson(3, "Ann", Some("R1"))).unwrap();
    assert_eq!(session.score(), HardSoftScore::ZERO);

    session
        .set_constraint_weight("school/Teacher conflict", HardSoftScore::ONE_HARD)
        .unwrap();
    assert_eq!(session.score(), HardSoftScore::of(-3, 0));
    assert_eq!(session.calculate_from_scratch().unwrap(), session.score());

    assert!(matches!(
        session.set_constraint_weight("school/Teacher conflict", HardSoftScore::of(-1, 0)),
        Err(SolverForgeError::Config(_))
    ));
    assert!(matches!(
        session.set_constraint_weight("school/Missing", HardSoftScore::ONE_HARD),
        Err(SolverForgeError::NoSuchConstraint(_))
    ));
}

#[test]
fn test_full_assert_checks_every_mutation() {
    let config = ConstraintConfig::new().with_environment_mode(EnvironmentMode::FullAssert);
    let mut session = session_with(config);
    let a = session.insert(lesson(1, "Ann", None)).unwrap();
    session.insert(lesson(2, "Ann", Some("R1"))).unwrap();
    let a = session.update(&a, lesson(1, "Ann", Some("R1"))).unwrap();
    session.insert(Visit { id: 7 }).unwrap();
    session.insert(Vehicle { visits: vec![7] }).unwrap();
    session.retract(&a).unwrap();
    assert_eq!(session.score(), HardSoftScore::of(0, 1));
}

#[test]
fn test_failing_constraint_leaves_others_running() {
    let factory = ConstraintFactory::new("school");
    let constraints = vec![
        factory
            .for_each::<Lesson>()
            .filter(Predicate::of(|l: &Lesson| {
                assert!(l.teacher != "Zed", "lesson {} has no teacher record", l.id);
                true
            }))
            .penalize(HardSoftScore::ONE_SOFT)
            .as_constraint("Fragile")
            .unwrap(),
        factory
            .for_each::<Lesson>()
            .penalize(HardSoftScore::ONE_HARD)
            .as_constraint("Lesson")
            .unwrap(),
    ];
    let mut session =
        ConstraintRegistry::from_constraints(schema(), ConstraintConfig::default(), constraints)
            .unwrap()
            .create_session();

    session.insert(lesson(1, "Ann", Some("R1"))).unwrap();
    let err = session.insert(lesson(2, "Zed", Some("R1"))).unwrap_err();
    assert!(err.to_string().contains("school/Fragile"));
    assert!(err.to_string().contains("lesson 2 has no teacher record"));

    assert_eq!(session.score(), HardSoftScore::of(-2, 0));
    let failed = session.failed_constraints();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0.name, "Fragile");

    session.insert(lesson(3, "Ann", Some("R2"))).unwrap();
    assert_eq!(session.score(), HardSoftScore::of(-3, 0));
    assert_eq!(session.facts_of::<Lesson>().len(), 3);
}
