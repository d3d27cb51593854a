//! Shift scheduling scenarios checked through `ConstraintVerifier` and full sessions.

use solverforge_config::{ConstraintConfig, EnvironmentMode, FetchPolicy};
use solverforge_core::{HardSoftScore, Value};
use solverforge_scoring::ConstraintRegistry;
use solverforge_test::shift::{schema, Employee, Shift, ShiftConstraints};
use solverforge_test::{ConstraintVerifier, VerifyError};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn verifier() -> ConstraintVerifier<HardSoftScore> {
    init_logging();
    ConstraintVerifier::new(schema(), ConstraintConfig::default(), &ShiftConstraints).unwrap()
}

#[test]
fn test_pairwise_overlapping_shifts_penalize_each_pair() {
    verifier()
        .verify_that(ShiftConstraints::NO_OVERLAPPING_SHIFTS)
        .unwrap()
        .given([
            Shift::new(1, 0, 8, "nurse").assigned_to("Ann"),
            Shift::new(2, 2, 10, "nurse").assigned_to("Ann"),
            Shift::new(3, 4, 12, "nurse").assigned_to("Ann"),
        ])
        .unwrap()
        .penalizes_by(3)
        .unwrap();
}

#[test]
fn test_separate_shifts_have_no_violations() {
    let verification = verifier()
        .verify_that(ShiftConstraints::NO_OVERLAPPING_SHIFTS)
        .unwrap()
        .given([
            Shift::new(1, 0, 8, "nurse").assigned_to("Ann"),
            Shift::new(2, 8, 16, "nurse").assigned_to("Ann"),
            Shift::new(3, 0, 8, "nurse").assigned_to("Bob"),
        ])
        .unwrap();
    verification.has_no_violations().unwrap();
    verification.penalizes(0).unwrap();
}

#[test]
fn test_unavailable_employee_weighs_by_hours() {
    verifier()
        .verify_that("scheduling/Unavailable employee")
        .unwrap()
        .given([Employee::new("Ann").with_unavailable_day(1)])
        .unwrap()
        .given([
            Shift::new(1, 24, 30, "nurse").assigned_to("Ann"),
            Shift::new(2, 0, 8, "nurse").assigned_to("Ann"),
        ])
        .unwrap()
        .penalizes_by(6)
        .unwrap();
}

#[test]
fn test_too_many_shifts_counts_beyond_the_limit() {
    let shifts = (0..5).map(|i| Shift::new(i, 24 * i, 24 * i + 8, "nurse").assigned_to("Ann"));
    let verification = verifier()
        .verify_that(ShiftConstraints::TOO_MANY_SHIFTS)
        .unwrap()
        .given(shifts)
        .unwrap();
    verification.penalizes(1).unwrap();
    verification.penalizes_by(3).unwrap();
}

#[test]
fn test_idle_employee_until_assigned() {
    let mut verification = verifier()
        .verify_that(ShiftConstraints::IDLE_EMPLOYEE)
        .unwrap()
        .given([Employee::new("Ann"), Employee::new("Bob")])
        .unwrap()
        .given([Shift::new(1, 0, 8, "nurse")])
        .unwrap();
    verification.penalizes_by(2).unwrap();

    let session = verification.session_mut();
    let shift = session.facts_of::<Shift>().remove(0);
    session
        .update_variable(&shift, "employee", Shift::new(1, 0, 8, "nurse").assigned_to("Bob"))
        .unwrap();
    verification.penalizes_by(1).unwrap();
}

#[test]
fn test_broken_expectation_explains_the_matches() {
    let err = verifier()
        .verify_that(ShiftConstraints::REQUIRED_SKILL)
        .unwrap()
        .given([Employee::new("Ann").with_skills(["cook"])])
        .unwrap()
        .given([Shift::new(1, 0, 8, "nurse").assigned_to("Ann")])
        .unwrap()
        .has_no_violations()
        .unwrap_err();
    match &err {
        VerifyError::Mismatch {
            constraint, actual, ..
        } => {
            assert_eq!(constraint, "scheduling/Missing required skill");
            assert_eq!(actual, "1 matched tuple(s)");
        }
        other => panic!("unexpected error {other}"),
    }
    let message = err.to_string();
    assert!(message.starts_with("Broken expectation."));
    assert!(message.contains("constraint (Missing required skill) has 1 matches"));
}

#[test]
fn test_unknown_constraint_is_reported() {
    assert!(matches!(
        verifier().verify_that("Missing"),
        Err(VerifyError::Session(_))
    ));
}

#[test]
fn test_schedule_session_end_to_end() {
    init_logging();
    let config = ConstraintConfig::new()
        .with_environment_mode(EnvironmentMode::FullAssert)
        .with_weight("Unassigned shift", "0hard/10soft");
    let registry = ConstraintRegistry::new(schema(), config, &ShiftConstraints).unwrap();
    let mut session = registry.create_session();

    session.insert(Employee::new("Ann").with_skills(["nurse"])).unwrap();
    session.insert(Employee::new("Bob").with_skills(["cook"])).unwrap();
    let s1 = session.insert(Shift::new(1, 0, 8, "nurse")).unwrap();
    let s2 = session
        .insert(Shift::new(2, 4, 12, "nurse").assigned_to("Ann"))
        .unwrap();
    // Bob idle, s1 unassigned.
    assert_eq!(session.score(), HardSoftScore::of(0, -11));

    let s1 = session
        .update(&s1, Shift::new(1, 0, 8, "nurse").assigned_to("Ann"))
        .unwrap();
    // Overlap with s2; Bob still idle.
    assert_eq!(session.score(), HardSoftScore::of(-1, -1));

    let before = session.analyze(FetchPolicy::FetchAll);
    session
        .update(&s2, Shift::new(2, 4, 12, "nurse").assigned_to("Bob"))
        .unwrap();
    // Bob lacks the skill and is no longer idle.
    assert_eq!(session.score(), HardSoftScore::of(-1, 0));
    let after = session.analyze(FetchPolicy::FetchAll);

    let diff = after.diff(&before).unwrap();
    assert_eq!(diff.score, after.score - before.score);
    let overlap = diff.constraint_analysis_by_name("Overlapping shift").unwrap();
    assert_eq!(overlap.score, HardSoftScore::of(1, 0));
    let skill = diff.constraint_analysis_by_name("Missing required skill").unwrap();
    assert_eq!(skill.score, HardSoftScore::of(-1, 0));

    let explanation = session.explain();
    let indictment = explanation.indictment(&Value::Fact(s1.clone())).is_none();
    assert!(indictment, "s1 no longer participates in any match");
    assert_eq!(explanation.total_match_count(), 1);

    session.retract(&s1).unwrap();
    assert!(session.is_solution_initialized());
}
