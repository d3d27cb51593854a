use solverforge_config::ConstraintConfig;
use solverforge_core::score::{HardSoftScore, SimpleScore};
use solverforge_core::{ConstraintRef, SolverForgeError};

use crate::api::weight_overrides::ConstraintWeightOverrides;

// ============================================================================
// ConstraintWeightOverrides tests
// ============================================================================

fn overlap() -> ConstraintRef {
    ConstraintRef::new("roster", "Overlapping shifts")
}

#[test]
fn test_new_is_empty() {
    let overrides = ConstraintWeightOverrides::<SimpleScore>::new();
    assert!(overrides.is_empty());
    assert_eq!(overrides.len(), 0);
    assert_eq!(overrides.get(&overlap()), None);
}

#[test]
fn test_lookup_by_id_or_name() {
    let mut overrides = ConstraintWeightOverrides::<SimpleScore>::new();
    overrides.put("Overlapping shifts", SimpleScore::of(5));
    assert_eq!(overrides.get(&overlap()), Some(SimpleScore::of(5)));

    overrides.put("roster/Overlapping shifts", SimpleScore::of(7));
    assert_eq!(overrides.get(&overlap()), Some(SimpleScore::of(7)));

    let elsewhere = ConstraintRef::new("other", "Overlapping shifts");
    assert_eq!(overrides.get(&elsewhere), Some(SimpleScore::of(5)));
}

#[test]
fn test_get_or_default() {
    let overrides = ConstraintWeightOverrides::<SimpleScore>::new();
    let weight = overrides.get_or_default(&overlap(), SimpleScore::of(1));
    assert_eq!(weight, SimpleScore::of(1));
}

#[test]
fn test_remove() {
    let mut overrides = ConstraintWeightOverrides::<SimpleScore>::new();
    overrides.put("test", SimpleScore::of(5));

    let removed = overrides.remove("test");
    assert_eq!(removed, Some(SimpleScore::of(5)));
    assert!(!overrides.contains("test"));
}

#[test]
fn test_from_pairs() {
    let overrides = ConstraintWeightOverrides::<HardSoftScore>::from_pairs([
        ("roster/Overlapping shifts", HardSoftScore::of_hard(1)),
        ("Long shift", HardSoftScore::of_soft(10)),
    ]);

    assert_eq!(overrides.len(), 2);
    assert_eq!(overrides.get(&overlap()), Some(HardSoftScore::of_hard(1)));
    assert_eq!(
        overrides.get(&ConstraintRef::new("roster", "Long shift")),
        Some(HardSoftScore::of_soft(10))
    );
}

#[test]
fn test_from_config_parses_scores() {
    let config = ConstraintConfig::new()
        .with_weight("roster/Overlapping shifts", "2hard/0soft")
        .with_weight("Long shift", "0hard/3soft");
    let overrides = ConstraintWeightOverrides::<HardSoftScore>::from_config(&config).unwrap();
    assert_eq!(overrides.get(&overlap()), Some(HardSoftScore::of(2, 0)));

    let broken = ConstraintConfig::new().with_weight("Long shift", "lots");
    let err = ConstraintWeightOverrides::<HardSoftScore>::from_config(&broken).unwrap_err();
    assert!(matches!(err, SolverForgeError::Config(_)));
}

#[test]
fn test_unknown_keys() {
    let overrides = ConstraintWeightOverrides::<SimpleScore>::from_pairs([
        ("Overlapping shifts", SimpleScore::of(1)),
        ("roster/Typo", SimpleScore::of(1)),
    ]);
    let known = overlap();
    assert_eq!(overrides.unknown_keys(&[&known]), vec!["roster/Typo"]);
}
