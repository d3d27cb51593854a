//! Shift scheduling test fixtures.
//!
//! Shifts are planning entities whose `employee` variable may be unassigned;
//! employees are problem facts. Times are whole hours from the start of the
//! schedule, so day `d` spans hours `24 * d .. 24 * (d + 1)`.
//!
//! # Example
//!
//! ```
//! use solverforge_test::shift::{schema, Employee, Shift};
//!
//! let ann = Employee::new("Ann").with_skills(["nurse"]);
//! let shift = Shift::new(1, 8, 16, "nurse").assigned_to("Ann");
//! assert!(ann.has_skill(&shift.required_skill));
//! assert!(schema().validate().is_ok());
//! ```

use solverforge_core::domain::{ClassDescriptor, DomainSchema, VariableDescriptor};
use solverforge_core::{HardSoftScore, Result};
use solverforge_scoring::stream::collector::count;
use solverforge_scoring::stream::joiner::{equal_bi, overlapping};
use solverforge_scoring::{
    Constraint, ConstraintFactory, ConstraintProvider, GroupArg, Mapping, Predicate,
};

/// An employee that shifts can be assigned to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Employee {
    pub name: String,
    pub skills: Vec<String>,
    pub unavailable_days: Vec<i64>,
}

impl Employee {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skills: Vec::new(),
            unavailable_days: Vec::new(),
        }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills.extend(skills.into_iter().map(Into::into));
        self
    }

    pub fn with_unavailable_day(mut self, day: i64) -> Self {
        self.unavailable_days.push(day);
        self
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }
}

/// A shift needing one employee with the required skill.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shift {
    pub id: i64,
    pub start: i64,
    pub end: i64,
    pub required_skill: String,
    pub employee: Option<String>,
}

impl Shift {
    /// Creates an unassigned shift.
    pub fn new(id: i64, start: i64, end: i64, required_skill: impl Into<String>) -> Self {
        Self {
            id,
            start,
            end,
            required_skill: required_skill.into(),
            employee: None,
        }
    }

    pub fn assigned_to(mut self, employee: impl Into<String>) -> Self {
        self.employee = Some(employee.into());
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.employee = None;
        self
    }

    pub fn day(&self) -> i64 {
        self.start.div_euclid(24)
    }

    pub fn hours(&self) -> i64 {
        self.end - self.start
    }
}

/// Schema of the shift scheduling domain.
pub fn schema() -> DomainSchema {
    DomainSchema::new()
        .with_class(
            ClassDescriptor::entity::<Shift>()
                .with_planning_id(|s: &Shift| s.id)
                .with_variable(VariableDescriptor::genuine("employee", |s: &Shift| {
                    s.employee.is_some()
                })),
        )
        .with_class(
            ClassDescriptor::problem_fact::<Employee>().with_planning_id(|e: &Employee| e.name.clone()),
        )
}

/// Maximum number of shifts per employee before a soft penalty applies.
pub const MAX_SHIFTS_PER_EMPLOYEE: i64 = 2;

/// Constraints of the shift scheduling domain.
pub struct ShiftConstraints;

impl ShiftConstraints {
    pub const REQUIRED_SKILL: &'static str = "Missing required skill";
    pub const NO_OVERLAPPING_SHIFTS: &'static str = "Overlapping shift";
    pub const UNAVAILABLE_EMPLOYEE: &'static str = "Unavailable employee";
    pub const TOO_MANY_SHIFTS: &'static str = "Too many shifts";
    pub const IDLE_EMPLOYEE: &'static str = "Idle employee";
    pub const UNASSIGNED_SHIFT: &'static str = "Unassigned shift";
}

fn shift_employee() -> Mapping {
    Mapping::of(|s: &Shift| s.employee.clone())
}

fn employee_name() -> Mapping {
    Mapping::of(|e: &Employee| e.name.clone())
}

impl ConstraintProvider<HardSoftScore> for ShiftConstraints {
    fn define_constraints(&self, factory: &ConstraintFactory) -> Result<Vec<Constraint<HardSoftScore>>> {
        Ok(vec![
            required_skill(factory)?,
            no_overlapping_shifts(factory)?,
            unavailable_employee(factory)?,
            too_many_shifts(factory)?,
            idle_employee(factory)?,
            unassigned_shift(factory)?,
        ])
    }

    fn package(&self) -> String {
        "scheduling".into()
    }
}

pub fn required_skill(factory: &ConstraintFactory) -> Result<Constraint<HardSoftScore>> {
    factory
        .for_each::<Shift>()
        .join::<Employee>(vec![equal_bi(shift_employee(), employee_name())])
        .filter(Predicate::of_bi(|s: &Shift, e: &Employee| {
            !e.has_skill(&s.required_skill)
        }))
        .penalize(HardSoftScore::ONE_HARD)
        .as_constraint(ShiftConstraints::REQUIRED_SKILL)
}

pub fn no_overlapping_shifts(factory: &ConstraintFactory) -> Result<Constraint<HardSoftScore>> {
    factory
        .for_each_unique_pair::<Shift>(vec![
            equal_bi(shift_employee(), shift_employee()),
            overlapping(
                Mapping::of(|s: &Shift| s.start),
                Mapping::of(|s: &Shift| s.end),
            ),
        ])
        .penalize(HardSoftScore::ONE_HARD)
        .as_constraint(ShiftConstraints::NO_OVERLAPPING_SHIFTS)
}

pub fn unavailable_employee(factory: &ConstraintFactory) -> Result<Constraint<HardSoftScore>> {
    factory
        .for_each::<Shift>()
        .join::<Employee>(vec![equal_bi(shift_employee(), employee_name())])
        .filter(Predicate::of_bi(|s: &Shift, e: &Employee| {
            e.unavailable_days.contains(&s.day())
        }))
        .penalize_with(
            HardSoftScore::ONE_HARD,
            Mapping::of_bi(|s: &Shift, _: &Employee| s.hours()),
        )
        .as_constraint(ShiftConstraints::UNAVAILABLE_EMPLOYEE)
}

pub fn too_many_shifts(factory: &ConstraintFactory) -> Result<Constraint<HardSoftScore>> {
    factory
        .for_each::<Shift>()
        .group_by([GroupArg::key(shift_employee()), GroupArg::collect(count())])
        .filter(Predicate::new(|t| t.int(1) > MAX_SHIFTS_PER_EMPLOYEE))
        .penalize_with(
            HardSoftScore::ONE_SOFT,
            Mapping::new(|t| t.int(1) - MAX_SHIFTS_PER_EMPLOYEE),
        )
        .as_constraint(ShiftConstraints::TOO_MANY_SHIFTS)
}

pub fn idle_employee(factory: &ConstraintFactory) -> Result<Constraint<HardSoftScore>> {
    factory
        .for_each::<Employee>()
        .if_not_exists::<Shift>(vec![equal_bi(employee_name(), shift_employee())])
        .penalize(HardSoftScore::ONE_SOFT)
        .as_constraint(ShiftConstraints::IDLE_EMPLOYEE)
}

pub fn unassigned_shift(factory: &ConstraintFactory) -> Result<Constraint<HardSoftScore>> {
    factory
        .for_each_including_unassigned::<Shift>()
        .filter(Predicate::of(|s: &Shift| s.employee.is_none()))
        .penalize(HardSoftScore::ONE_SOFT)
        .as_constraint(ShiftConstraints::UNASSIGNED_SHIFT)
}
