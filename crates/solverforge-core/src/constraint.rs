//! Core constraint types.
//!
//! This module provides constraint identification and the classification of
//! how a constraint's matches move the score.

use std::fmt;

/// Reference to a constraint for identification.
///
/// # Example
///
/// ```
/// use solverforge_core::ConstraintRef;
///
/// let cr = ConstraintRef::new("scheduling", "No overlap");
/// assert_eq!(cr.constraint_id(), "scheduling/No overlap");
///
/// let parsed = ConstraintRef::parse_id("org.acme.rules/Max hours");
/// assert_eq!(parsed.package, "org.acme.rules");
/// assert_eq!(parsed.name, "Max hours");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintRef {
    /// Package/module containing the constraint.
    pub package: String,
    /// Name of the constraint.
    pub name: String,
}

impl ConstraintRef {
    /// Creates a new constraint reference.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Splits an id on its last `/`; ids without one have an empty package.
    pub fn parse_id(constraint_id: &str) -> Self {
        match constraint_id.rfind('/') {
            Some(slash) => Self::new(&constraint_id[..slash], &constraint_id[slash + 1..]),
            None => Self::new("", constraint_id),
        }
    }

    /// Returns the stable `package/name` identifier.
    pub fn constraint_id(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.package, self.name)
        }
    }
}

impl fmt::Display for ConstraintRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.constraint_id())
    }
}

/// Type of impact a constraint has on the score.
///
/// # Example
///
/// ```
/// use solverforge_core::ImpactType;
///
/// assert_eq!(ImpactType::Penalty.sign(), -1);
/// assert_eq!(ImpactType::Mixed.sign(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImpactType {
    /// Penalize (subtract from score).
    Penalty,
    /// Reward (add to score).
    Reward,
    /// The match weight carries its own sign.
    Mixed,
}

impl ImpactType {
    /// Multiplier applied to `weight * match_weight`.
    pub fn sign(self) -> i64 {
        match self {
            ImpactType::Penalty => -1,
            ImpactType::Reward | ImpactType::Mixed => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_id() {
        let cr = ConstraintRef::new("my.package", "TestConstraint");
        assert_eq!(cr.constraint_id(), "my.package/TestConstraint");
        assert_eq!(cr.to_string(), "my.package/TestConstraint");
    }

    #[test]
    fn test_constraint_id_empty_package() {
        let cr = ConstraintRef::new("", "Simple");
        assert_eq!(cr.constraint_id(), "Simple");
    }

    #[test]
    fn test_parse_id_uses_last_slash() {
        let cr = ConstraintRef::parse_id("a/b/c");
        assert_eq!(cr, ConstraintRef::new("a/b", "c"));
        assert_eq!(ConstraintRef::parse_id("plain"), ConstraintRef::new("", "plain"));
    }

    #[test]
    fn test_ordering_by_package_then_name() {
        let mut refs = vec![
            ConstraintRef::new("b", "a"),
            ConstraintRef::new("a", "z"),
            ConstraintRef::new("a", "b"),
        ];
        refs.sort();
        assert_eq!(refs[0], ConstraintRef::new("a", "b"));
        assert_eq!(refs[2], ConstraintRef::new("b", "a"));
    }
}
