//! Variable type definitions

/// The type of a planning variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// A genuine planning variable holding at most one value.
    Genuine,
    /// A genuine list variable holding an ordered sequence of elements.
    List,
    /// A shadow variable computed from other variables.
    Shadow(ShadowVariableKind),
}

/// The kind of shadow variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowVariableKind {
    /// Back-reference from a list element to the entity whose list holds it.
    InverseRelation,
    /// Any other derived value.
    Custom,
}

impl VariableType {
    /// Returns true if this is a genuine (non-shadow) variable.
    pub fn is_genuine(&self) -> bool {
        matches!(self, VariableType::Genuine | VariableType::List)
    }

    /// Returns true if this is a shadow variable.
    pub fn is_shadow(&self) -> bool {
        matches!(self, VariableType::Shadow(_))
    }

    /// Returns true if this is a list variable.
    pub fn is_list(&self) -> bool {
        matches!(self, VariableType::List)
    }
}
