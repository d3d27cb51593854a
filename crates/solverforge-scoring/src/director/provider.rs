//! Source of a session's constraints.

use solverforge_core::{Result, Score};

use crate::constraint::Constraint;
use crate::stream::ConstraintFactory;

/// Defines the constraints of a planning problem.
///
/// # Example
///
/// ```
/// use solverforge_core::{Result, SimpleScore};
/// use solverforge_scoring::constraint::Constraint;
/// use solverforge_scoring::director::ConstraintProvider;
/// use solverforge_scoring::stream::ConstraintFactory;
///
/// #[derive(Debug)]
/// struct Visit { vehicle: Option<u32> }
///
/// struct Routing;
///
/// impl ConstraintProvider<SimpleScore> for Routing {
///     fn define_constraints(&self, factory: &ConstraintFactory) -> Result<Vec<Constraint<SimpleScore>>> {
///         Ok(vec![factory
///             .for_each::<Visit>()
///             .penalize(SimpleScore::ONE)
///             .as_constraint("Visit")?])
///     }
///
///     fn package(&self) -> String {
///         "routing".into()
///     }
/// }
///
/// let factory = ConstraintFactory::new(Routing.package());
/// assert_eq!(Routing.define_constraints(&factory).unwrap().len(), 1);
/// ```
pub trait ConstraintProvider<Sc: Score> {
    /// Builds every constraint with `factory`, which carries the package.
    fn define_constraints(&self, factory: &ConstraintFactory) -> Result<Vec<Constraint<Sc>>>;

    /// Package of the constraints when the configuration names none.
    ///
    /// Defaults to the module path of the provider type.
    fn package(&self) -> String {
        let full = std::any::type_name::<Self>();
        match full.rsplit_once("::") {
            Some((module, _)) => module.to_string(),
            None => String::new(),
        }
    }
}
