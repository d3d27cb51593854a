//! Runtime descriptors of the domain model.

mod class;
mod schema;
mod var_descriptor;

#[cfg(test)]
mod tests;

pub use class::{ClassDescriptor, ClassKind};
pub use schema::DomainSchema;
pub use var_descriptor::VariableDescriptor;
