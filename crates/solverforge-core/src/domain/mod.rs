//! Domain model: values, fact handles, tuples and the schema descriptor
//!
//! - `Value`: dynamically typed value carried by stream tuples
//! - `FactRef`: identity-carrying handle to a fact or entity
//! - `Tuple`: one to four values flowing through a stream node
//! - `DomainSchema`: explicit description of entity classes and variables

mod descriptor;
mod fact;
mod tuple;
mod value;
mod variable;

pub use descriptor::{ClassDescriptor, ClassKind, DomainSchema, VariableDescriptor};
pub use fact::{short_type_name, FactData, FactId, FactRef, FactSource};
pub use tuple::{Tuple, MAX_ARITY};
pub use value::{Value, ValueObject};
pub use variable::{ShadowVariableKind, VariableType};
