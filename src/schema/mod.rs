//! Schema module - resolves which properties of a type take part in equals,
//! hashCode and toString.
//!
//! Resolution walks a type's ancestry once per type; the result is an
//! immutable [`TypeSchema`] shared by every operation on that type.

mod descriptor;
mod error;
mod naming;
mod overrides;
mod resolver;
mod roles;

#[cfg(test)]
mod resolver_test;

pub use descriptor::*;
pub use error::*;
pub use naming::{accessor_property_name, decapitalize, is_getter};
pub use resolver::*;
pub use roles::*;
