//! Model module - the declared type universe.
//!
//! Declarations are plain data (loadable from YAML/JSON); registering them in a
//! [`TypeRegistry`] links each type to its parent and interfaces.

mod elements;
mod registry;

pub use elements::*;
pub use registry::*;
