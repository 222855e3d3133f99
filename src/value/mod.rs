//! Value module - runtime values and object instances.
//!
//! Values carry their own runtime shape, so a property declared as a plain
//! object can still be recognised as an array when it holds one.

mod instance;
mod semantics;
mod value;

pub use instance::*;
pub use semantics::*;
pub use value::*;
