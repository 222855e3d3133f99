//! Structural operations over resolved schemas.

mod diff;
mod error;
mod operations;
mod values;


pub use diff::*;
pub use error::*;
pub use operations::*;
pub use values::*;
