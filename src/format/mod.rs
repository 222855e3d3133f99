//! Formatter chain - whole-object and per-property text formatting.
//!
//! A structural `to_string` asks a fresh [`ObjectFormatter`] for the framing
//! text and one [`PropertyFormatter`] per string property for the values.
//! Both are looked up by id in a [`FormatterRegistry`].

mod error;
mod object;
mod property;
mod registry;

pub use error::*;
pub use object::*;
pub use property::*;
pub use registry::*;
