//! # Propmatic
//!
//! Structural `equals`, `hashCode`, `toString` and `diff` for declared types.
//!
//! Types are declared as plain data (fields, accessor methods, visibility and
//! per-member markers). For each type the library resolves which properties take
//! part in equality, hashing and rendering, then evaluates those operations over
//! instances without any per-type hand-written code.
//!
//! ## Modules
//!
//! - [`model`] - Declared type universe and the registry that links it
//! - [`value`] - Runtime values and object instances
//! - [`schema`] - Property resolution into a per-type [`TypeSchema`]
//! - [`format`] - Pluggable object and property formatters for `toString`
//! - [`ops`] - Structural operations bound to one type
//! - [`cache`] - Concurrent build-once cache shared by the engine
//! - [`engine`] - Cached entry points dispatching on runtime type
//! - [`load`] - YAML/JSON readers for type universes and instances

pub mod cache;
pub mod engine;
pub mod format;
pub mod load;
pub mod model;
pub mod ops;
pub mod schema;
pub mod value;

pub use cache::InstanceCache;
pub use engine::{
    diff, equals, hash_code, is_compatible_for_equality, to_string, Structural, StructuralBuilder,
};
pub use format::{FormatError, FormatterRegistry, ObjectFormatter, PropertyFormatter};
pub use model::{FieldDecl, MethodDecl, TypeDecl, TypeId, TypeInfo, TypeRef, TypeRegistry, Universe};
pub use ops::{DiffResult, Difference, OperationError, OperationsSource, StructuralOperations};
pub use schema::{PropertyDescriptor, SchemaError, SchemaResolver, TypeSchema};
pub use value::{Instance, NaturalObjects, ObjectSemantics, Value};
