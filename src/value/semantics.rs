//! Semantics of object values nested inside properties.

use std::sync::Arc;

use super::value::{ObjectRef, Value};

/// ObjectSemantics decides how object values held by properties are
/// compared, hashed and rendered.
pub trait ObjectSemantics {
    fn equal(&self, a: &ObjectRef, b: &ObjectRef) -> bool;

    fn hash(&self, object: &ObjectRef) -> i32;

    /// Text for `object`, or `None` to fall back to its natural text.
    fn text(&self, object: &ObjectRef) -> Option<String>;
}

/// NaturalObjects treats objects by identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalObjects;

impl ObjectSemantics for NaturalObjects {
    fn equal(&self, a: &ObjectRef, b: &ObjectRef) -> bool {
        Arc::ptr_eq(a, b)
    }

    fn hash(&self, object: &ObjectRef) -> i32 {
        Value::Object(object.clone()).natural_hash()
    }

    fn text(&self, _object: &ObjectRef) -> Option<String> {
        None
    }
}
