//! Array-aware value equality and hashing.

use crate::schema::PropertyDescriptor;
use crate::value::{string_hash, Array, ObjectSemantics, Value};

/// Compares two property values.
///
/// With `inspect_arrays` set, arrays are equal when they have the same shape
/// (component kind and rank), the same length and equal elements, recursively.
/// Otherwise values use natural equality, where arrays compare by identity.
/// Objects, including array elements, compare through `objects`.
pub fn value_equal(x: &Value, y: &Value, inspect_arrays: bool, objects: &dyn ObjectSemantics) -> bool {
    if x.same_reference(y) {
        return true;
    }
    match (x, y) {
        (Value::Array(a), Value::Array(b)) if inspect_arrays => arrays_equal(a, b, objects),
        (Value::Object(a), Value::Object(b)) => objects.equal(a, b),
        _ => x.natural_eq(y),
    }
}

fn arrays_equal(a: &Array, b: &Array, objects: &dyn ObjectSemantics) -> bool {
    a.shape() == b.shape()
        && a.len() == b.len()
        && a
            .elements()
            .iter()
            .zip(b.elements())
            .all(|(x, y)| value_equal(x, y, true, objects))
}

/// Compares the values `property` reads, following its array flags.
pub fn property_equal(
    property: &PropertyDescriptor,
    x: &Value,
    y: &Value,
    objects: &dyn ObjectSemantics,
) -> bool {
    value_equal(x, y, property.inspects_arrays(), objects)
}

/// Hashes one property value.
///
/// Arrays hash their elements as `h = 31 * h + e` starting from 1. Nested
/// arrays contribute only their shape and length unless `deep` is set.
pub fn value_hash(value: &Value, inspect_arrays: bool, deep: bool, objects: &dyn ObjectSemantics) -> i32 {
    match value {
        Value::Array(array) if inspect_arrays => array_hash(array, deep, objects),
        Value::Object(object) => objects.hash(object),
        other => other.natural_hash(),
    }
}

fn array_hash(array: &Array, deep: bool, objects: &dyn ObjectSemantics) -> i32 {
    array.elements().iter().fold(1i32, |h, element| {
        let e = match element {
            Value::Array(inner) if deep => array_hash(inner, deep, objects),
            Value::Array(inner) => shape_hash(inner),
            Value::Object(object) => objects.hash(object),
            other => other.natural_hash(),
        };
        h.wrapping_mul(31).wrapping_add(e)
    })
}

fn shape_hash(array: &Array) -> i32 {
    string_hash(&array.shape().to_string())
        .wrapping_mul(31)
        .wrapping_add(array.len() as i32)
}

pub fn property_hash(property: &PropertyDescriptor, value: &Value, objects: &dyn ObjectSemantics) -> i32 {
    value_hash(value, property.inspects_arrays(), property.deep_array(), objects)
}
