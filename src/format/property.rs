//! Per-property value formatters.

use std::fmt::{self, Write};

use super::error::FormatError;
use crate::schema::PropertyDescriptor;
use crate::value::{Array, ObjectRef, ObjectSemantics, Value};

/// PropertyFormatter renders one property value.
///
/// Property formatters are resolved once per type and shared across threads.
/// `objects` renders object values held by the property.
pub trait PropertyFormatter: Send + Sync {
    fn format(
        &self,
        out: &mut String,
        property: &PropertyDescriptor,
        value: &Value,
        objects: &dyn ObjectSemantics,
    ) -> Result<(), FormatError>;
}

/// DefaultPropertyFormatter renders values in their natural form.
///
/// Characters are single-quoted with control characters escaped. Arrays are
/// bracketed lists; nested arrays collapse to a shape such as `int[2]` unless
/// the property asks for deep rendering. Objects take the text `objects`
/// gives them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPropertyFormatter;

impl PropertyFormatter for DefaultPropertyFormatter {
    fn format(
        &self,
        out: &mut String,
        property: &PropertyDescriptor,
        value: &Value,
        objects: &dyn ObjectSemantics,
    ) -> Result<(), FormatError> {
        write_value(out, value, property.inspects_arrays(), property.deep_array(), objects)?;
        Ok(())
    }
}

/// Renders `value` the way [`DefaultPropertyFormatter`] does.
pub fn render_value(
    value: &Value,
    inspect_arrays: bool,
    deep: bool,
    objects: &dyn ObjectSemantics,
) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_value(&mut out, value, inspect_arrays, deep, objects);
    out
}

/// Writes `value`; arrays are expanded only when `inspect_arrays` is set.
pub fn write_value(
    out: &mut String,
    value: &Value,
    inspect_arrays: bool,
    deep: bool,
    objects: &dyn ObjectSemantics,
) -> fmt::Result {
    match value {
        Value::Char(c) => write_char(out, *c),
        Value::Array(array) if inspect_arrays => write_array(out, array, deep, objects),
        Value::Object(object) => write_object(out, object, objects),
        other => write!(out, "{}", other),
    }
}

fn write_array(out: &mut String, array: &Array, deep: bool, objects: &dyn ObjectSemantics) -> fmt::Result {
    out.push('[');
    for (i, element) in array.elements().iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match element {
            Value::Array(inner) if deep => write_array(out, inner, deep, objects)?,
            Value::Array(inner) => out.push_str(&inner.shape().describe(inner.len())),
            Value::Char(c) => write_char(out, *c)?,
            Value::Object(object) => write_object(out, object, objects)?,
            other => write!(out, "{}", other)?,
        }
    }
    out.push(']');
    Ok(())
}

fn write_object(out: &mut String, object: &ObjectRef, objects: &dyn ObjectSemantics) -> fmt::Result {
    match objects.text(object) {
        Some(text) => out.push_str(&text),
        None => write!(out, "{}", Value::Object(object.clone()))?,
    }
    Ok(())
}

fn write_char(out: &mut String, c: char) -> fmt::Result {
    out.push('\'');
    match c {
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        '\u{8}' => out.push_str("\\b"),
        '\u{c}' => out.push_str("\\f"),
        '\'' => out.push_str("\\'"),
        '\\' => out.push_str("\\\\"),
        c if c.is_control() => write!(out, "\\u{:04x}", c as u32)?,
        c => out.push(c),
    }
    out.push('\'');
    Ok(())
}

/// AccountNumberFormatter masks all but the last four characters of a
/// string property with `*`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccountNumberFormatter;

impl AccountNumberFormatter {
    pub const ID: &'static str = "account-number";
    const VISIBLE: usize = 4;
}

impl PropertyFormatter for AccountNumberFormatter {
    fn format(
        &self,
        out: &mut String,
        property: &PropertyDescriptor,
        value: &Value,
        _objects: &dyn ObjectSemantics,
    ) -> Result<(), FormatError> {
        match value {
            Value::Null => out.push_str("null"),
            Value::String(s) => {
                let count = s.chars().count();
                let hidden = count.saturating_sub(Self::VISIBLE);
                out.extend(std::iter::repeat('*').take(hidden));
                out.extend(s.chars().skip(hidden));
            }
            other => {
                return Err(FormatError::unsupported(
                    Self::ID,
                    property.name(),
                    other.type_name(),
                ))
            }
        }
        Ok(())
    }
}
