//! Whole-object formatters.

use std::fmt::Write;

use super::error::FormatError;
use crate::model::TypeInfo;
use crate::schema::PropertyDescriptor;

/// ObjectFormatter writes the text around the properties of one instance.
///
/// A new formatter is created for every `to_string` call, so implementations
/// may keep per-call state such as a separator flag.
pub trait ObjectFormatter {
    fn prefix(&mut self, out: &mut String, ty: &TypeInfo) -> Result<(), FormatError>;

    fn property_prefix(
        &mut self,
        out: &mut String,
        property: &PropertyDescriptor,
    ) -> Result<(), FormatError>;

    fn property_suffix(
        &mut self,
        out: &mut String,
        property: &PropertyDescriptor,
    ) -> Result<(), FormatError>;

    fn suffix(&mut self, out: &mut String, ty: &TypeInfo) -> Result<(), FormatError>;
}

/// DefaultObjectFormatter renders `Simple{a: {1}, b: {2}}`.
#[derive(Debug, Default)]
pub struct DefaultObjectFormatter {
    written: usize,
}

impl DefaultObjectFormatter {
    pub fn new() -> Self {
        DefaultObjectFormatter::default()
    }
}

impl ObjectFormatter for DefaultObjectFormatter {
    fn prefix(&mut self, out: &mut String, ty: &TypeInfo) -> Result<(), FormatError> {
        write!(out, "{}{{", ty.simple_name())?;
        Ok(())
    }

    fn property_prefix(
        &mut self,
        out: &mut String,
        property: &PropertyDescriptor,
    ) -> Result<(), FormatError> {
        if self.written > 0 {
            out.push_str(", ");
        }
        self.written += 1;
        write!(out, "{}: {{", property.name())?;
        Ok(())
    }

    fn property_suffix(
        &mut self,
        out: &mut String,
        _property: &PropertyDescriptor,
    ) -> Result<(), FormatError> {
        out.push('}');
        Ok(())
    }

    fn suffix(&mut self, out: &mut String, _ty: &TypeInfo) -> Result<(), FormatError> {
        out.push('}');
        Ok(())
    }
}
