//! Property descriptors: how to read one value out of an instance.

use serde::Serialize;
use std::fmt;

use super::naming::accessor_property_name;
use crate::model::{FieldDecl, MethodDecl, TypeRef, ValueKind, Visibility};
use crate::value::{Instance, Value};

/// How a property reads its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "access")]
pub enum AccessKind {
    Field,
    Accessor { visibility: Visibility },
}

/// PropertyDescriptor names one way to read a value out of an instance.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: String,
    member: String,
    declaring_type: TypeRef,
    access: AccessKind,
    kind: ValueKind,
    skip_array_check: bool,
    deep_array: bool,
    format: Option<String>,
}

impl PropertyDescriptor {
    pub fn for_field(declaring_type: &TypeRef, field: &FieldDecl) -> Self {
        let name = match field.property.as_ref().and_then(|m| m.display_name()) {
            Some(name) => name.to_string(),
            None => field.name.clone(),
        };
        PropertyDescriptor {
            name,
            member: field.name.clone(),
            declaring_type: declaring_type.clone(),
            access: AccessKind::Field,
            kind: field.kind.clone(),
            skip_array_check: field.options.skip_array_check,
            deep_array: field.options.deep_array,
            format: field.options.format.clone(),
        }
    }

    /// Builds the descriptor of a zero-argument, non-void accessor.
    pub fn for_accessor(declaring_type: &TypeRef, method: &MethodDecl) -> Self {
        let name = match method.property.as_ref().and_then(|m| m.display_name()) {
            Some(name) => name.to_string(),
            None => accessor_property_name(method),
        };
        PropertyDescriptor {
            name,
            member: method.name.clone(),
            declaring_type: declaring_type.clone(),
            access: AccessKind::Accessor {
                visibility: method.visibility,
            },
            kind: method.returns.clone().unwrap_or_else(ValueKind::object),
            skip_array_check: method.options.skip_array_check,
            deep_array: method.options.deep_array,
            format: method.options.format.clone(),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the underlying field or method.
    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn declaring_type(&self) -> &TypeRef {
        &self.declaring_type
    }

    pub fn access(&self) -> AccessKind {
        self.access
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn skip_array_check(&self) -> bool {
        self.skip_array_check
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// True when nested arrays are hashed and formatted recursively: the
    /// member asks for it, or its declared type is multi-dimensional.
    pub fn deep_array(&self) -> bool {
        self.deep_array || self.kind.depth() > 1
    }

    /// True when runtime values must be inspected for array-ness.
    pub fn inspects_arrays(&self) -> bool {
        match &self.kind {
            ValueKind::Array { .. } => true,
            ValueKind::Primitive(_) => false,
            ValueKind::Object(_) => !self.skip_array_check,
        }
    }

    /// Reads this property out of `instance`.
    pub fn read(&self, instance: &Instance) -> Value {
        match self.access {
            AccessKind::Field => instance.field(self.declaring_type.id(), &self.member),
            AccessKind::Accessor { .. } => instance.invoke(&self.declaring_type, &self.member),
        }
    }
}

impl fmt::Display for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.access {
            AccessKind::Field => write!(f, "field {}.{}", self.declaring_type.name(), self.member),
            AccessKind::Accessor { .. } => {
                write!(f, "method {}.{}()", self.declaring_type.name(), self.member)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementKind, MemberPolicy, PrimitiveKind, TypeDecl, TypeRegistry};

    #[test]
    fn test_descriptor_flags() {
        let registry = TypeRegistry::new();
        let ty = registry.define(TypeDecl::class("d.T")).unwrap();

        let grid = PropertyDescriptor::for_field(
            &ty,
            &FieldDecl::new("grid", ValueKind::array(ElementKind::Primitive(PrimitiveKind::Int), 2)),
        );
        assert!(grid.deep_array());
        assert!(grid.inspects_arrays());
        assert_eq!(grid.to_string(), "field d.T.grid");

        let any = PropertyDescriptor::for_field(&ty, &FieldDecl::new("any", ValueKind::object()));
        assert!(!any.deep_array());
        assert!(any.inspects_arrays());

        let opaque = PropertyDescriptor::for_field(
            &ty,
            &FieldDecl::new("opaque", ValueKind::object()).skip_array_check(),
        );
        assert!(!opaque.inspects_arrays());

        let getter =
            PropertyDescriptor::for_accessor(&ty, &MethodDecl::getter("getTotal", ValueKind::object()));
        assert_eq!(getter.name(), "total");
        assert_eq!(getter.member(), "getTotal");
        assert_eq!(getter.to_string(), "method d.T.getTotal()");
    }

    #[test]
    fn test_marker_display_name() {
        let registry = TypeRegistry::new();
        let ty = registry.define(TypeDecl::class("d.T")).unwrap();

        let field = PropertyDescriptor::for_field(
            &ty,
            &FieldDecl::new("acctNo", ValueKind::string()).renamed("account"),
        );
        assert_eq!(field.name(), "account");
        assert_eq!(field.member(), "acctNo");

        let getter = PropertyDescriptor::for_accessor(
            &ty,
            &MethodDecl::getter("getTotal", ValueKind::object())
                .marked(MemberPolicy::All)
                .renamed("sum"),
        );
        assert_eq!(getter.name(), "sum");
        assert_eq!(getter.to_string(), "method d.T.getTotal()");

        let blank = PropertyDescriptor::for_field(
            &ty,
            &FieldDecl::new("code", ValueKind::string()).renamed(""),
        );
        assert_eq!(blank.name(), "code");
    }
}
