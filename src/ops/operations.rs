//! StructuralOperations: equals, hashCode, toString and diff bound to one schema.

use std::fmt;
use std::sync::{Arc, Weak};

use super::diff::{DiffResult, Difference};
use super::error::OperationError;
use super::values::{property_equal, property_hash};
use crate::format::{FormatError, FormatterRegistry, ObjectFormatterFactory, PropertyFormatter};
use crate::model::TypeRef;
use crate::schema::{SchemaError, SchemaSource, TypeSchema};
use crate::value::{NaturalObjects, ObjectRef, ObjectSemantics, Value};

/// OperationsSource looks up the operations of a type.
///
/// Operations consult it for objects nested inside property values, so a
/// nested instance is compared, hashed and rendered by its own runtime type.
pub trait OperationsSource: Send + Sync {
    fn operations(&self, ty: &TypeRef) -> Result<Arc<StructuralOperations>, SchemaError>;
}

/// StructuralOperations implements the structural operations of one type.
///
/// It holds the type's schema, the formatters resolved for it and the
/// source used to look up other types' schemas for compatibility checks.
/// Without an [`OperationsSource`], nested objects are treated by identity.
pub struct StructuralOperations {
    schema: Arc<TypeSchema>,
    object_formatter: ObjectFormatterFactory,
    property_formatters: Vec<Arc<dyn PropertyFormatter>>,
    source: Arc<dyn SchemaSource>,
    nested: Option<Weak<dyn OperationsSource>>,
}

impl fmt::Debug for StructuralOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuralOperations")
            .field("type", &self.schema.type_info().name())
            .field("equality", &self.schema.equality_properties().len())
            .field("hash", &self.schema.hash_properties().len())
            .field("string", &self.schema.string_properties().len())
            .field("nested", &self.nested.is_some())
            .finish()
    }
}

impl StructuralOperations {
    /// Binds operations to `schema`, resolving its formatter ids.
    pub fn new(
        schema: Arc<TypeSchema>,
        formatters: &FormatterRegistry,
        source: Arc<dyn SchemaSource>,
    ) -> Result<Self, SchemaError> {
        let ty = schema.type_info();
        let unknown = |kind: &'static str, id: &str| SchemaError::UnknownFormatter {
            type_name: ty.name().to_string(),
            kind,
            id: id.to_string(),
        };

        let object_formatter = match &ty.decl().format {
            Some(id) => formatters
                .object_factory(id)
                .ok_or_else(|| unknown("object", id.as_str()))?,
            None => formatters.default_object_factory(),
        };
        let property_formatters = schema
            .string_properties()
            .iter()
            .map(|p| match p.format() {
                Some(id) => formatters
                    .property_formatter(id)
                    .ok_or_else(|| unknown("property", id)),
                None => Ok(formatters.default_property_formatter()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("built structural operations for {}", ty.name());
        Ok(StructuralOperations {
            schema,
            object_formatter,
            property_formatters,
            source,
            nested: None,
        })
    }

    /// Delegates nested objects to the operations `nested` supplies.
    ///
    /// The source is held weakly; once it is gone nested objects fall back
    /// to identity.
    pub fn with_nested(mut self, nested: Weak<dyn OperationsSource>) -> Self {
        self.nested = Some(nested);
        self
    }

    pub fn type_info(&self) -> &TypeRef {
        self.schema.type_info()
    }

    pub fn schema(&self) -> &Arc<TypeSchema> {
        &self.schema
    }

    /// Structural equality. `other` may be null or any value; only instances
    /// of a compatible type can be equal.
    pub fn equals(&self, instance: &Value, other: &Value) -> Result<bool, OperationError> {
        let a = self.instance("instance", instance)?;
        let Value::Object(b) = other else {
            return Ok(false);
        };
        Ok(self.objects_equal(a, b))
    }

    /// Structural hash: `h = 31 * h + hash(p)` over the hash properties,
    /// starting from 1.
    pub fn hash_code(&self, instance: &Value) -> Result<i32, OperationError> {
        let a = self.instance("instance", instance)?;
        Ok(self.object_hash(a))
    }

    pub fn to_string(&self, instance: &Value) -> Result<String, OperationError> {
        let a = self.instance("instance", instance)?;
        Ok(self.object_text(a)?)
    }

    /// Lists the equality properties whose values differ.
    pub fn diff(&self, instance: &Value, other: &Value) -> Result<DiffResult, OperationError> {
        let a = self.instance("instance", instance)?;
        let b = match other {
            Value::Null => return Err(OperationError::null_argument("other")),
            Value::Object(b) => b,
            v => return Err(OperationError::not_an_instance("other", v.type_name())),
        };
        if Arc::ptr_eq(a, b) {
            return Ok(DiffResult::NoDifferences);
        }
        if !self.comparable(a, b) {
            return Err(OperationError::incompatible_types(
                "other",
                self.schema.equality_root().name(),
                b.type_info().name(),
            ));
        }

        let objects = self.objects();
        let differences = self
            .schema
            .equality_properties()
            .iter()
            .filter_map(|p| {
                let left = p.read(a);
                let right = p.read(b);
                if property_equal(p, &left, &right, &objects) {
                    None
                } else {
                    Some(Difference::with_objects(p.name(), left, right, &objects))
                }
            })
            .collect();
        Ok(DiffResult::from_differences(differences))
    }

    /// True if instances of `other` may be compared with this type.
    pub fn is_compatible_for_equality(&self, other: &TypeRef) -> bool {
        self.schema
            .is_compatible_with(other, |ty| self.source.schema(ty))
    }

    fn objects_equal(&self, a: &ObjectRef, b: &ObjectRef) -> bool {
        if Arc::ptr_eq(a, b) {
            return true;
        }
        if !self.comparable(a, b) {
            return false;
        }
        let objects = self.objects();
        self.schema
            .equality_properties()
            .iter()
            .all(|p| property_equal(p, &p.read(a), &p.read(b), &objects))
    }

    fn object_hash(&self, a: &ObjectRef) -> i32 {
        let objects = self.objects();
        self.schema.hash_properties().iter().fold(1i32, |h, p| {
            h.wrapping_mul(31)
                .wrapping_add(property_hash(p, &p.read(a), &objects))
        })
    }

    fn object_text(&self, a: &ObjectRef) -> Result<String, FormatError> {
        let ty = self.type_info();
        let objects = self.objects();
        let mut formatter = (self.object_formatter)();
        let mut out = String::new();

        formatter.prefix(&mut out, ty)?;
        for (property, value_formatter) in self
            .schema
            .string_properties()
            .iter()
            .zip(&self.property_formatters)
        {
            formatter.property_prefix(&mut out, property)?;
            value_formatter.format(&mut out, property, &property.read(a), &objects)?;
            formatter.property_suffix(&mut out, property)?;
        }
        formatter.suffix(&mut out, ty)?;
        Ok(out)
    }

    fn objects(&self) -> NestedObjects {
        NestedObjects {
            source: self.nested.as_ref().and_then(Weak::upgrade),
        }
    }

    fn comparable(&self, a: &ObjectRef, b: &ObjectRef) -> bool {
        a.type_info().is_same(b.type_info()) || self.is_compatible_for_equality(b.type_info())
    }

    fn instance<'v>(
        &self,
        argument: &'static str,
        value: &'v Value,
    ) -> Result<&'v ObjectRef, OperationError> {
        match value {
            Value::Null => Err(OperationError::null_argument(argument)),
            Value::Object(object) => {
                if object.type_info().is_subtype_of(self.type_info()) {
                    Ok(object)
                } else {
                    Err(OperationError::WrongType {
                        expected: self.type_info().name().to_string(),
                        actual: object.type_info().name().to_string(),
                    })
                }
            }
            other => Err(OperationError::not_an_instance(argument, other.type_name())),
        }
    }
}

/// Nested objects through the operations of their runtime type. Objects
/// whose operations cannot be built are treated by identity.
struct NestedObjects {
    source: Option<Arc<dyn OperationsSource>>,
}

impl NestedObjects {
    fn operations(&self, object: &ObjectRef) -> Option<Arc<StructuralOperations>> {
        let source = self.source.as_ref()?;
        match source.operations(object.type_info()) {
            Ok(ops) => Some(ops),
            Err(e) => {
                log::trace!("nested {} falls back to identity: {}", object.type_info().name(), e);
                None
            }
        }
    }
}

impl ObjectSemantics for NestedObjects {
    fn equal(&self, a: &ObjectRef, b: &ObjectRef) -> bool {
        match self.operations(a) {
            Some(ops) => ops.objects_equal(a, b),
            None => NaturalObjects.equal(a, b),
        }
    }

    fn hash(&self, object: &ObjectRef) -> i32 {
        match self.operations(object) {
            Some(ops) => ops.object_hash(object),
            None => NaturalObjects.hash(object),
        }
    }

    fn text(&self, object: &ObjectRef) -> Option<String> {
        let ops = self.operations(object)?;
        match ops.object_text(object) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("nested {} rendered by identity: {}", object.type_info().name(), e);
                None
            }
        }
    }
}
