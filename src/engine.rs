//! The structural engine: cached schemas and operations per type.

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::cache::InstanceCache;
use crate::format::FormatterRegistry;
use crate::model::{TypeId, TypeRef, TypeRegistry};
use crate::ops::{DiffResult, OperationError, OperationsSource, StructuralOperations};
use crate::schema::{SchemaError, SchemaResolver, SchemaSource, TypeSchema};
use crate::value::{ObjectRef, Value};

/// Schema resolution shared by an engine and every operations object it
/// builds.
struct Schemas {
    resolver: SchemaResolver,
    cache: InstanceCache<TypeId, TypeSchema>,
}

impl SchemaSource for Schemas {
    fn schema(&self, ty: &TypeRef) -> Result<Arc<TypeSchema>, SchemaError> {
        self.cache
            .get_or_try_build(ty.id(), || self.resolver.resolve(ty))
    }
}

/// Formatters and built operations of an engine.
///
/// Every operations object it builds holds a weak reference back to it, so
/// nested objects reach the same cached operations.
struct Catalog {
    this: Weak<Catalog>,
    formatters: FormatterRegistry,
    schemas: Arc<Schemas>,
    operations: InstanceCache<TypeId, StructuralOperations>,
}

impl OperationsSource for Catalog {
    fn operations(&self, ty: &TypeRef) -> Result<Arc<StructuralOperations>, SchemaError> {
        self.operations.get_or_try_build(ty.id(), || {
            let schema = self.schemas.schema(ty)?;
            let source: Arc<dyn SchemaSource> = self.schemas.clone();
            let nested: Weak<dyn OperationsSource> = self.this.clone();
            Ok(StructuralOperations::new(schema, &self.formatters, source)?.with_nested(nested))
        })
    }
}

enum RegistryHandle {
    Global,
    Shared(Arc<TypeRegistry>),
}

impl RegistryHandle {
    fn get(&self) -> &TypeRegistry {
        match self {
            RegistryHandle::Global => TypeRegistry::global(),
            RegistryHandle::Shared(registry) => registry.as_ref(),
        }
    }
}

/// Structural is the entry point for structural operations.
///
/// Operations are looked up by an instance's runtime type and built on first
/// use, at most once per type even under concurrent first use. Build
/// failures are returned to the caller and retried on the next request.
pub struct Structural {
    registry: RegistryHandle,
    catalog: Arc<Catalog>,
}

impl fmt::Debug for Structural {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structural")
            .field("types", &self.registry().len())
            .field("schemas", &self.catalog.schemas.cache.len())
            .field("operations", &self.catalog.operations.len())
            .finish()
    }
}

static GLOBAL: Lazy<Structural> = Lazy::new(|| StructuralBuilder::new().build());

impl Structural {
    pub fn builder() -> StructuralBuilder {
        StructuralBuilder::new()
    }

    /// The process-wide engine over [`TypeRegistry::global`].
    pub fn global() -> &'static Structural {
        &GLOBAL
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry.get()
    }

    pub fn formatters(&self) -> &FormatterRegistry {
        &self.catalog.formatters
    }

    /// Returns the schema of `ty`, resolving it on first use.
    pub fn schema(&self, ty: &TypeRef) -> Result<Arc<TypeSchema>, SchemaError> {
        self.catalog.schemas.schema(ty)
    }

    /// Returns the operations of `ty`, building them on first use.
    pub fn operations(&self, ty: &TypeRef) -> Result<Arc<StructuralOperations>, SchemaError> {
        self.catalog.operations(ty)
    }

    /// Returns the operations of the registered type `name`.
    pub fn operations_named(&self, name: &str) -> Result<Arc<StructuralOperations>, OperationError> {
        let ty = self
            .registry()
            .get(name)
            .ok_or_else(|| OperationError::UnknownType {
                name: name.to_string(),
            })?;
        Ok(self.operations(&ty)?)
    }

    pub fn equals(&self, instance: &Value, other: &Value) -> Result<bool, OperationError> {
        let object = runtime_object("instance", instance)?;
        self.operations(object.type_info())?.equals(instance, other)
    }

    pub fn hash_code(&self, instance: &Value) -> Result<i32, OperationError> {
        let object = runtime_object("instance", instance)?;
        self.operations(object.type_info())?.hash_code(instance)
    }

    pub fn to_string(&self, instance: &Value) -> Result<String, OperationError> {
        let object = runtime_object("instance", instance)?;
        self.operations(object.type_info())?.to_string(instance)
    }

    pub fn diff(&self, instance: &Value, other: &Value) -> Result<DiffResult, OperationError> {
        let object = runtime_object("instance", instance)?;
        self.operations(object.type_info())?.diff(instance, other)
    }

    /// True if instances of `other` may be compared with instances of `ty`.
    pub fn is_compatible_for_equality(
        &self,
        ty: &TypeRef,
        other: &TypeRef,
    ) -> Result<bool, SchemaError> {
        Ok(self
            .schema(ty)?
            .is_compatible_with(other, |t| self.catalog.schemas.schema(t)))
    }
}

fn runtime_object<'v>(argument: &'static str, value: &'v Value) -> Result<&'v ObjectRef, OperationError> {
    match value {
        Value::Null => Err(OperationError::null_argument(argument)),
        Value::Object(object) => Ok(object),
        other => Err(OperationError::not_an_instance(argument, other.type_name())),
    }
}

/// StructuralBuilder configures a [`Structural`] engine.
#[derive(Default)]
pub struct StructuralBuilder {
    registry: Option<Arc<TypeRegistry>>,
    formatters: Option<FormatterRegistry>,
    reconcile_declaration_order: Option<bool>,
}

impl StructuralBuilder {
    pub fn new() -> Self {
        StructuralBuilder::default()
    }

    /// Uses `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn formatters(mut self, formatters: FormatterRegistry) -> Self {
        self.formatters = Some(formatters);
        self
    }

    /// Reorders role lists to declared member order. On by default.
    pub fn reconcile_declaration_order(mut self, enabled: bool) -> Self {
        self.reconcile_declaration_order = Some(enabled);
        self
    }

    pub fn build(self) -> Structural {
        let resolver = SchemaResolver::new()
            .reconcile_declaration_order(self.reconcile_declaration_order.unwrap_or(true));
        let formatters = self.formatters.unwrap_or_default();
        let schemas = Arc::new(Schemas {
            resolver,
            cache: InstanceCache::new(),
        });
        Structural {
            registry: match self.registry {
                Some(registry) => RegistryHandle::Shared(registry),
                None => RegistryHandle::Global,
            },
            catalog: Arc::new_cyclic(|this| Catalog {
                this: this.clone(),
                formatters,
                schemas,
                operations: InstanceCache::new(),
            }),
        }
    }
}

/// Structural equality through the process-wide engine.
pub fn equals(instance: &Value, other: &Value) -> Result<bool, OperationError> {
    Structural::global().equals(instance, other)
}

/// Structural hash through the process-wide engine.
pub fn hash_code(instance: &Value) -> Result<i32, OperationError> {
    Structural::global().hash_code(instance)
}

/// Structural text through the process-wide engine.
pub fn to_string(instance: &Value) -> Result<String, OperationError> {
    Structural::global().to_string(instance)
}

/// Structural diff through the process-wide engine.
pub fn diff(instance: &Value, other: &Value) -> Result<DiffResult, OperationError> {
    Structural::global().diff(instance, other)
}

pub fn is_compatible_for_equality(ty: &TypeRef, other: &TypeRef) -> Result<bool, SchemaError> {
    Structural::global().is_compatible_for_equality(ty, other)
}
