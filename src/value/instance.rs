//! Object instances and accessor dispatch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::value::Value;
use crate::model::{MethodBody, MethodDecl, TypeId, TypeInfo, TypeRef, Visibility};

/// Key of one stored slot: the member and the type that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    pub owner: TypeId,
    pub member: Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Member {
    Field(String),
    /// Result of a slot-backed accessor.
    Method(String),
}

/// InstanceError reports a slot that does not exist on the instance's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("type {type_name} has no {kind} named {member}")]
    UnknownMember {
        type_name: String,
        kind: &'static str,
        member: String,
    },

    #[error("type {owner} is not an ancestor of {type_name}")]
    NotAnAncestor { type_name: String, owner: String },
}

/// Instance is an object of some registered class-like type.
///
/// Field slots are keyed by declaring type, so a shadowed field and the field
/// it shadows hold independent values.
pub struct Instance {
    ty: TypeRef,
    slots: HashMap<Slot, Value>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.ty.name())
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl Instance {
    pub fn builder(ty: &TypeRef) -> InstanceBuilder {
        InstanceBuilder {
            ty: ty.clone(),
            slots: HashMap::new(),
            error: None,
        }
    }

    /// The runtime type.
    pub fn type_info(&self) -> &TypeRef {
        &self.ty
    }

    /// Reads the field `name` as declared by `owner`.
    pub fn field(&self, owner: TypeId, name: &str) -> Value {
        self.slots
            .get(&Slot {
                owner,
                member: Member::Field(name.to_string()),
            })
            .cloned()
            .unwrap_or_default()
    }

    /// Invokes the zero-argument method `name` declared on `declaring`,
    /// dispatching to the most specific override on the runtime type.
    ///
    /// Private methods are never overridden. A package-private method is only
    /// overridden by a type of the same package.
    pub fn invoke(&self, declaring: &TypeInfo, name: &str) -> Value {
        let Some(declared) = declaring.find_accessor(name) else {
            return Value::Null;
        };
        if declared.visibility == Visibility::Private || declared.is_static {
            return self.run(declaring, declared);
        }
        for candidate in self.ty.ancestry() {
            if candidate.is_same(declaring) {
                break;
            }
            if let Some(method) = candidate.find_accessor(name) {
                if overrides(method, &candidate, declared, declaring) {
                    return self.run(&candidate, method);
                }
            }
        }
        self.run(declaring, declared)
    }

    fn run(&self, implementor: &TypeInfo, method: &MethodDecl) -> Value {
        match &method.body {
            MethodBody::Slot => self
                .slots
                .get(&Slot {
                    owner: implementor.id(),
                    member: Member::Method(method.name.clone()),
                })
                .cloned()
                .unwrap_or_default(),
            MethodBody::Field { field } => {
                let mut current = Some(implementor);
                while let Some(t) = current {
                    if t.find_field(field).is_some() {
                        return self.field(t.id(), field);
                    }
                    current = t.parent().map(|p| p.as_ref());
                }
                Value::Null
            }
            MethodBody::Abstract => Value::Null,
            MethodBody::Computed(accessor) => (accessor.0)(self),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(Arc::new(self))
    }
}

fn overrides(
    method: &MethodDecl,
    implementor: &TypeInfo,
    declared: &MethodDecl,
    declaring: &TypeInfo,
) -> bool {
    if method.is_static || method.visibility == Visibility::Private {
        return false;
    }
    declared.visibility != Visibility::Package || implementor.package() == declaring.package()
}

/// InstanceBuilder fills the slots of a new instance.
///
/// Unqualified names resolve to the most specific declaring type; the first
/// unresolvable name is reported by [`InstanceBuilder::build`].
pub struct InstanceBuilder {
    ty: TypeRef,
    slots: HashMap<Slot, Value>,
    error: Option<InstanceError>,
}

impl InstanceBuilder {
    /// Sets the most specific field named `name`.
    pub fn set(self, name: &str, value: impl Into<Value>) -> Self {
        let owner = self
            .ty
            .ancestry()
            .into_iter()
            .find(|t| t.find_field(name).is_some());
        match owner {
            Some(owner) => self.put(owner.id(), Member::Field(name.to_string()), value.into()),
            None => {
                let err = InstanceError::UnknownMember {
                    type_name: self.ty.name().to_string(),
                    kind: "field",
                    member: name.to_string(),
                };
                self.fail(err)
            }
        }
    }

    /// Sets the field `name` declared by the ancestor `owner`.
    pub fn set_on(self, owner: &str, name: &str, value: impl Into<Value>) -> Self {
        match self.ancestor(owner) {
            Some(t) if t.find_field(name).is_some() => {
                let id = t.id();
                self.put(id, Member::Field(name.to_string()), value.into())
            }
            Some(_) => {
                let err = InstanceError::UnknownMember {
                    type_name: owner.to_string(),
                    kind: "field",
                    member: name.to_string(),
                };
                self.fail(err)
            }
            None => {
                let err = InstanceError::NotAnAncestor {
                    type_name: self.ty.name().to_string(),
                    owner: owner.to_string(),
                };
                self.fail(err)
            }
        }
    }

    /// Sets the result of the most specific slot-backed accessor `name`.
    pub fn returns(self, name: &str, value: impl Into<Value>) -> Self {
        let owner = self
            .ty
            .ancestry()
            .into_iter()
            .find(|t| t.find_accessor(name).is_some());
        match owner {
            Some(owner) => self.put(owner.id(), Member::Method(name.to_string()), value.into()),
            None => {
                let err = InstanceError::UnknownMember {
                    type_name: self.ty.name().to_string(),
                    kind: "accessor",
                    member: name.to_string(),
                };
                self.fail(err)
            }
        }
    }

    /// Sets the result of the accessor `name` as implemented by `owner`.
    pub fn returns_on(self, owner: &str, name: &str, value: impl Into<Value>) -> Self {
        match self.ancestor(owner) {
            Some(t) if t.find_accessor(name).is_some() => {
                let id = t.id();
                self.put(id, Member::Method(name.to_string()), value.into())
            }
            Some(_) => {
                let err = InstanceError::UnknownMember {
                    type_name: owner.to_string(),
                    kind: "accessor",
                    member: name.to_string(),
                };
                self.fail(err)
            }
            None => {
                let err = InstanceError::NotAnAncestor {
                    type_name: self.ty.name().to_string(),
                    owner: owner.to_string(),
                };
                self.fail(err)
            }
        }
    }

    pub fn build(self) -> Result<Value, InstanceError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(Instance {
                ty: self.ty,
                slots: self.slots,
            }
            .into_value()),
        }
    }

    fn ancestor(&self, name: &str) -> Option<TypeRef> {
        self.ty.ancestry().into_iter().find(|t| t.name() == name)
    }

    fn put(mut self, owner: TypeId, member: Member, value: Value) -> Self {
        self.slots.insert(Slot { owner, member }, value);
        self
    }

    fn fail(mut self, err: InstanceError) -> Self {
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDecl, MethodDecl, TypeDecl, TypeRegistry, ValueKind, Visibility};

    fn object(v: &Value) -> &Instance {
        v.as_object().unwrap()
    }

    #[test]
    fn test_shadowed_fields_are_independent() {
        let registry = TypeRegistry::new();
        let base = registry
            .define(TypeDecl::class("p.Base").field(FieldDecl::new("x", ValueKind::object())))
            .unwrap();
        let derived = registry
            .define(
                TypeDecl::class("p.Derived")
                    .extends("p.Base")
                    .field(FieldDecl::new("x", ValueKind::object())),
            )
            .unwrap();

        let v = Instance::builder(&derived)
            .set("x", "derived")
            .set_on("p.Base", "x", "base")
            .build()
            .unwrap();
        assert_eq!(object(&v).field(derived.id(), "x"), Value::from("derived"));
        assert_eq!(object(&v).field(base.id(), "x"), Value::from("base"));
    }

    #[test]
    fn test_virtual_dispatch_respects_visibility() {
        let registry = TypeRegistry::new();
        let base = registry
            .define(
                TypeDecl::class("p.Base")
                    .method(MethodDecl::getter("getA", ValueKind::string()))
                    .method(
                        MethodDecl::getter("getB", ValueKind::string())
                            .visibility(Visibility::Private),
                    )
                    .method(
                        MethodDecl::getter("getC", ValueKind::string())
                            .visibility(Visibility::Package),
                    ),
            )
            .unwrap();
        registry
            .define(
                TypeDecl::class("q.Child")
                    .extends("p.Base")
                    .method(MethodDecl::getter("getA", ValueKind::string()))
                    .method(MethodDecl::getter("getB", ValueKind::string()))
                    .method(MethodDecl::getter("getC", ValueKind::string())),
            )
            .unwrap();
        let child = registry.get("q.Child").unwrap();

        let v = Instance::builder(&child)
            .returns("getA", "child-a")
            .returns_on("p.Base", "getA", "base-a")
            .returns("getB", "child-b")
            .returns_on("p.Base", "getB", "base-b")
            .returns("getC", "child-c")
            .returns_on("p.Base", "getC", "base-c")
            .build()
            .unwrap();

        assert_eq!(object(&v).invoke(&base, "getA"), Value::from("child-a"));
        assert_eq!(object(&v).invoke(&base, "getB"), Value::from("base-b"));
        // different package: the package-private method is not overridden
        assert_eq!(object(&v).invoke(&base, "getC"), Value::from("base-c"));
    }

    #[test]
    fn test_field_and_computed_bodies() {
        let registry = TypeRegistry::new();
        let ty = registry
            .define(
                TypeDecl::class("p.Point")
                    .field(FieldDecl::new("x", ValueKind::object()))
                    .method(MethodDecl::getter("getX", ValueKind::object()).returning_field("x"))
                    .method(
                        MethodDecl::getter("getLabel", ValueKind::string())
                            .computed(|_| Value::from("point")),
                    ),
            )
            .unwrap();
        let v = Instance::builder(&ty).set("x", 3).build().unwrap();
        assert_eq!(object(&v).invoke(&ty, "getX"), Value::Int(3));
        assert_eq!(object(&v).invoke(&ty, "getLabel"), Value::from("point"));
        assert_eq!(object(&v).invoke(&ty, "missing"), Value::Null);
    }

    #[test]
    fn test_builder_reports_unknown_members() {
        let registry = TypeRegistry::new();
        let ty = registry.define(TypeDecl::class("p.Empty")).unwrap();
        let err = Instance::builder(&ty).set("nope", 1).build().unwrap_err();
        assert_eq!(
            err,
            InstanceError::UnknownMember {
                type_name: "p.Empty".into(),
                kind: "field",
                member: "nope".into(),
            }
        );
        let err = Instance::builder(&ty)
            .set_on("p.Other", "x", 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, InstanceError::NotAnAncestor { .. }));
    }
}
