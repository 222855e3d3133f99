//! The type universe: compiled declarations linked to their supertypes.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

use super::elements::*;

/// Shared handle to a registered type.
pub type TypeRef = Arc<TypeInfo>;

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// TypeId identifies one registered type for the lifetime of the process.
///
/// Ids are unique across registries, so caches keyed by them never confuse
/// same-named types from two universes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u64);

impl TypeId {
    fn next() -> Self {
        TypeId(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// RegistryError reports an invalid type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("type {name} is already defined")]
    DuplicateType { name: String },

    #[error("type {name} refers to unknown type {missing}")]
    UnknownType { name: String, missing: String },

    #[error("type {name} cannot extend {parent}: {reason}")]
    InvalidParent {
        name: String,
        parent: String,
        reason: String,
    },

    #[error("type {name} cannot implement {interface}: not an interface")]
    NotAnInterface { name: String, interface: String },

    #[error("type {name} declares member {member} twice")]
    DuplicateMember { name: String, member: String },

    #[error("declarations form a cycle through: {names}")]
    Cycle { names: String },
}

impl RegistryError {
    pub fn unknown_type(name: impl Into<String>, missing: impl Into<String>) -> Self {
        RegistryError::UnknownType {
            name: name.into(),
            missing: missing.into(),
        }
    }

    pub fn invalid_parent(
        name: impl Into<String>,
        parent: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidParent {
            name: name.into(),
            parent: parent.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate_member(name: impl Into<String>, member: impl Into<String>) -> Self {
        RegistryError::DuplicateMember {
            name: name.into(),
            member: member.into(),
        }
    }
}

/// TypeInfo is a declaration after registration: its supertypes are linked
/// and it has a process-unique id.
pub struct TypeInfo {
    id: TypeId,
    decl: TypeDecl,
    parent: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("id", &self.id)
            .field("name", &self.decl.name)
            .field("kind", &self.decl.kind)
            .finish()
    }
}

impl TypeInfo {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    /// The name without its package qualifier.
    pub fn simple_name(&self) -> &str {
        match self.decl.name.rfind('.') {
            Some(i) => &self.decl.name[i + 1..],
            None => &self.decl.name,
        }
    }

    /// The package qualifier, empty for the default package.
    pub fn package(&self) -> &str {
        match self.decl.name.rfind('.') {
            Some(i) => &self.decl.name[..i],
            None => "",
        }
    }

    pub fn kind(&self) -> TypeKind {
        self.decl.kind
    }

    pub fn is_interface(&self) -> bool {
        self.decl.kind == TypeKind::Interface
    }

    pub fn decl(&self) -> &TypeDecl {
        &self.decl
    }

    pub fn parent(&self) -> Option<&TypeRef> {
        self.parent.as_ref()
    }

    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.decl.fields
    }

    pub fn methods(&self) -> &[MethodDecl] {
        &self.decl.methods
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDecl> {
        self.decl.fields.iter().find(|f| f.name == name)
    }

    /// Finds the zero-argument method with the given name declared here.
    pub fn find_accessor(&self, name: &str) -> Option<&MethodDecl> {
        self.decl
            .methods
            .iter()
            .find(|m| m.name == name && m.params == 0)
    }

    pub fn is_same(&self, other: &TypeInfo) -> bool {
        self.id == other.id
    }

    /// Class chain from this type up to the top-most registered ancestor.
    pub fn ancestry(self: &Arc<Self>) -> Vec<TypeRef> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent.clone();
        while let Some(t) = current {
            current = t.parent.clone();
            chain.push(t);
        }
        chain
    }

    /// Returns true if `self` is `other` or one of its subtypes, following
    /// both parent and interface links.
    pub fn is_subtype_of(&self, other: &TypeInfo) -> bool {
        if self.is_same(other) {
            return true;
        }
        if let Some(parent) = &self.parent {
            if parent.is_subtype_of(other) {
                return true;
            }
        }
        self.interfaces.iter().any(|i| i.is_subtype_of(other))
    }
}

/// TypeRegistry holds the type universe.
///
/// Types must be defined after the types they refer to; [`TypeRegistry::load`]
/// accepts declarations in any order.
#[derive(Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<String, TypeRef>>,
}

static GLOBAL: Lazy<TypeRegistry> = Lazy::new(TypeRegistry::new);

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// The process-wide registry used by the global engine.
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    /// Registers one declaration and returns its handle.
    pub fn define(&self, decl: TypeDecl) -> Result<TypeRef, RegistryError> {
        let mut types = self.types.write();
        if types.contains_key(&decl.name) {
            return Err(RegistryError::DuplicateType { name: decl.name });
        }
        check_members(&decl)?;

        let parent = match &decl.parent {
            Some(parent_name) => {
                let parent = types
                    .get(parent_name)
                    .cloned()
                    .ok_or_else(|| RegistryError::unknown_type(&decl.name, parent_name))?;
                if decl.kind == TypeKind::Interface {
                    return Err(RegistryError::invalid_parent(
                        &decl.name,
                        parent_name,
                        "interfaces extend other interfaces only",
                    ));
                }
                if parent.is_interface() {
                    return Err(RegistryError::invalid_parent(
                        &decl.name,
                        parent_name,
                        "parent is an interface",
                    ));
                }
                Some(parent)
            }
            None => None,
        };

        let mut interfaces = Vec::with_capacity(decl.interfaces.len());
        for name in &decl.interfaces {
            let interface = types
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::unknown_type(&decl.name, name))?;
            if !interface.is_interface() {
                return Err(RegistryError::NotAnInterface {
                    name: decl.name.clone(),
                    interface: name.clone(),
                });
            }
            interfaces.push(interface);
        }

        let info = Arc::new(TypeInfo {
            id: TypeId::next(),
            decl,
            parent,
            interfaces,
        });
        log::trace!("registered type {} as {}", info.name(), info.id());
        types.insert(info.name().to_string(), info.clone());
        Ok(info)
    }

    /// Registers a whole universe, ordering declarations so every type is
    /// defined after its supertypes.
    pub fn load(&self, universe: Universe) -> Result<Vec<TypeRef>, RegistryError> {
        let mut pending: Vec<TypeDecl> = universe.types;
        let mut defined = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let names: HashSet<String> = pending.iter().map(|d| d.name.clone()).collect();
            let (ready, waiting): (Vec<TypeDecl>, Vec<TypeDecl>) =
                pending.into_iter().partition(|d| {
                    d.parent
                        .iter()
                        .chain(d.interfaces.iter())
                        .all(|dep| !names.contains(dep))
                });
            if ready.is_empty() {
                let mut names: Vec<&str> = waiting.iter().map(|d| d.name.as_str()).collect();
                names.sort_unstable();
                return Err(RegistryError::Cycle {
                    names: names.join(", "),
                });
            }
            for decl in ready {
                defined.push(self.define(decl)?);
            }
            pending = waiting;
        }
        Ok(defined)
    }

    pub fn get(&self, name: &str) -> Option<TypeRef> {
        self.types.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Returns the registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }
}

fn check_members(decl: &TypeDecl) -> Result<(), RegistryError> {
    let mut fields = HashSet::new();
    for field in &decl.fields {
        if !fields.insert(field.name.as_str()) {
            return Err(RegistryError::duplicate_member(&decl.name, &field.name));
        }
    }
    let mut methods = HashSet::new();
    for method in &decl.methods {
        if !methods.insert((method.name.as_str(), method.params)) {
            return Err(RegistryError::duplicate_member(
                &decl.name,
                format!("{}/{}", method.name, method.params),
            ));
        }
    }
    Ok(())
}
