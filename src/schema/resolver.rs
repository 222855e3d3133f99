//! Schema resolution: from a type's declarations to its per-role property lists.

use serde::Serialize;
use std::sync::Arc;

use super::descriptor::{AccessKind, PropertyDescriptor};
use super::error::SchemaError;
use super::naming::is_getter;
use super::overrides::OverrideLedger;
use super::roles::{PropertyRole, RoleFilter, RoleSet};
use crate::model::{AutoDetect, EqualityMarker, MethodDecl, TypeInfo, TypeRef};

/// TypeSchema is the resolved, ordered property set of one type.
///
/// Schemas are immutable once built and shared behind an `Arc`.
#[derive(Debug)]
pub struct TypeSchema {
    ty: TypeRef,
    equality: Vec<PropertyDescriptor>,
    hash: Vec<PropertyDescriptor>,
    string: Vec<PropertyDescriptor>,
    equality_root: TypeRef,
    sealed_equality: bool,
}

impl TypeSchema {
    pub fn type_info(&self) -> &TypeRef {
        &self.ty
    }

    pub fn equality_properties(&self) -> &[PropertyDescriptor] {
        &self.equality
    }

    pub fn hash_properties(&self) -> &[PropertyDescriptor] {
        &self.hash
    }

    pub fn string_properties(&self) -> &[PropertyDescriptor] {
        &self.string
    }

    /// The most specific level that contributed equality properties or
    /// redefined equality.
    pub fn equality_root(&self) -> &TypeRef {
        &self.equality_root
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed_equality
    }

    /// Decides whether instances of `other` may be compared with instances of
    /// this schema's type.
    ///
    /// Unsealed schemas require `other` to resolve to the same equality root,
    /// which `resolve` provides. A child that adds equality properties is
    /// therefore incompatible with its parent and with simpler siblings,
    /// while the parent's own schema stays as it was.
    pub fn is_compatible_with<F>(&self, other: &TypeRef, resolve: F) -> bool
    where
        F: FnOnce(&TypeRef) -> Result<Arc<TypeSchema>, SchemaError>,
    {
        if !other.is_subtype_of(&self.equality_root) {
            return false;
        }
        if self.sealed_equality {
            return true;
        }
        match resolve(other) {
            Ok(schema) => schema.equality_root.is_same(&self.equality_root),
            Err(err) => {
                log::warn!(
                    "cannot compare {} with {}: {}",
                    self.ty.name(),
                    other.name(),
                    err
                );
                false
            }
        }
    }

    /// A serializable summary, used by the command line tool.
    pub fn summary(&self) -> SchemaSummary {
        let list = |props: &[PropertyDescriptor]| -> Vec<PropertySummary> {
            props
                .iter()
                .map(|p| PropertySummary {
                    name: p.name().to_string(),
                    member: p.member().to_string(),
                    declaring_type: p.declaring_type().name().to_string(),
                    access: p.access(),
                    kind: p.kind().to_string(),
                })
                .collect()
        };
        SchemaSummary {
            type_name: self.ty.name().to_string(),
            equality_root: self.equality_root.name().to_string(),
            sealed: self.sealed_equality,
            equality: list(&self.equality),
            hash: list(&self.hash),
            string: list(&self.string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    #[serde(rename = "type")]
    pub type_name: String,
    pub equality_root: String,
    pub sealed: bool,
    pub equality: Vec<PropertySummary>,
    pub hash: Vec<PropertySummary>,
    pub string: Vec<PropertySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub name: String,
    pub member: String,
    pub declaring_type: String,
    #[serde(flatten)]
    pub access: AccessKind,
    pub kind: String,
}

/// One contributed property with the position it was resolved at.
struct Entry {
    property: PropertyDescriptor,
    level: usize,
    seq: usize,
}

#[derive(Default)]
struct Lists {
    equality: Vec<Entry>,
    hash: Vec<Entry>,
    string: Vec<Entry>,
    seq: usize,
}

impl Lists {
    fn add(&mut self, property: PropertyDescriptor, roles: RoleSet, level: usize) {
        let seq = self.seq;
        self.seq += 1;
        for role in roles.iter() {
            let entry = Entry {
                property: property.clone(),
                level,
                seq,
            };
            match role {
                PropertyRole::Equality => self.equality.push(entry),
                PropertyRole::Hash => self.hash.push(entry),
                PropertyRole::String => self.string.push(entry),
            }
        }
    }
}

/// SchemaResolver builds [`TypeSchema`]s.
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    reconcile_declaration_order: bool,
}

impl Default for SchemaResolver {
    fn default() -> Self {
        SchemaResolver {
            reconcile_declaration_order: true,
        }
    }
}

impl SchemaResolver {
    pub fn new() -> Self {
        SchemaResolver::default()
    }

    /// Controls whether role lists are reordered to each level's declared
    /// member order when one is available.
    pub fn reconcile_declaration_order(mut self, enabled: bool) -> Self {
        self.reconcile_declaration_order = enabled;
        self
    }

    /// Resolves the schema of `ty`.
    ///
    /// Class-like types are walked from their top-most ancestor down; an
    /// interface-like type is a single level.
    pub fn resolve(&self, ty: &TypeRef) -> Result<TypeSchema, SchemaError> {
        let levels: Vec<TypeRef> = if ty.is_interface() {
            vec![ty.clone()]
        } else {
            let mut chain = ty.ancestry();
            chain.reverse();
            chain
        };

        let mut lists = Lists::default();
        let mut ledger = OverrideLedger::new();
        let mut equality_root: Option<TypeRef> = None;
        let mut sealed = ty.is_interface();

        for (index, level) in levels.iter().enumerate() {
            let before = lists.equality.len();
            resolve_level(level, index, &mut lists, &mut ledger)?;
            let contributes_equality = lists.equality.len() > before;

            let marker = level.decl().equality;
            if contributes_equality || marker.is_some() {
                equality_root = Some(level.clone());
            }
            if marker == Some(EqualityMarker::SubclassCannotOverrideEquals) {
                sealed = true;
            }
            log::trace!(
                "resolved level {} of {}: {} equality properties so far",
                level.name(),
                ty.name(),
                lists.equality.len()
            );
        }

        if self.reconcile_declaration_order {
            for list in [&mut lists.equality, &mut lists.hash, &mut lists.string] {
                reorder(list, &levels)?;
            }
        }

        if lists.equality.is_empty() && lists.hash.is_empty() && lists.string.is_empty() {
            return Err(SchemaError::no_eligible_properties(ty.name()));
        }

        let into_props = |entries: Vec<Entry>| -> Vec<PropertyDescriptor> {
            entries.into_iter().map(|e| e.property).collect()
        };
        let schema = TypeSchema {
            ty: ty.clone(),
            equality: into_props(lists.equality),
            hash: into_props(lists.hash),
            string: into_props(lists.string),
            equality_root: equality_root.unwrap_or_else(|| levels[0].clone()),
            sealed_equality: sealed,
        };
        log::debug!(
            "built schema for {}: {} equality, {} hash, {} string properties, root {}{}",
            ty.name(),
            schema.equality.len(),
            schema.hash.len(),
            schema.string.len(),
            schema.equality_root.name(),
            if schema.sealed_equality { " (sealed)" } else { "" }
        );
        Ok(schema)
    }
}

/// SchemaSource hands out the schema of any type, typically from a cache.
pub trait SchemaSource: Send + Sync {
    fn schema(&self, ty: &TypeRef) -> Result<Arc<TypeSchema>, SchemaError>;
}

/// An uncached source: every request resolves afresh.
impl SchemaSource for SchemaResolver {
    fn schema(&self, ty: &TypeRef) -> Result<Arc<TypeSchema>, SchemaError> {
        self.resolve(ty).map(Arc::new)
    }
}

fn resolve_level(
    level: &TypeRef,
    index: usize,
    lists: &mut Lists,
    ledger: &mut OverrideLedger,
) -> Result<(), SchemaError> {
    let auto = level.decl().auto_property;
    let default_policy = auto.map(|a| a.policy);
    let detect = auto.map(|a| a.auto_detect).unwrap_or(AutoDetect::None);

    for field in level.fields() {
        let marker = field.property.as_ref().map(|m| m.policy);
        if field.is_static {
            if marker.is_some() {
                return Err(SchemaError::static_member_marked(level.name(), &field.name));
            }
            continue;
        }
        if marker.is_none() && detect != AutoDetect::Fields {
            continue;
        }
        let Some(roles) = RoleFilter::roles(marker, default_policy) else {
            continue;
        };
        if roles.is_empty() {
            continue;
        }
        lists.add(PropertyDescriptor::for_field(level, field), roles, index);
    }

    for method in level.methods() {
        let marker = method.property.as_ref().map(|m| m.policy);
        if marker.is_some() {
            check_marked_accessor(level, method)?;
        } else if detect != AutoDetect::Methods || !is_getter(method) {
            continue;
        }
        let Some(roles) = RoleFilter::roles(marker, default_policy) else {
            continue;
        };
        if roles.is_empty() {
            continue;
        }
        let added = ledger.register(level, method, roles)?;
        if added.is_empty() {
            continue;
        }
        lists.add(PropertyDescriptor::for_accessor(level, method), added, index);
    }
    Ok(())
}

fn check_marked_accessor(level: &TypeInfo, method: &MethodDecl) -> Result<(), SchemaError> {
    if method.is_static {
        return Err(SchemaError::static_member_marked(level.name(), &method.name));
    }
    if method.params != 0 {
        return Err(SchemaError::not_an_accessor(
            level.name(),
            &method.name,
            format!("takes {} arguments", method.params),
        ));
    }
    if method.returns.is_none() {
        return Err(SchemaError::not_an_accessor(
            level.name(),
            &method.name,
            "returns void",
        ));
    }
    Ok(())
}

/// Sorts `entries` by level, then by position in the level's declaration
/// order; levels without one keep resolution order.
fn reorder(entries: &mut Vec<Entry>, levels: &[TypeRef]) -> Result<(), SchemaError> {
    let mut keyed = Vec::with_capacity(entries.len());
    for entry in entries.drain(..) {
        let level = &levels[entry.level];
        let position = match &level.decl().declaration_order {
            Some(order) => match order.iter().position(|m| m == entry.property.member()) {
                Some(pos) => pos,
                None => {
                    log::error!(
                        "declaration order of {} is missing resolved {}",
                        level.name(),
                        entry.property
                    );
                    return Err(SchemaError::DeclarationOrderMismatch {
                        type_name: level.name().to_string(),
                        member: entry.property.member().to_string(),
                    });
                }
            },
            None => entry.seq,
        };
        keyed.push(((entry.level, position), entry));
    }
    keyed.sort_by_key(|(key, _)| *key);
    entries.extend(keyed.into_iter().map(|(_, entry)| entry));
    Ok(())
}
