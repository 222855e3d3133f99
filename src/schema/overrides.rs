//! Override ledger for accessor properties.
//!
//! Overriding is tracked explicitly, keyed by visibility scope and method name,
//! so a redeclared accessor contributes only the roles its ancestors have not
//! already claimed.

use std::collections::HashMap;

use super::error::SchemaError;
use super::roles::{PropertyRole, RoleSet};
use crate::model::{MethodDecl, TypeId, TypeInfo, Visibility};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Scope {
    Private(TypeId),
    Package(String),
    Global,
}

#[derive(Debug, Default)]
pub struct OverrideLedger {
    recorded: HashMap<(Scope, String), RoleSet>,
}

impl OverrideLedger {
    pub fn new() -> Self {
        OverrideLedger::default()
    }

    /// Records `requested` roles for `method` declared on `declaring` and
    /// returns the roles newly contributed at this level.
    pub fn register(
        &mut self,
        declaring: &TypeInfo,
        method: &MethodDecl,
        requested: RoleSet,
    ) -> Result<RoleSet, SchemaError> {
        let name = method.name.clone();
        let (key, existing) = match method.visibility {
            Visibility::Private => {
                let key = (Scope::Private(declaring.id()), name);
                let existing = self.get(&key);
                (key, existing)
            }
            Visibility::Package => {
                let key = (Scope::Package(declaring.package().to_string()), name);
                let existing = self.get(&key);
                (key, existing)
            }
            Visibility::Public | Visibility::Protected => {
                let package_key = (Scope::Package(declaring.package().to_string()), name.clone());
                let key = (Scope::Global, name);
                let existing = self.get(&key).union(self.get(&package_key));
                (key, existing)
            }
        };

        if existing.contains(PropertyRole::Equality)
            && !existing.contains(PropertyRole::Hash)
            && requested.contains(PropertyRole::Hash)
        {
            return Err(SchemaError::hash_without_equals(declaring.name(), &method.name));
        }

        let added = requested.difference(existing);
        self.recorded.insert(key, existing.union(added));
        Ok(added)
    }

    fn get(&self, key: &(Scope, String)) -> RoleSet {
        self.recorded.get(key).copied().unwrap_or_default()
    }
}
