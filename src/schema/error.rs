//! Schema build errors.

use thiserror::Error;

/// SchemaError reports why a type's schema could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("type {type_name} has no properties eligible for equals, hashCode or toString")]
    NoEligibleProperties { type_name: String },

    #[error("static member {member} of {type_name} cannot be marked as a property")]
    StaticMemberMarked { type_name: String, member: String },

    #[error("method {member} of {type_name} is marked as a property but {reason}")]
    NotAnAccessor {
        type_name: String,
        member: String,
        reason: String,
    },

    #[error(
        "method {member} of {type_name} is requested for hashCode but overrides a method \
         used for equals and not for hashCode"
    )]
    HashWithoutEquals { type_name: String, member: String },

    #[error("type {type_name} refers to unknown {kind} formatter {id}")]
    UnknownFormatter {
        type_name: String,
        kind: &'static str,
        id: String,
    },

    /// The resolved properties disagree with the declaration order of the
    /// level they came from. This is an internal consistency fault rather
    /// than a declaration mistake.
    #[error("declaration order of {type_name} does not list resolved member {member}")]
    DeclarationOrderMismatch { type_name: String, member: String },
}

impl SchemaError {
    pub fn no_eligible_properties(type_name: impl Into<String>) -> Self {
        SchemaError::NoEligibleProperties {
            type_name: type_name.into(),
        }
    }

    pub fn static_member_marked(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        SchemaError::StaticMemberMarked {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    pub fn not_an_accessor(
        type_name: impl Into<String>,
        member: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SchemaError::NotAnAccessor {
            type_name: type_name.into(),
            member: member.into(),
            reason: reason.into(),
        }
    }

    pub fn hash_without_equals(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        SchemaError::HashWithoutEquals {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// True for mistakes in the declarations themselves.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            SchemaError::NoEligibleProperties { .. } | SchemaError::DeclarationOrderMismatch { .. }
        )
    }
}
