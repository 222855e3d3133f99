//! Runtime operation errors.

use thiserror::Error;

use crate::format::FormatError;
use crate::schema::SchemaError;

/// OperationError reports why a structural operation could not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("argument {argument} must not be null")]
    NullArgument { argument: &'static str },

    #[error("argument {argument} of type {actual} is not compatible for equality with {expected}")]
    IncompatibleTypes {
        argument: &'static str,
        expected: String,
        actual: String,
    },

    #[error("argument {argument} is a {kind} value, not an object instance")]
    NotAnInstance { argument: &'static str, kind: String },

    #[error("instance of {actual} is not a {expected}")]
    WrongType { expected: String, actual: String },

    #[error("unknown type {name}")]
    UnknownType { name: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

impl OperationError {
    pub fn null_argument(argument: &'static str) -> Self {
        OperationError::NullArgument { argument }
    }

    pub fn incompatible_types(
        argument: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        OperationError::IncompatibleTypes {
            argument,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn not_an_instance(argument: &'static str, kind: impl Into<String>) -> Self {
        OperationError::NotAnInstance {
            argument,
            kind: kind.into(),
        }
    }
}
