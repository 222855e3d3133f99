//! Formatting errors.

use std::fmt;
use thiserror::Error;

/// FormatError reports a value a formatter cannot render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("formatter {formatter} cannot render property {property} holding a {kind} value")]
    Unsupported {
        formatter: String,
        property: String,
        kind: String,
    },

    #[error("failed to write formatted output")]
    Write,
}

impl FormatError {
    pub fn unsupported(
        formatter: impl Into<String>,
        property: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        FormatError::Unsupported {
            formatter: formatter.into(),
            property: property.into(),
            kind: kind.into(),
        }
    }
}

impl From<fmt::Error> for FormatError {
    fn from(_: fmt::Error) -> Self {
        FormatError::Write
    }
}
