//! Diff results.

use serde::Serialize;
use std::fmt;

use crate::format::render_value;
use crate::value::{NaturalObjects, ObjectSemantics, Value};

/// Difference records one equality property whose values differ.
///
/// The text of both values is rendered when the difference is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    pub property: String,
    pub left: Value,
    pub right: Value,
    left_text: String,
    right_text: String,
}

impl Difference {
    /// A difference whose object values render by identity.
    pub fn new(property: impl Into<String>, left: Value, right: Value) -> Self {
        Difference::with_objects(property, left, right, &NaturalObjects)
    }

    /// A difference whose object values render through `objects`.
    pub fn with_objects(
        property: impl Into<String>,
        left: Value,
        right: Value,
        objects: &dyn ObjectSemantics,
    ) -> Self {
        Difference {
            property: property.into(),
            left_text: render_value(&left, true, true, objects),
            right_text: render_value(&right, true, true, objects),
            left,
            right,
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} != {}",
            self.property, self.left_text, self.right_text
        )
    }
}

/// DiffResult is the outcome of a structural diff.
///
/// `NoDifferences` is returned exactly when the two instances are equal.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffResult {
    NoDifferences,
    PropertyDifferences(Vec<Difference>),
}

impl DiffResult {
    pub fn from_differences(differences: Vec<Difference>) -> Self {
        if differences.is_empty() {
            DiffResult::NoDifferences
        } else {
            DiffResult::PropertyDifferences(differences)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DiffResult::NoDifferences)
    }

    pub fn differences(&self) -> &[Difference] {
        match self {
            DiffResult::NoDifferences => &[],
            DiffResult::PropertyDifferences(list) => list,
        }
    }

    /// Names of the differing properties, in equality order.
    pub fn property_names(&self) -> Vec<&str> {
        self.differences().iter().map(|d| d.property.as_str()).collect()
    }

    /// A serializable report, used by the command line tool.
    pub fn report(&self) -> DiffReport {
        DiffReport {
            equal: self.is_empty(),
            differences: self
                .differences()
                .iter()
                .map(|d| DifferenceReport {
                    property: d.property.clone(),
                    left: d.left_text.clone(),
                    right: d.right_text.clone(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffResult::NoDifferences => write!(f, "no differences"),
            DiffResult::PropertyDifferences(list) => {
                write!(f, "- Differences:")?;
                for difference in list {
                    write!(f, "\n  {}", difference)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub equal: bool,
    pub differences: Vec<DifferenceReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DifferenceReport {
    pub property: String,
    pub left: String,
    pub right: String,
}
