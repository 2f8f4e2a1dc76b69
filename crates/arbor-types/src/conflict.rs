use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::PropertyValue;

/// An irreconcilable three-way disagreement on a single property.
///
/// Produced when base, ours, and theirs are pairwise distinct on a
/// non-composite property, or when a component value cannot be
/// reconciled. Conflicts are data, never errors: a merge that reports
/// conflicts still returns a complete result, with the base value kept
/// as the provisional merged value wherever one exists.
///
/// Nested conflicts carry dotted paths (`"layout.spacing"`) and
/// bracketed sequence indices (`"tags[2]"`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeConflict {
    /// Property name, possibly a nested path.
    pub property: String,
    /// The common ancestor's value, if it defined the property.
    pub base: Option<PropertyValue>,
    /// Our side's value, if present.
    pub ours: Option<PropertyValue>,
    /// Their side's value, if present.
    pub theirs: Option<PropertyValue>,
}

impl MergeConflict {
    pub fn new(
        property: impl Into<String>,
        base: Option<PropertyValue>,
        ours: Option<PropertyValue>,
        theirs: Option<PropertyValue>,
    ) -> Self {
        Self {
            property: property.into(),
            base,
            ours,
            theirs,
        }
    }
}

impl fmt::Display for MergeConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side(v: &Option<PropertyValue>) -> String {
            match v {
                Some(v) => v.to_string(),
                None => "<absent>".to_string(),
            }
        }
        write!(
            f,
            "conflict on `{}`: ours={}, theirs={} (base={})",
            self.property,
            side(&self.ours),
            side(&self.theirs),
            side(&self.base),
        )
    }
}
