use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::dataframe::DataFrame;
use crate::transform::{coerce, TransformKind};

/// One versioned schema definition for a provider: declared column types, a
/// rename table, and per-column coercion rules.
///
/// The three tables are independent — a column may appear in one, some, or
/// all of them. `transformations` is keyed by source column names because it
/// runs before `mapping` renames anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaVersion {
    pub version: String,
    pub description: String,
    /// Source column name -> declared data type. The key set is the expected
    /// column set used for detection and validation.
    pub schema: HashMap<String, String>,
    /// Source column name -> target column name.
    pub mapping: HashMap<String, String>,
    #[serde(default)]
    pub transformations: HashMap<String, TransformKind>,
}

impl SchemaVersion {
    /// Rename columns per `mapping`. Columns absent from the mapping pass
    /// through unchanged; the input frame is not modified.
    pub fn apply_mapping(&self, frame: &DataFrame) -> DataFrame {
        frame.rename_columns(&self.mapping)
    }

    /// Apply the declared coercions to a copy of the frame. Columns named in
    /// `transformations` but absent from the frame are skipped silently;
    /// cells that fail numeric coercion become null.
    pub fn apply_transformations(&self, frame: &DataFrame) -> DataFrame {
        let mut result = frame.clone();
        for (column, kind) in &self.transformations {
            if let Some(existing) = result.column(column) {
                let values = existing.values().iter().map(|v| coerce(v, *kind)).collect();
                result = result.with_column(column.clone(), values);
            }
        }
        result
    }

    /// Numeric suffix of this version's `v<N>` identifier.
    pub fn version_number(&self) -> Option<u64> {
        numeric_suffix(&self.version)
    }
}

/// Parse the `<N>` out of a `v<N>` version string. Version ordering is
/// numeric on this suffix, never lexicographic: `v10` sorts after `v2`.
pub fn numeric_suffix(version: &str) -> Option<u64> {
    version.strip_prefix('v')?.parse().ok()
}
