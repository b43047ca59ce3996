use serde::{Deserialize, Serialize};

/// Per-table column override rule.
///
/// `exclude` removes named columns from the source side before intersecting
/// with the target; `include`, when present, first restricts the source side
/// to only the named columns. Both operate on the source column list and are
/// indifferent to whether the named columns exist on either side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideRule {
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
}

/// A table selected for migration, with an optional override rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    #[serde(default)]
    pub rule: Option<OverrideRule>,
}

impl TableSpec {
    /// Spec for a table with no override rule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: None,
        }
    }
}
