use serde::{Deserialize, Serialize};

/// Column metadata as reported by the database catalog.
///
/// `data_type` is the catalog's `format_type` rendering (e.g. `bigint`,
/// `character varying(64)`, `timestamp with time zone`) and is valid SQL cast
/// syntax, which the transfer engine relies on when binding row values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Project a column list down to its ordered names.
pub fn column_names(columns: &[ColumnInfo]) -> Vec<String> {
    columns.iter().map(|column| column.name.clone()).collect()
}
