//! Table Registry - Load table descriptors from JSON
//!
//! This module loads every table descriptor from embedded JSON files and
//! provides lookup functions for the dispatch layer.

use super::dispatch::ResourceKind;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Embedded table JSON files (compiled into the binary)
const TABLE_FILES: &[&str] = &[
    include_str!("../resources/compute.json"),
    include_str!("../resources/vpc.json"),
    include_str!("../resources/billing.json"),
];

/// Value transform applied while mapping a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Keep the first 10 characters (`YYYY-MM-DD`)
    Date,
}

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// camelCase JSON path into the item
    pub field: String,
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualKind {
    #[default]
    String,
    Bool,
}

/// Where a qualifier is applied besides the local re-check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualTarget {
    /// Server-side `filter` expression
    Filter,
    /// Query parameter named after `field`
    Param,
    /// Client side only
    #[default]
    Local,
}

/// Qualifier definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct QualifierDef {
    pub column: String,
    pub field: String,
    #[serde(default)]
    pub kind: QualKind,
    #[serde(default)]
    pub target: QualTarget,
    /// Upper-case the value before use
    #[serde(default)]
    pub upper: bool,
}

/// Table definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct TableDef {
    pub description: String,
    pub resource: ResourceKind,
    pub id_column: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub qualifiers: Vec<QualifierDef>,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub tables: BTreeMap<String, TableDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<TableConfig> = OnceLock::new();

/// Get the table registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static TableConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = TableConfig::default();

        for content in TABLE_FILES {
            let partial: TableConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded table JSON: {}", e));
            final_config.tables.extend(partial.tables);
        }

        final_config
    })
}

/// Get a table definition by name
pub fn get_table_def(name: &str) -> Option<&'static TableDef> {
    get_registry().tables.get(name)
}

/// All table names, sorted
pub fn table_names() -> Vec<&'static str> {
    get_registry().tables.keys().map(|s| s.as_str()).collect()
}
