//! Resource abstraction layer
//!
//! This module provides a data-driven approach to exposing Yandex Cloud
//! resources as tables. Table descriptors are loaded from JSON files at
//! compile time; one generic engine serves every resource type.
//!
//! # Architecture
//!
//! - [`model`] - Typed entities and their endpoint metadata
//! - [`registry`] - Loads and caches table descriptors from embedded JSON
//! - [`filter`] - Typed predicates for server filters and local re-checks
//! - [`fetcher`] - Generic list/get with pagination and row mapping
//! - [`dispatch`] - Maps table names to resource types
//!
//! # Table Descriptors
//!
//! Tables are defined in JSON files under `src/resources/`:
//! - `compute.json` - Compute resources (instances, disks, images, groups)
//! - `vpc.json` - VPC resources (networks, subnets, addresses, operations)
//! - `billing.json` - Billing accounts
//!
//! # Example
//!
//! ```ignore
//! use ycsource::host::QualMap;
//! use ycsource::resource::list_table;
//!
//! async fn running(client: &ycsource::YcClient) -> ycsource::Result<Vec<ycsource::Row>> {
//!     let quals = QualMap::new().with_string("status", "running");
//!     let mut rows = Vec::new();
//!     list_table(client, "yandexcloud_compute_instance", &quals, &mut rows).await?;
//!     Ok(rows)
//! }
//! ```

pub mod dispatch;
pub mod fetcher;
pub mod filter;
pub mod model;
pub mod registry;

pub use dispatch::{get_table, list_table, QueryPlan, ResourceKind};
pub use fetcher::{
    extract_json_value, format_date, get_item, list_page, list_pages, pages, to_row, ListQuery,
    Page, PageToken,
};
pub use filter::{build_filter, FilterValue, Predicate};
pub use model::{Resource, Scope};
pub use registry::{get_registry, get_table_def, table_names, TableDef};
