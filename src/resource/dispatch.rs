//! Table Dispatch
//!
//! Maps table names to their resource types and runs list/get requests
//! through the generic fetcher.

use super::fetcher::{get_item, list_pages, to_row, ListQuery};
use super::filter::{build_filter, matches_all, Predicate};
use super::model::*;
use super::registry::{get_table_def, QualKind, QualTarget, TableDef};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{Error, Result};
use crate::host::{Qualifiers, Row, RowSink};
use crate::yc::client::YcClient;
use futures::TryStreamExt;
use serde::Deserialize;

/// Column through which a listing may override the configured folder
const FOLDER_ID_COLUMN: &str = "folder_id";

/// Resource type behind a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Instance,
    Disk,
    Snapshot,
    Image,
    Filesystem,
    PlacementGroup,
    HostGroup,
    GpuCluster,
    DiskPlacementGroup,
    SnapshotSchedule,
    ReservedInstancePool,
    Zone,
    DiskType,
    HostType,
    Operation,
    Network,
    Subnet,
    RouteTable,
    SecurityGroup,
    Address,
    Gateway,
    VpcOperation,
    BillingAccount,
}

macro_rules! dispatch {
    ($kind:expr, $func:ident ( $($arg:expr),* )) => {
        match $kind {
            ResourceKind::Instance => $func::<Instance>($($arg),*).await,
            ResourceKind::Disk => $func::<Disk>($($arg),*).await,
            ResourceKind::Snapshot => $func::<Snapshot>($($arg),*).await,
            ResourceKind::Image => $func::<Image>($($arg),*).await,
            ResourceKind::Filesystem => $func::<Filesystem>($($arg),*).await,
            ResourceKind::PlacementGroup => $func::<PlacementGroup>($($arg),*).await,
            ResourceKind::HostGroup => $func::<HostGroup>($($arg),*).await,
            ResourceKind::GpuCluster => $func::<GpuCluster>($($arg),*).await,
            ResourceKind::DiskPlacementGroup => $func::<DiskPlacementGroup>($($arg),*).await,
            ResourceKind::SnapshotSchedule => $func::<SnapshotSchedule>($($arg),*).await,
            ResourceKind::ReservedInstancePool => $func::<ReservedInstancePool>($($arg),*).await,
            ResourceKind::Zone => $func::<Zone>($($arg),*).await,
            ResourceKind::DiskType => $func::<DiskType>($($arg),*).await,
            ResourceKind::HostType => $func::<HostType>($($arg),*).await,
            ResourceKind::Operation => $func::<Operation>($($arg),*).await,
            ResourceKind::Network => $func::<Network>($($arg),*).await,
            ResourceKind::Subnet => $func::<Subnet>($($arg),*).await,
            ResourceKind::RouteTable => $func::<RouteTable>($($arg),*).await,
            ResourceKind::SecurityGroup => $func::<SecurityGroup>($($arg),*).await,
            ResourceKind::Address => $func::<Address>($($arg),*).await,
            ResourceKind::Gateway => $func::<Gateway>($($arg),*).await,
            ResourceKind::VpcOperation => $func::<VpcOperation>($($arg),*).await,
            ResourceKind::BillingAccount => $func::<BillingAccount>($($arg),*).await,
        }
    };
}

/// Qualifiers of one query sorted by where they apply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    /// Rendered into the server `filter`
    pub server: Vec<Predicate>,
    /// Sent as query parameters
    pub params: Vec<(String, String)>,
    /// Re-checked on every item, server filter clauses included
    pub local: Vec<Predicate>,
}

impl QueryPlan {
    pub fn new(table: &TableDef, quals: &dyn Qualifiers) -> Self {
        let mut plan = Self::default();

        for def in &table.qualifiers {
            let predicate = match def.kind {
                QualKind::String => match quals.string(&def.column) {
                    Some(value) if def.upper => Predicate::eq_str(&def.field, value.to_uppercase()),
                    Some(value) => Predicate::eq_str(&def.field, value),
                    None => continue,
                },
                QualKind::Bool => match quals.bool(&def.column) {
                    Some(value) => Predicate::eq_bool(&def.field, value),
                    None => continue,
                },
            };

            // Scoping parameters are trusted; list items need not echo them back
            match def.target {
                QualTarget::Filter => {
                    plan.server.push(predicate.clone());
                    plan.local.push(predicate);
                },
                QualTarget::Param => plan
                    .params
                    .push((def.field.clone(), predicate.value.to_param())),
                QualTarget::Local => plan.local.push(predicate),
            }
        }

        plan
    }
}

fn table_def(name: &str) -> Result<&'static TableDef> {
    get_table_def(name).ok_or_else(|| Error::UnknownTable(name.to_string()))
}

/// Stream every matching row of a table into `sink`
///
/// Returns the number of rows emitted. Rows already emitted stay delivered
/// if a later page fails.
pub async fn list_table(
    client: &YcClient,
    table: &str,
    quals: &dyn Qualifiers,
    sink: &mut dyn RowSink,
) -> Result<usize> {
    let def = table_def(table)?;
    tracing::debug!("list_table: table={}, resource={:?}", table, def.resource);
    let emitted = dispatch!(def.resource, list_into(client, def, quals, sink))?;
    tracing::info!("list_table: table={}, rows={}", table, emitted);
    Ok(emitted)
}

/// Fetch one row by the table's id column
///
/// `None` without a request when the id qualifier is absent; an id the API
/// does not know fails with `Error::Status` (404).
pub async fn get_table(client: &YcClient, table: &str, quals: &dyn Qualifiers) -> Result<Option<Row>> {
    let def = table_def(table)?;
    tracing::debug!("get_table: table={}, resource={:?}", table, def.resource);
    dispatch!(def.resource, get_into(client, def, quals))
}

async fn list_into<R: Resource>(
    client: &YcClient,
    def: &TableDef,
    quals: &dyn Qualifiers,
    sink: &mut dyn RowSink,
) -> Result<usize> {
    let plan = QueryPlan::new(def, quals);

    let folder_id = match R::SCOPE {
        Scope::Folder => Some(client.folder_id(quals.string(FOLDER_ID_COLUMN).as_deref())?),
        Scope::Zone | Scope::Global => None,
    };

    let query = ListQuery {
        folder_id,
        filter: build_filter(&plan.server),
        params: plan.params.clone(),
        page_size: DEFAULT_PAGE_SIZE,
        ..Default::default()
    };

    let mut pages = std::pin::pin!(list_pages::<R>(client, query));
    let mut emitted = 0;

    while let Some(page) = pages.try_next().await? {
        for item in page.items {
            let value = serde_json::to_value(&item).map_err(|source| Error::Decode {
                url: R::COLLECTION.to_string(),
                source,
            })?;
            if !matches_all(&plan.local, &value) {
                continue;
            }
            sink.emit(to_row(&def.columns, &value))?;
            emitted += 1;
        }
    }

    Ok(emitted)
}

async fn get_into<R: Resource>(
    client: &YcClient,
    def: &TableDef,
    quals: &dyn Qualifiers,
) -> Result<Option<Row>> {
    let id = quals.string(&def.id_column);
    let Some(item) = get_item::<R>(client, id.as_deref()).await? else {
        return Ok(None);
    };

    let value = serde_json::to_value(&item).map_err(|source| Error::Decode {
        url: R::COLLECTION.to_string(),
        source,
    })?;
    Ok(Some(to_row(&def.columns, &value)))
}
