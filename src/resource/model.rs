//! Resource entities
//!
//! Typed snapshots of the JSON returned by the compute, VPC, operation and
//! billing APIs. Every field defaults when absent; 64-bit sizes stay strings
//! because the API encodes them that way.

use crate::yc::client::Api;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Labels = BTreeMap<String, String>;

/// Where a collection lives in the resource hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `folderId` is required and the server accepts a `filter`
    Folder,
    /// Optional `zoneId` query parameter, no server filter
    Zone,
    /// No scoping parameter at all
    Global,
}

/// Endpoint and envelope metadata for an entity type
pub trait Resource: DeserializeOwned + Serialize + Send + 'static {
    const API: Api;
    /// Path segment under the API base URL
    const COLLECTION: &'static str;
    /// Array key in the list envelope
    const LIST_KEY: &'static str;
    /// Object key in the get envelope
    const ITEM_KEY: &'static str;
    const SCOPE: Scope;
    /// Extra query parameters for single-item GETs
    const GET_PARAMS: &'static [(&'static str, &'static str)] = &[];

    fn id(&self) -> &str;
}

macro_rules! resource {
    ($ty:ident, $api:ident, $collection:literal, $list_key:literal, $item_key:literal, $scope:ident) => {
        resource!($ty, $api, $collection, $list_key, $item_key, $scope, &[]);
    };
    ($ty:ident, $api:ident, $collection:literal, $list_key:literal, $item_key:literal, $scope:ident, $params:expr) => {
        impl Resource for $ty {
            const API: Api = Api::$api;
            const COLLECTION: &'static str = $collection;
            const LIST_KEY: &'static str = $list_key;
            const ITEM_KEY: &'static str = $item_key;
            const SCOPE: Scope = Scope::$scope;
            const GET_PARAMS: &'static [(&'static str, &'static str)] = $params;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

/// Compute instance status
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    Running,
    Stopped,
    Provisioning,
    Starting,
    Stopping,
    Unknown,
    /// Anything else, passed through verbatim
    Other(String),
    #[default]
    Unspecified,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Provisioning => "PROVISIONING",
            Self::Starting => "STARTING",
            Self::Stopping => "STOPPING",
            Self::Unknown => "UNKNOWN",
            Self::Other(s) => s,
            Self::Unspecified => "",
        }
    }
}

impl From<String> for InstanceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "RUNNING" => Self::Running,
            "STOPPED" => Self::Stopped,
            "PROVISIONING" => Self::Provisioning,
            "STARTING" => Self::Starting,
            "STOPPING" => Self::Stopping,
            "UNKNOWN" => Self::Unknown,
            "" => Self::Unspecified,
            _ => Self::Other(value),
        }
    }
}

impl From<InstanceStatus> for String {
    fn from(value: InstanceStatus) -> Self {
        value.as_str().to_string()
    }
}

// =============================================================================
// Compute
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub zone_id: String,
    pub status: InstanceStatus,
    pub folder_id: String,
    pub description: String,
    pub labels: Labels,
    pub platform_id: String,
    pub created_at: String,
    pub resources: Value,
    pub metadata: BTreeMap<String, String>,
    pub metadata_options: Value,
    pub boot_disk: Value,
    pub secondary_disks: Vec<Value>,
    pub network_interfaces: Vec<Value>,
    pub fqdn: String,
    pub service_account_id: String,
    pub hostname: String,
    pub deletion_protection: bool,
}

resource!(Instance, Compute, "instances", "instances", "instance", Folder, &[("view", "FULL")]);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Disk {
    pub id: String,
    pub name: String,
    pub description: String,
    pub folder_id: String,
    pub zone_id: String,
    pub type_id: String,
    pub size: String,
    pub status: String,
    pub created_at: String,
    pub source_image_id: String,
    pub source_snapshot_id: String,
    pub block_size: String,
    pub labels: Labels,
}

resource!(Disk, Compute, "disks", "disks", "disk", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub folder_id: String,
    pub zone_id: String,
    pub status: String,
    pub created_at: String,
    pub source_disk_id: String,
    pub size: String,
    pub labels: Labels,
}

resource!(Snapshot, Compute, "snapshots", "snapshots", "snapshot", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub description: String,
    pub folder_id: String,
    pub family: String,
    pub product_ids: Vec<String>,
    pub status: String,
    pub created_at: String,
    pub min_disk_size: String,
    pub size: String,
    pub os_type: String,
    pub os_version: String,
    pub labels: Labels,
}

resource!(Image, Compute, "images", "images", "image", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filesystem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub folder_id: String,
    pub zone_id: String,
    pub type_id: String,
    pub size: String,
    pub status: String,
    pub created_at: String,
    pub labels: Labels,
}

resource!(Filesystem, Compute, "filesystems", "filesystems", "filesystem", Folder);

/// Shape shared by placement, host, GPU and disk placement groups and
/// reserved instance pools
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub folder_id: String,
    pub zone_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub created_at: String,
    pub labels: Labels,
}

macro_rules! group_resource {
    ($ty:ident, $collection:literal, $item_key:literal) => {
        #[derive(Debug, Clone, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $ty(pub Group);

        impl Resource for $ty {
            const API: Api = Api::Compute;
            const COLLECTION: &'static str = $collection;
            const LIST_KEY: &'static str = $collection;
            const ITEM_KEY: &'static str = $item_key;
            const SCOPE: Scope = Scope::Folder;

            fn id(&self) -> &str {
                &self.0.id
            }
        }
    };
}

group_resource!(PlacementGroup, "placementGroups", "placementGroup");
group_resource!(HostGroup, "hostGroups", "hostGroup");
group_resource!(GpuCluster, "gpuClusters", "gpuCluster");
group_resource!(DiskPlacementGroup, "diskPlacementGroups", "diskPlacementGroup");
group_resource!(ReservedInstancePool, "reservedInstancePools", "reservedInstancePool");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotSchedule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub folder_id: String,
    pub status: String,
    pub created_at: String,
    pub schedule_policy: Value,
    pub labels: Labels,
}

resource!(SnapshotSchedule, Compute, "snapshotSchedules", "snapshotSchedules", "snapshotSchedule", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Zone {
    pub id: String,
    pub region_id: String,
    pub name: String,
    pub status: String,
}

resource!(Zone, Compute, "zones", "zones", "zone", Global);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskType {
    pub id: String,
    pub zone_id: String,
    pub name: String,
    pub description: String,
}

resource!(DiskType, Compute, "diskTypes", "diskTypes", "diskType", Zone);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostType {
    pub id: String,
    pub zone_id: String,
    pub name: String,
    pub description: String,
}

resource!(HostType, Compute, "hostTypes", "hostTypes", "hostType", Zone);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub id: String,
    pub description: String,
    pub created_at: String,
    pub done: bool,
    pub status: String,
    pub folder_id: String,
    pub error: Value,
    pub response: Value,
    pub metadata: Value,
}

resource!(Operation, Compute, "operations", "operations", "operation", Folder);

// =============================================================================
// VPC
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Network {
    pub id: String,
    pub folder_id: String,
    pub name: String,
    pub description: String,
    pub labels: Labels,
    pub created_at: String,
}

resource!(Network, Vpc, "networks", "networks", "network", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subnet {
    pub id: String,
    pub folder_id: String,
    pub network_id: String,
    pub zone_id: String,
    pub name: String,
    pub description: String,
    pub labels: Labels,
    pub created_at: String,
    #[serde(rename = "v4CidrBlocks")]
    pub cidr_blocks: Vec<String>,
}

resource!(Subnet, Vpc, "subnets", "subnets", "subnet", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteTable {
    pub id: String,
    pub folder_id: String,
    pub network_id: String,
    pub name: String,
    pub description: String,
    pub labels: Labels,
    pub created_at: String,
    pub static_routes: Vec<Value>,
}

resource!(RouteTable, Vpc, "routeTables", "routeTables", "routeTable", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityGroup {
    pub id: String,
    pub folder_id: String,
    pub network_id: String,
    pub name: String,
    pub description: String,
    pub labels: Labels,
    pub created_at: String,
    pub rules: Vec<Value>,
    pub ingress_rules: Vec<Value>,
    pub egress_rules: Vec<Value>,
}

resource!(SecurityGroup, Vpc, "securityGroups", "securityGroups", "securityGroup", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressRequirements {
    pub ddos_protection_provider: String,
    pub outgoing_smtp_capability: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalIpv4Address {
    pub address: String,
    pub zone_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<AddressRequirements>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsRecord {
    pub fqdn: String,
    pub dns_zone_id: String,
    pub ttl: String,
    pub ptr: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub id: String,
    pub folder_id: String,
    pub created_at: String,
    pub name: String,
    pub description: String,
    pub labels: Labels,
    pub external_ipv4_address: Option<ExternalIpv4Address>,
    pub reserved: bool,
    pub used: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub ip_version: String,
    pub deletion_protection: bool,
    pub dns_records: Vec<DnsRecord>,
}

resource!(Address, Vpc, "addresses", "addresses", "address", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Gateway {
    pub id: String,
    pub folder_id: String,
    pub created_at: String,
    pub name: String,
    pub description: String,
    pub labels: Labels,
    pub shared_egress_gateway: Value,
}

resource!(Gateway, Vpc, "gateways", "gateways", "gateway", Folder);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VpcOperation {
    pub id: String,
    pub description: String,
    pub created_at: String,
    pub created_by: String,
    pub modified_at: String,
    pub done: bool,
    pub metadata: Value,
    pub error: Value,
    pub response: Value,
}

resource!(VpcOperation, Operation, "operations", "operations", "operation", Global);

// =============================================================================
// Billing
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillingAccount {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub country_code: String,
    pub balance: String,
    pub currency: String,
    pub active: bool,
    pub labels: Labels,
}

resource!(BillingAccount, Billing, "billingAccounts", "billingAccounts", "billingAccount", Global);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instance_status_roundtrip() {
        let instance: Instance = serde_json::from_value(json!({
            "id": "fhm1",
            "status": "RUNNING",
            "zoneId": "ru-central1-a"
        }))
        .unwrap();
        assert_eq!(instance.status, InstanceStatus::Running);
        assert_eq!(instance.id(), "fhm1");

        let instance: Instance = serde_json::from_value(json!({ "status": "CRASHED" })).unwrap();
        assert_eq!(instance.status, InstanceStatus::Other("CRASHED".into()));
        assert_eq!(serde_json::to_value(&instance).unwrap()["status"], "CRASHED");
    }

    #[test]
    fn test_missing_fields_default() {
        let disk: Disk = serde_json::from_value(json!({ "id": "epd1" })).unwrap();
        assert_eq!(disk.id, "epd1");
        assert!(disk.labels.is_empty());
        assert_eq!(disk.size, "");
    }

    #[test]
    fn test_group_type_field() {
        let group: HostGroup = serde_json::from_value(json!({
            "id": "hg1",
            "type": "DEDICATED",
            "zoneId": "ru-central1-b"
        }))
        .unwrap();
        assert_eq!(group.0.kind, "DEDICATED");
        assert_eq!(group.id(), "hg1");
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["type"], "DEDICATED");
        assert_eq!(value["zoneId"], "ru-central1-b");
    }

    #[test]
    fn test_subnet_cidr_blocks() {
        let subnet: Subnet = serde_json::from_value(json!({
            "id": "e9b1",
            "v4CidrBlocks": ["10.0.0.0/24"]
        }))
        .unwrap();
        assert_eq!(subnet.cidr_blocks, vec!["10.0.0.0/24".to_string()]);
    }

    #[test]
    fn test_instance_get_uses_full_view() {
        assert_eq!(Instance::GET_PARAMS, &[("view", "FULL")]);
        assert!(Disk::GET_PARAMS.is_empty());
        assert_eq!(VpcOperation::API, Api::Operation);
        assert_eq!(Zone::SCOPE, Scope::Global);
        assert_eq!(DiskType::SCOPE, Scope::Zone);
    }
}
