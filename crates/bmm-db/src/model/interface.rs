//! Instance network interface entity.

use super::{Instance, MachineInterface, Model, Subnet, VpcPrefix};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Provisioning state of an instance interface.
    pub enum InterfaceStatus {
        Pending => "Pending",
        Provisioning => "Provisioning",
        Ready => "Ready",
        Error => "Error",
        Deleting => "Deleting",
    }
}

/// A network interface attached to an instance, bound to either a subnet or
/// a VPC prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Interface {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub subnet_id: Option<Uuid>,
    pub vpc_prefix_id: Option<Uuid>,
    pub machine_interface_id: Option<Uuid>,
    pub device: Option<String>,
    pub device_instance: Option<i32>,
    pub is_physical: bool,
    pub virtual_function_id: Option<i32>,
    pub mac_address: Option<String>,
    pub ip_addresses: Vec<String>,
    #[sqlx(try_from = "String")]
    pub status: InterfaceStatus,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<Instance>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Subnet>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_prefix: Option<VpcPrefix>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_interface: Option<MachineInterface>,
}

impl Model for Interface {
    const TABLE: &'static str = "interface";
    const ALIAS: &'static str = "ifc";
    const RESOURCE: &'static str = "Interface";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "instance_id",
        "subnet_id",
        "vpc_prefix_id",
        "machine_interface_id",
        "device",
        "device_instance",
        "is_physical",
        "virtual_function_id",
        "mac_address",
        "ip_addresses",
        "status",
        "created",
        "updated",
        "deleted",
        "created_by",
    ];
}
