//! Machine network interface entity.

use super::{Keyed, Machine, Model, Subnet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A network interface discovered on a machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MachineInterface {
    pub id: Uuid,
    pub machine_id: String,
    pub controller_interface_id: Option<Uuid>,
    pub controller_segment_id: Option<Uuid>,
    pub attached_dpu_machine_id: Option<String>,
    pub subnet_id: Option<Uuid>,
    pub hostname: Option<String>,
    pub is_primary: bool,
    pub mac_address: Option<String>,
    pub ip_addresses: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<Machine>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Subnet>,
}

impl Model for MachineInterface {
    const TABLE: &'static str = "machine_interface";
    const ALIAS: &'static str = "mi";
    const RESOURCE: &'static str = "MachineInterface";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "machine_id",
        "controller_interface_id",
        "controller_segment_id",
        "attached_dpu_machine_id",
        "subnet_id",
        "hostname",
        "is_primary",
        "mac_address",
        "ip_addresses",
        "created",
        "updated",
        "deleted",
    ];
}

impl Keyed for MachineInterface {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}
