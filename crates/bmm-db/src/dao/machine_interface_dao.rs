//! MachineInterfaceDao trait and its inputs.

use crate::model::MachineInterface;
use crate::relation::Relation;
use crate::session::Tx;
use async_trait::async_trait;
use bmm_core::{BmmResult, Interface, Page, PageInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Fields of a newly discovered machine interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MachineInterfaceCreateInput {
    pub id: Option<Uuid>,
    #[validate(length(min = 1), custom(function = "bmm_core::validation::rules::not_blank"))]
    pub machine_id: String,
    pub controller_interface_id: Option<Uuid>,
    pub controller_segment_id: Option<Uuid>,
    pub attached_dpu_machine_id: Option<String>,
    pub subnet_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub hostname: Option<String>,
    pub is_primary: bool,
    #[validate(custom(function = "bmm_core::validation::rules::mac_address"))]
    pub mac_address: Option<String>,
    #[validate(custom(function = "bmm_core::validation::rules::ip_addresses"))]
    pub ip_addresses: Vec<String>,
}

/// Sparse update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MachineInterfaceUpdateInput {
    pub id: Uuid,
    #[validate(length(min = 1), custom(function = "bmm_core::validation::rules::not_blank"))]
    pub machine_id: Option<String>,
    pub controller_interface_id: Option<Uuid>,
    pub controller_segment_id: Option<Uuid>,
    pub attached_dpu_machine_id: Option<String>,
    pub subnet_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub hostname: Option<String>,
    pub is_primary: Option<bool>,
    #[validate(custom(function = "bmm_core::validation::rules::mac_address"))]
    pub mac_address: Option<String>,
    #[validate(custom(function = "bmm_core::validation::rules::ip_addresses"))]
    pub ip_addresses: Option<Vec<String>>,
}

/// Nullable columns to reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineInterfaceClearInput {
    pub id: Uuid,
    pub controller_interface_id: bool,
    pub controller_segment_id: bool,
    pub attached_dpu_machine_id: bool,
    pub subnet_id: bool,
    pub hostname: bool,
    pub mac_address: bool,
}

/// Listing filter. Every present criterion must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineInterfaceFilterInput {
    pub machine_ids: Option<Vec<String>>,
    pub controller_interface_ids: Option<Vec<Uuid>>,
    pub controller_segment_ids: Option<Vec<Uuid>>,
    pub attached_dpu_machine_ids: Option<Vec<String>>,
    pub subnet_ids: Option<Vec<Uuid>>,
    pub hostnames: Option<Vec<String>>,
    pub is_primary: Option<bool>,
    pub mac_addresses: Option<Vec<String>>,
    /// Matches interfaces holding any of these addresses.
    pub ip_addresses: Option<Vec<String>>,
    /// Matched against hostname, MAC address and machine id.
    pub search_query: Option<String>,
}

/// Data access for machine interfaces.
#[async_trait]
pub trait MachineInterfaceDao: Interface + Send + Sync {
    async fn create(
        &self,
        tx: Option<&mut Tx>,
        input: MachineInterfaceCreateInput,
    ) -> BmmResult<MachineInterface>;

    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<MachineInterface>;

    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: MachineInterfaceFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<MachineInterface>>;

    async fn update(
        &self,
        tx: Option<&mut Tx>,
        input: MachineInterfaceUpdateInput,
    ) -> BmmResult<MachineInterface>;

    async fn clear(
        &self,
        tx: Option<&mut Tx>,
        input: MachineInterfaceClearInput,
    ) -> BmmResult<MachineInterface>;

    /// Soft deletes the interface, or removes the row when `purge` is set.
    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid, purge: bool) -> BmmResult<()>;
}
