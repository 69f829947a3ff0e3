//! InterfaceDao trait and its inputs.

use crate::model::{Interface, InterfaceStatus};
use crate::relation::Relation;
use crate::session::Tx;
use async_trait::async_trait;
use bmm_core::{BmmResult, Page, PageInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Most interfaces a single `create_multiple` call accepts.
pub const MAX_BATCH_ITEMS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InterfaceCreateInput {
    pub id: Option<Uuid>,
    pub instance_id: Uuid,
    pub subnet_id: Option<Uuid>,
    pub vpc_prefix_id: Option<Uuid>,
    pub machine_interface_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub device: Option<String>,
    #[validate(range(min = 0))]
    pub device_instance: Option<i32>,
    pub is_physical: bool,
    #[validate(range(min = 0))]
    pub virtual_function_id: Option<i32>,
    #[validate(custom(function = "bmm_core::validation::rules::mac_address"))]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    pub status: InterfaceStatus,
    pub created_by: Option<Uuid>,
}

/// Sparse update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct InterfaceUpdateInput {
    pub id: Uuid,
    pub subnet_id: Option<Uuid>,
    pub vpc_prefix_id: Option<Uuid>,
    pub machine_interface_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub device: Option<String>,
    #[validate(range(min = 0))]
    pub device_instance: Option<i32>,
    pub is_physical: Option<bool>,
    #[validate(range(min = 0))]
    pub virtual_function_id: Option<i32>,
    #[validate(custom(function = "bmm_core::validation::rules::mac_address"))]
    pub mac_address: Option<String>,
    pub ip_addresses: Option<Vec<String>>,
    pub status: Option<InterfaceStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceClearInput {
    pub id: Uuid,
    pub subnet_id: bool,
    pub vpc_prefix_id: bool,
    pub machine_interface_id: bool,
    pub device: bool,
    pub device_instance: bool,
    pub virtual_function_id: bool,
    pub mac_address: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterfaceFilterInput {
    pub instance_ids: Option<Vec<Uuid>>,
    pub subnet_ids: Option<Vec<Uuid>>,
    pub vpc_prefix_ids: Option<Vec<Uuid>>,
    pub machine_interface_ids: Option<Vec<Uuid>>,
    pub devices: Option<Vec<String>>,
    pub device_instances: Option<Vec<i32>>,
    pub is_physical: Option<bool>,
    pub statuses: Option<Vec<InterfaceStatus>>,
    /// Matches interfaces holding any of these addresses.
    pub ip_addresses: Option<Vec<String>>,
}

/// Data access for instance interfaces.
#[async_trait]
pub trait InterfaceDao: bmm_core::Interface + Send + Sync {
    /// Inserts one interface.
    async fn create(&self, tx: Option<&mut Tx>, input: InterfaceCreateInput) -> BmmResult<Interface>;

    /// Inserts up to [`MAX_BATCH_ITEMS`] interfaces in one statement and
    /// returns them in input order.
    async fn create_multiple(
        &self,
        tx: Option<&mut Tx>,
        inputs: Vec<InterfaceCreateInput>,
    ) -> BmmResult<Vec<Interface>>;

    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<Interface>;

    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: InterfaceFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<Interface>>;

    async fn update(&self, tx: Option<&mut Tx>, input: InterfaceUpdateInput) -> BmmResult<Interface>;

    async fn clear(&self, tx: Option<&mut Tx>, input: InterfaceClearInput) -> BmmResult<Interface>;

    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()>;
}
