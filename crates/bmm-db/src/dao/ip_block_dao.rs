//! IpBlockDao trait and its inputs.

use crate::model::{IpBlock, IpBlockStatus, ProtocolVersion, RoutingType};
use crate::relation::Relation;
use crate::session::Tx;
use async_trait::async_trait;
use bmm_core::{BmmResult, Interface, Page, PageInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

/// Fields of a new IP block.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IpBlockCreateInput {
    /// Caller-chosen id; a random one is generated when absent.
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 256), custom(function = "bmm_core::validation::rules::not_blank"))]
    pub name: String,
    pub description: Option<String>,
    pub site_id: Uuid,
    pub infrastructure_provider_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub routing_type: RoutingType,
    #[validate(custom(function = "bmm_core::validation::rules::ip_address"))]
    pub prefix: String,
    #[validate(range(min = 0, max = 128))]
    pub prefix_length: i32,
    pub protocol_version: ProtocolVersion,
    pub full_grant: bool,
    pub status: IpBlockStatus,
    pub created_by: Option<Uuid>,
}

/// Sparse update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct IpBlockUpdateInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 256), custom(function = "bmm_core::validation::rules::not_blank"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub site_id: Option<Uuid>,
    pub infrastructure_provider_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub routing_type: Option<RoutingType>,
    #[validate(custom(function = "bmm_core::validation::rules::ip_address"))]
    pub prefix: Option<String>,
    #[validate(range(min = 0, max = 128))]
    pub prefix_length: Option<i32>,
    pub protocol_version: Option<ProtocolVersion>,
    pub full_grant: Option<bool>,
    pub status: Option<IpBlockStatus>,
}

/// Nullable columns to reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpBlockClearInput {
    pub id: Uuid,
    pub description: bool,
    pub tenant_id: bool,
}

/// Listing filter. Every present criterion must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpBlockFilterInput {
    pub ids: Option<Vec<Uuid>>,
    pub names: Option<Vec<String>>,
    pub site_ids: Option<Vec<Uuid>>,
    pub infrastructure_provider_ids: Option<Vec<Uuid>>,
    pub tenant_ids: Option<Vec<Uuid>>,
    pub routing_types: Option<Vec<RoutingType>>,
    pub prefixes: Option<Vec<String>>,
    pub prefix_lengths: Option<Vec<i32>>,
    pub protocol_versions: Option<Vec<ProtocolVersion>>,
    pub full_grant: Option<bool>,
    pub statuses: Option<Vec<IpBlockStatus>>,
    /// Only blocks not derived for a tenant. Cannot be combined with `tenant_ids`.
    #[serde(default)]
    pub exclude_derived: bool,
    /// Matched against name, description and status.
    pub search_query: Option<String>,
}

/// Data access for IP blocks.
#[async_trait]
pub trait IpBlockDao: Interface + Send + Sync {
    /// Inserts a block and returns it as stored.
    async fn create(&self, tx: Option<&mut Tx>, input: IpBlockCreateInput) -> BmmResult<IpBlock>;

    /// Loads a live block.
    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<IpBlock>;

    /// Lists blocks matching `filter`.
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: IpBlockFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<IpBlock>>;

    /// Applies a sparse update.
    async fn update(&self, tx: Option<&mut Tx>, input: IpBlockUpdateInput) -> BmmResult<IpBlock>;

    /// Resets the flagged nullable columns.
    async fn clear(&self, tx: Option<&mut Tx>, input: IpBlockClearInput) -> BmmResult<IpBlock>;

    /// Soft deletes a block. Deleting a missing block is not an error.
    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()>;

    /// Counts live blocks per status, scoped by the given owners.
    async fn get_count_by_status(
        &self,
        tx: Option<&mut Tx>,
        infrastructure_provider_id: Option<Uuid>,
        site_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
    ) -> BmmResult<BTreeMap<String, u64>>;
}
