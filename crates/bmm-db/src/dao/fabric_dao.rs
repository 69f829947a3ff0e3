//! FabricDao trait and its inputs.

use crate::model::{Fabric, FabricStatus};
use crate::relation::Relation;
use crate::session::Tx;
use async_trait::async_trait;
use bmm_core::{BmmResult, Interface, Page, PageInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FabricCreateInput {
    /// Site-reported fabric id.
    #[validate(custom(function = "bmm_core::validation::rules::not_blank"))]
    pub id: String,
    pub site_id: Uuid,
    #[validate(custom(function = "bmm_core::validation::rules::not_blank"))]
    pub org: String,
    pub infrastructure_provider_id: Uuid,
    pub status: FabricStatus,
}

/// Sparse update of the fabric identified by `(id, site_id)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FabricUpdateInput {
    pub id: String,
    pub site_id: Uuid,
    pub infrastructure_provider_id: Option<Uuid>,
    pub status: Option<FabricStatus>,
    pub is_missing_on_site: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FabricFilterInput {
    pub org: Option<String>,
    pub site_id: Option<Uuid>,
    pub infrastructure_provider_id: Option<Uuid>,
    pub statuses: Option<Vec<FabricStatus>>,
    /// An empty list matches nothing and skips the query.
    pub ids: Option<Vec<String>>,
    /// Matched against id, org and status.
    pub search_query: Option<String>,
}

/// Data access for fabrics.
#[async_trait]
pub trait FabricDao: Interface + Send + Sync {
    async fn create(&self, tx: Option<&mut Tx>, input: FabricCreateInput) -> BmmResult<Fabric>;

    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: &str,
        site_id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<Fabric>;

    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: FabricFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<Fabric>>;

    async fn update(&self, tx: Option<&mut Tx>, input: FabricUpdateInput) -> BmmResult<Fabric>;

    /// Soft deletes one fabric.
    async fn delete_by_id(&self, tx: Option<&mut Tx>, id: &str, site_id: Uuid) -> BmmResult<()>;

    /// Soft deletes every live fabric matching the given ids and site.
    /// With neither given, every live fabric is deleted. Returns the number
    /// of fabrics deleted.
    async fn delete_all(
        &self,
        tx: Option<&mut Tx>,
        ids: Option<Vec<String>>,
        site_id: Option<Uuid>,
    ) -> BmmResult<u64>;
}
