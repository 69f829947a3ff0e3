//! OperatingSystemSiteAssociationDao trait and its inputs.

use crate::model::{OperatingSystemSiteAssociation, OssaStatus};
use crate::relation::Relation;
use crate::session::Tx;
use async_trait::async_trait;
use bmm_core::{BmmResult, Interface, Page, PageInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingSystemSiteAssociationCreateInput {
    pub operating_system_id: Uuid,
    pub site_id: Uuid,
    pub version: Option<String>,
    pub status: OssaStatus,
    pub created_by: Option<Uuid>,
}

/// Sparse update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatingSystemSiteAssociationUpdateInput {
    pub id: Uuid,
    pub operating_system_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub version: Option<String>,
    pub status: Option<OssaStatus>,
    pub is_missing_on_site: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatingSystemSiteAssociationClearInput {
    pub id: Uuid,
    pub version: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatingSystemSiteAssociationFilterInput {
    pub operating_system_ids: Option<Vec<Uuid>>,
    pub site_ids: Option<Vec<Uuid>>,
    pub versions: Option<Vec<String>>,
    pub statuses: Option<Vec<OssaStatus>>,
    pub is_missing_on_site: Option<bool>,
}

/// Data access for operating system to site associations.
#[async_trait]
pub trait OperatingSystemSiteAssociationDao: Interface + Send + Sync {
    async fn create(
        &self,
        tx: Option<&mut Tx>,
        input: OperatingSystemSiteAssociationCreateInput,
    ) -> BmmResult<OperatingSystemSiteAssociation>;

    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<OperatingSystemSiteAssociation>;

    /// Loads the live association of an operating system with a site.
    async fn get_by_operating_system_id_and_site_id(
        &self,
        tx: Option<&mut Tx>,
        operating_system_id: Uuid,
        site_id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<OperatingSystemSiteAssociation>;

    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: OperatingSystemSiteAssociationFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<OperatingSystemSiteAssociation>>;

    /// Recomputes `version` from the operating system's image attributes and
    /// stores it.
    async fn generate_and_update_version(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
    ) -> BmmResult<OperatingSystemSiteAssociation>;

    async fn update(
        &self,
        tx: Option<&mut Tx>,
        input: OperatingSystemSiteAssociationUpdateInput,
    ) -> BmmResult<OperatingSystemSiteAssociation>;

    async fn clear(
        &self,
        tx: Option<&mut Tx>,
        input: OperatingSystemSiteAssociationClearInput,
    ) -> BmmResult<OperatingSystemSiteAssociation>;

    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()>;
}
