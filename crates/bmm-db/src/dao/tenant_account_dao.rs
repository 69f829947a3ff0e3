//! TenantAccountDao trait and its inputs.

use crate::model::{TenantAccount, TenantAccountStatus};
use crate::relation::Relation;
use crate::session::Tx;
use async_trait::async_trait;
use bmm_core::{BmmResult, Interface, Page, PageInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TenantAccountCreateInput {
    /// Unique across all accounts; a duplicate is a conflict.
    #[validate(custom(function = "bmm_core::validation::rules::not_blank"), length(max = 64))]
    pub account_number: String,
    pub tenant_id: Option<Uuid>,
    #[validate(custom(function = "bmm_core::validation::rules::not_blank"))]
    pub tenant_org: String,
    pub infrastructure_provider_id: Uuid,
    #[validate(custom(function = "bmm_core::validation::rules::not_blank"))]
    pub infrastructure_provider_org: String,
    pub subscription_id: Option<String>,
    pub subscription_tier: Option<String>,
    pub tenant_contact_id: Option<Uuid>,
    pub status: TenantAccountStatus,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantAccountUpdateInput {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub subscription_id: Option<String>,
    pub subscription_tier: Option<String>,
    pub tenant_contact_id: Option<Uuid>,
    pub status: Option<TenantAccountStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantAccountClearInput {
    pub id: Uuid,
    pub tenant_id: bool,
    pub subscription_id: bool,
    pub subscription_tier: bool,
    pub tenant_contact_id: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantAccountFilterInput {
    pub infrastructure_provider_id: Option<Uuid>,
    pub tenant_ids: Option<Vec<Uuid>>,
    pub tenant_orgs: Option<Vec<String>>,
    pub statuses: Option<Vec<TenantAccountStatus>>,
    /// Matched against account number, tenant org and status.
    pub search_query: Option<String>,
}

/// Data access for tenant accounts.
#[async_trait]
pub trait TenantAccountDao: Interface + Send + Sync {
    async fn create(
        &self,
        tx: Option<&mut Tx>,
        input: TenantAccountCreateInput,
    ) -> BmmResult<TenantAccount>;

    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<TenantAccount>;

    async fn get_by_account_number(
        &self,
        tx: Option<&mut Tx>,
        account_number: &str,
        relations: &[Relation],
    ) -> BmmResult<TenantAccount>;

    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: TenantAccountFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<TenantAccount>>;

    /// Number of live accounts matching `filter`.
    async fn get_count(&self, tx: Option<&mut Tx>, filter: TenantAccountFilterInput) -> BmmResult<u64>;

    async fn get_count_by_status(
        &self,
        tx: Option<&mut Tx>,
        infrastructure_provider_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
    ) -> BmmResult<BTreeMap<String, u64>>;

    async fn update(
        &self,
        tx: Option<&mut Tx>,
        input: TenantAccountUpdateInput,
    ) -> BmmResult<TenantAccount>;

    async fn clear(
        &self,
        tx: Option<&mut Tx>,
        input: TenantAccountClearInput,
    ) -> BmmResult<TenantAccount>;

    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()>;
}
