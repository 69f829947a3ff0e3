//! SiteDao trait and its inputs.

use crate::model::{Site, SiteContact, SiteLocation, SiteStatus};
use crate::relation::Relation;
use crate::session::Tx;
use async_trait::async_trait;
use bmm_core::{BmmResult, Interface, Page, PageInput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SiteCreateInput {
    #[validate(custom(function = "bmm_core::validation::rules::not_blank"), length(max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "bmm_core::validation::rules::not_blank"))]
    pub org: String,
    pub infrastructure_provider_id: Uuid,
    pub site_controller_version: Option<String>,
    pub site_agent_version: Option<String>,
    pub registration_token: Option<String>,
    pub registration_token_expiration: Option<DateTime<Utc>>,
    pub serial_console_hostname: Option<String>,
    #[serde(default)]
    pub is_serial_console_enabled: bool,
    #[validate(range(min = 0))]
    pub serial_console_idle_timeout: Option<i32>,
    #[validate(range(min = 0))]
    pub serial_console_max_session_length: Option<i32>,
    #[serde(default)]
    pub is_serial_console_ssh_keys_enabled: bool,
    pub location: Option<SiteLocation>,
    pub contact: Option<SiteContact>,
    pub status: SiteStatus,
    pub created_by: Option<Uuid>,
}

/// Sparse update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SiteUpdateInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub site_controller_version: Option<String>,
    pub site_agent_version: Option<String>,
    pub registration_token: Option<String>,
    pub registration_token_expiration: Option<DateTime<Utc>>,
    pub serial_console_hostname: Option<String>,
    pub is_serial_console_enabled: Option<bool>,
    #[validate(range(min = 0))]
    pub serial_console_idle_timeout: Option<i32>,
    #[validate(range(min = 0))]
    pub serial_console_max_session_length: Option<i32>,
    pub is_serial_console_ssh_keys_enabled: Option<bool>,
    pub location: Option<SiteLocation>,
    pub contact: Option<SiteContact>,
    pub status: Option<SiteStatus>,
}

/// Columns to set to `NULL`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteClearInput {
    pub id: Uuid,
    pub display_name: bool,
    pub description: bool,
    pub site_controller_version: bool,
    pub site_agent_version: bool,
    pub registration_token: bool,
    pub registration_token_expiration: bool,
    pub serial_console_hostname: bool,
    pub serial_console_idle_timeout: bool,
    pub serial_console_max_session_length: bool,
    pub location: bool,
    pub contact: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteFilterInput {
    pub ids: Option<Vec<Uuid>>,
    pub names: Option<Vec<String>>,
    pub orgs: Option<Vec<String>>,
    pub infrastructure_provider_ids: Option<Vec<Uuid>>,
    pub statuses: Option<Vec<SiteStatus>>,
    pub is_serial_console_enabled: Option<bool>,
    /// Matched against name, display name, description, org and status.
    pub search_query: Option<String>,
}

/// Data access for sites.
#[async_trait]
pub trait SiteDao: Interface + Send + Sync {
    async fn create(&self, tx: Option<&mut Tx>, input: SiteCreateInput) -> BmmResult<Site>;

    async fn get_by_id(&self, tx: Option<&mut Tx>, id: Uuid, relations: &[Relation]) -> BmmResult<Site>;

    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: SiteFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<Site>>;

    async fn update(&self, tx: Option<&mut Tx>, input: SiteUpdateInput) -> BmmResult<Site>;

    async fn clear(&self, tx: Option<&mut Tx>, input: SiteClearInput) -> BmmResult<Site>;

    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()>;

    /// Live site counts per status, optionally for one provider.
    async fn get_count_by_status(
        &self,
        tx: Option<&mut Tx>,
        infrastructure_provider_id: Option<Uuid>,
    ) -> BmmResult<BTreeMap<String, u64>>;
}
