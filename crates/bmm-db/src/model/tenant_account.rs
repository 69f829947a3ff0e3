//! Tenant account entity.

use super::{InfrastructureProvider, Model, Tenant, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Onboarding state of a tenant account.
    pub enum TenantAccountStatus {
        Pending => "Pending",
        Invited => "Invited",
        Ready => "Ready",
        Error => "Error",
    }
}

/// Links a tenant organization to an infrastructure provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TenantAccount {
    pub id: Uuid,
    pub account_number: String,
    pub tenant_id: Option<Uuid>,
    pub tenant_org: String,
    pub infrastructure_provider_id: Uuid,
    pub infrastructure_provider_org: String,
    pub subscription_id: Option<String>,
    pub subscription_tier: Option<String>,
    pub tenant_contact_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub status: TenantAccountStatus,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_provider: Option<InfrastructureProvider>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_contact: Option<User>,
}

impl Model for TenantAccount {
    const TABLE: &'static str = "tenant_account";
    const ALIAS: &'static str = "ta";
    const RESOURCE: &'static str = "TenantAccount";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "account_number",
        "tenant_id",
        "tenant_org",
        "infrastructure_provider_id",
        "infrastructure_provider_org",
        "subscription_id",
        "subscription_tier",
        "tenant_contact_id",
        "status",
        "created",
        "updated",
        "deleted",
        "created_by",
    ];
}
