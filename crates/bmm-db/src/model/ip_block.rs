//! IP address block entity.

use super::{InfrastructureProvider, Model, Site, Tenant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Lifecycle state of an IP block.
    pub enum IpBlockStatus {
        Pending => "Pending",
        Provisioning => "Provisioning",
        Ready => "Ready",
        Error => "Error",
        Deleting => "Deleting",
    }
}

text_enum! {
    /// Where addresses of the block are routable.
    pub enum RoutingType {
        Public => "Public",
        DatacenterOnly => "DatacenterOnly",
    }
}

text_enum! {
    /// IP protocol of the prefix.
    pub enum ProtocolVersion {
        IPv4 => "IPv4",
        IPv6 => "IPv6",
    }
}

/// A block of IP addresses owned by a provider at a site, optionally derived
/// for a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct IpBlock {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub site_id: Uuid,
    pub infrastructure_provider_id: Uuid,
    pub tenant_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub routing_type: RoutingType,
    pub prefix: String,
    pub prefix_length: i32,
    #[sqlx(try_from = "String")]
    pub protocol_version: ProtocolVersion,
    pub full_grant: bool,
    #[sqlx(try_from = "String")]
    pub status: IpBlockStatus,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_provider: Option<InfrastructureProvider>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
}

impl IpBlock {
    /// CIDR notation of the block, e.g. `10.0.0.0/16`.
    #[must_use]
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.prefix, self.prefix_length)
    }

    /// Returns true when the block was carved out for a tenant.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        self.tenant_id.is_some()
    }
}

impl Model for IpBlock {
    const TABLE: &'static str = "ip_block";
    const ALIAS: &'static str = "ipb";
    const RESOURCE: &'static str = "IpBlock";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "site_id",
        "infrastructure_provider_id",
        "tenant_id",
        "routing_type",
        "prefix",
        "prefix_length",
        "protocol_version",
        "full_grant",
        "status",
        "created",
        "updated",
        "deleted",
        "created_by",
    ];
}
