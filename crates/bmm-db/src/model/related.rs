//! Read models for tables owned by other services.
//!
//! These rows are only ever loaded as relations of the entities in this
//! crate, so they carry the columns callers display and nothing more.

use super::{Keyed, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

macro_rules! keyed_by_id {
    ($($model:ty => $key:ty),+ $(,)?) => {
        $(impl Keyed for $model {
            type Key = $key;

            fn key(&self) -> $key {
                self.id.clone()
            }
        })+
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InfrastructureProvider {
    pub id: Uuid,
    pub name: String,
    pub display_name: Option<String>,
    pub org: String,
    pub org_display_name: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Model for InfrastructureProvider {
    const TABLE: &'static str = "infrastructure_provider";
    const ALIAS: &'static str = "ip";
    const RESOURCE: &'static str = "InfrastructureProvider";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "display_name",
        "org",
        "org_display_name",
        "created",
        "updated",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub org: String,
    pub org_display_name: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Model for Tenant {
    const TABLE: &'static str = "tenant";
    const ALIAS: &'static str = "tn";
    const RESOURCE: &'static str = "Tenant";
    const COLUMNS: &'static [&'static str] =
        &["id", "org", "org_display_name", "created", "updated"];
}

/// Portal user; loaded as the contact of a tenant account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl User {
    /// `first last`, skipping missing parts.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

impl Model for User {
    const TABLE: &'static str = "\"user\"";
    const ALIAS: &'static str = "usr";
    const RESOURCE: &'static str = "User";
    const COLUMNS: &'static [&'static str] =
        &["id", "email", "first_name", "last_name", "created", "updated"];
}

/// Operating system definition, including the image attributes that feed
/// the per-site version hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OperatingSystem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub org: String,
    pub image_url: Option<String>,
    pub image_sha: Option<String>,
    pub image_auth_type: Option<String>,
    pub image_auth_token: Option<String>,
    pub image_disk: Option<String>,
    pub root_fs_id: Option<String>,
    pub root_fs_label: Option<String>,
    pub enable_block_storage: bool,
    pub status: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Model for OperatingSystem {
    const TABLE: &'static str = "operating_system";
    const ALIAS: &'static str = "os";
    const RESOURCE: &'static str = "OperatingSystem";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "org",
        "image_url",
        "image_sha",
        "image_auth_type",
        "image_auth_token",
        "image_disk",
        "root_fs_id",
        "root_fs_label",
        "enable_block_storage",
        "status",
        "created",
        "updated",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Allocation {
    pub id: Uuid,
    pub name: String,
    pub infrastructure_provider_id: Uuid,
    pub tenant_id: Uuid,
    pub site_id: Uuid,
    pub status: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Model for Allocation {
    const TABLE: &'static str = "allocation";
    const ALIAS: &'static str = "al";
    const RESOURCE: &'static str = "Allocation";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "infrastructure_provider_id",
        "tenant_id",
        "site_id",
        "status",
        "created",
        "updated",
    ];
}

/// Machine as reported by the site controller; ids are controller-assigned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Machine {
    pub id: String,
    pub site_id: Uuid,
    pub infrastructure_provider_id: Uuid,
    pub hostname: Option<String>,
    pub status: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Model for Machine {
    const TABLE: &'static str = "machine";
    const ALIAS: &'static str = "m";
    const RESOURCE: &'static str = "Machine";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "site_id",
        "infrastructure_provider_id",
        "hostname",
        "status",
        "created",
        "updated",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Subnet {
    pub id: Uuid,
    pub name: String,
    pub site_id: Uuid,
    pub tenant_id: Uuid,
    pub ipv4_prefix: Option<String>,
    pub prefix_length: Option<i32>,
    pub status: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Model for Subnet {
    const TABLE: &'static str = "subnet";
    const ALIAS: &'static str = "sn";
    const RESOURCE: &'static str = "Subnet";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "site_id",
        "tenant_id",
        "ipv4_prefix",
        "prefix_length",
        "status",
        "created",
        "updated",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Instance {
    pub id: Uuid,
    pub name: String,
    pub tenant_id: Uuid,
    pub site_id: Uuid,
    pub machine_id: Option<String>,
    pub status: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Model for Instance {
    const TABLE: &'static str = "instance";
    const ALIAS: &'static str = "inst";
    const RESOURCE: &'static str = "Instance";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "tenant_id",
        "site_id",
        "machine_id",
        "status",
        "created",
        "updated",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VpcPrefix {
    pub id: Uuid,
    pub name: String,
    pub site_id: Uuid,
    pub vpc_id: Uuid,
    pub prefix: String,
    pub prefix_length: i32,
    pub status: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Model for VpcPrefix {
    const TABLE: &'static str = "vpc_prefix";
    const ALIAS: &'static str = "vp";
    const RESOURCE: &'static str = "VpcPrefix";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "site_id",
        "vpc_id",
        "prefix",
        "prefix_length",
        "status",
        "created",
        "updated",
    ];
}

keyed_by_id! {
    InfrastructureProvider => Uuid,
    Tenant => Uuid,
    User => Uuid,
    OperatingSystem => Uuid,
    Allocation => Uuid,
    Machine => String,
    Subnet => Uuid,
    Instance => Uuid,
    VpcPrefix => Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: Option<&str>, last: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: None,
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            created: now,
            updated: now,
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(user(Some("Ada"), Some("Lovelace")).full_name().as_deref(), Some("Ada Lovelace"));
        assert_eq!(user(None, Some("Lovelace")).full_name().as_deref(), Some("Lovelace"));
        assert_eq!(user(None, None).full_name(), None);
    }
}
