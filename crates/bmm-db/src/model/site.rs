//! Site entity.

use super::{InfrastructureProvider, Keyed, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Registration state of a site.
    pub enum SiteStatus {
        Pending => "Pending",
        Registered => "Registered",
        Error => "Error",
        Deleting => "Deleting",
    }
}

/// Physical location of a site, stored as `jsonb`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Operator contact of a site, stored as `jsonb`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A datacenter location operated by an infrastructure provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub org: String,
    pub infrastructure_provider_id: Uuid,
    pub site_controller_version: Option<String>,
    pub site_agent_version: Option<String>,
    pub registration_token: Option<String>,
    pub registration_token_expiration: Option<DateTime<Utc>>,
    pub serial_console_hostname: Option<String>,
    pub is_serial_console_enabled: bool,
    pub serial_console_idle_timeout: Option<i32>,
    pub serial_console_max_session_length: Option<i32>,
    pub is_serial_console_ssh_keys_enabled: bool,
    pub location: Option<Json<SiteLocation>>,
    pub contact: Option<Json<SiteContact>>,
    #[sqlx(try_from = "String")]
    pub status: SiteStatus,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_provider: Option<InfrastructureProvider>,
}

impl Site {
    /// A site is online once its agent has registered.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status == SiteStatus::Registered
    }

    /// Returns true when the registration token is set and expired at `now`.
    #[must_use]
    pub fn is_registration_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.registration_token_expiration
            .is_some_and(|expiration| expiration <= now)
    }
}

impl Model for Site {
    const TABLE: &'static str = "site";
    const ALIAS: &'static str = "st";
    const RESOURCE: &'static str = "Site";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "display_name",
        "description",
        "org",
        "infrastructure_provider_id",
        "site_controller_version",
        "site_agent_version",
        "registration_token",
        "registration_token_expiration",
        "serial_console_hostname",
        "is_serial_console_enabled",
        "serial_console_idle_timeout",
        "serial_console_max_session_length",
        "is_serial_console_ssh_keys_enabled",
        "location",
        "contact",
        "status",
        "created",
        "updated",
        "deleted",
        "created_by",
    ];
}

impl Keyed for Site {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}
