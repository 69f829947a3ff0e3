//! Operating system to site association entity.

use super::{Model, OperatingSystem, Site};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Synchronization state of an operating system image at a site.
    pub enum OssaStatus {
        Syncing => "Syncing",
        Synced => "Synced",
        Error => "Error",
        Deleting => "Deleting",
    }
}

/// Tracks an operating system image being made available at a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OperatingSystemSiteAssociation {
    pub id: Uuid,
    pub operating_system_id: Uuid,
    pub site_id: Uuid,
    pub version: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: OssaStatus,
    pub is_missing_on_site: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<OperatingSystem>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
}

impl Model for OperatingSystemSiteAssociation {
    const TABLE: &'static str = "operating_system_site_association";
    const ALIAS: &'static str = "ossa";
    const RESOURCE: &'static str = "OperatingSystemSiteAssociation";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "operating_system_id",
        "site_id",
        "version",
        "status",
        "is_missing_on_site",
        "created",
        "updated",
        "deleted",
        "created_by",
    ];
}
