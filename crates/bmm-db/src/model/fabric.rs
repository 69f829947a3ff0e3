//! Fabric entity. Fabric ids are reported by the site and only unique
//! within it, so the key is `(id, site_id)`.

use super::{InfrastructureProvider, Model, Site};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Lifecycle state of a fabric.
    pub enum FabricStatus {
        Pending => "Pending",
        Ready => "Ready",
        Error => "Error",
        Deleting => "Deleting",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Fabric {
    pub id: String,
    pub site_id: Uuid,
    pub org: String,
    pub infrastructure_provider_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: FabricStatus,
    pub is_missing_on_site: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_provider: Option<InfrastructureProvider>,
}

impl Model for Fabric {
    const TABLE: &'static str = "fabric";
    const ALIAS: &'static str = "fb";
    const RESOURCE: &'static str = "Fabric";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "site_id",
        "org",
        "infrastructure_provider_id",
        "status",
        "is_missing_on_site",
        "created",
        "updated",
        "deleted",
    ];
    const PRIMARY_KEY: &'static [&'static str] = &["id", "site_id"];
}
