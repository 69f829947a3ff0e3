//! SKU entity. SKUs are reported by sites and hard deleted.

use super::{Model, Site};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A hardware configuration class shared by a set of machines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sku {
    pub id: String,
    pub site_id: Uuid,
    pub device_type: Option<String>,
    /// Hardware component inventory as reported by the site.
    pub components: Option<serde_json::Value>,
    pub associated_machine_ids: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
}

impl Model for Sku {
    const TABLE: &'static str = "sku";
    const ALIAS: &'static str = "sk";
    const RESOURCE: &'static str = "Sku";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "site_id",
        "device_type",
        "components",
        "associated_machine_ids",
        "created",
        "updated",
    ];
    const SOFT_DELETE: bool = false;
}
