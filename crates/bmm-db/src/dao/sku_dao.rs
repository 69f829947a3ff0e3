//! SkuDao trait and its inputs.

use crate::model::Sku;
use crate::relation::Relation;
use crate::session::Tx;
use async_trait::async_trait;
use bmm_core::{BmmResult, Interface, Page, PageInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SkuCreateInput {
    /// Supplied by the site, which owns SKU identity.
    #[validate(custom(function = "bmm_core::validation::rules::not_blank"))]
    pub id: String,
    pub site_id: Uuid,
    pub device_type: Option<String>,
    pub components: Option<serde_json::Value>,
    #[serde(default)]
    pub associated_machine_ids: Vec<String>,
}

/// Sparse update. `Some(vec![])` for machine ids stores an empty array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkuUpdateInput {
    pub id: String,
    pub device_type: Option<String>,
    pub components: Option<serde_json::Value>,
    pub associated_machine_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkuClearInput {
    pub id: String,
    pub device_type: bool,
    pub components: bool,
}

/// Empty lists are ignored rather than matching nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkuFilterInput {
    #[serde(default)]
    pub site_ids: Vec<Uuid>,
    #[serde(default)]
    pub sku_ids: Vec<String>,
    #[serde(default)]
    pub device_types: Vec<String>,
    /// Matches SKUs associated with any of these machines.
    #[serde(default)]
    pub associated_machine_ids: Vec<String>,
}

/// Data access for SKUs.
#[async_trait]
pub trait SkuDao: Interface + Send + Sync {
    async fn create(&self, tx: Option<&mut Tx>, input: SkuCreateInput) -> BmmResult<Sku>;

    async fn get(&self, tx: Option<&mut Tx>, id: &str, relations: &[Relation]) -> BmmResult<Sku>;

    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: SkuFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<Sku>>;

    async fn update(&self, tx: Option<&mut Tx>, input: SkuUpdateInput) -> BmmResult<Sku>;

    async fn clear(&self, tx: Option<&mut Tx>, input: SkuClearInput) -> BmmResult<Sku>;

    /// Removes the SKU row. Deleting a missing SKU is not an error.
    async fn delete(&self, tx: Option<&mut Tx>, id: &str) -> BmmResult<()>;
}
