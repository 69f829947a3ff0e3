//! AllocationConstraintDao trait and its inputs.

use crate::model::{AllocationConstraint, ConstraintType, ResourceType};
use crate::relation::Relation;
use crate::session::Tx;
use async_trait::async_trait;
use bmm_core::{BmmResult, Interface, Page, PageInput};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AllocationConstraintCreateInput {
    pub allocation_id: Uuid,
    pub resource_type: ResourceType,
    pub resource_type_id: Uuid,
    pub constraint_type: ConstraintType,
    #[validate(range(min = 0))]
    pub constraint_value: i32,
    pub derived_resource_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

/// Sparse update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AllocationConstraintUpdateInput {
    pub id: Uuid,
    pub allocation_id: Option<Uuid>,
    pub resource_type: Option<ResourceType>,
    pub resource_type_id: Option<Uuid>,
    pub constraint_type: Option<ConstraintType>,
    #[validate(range(min = 0))]
    pub constraint_value: Option<i32>,
    pub derived_resource_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationConstraintClearInput {
    pub id: Uuid,
    pub derived_resource_id: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationConstraintFilterInput {
    pub allocation_ids: Option<Vec<Uuid>>,
    pub resource_type: Option<ResourceType>,
    pub resource_type_ids: Option<Vec<Uuid>>,
    pub constraint_type: Option<ConstraintType>,
    pub derived_resource_ids: Option<Vec<Uuid>>,
}

/// Data access for allocation constraints.
#[async_trait]
pub trait AllocationConstraintDao: Interface + Send + Sync {
    async fn create(
        &self,
        tx: Option<&mut Tx>,
        input: AllocationConstraintCreateInput,
    ) -> BmmResult<AllocationConstraint>;

    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<AllocationConstraint>;

    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: AllocationConstraintFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<AllocationConstraint>>;

    async fn update(
        &self,
        tx: Option<&mut Tx>,
        input: AllocationConstraintUpdateInput,
    ) -> BmmResult<AllocationConstraint>;

    /// Resets the flagged columns and returns the row with its allocation.
    async fn clear(
        &self,
        tx: Option<&mut Tx>,
        input: AllocationConstraintClearInput,
    ) -> BmmResult<AllocationConstraint>;

    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()>;
}
