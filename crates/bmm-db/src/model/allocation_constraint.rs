//! Allocation constraint entity.

use super::{Allocation, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Kind of resource an allocation constrains.
    pub enum ResourceType {
        InstanceType => "InstanceType",
        IpBlock => "IPBlock",
    }
}

text_enum! {
    /// How the constrained capacity is granted.
    pub enum ConstraintType {
        Reserved => "Reserved",
        OnDemand => "OnDemand",
        Preemptible => "Preemptible",
    }
}

/// Capacity granted to an allocation for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AllocationConstraint {
    pub id: Uuid,
    pub allocation_id: Uuid,
    #[sqlx(try_from = "String")]
    pub resource_type: ResourceType,
    pub resource_type_id: Uuid,
    #[sqlx(try_from = "String")]
    pub constraint_type: ConstraintType,
    pub constraint_value: i32,
    /// Resource created to satisfy the constraint, e.g. a tenant IP block.
    pub derived_resource_id: Option<Uuid>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub deleted: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,

    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<Allocation>,
}

impl Model for AllocationConstraint {
    const TABLE: &'static str = "allocation_constraint";
    const ALIAS: &'static str = "ac";
    const RESOURCE: &'static str = "AllocationConstraint";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "allocation_id",
        "resource_type",
        "resource_type_id",
        "constraint_type",
        "constraint_value",
        "derived_resource_id",
        "created",
        "updated",
        "deleted",
        "created_by",
    ];
}
