//! Integration tests for PgAllocationConstraintDaoImpl.

mod common;

use bmm_core::{BmmError, OrderBy, PageInput};
use bmm_db::{
    AllocationConstraintClearInput, AllocationConstraintCreateInput, AllocationConstraintDao,
    AllocationConstraintFilterInput, AllocationConstraintUpdateInput, ConstraintType,
    PgAllocationConstraintDaoImpl, Relation, ResourceType,
};
use common::{seed_allocation, Fixture, TestDatabase};
use uuid::Uuid;

fn constraint_input(
    allocation_id: Uuid,
    resource_type: ResourceType,
    constraint_type: ConstraintType,
) -> AllocationConstraintCreateInput {
    AllocationConstraintCreateInput {
        allocation_id,
        resource_type,
        resource_type_id: Uuid::new_v4(),
        constraint_type,
        constraint_value: 4,
        derived_resource_id: None,
        created_by: None,
    }
}

#[tokio::test]
async fn test_create_and_get_with_allocation() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let allocation_id = seed_allocation(db.pg(), &fixture).await;
    let dao = PgAllocationConstraintDaoImpl::new(db.pool());

    let created = dao
        .create(
            None,
            constraint_input(allocation_id, ResourceType::IpBlock, ConstraintType::Reserved),
        )
        .await
        .expect("Failed to create constraint");
    assert_eq!(created.resource_type, ResourceType::IpBlock);

    let found = dao
        .get_by_id(None, created.id, &[Relation::Allocation])
        .await
        .expect("Failed to get constraint");
    assert_eq!(found.allocation.as_ref().map(|a| a.id), Some(allocation_id));

    let stored: String =
        sqlx::query_scalar("SELECT resource_type FROM allocation_constraint WHERE id = $1")
            .bind(created.id)
            .fetch_one(db.pg())
            .await
            .expect("Failed to read resource type");
    assert_eq!(stored, "IPBlock");
}

#[tokio::test]
async fn test_negative_value_is_rejected() {
    let db = TestDatabase::new().await;
    let dao = PgAllocationConstraintDaoImpl::new(db.pool());

    let mut input =
        constraint_input(Uuid::new_v4(), ResourceType::InstanceType, ConstraintType::OnDemand);
    input.constraint_value = -1;
    let err = dao.create(None, input).await.expect_err("Negative value accepted");
    assert!(matches!(err, BmmError::Validation(_)));
}

#[tokio::test]
async fn test_get_all_filters_by_type() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let allocation_id = seed_allocation(db.pg(), &fixture).await;
    let dao = PgAllocationConstraintDaoImpl::new(db.pool());

    for (resource_type, constraint_type) in [
        (ResourceType::InstanceType, ConstraintType::Reserved),
        (ResourceType::InstanceType, ConstraintType::Preemptible),
        (ResourceType::IpBlock, ConstraintType::Reserved),
    ] {
        dao.create(None, constraint_input(allocation_id, resource_type, constraint_type))
            .await
            .expect("Failed to create constraint");
    }

    let instance_types = dao
        .get_all(
            None,
            AllocationConstraintFilterInput {
                allocation_ids: Some(vec![allocation_id]),
                resource_type: Some(ResourceType::InstanceType),
                ..AllocationConstraintFilterInput::default()
            },
            PageInput::default().with_order_by(OrderBy::asc("constraint_type")),
            &[],
        )
        .await
        .expect("Failed to list constraints");
    let kinds: Vec<_> = instance_types.items.iter().map(|c| c.constraint_type).collect();
    assert_eq!(kinds, vec![ConstraintType::Preemptible, ConstraintType::Reserved]);

    let reserved = dao
        .get_all(
            None,
            AllocationConstraintFilterInput {
                constraint_type: Some(ConstraintType::Reserved),
                ..AllocationConstraintFilterInput::default()
            },
            PageInput::default(),
            &[],
        )
        .await
        .expect("Failed to list constraints");
    assert_eq!(reserved.total(), 2);
}

#[tokio::test]
async fn test_update_clear_delete() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let allocation_id = seed_allocation(db.pg(), &fixture).await;
    let dao = PgAllocationConstraintDaoImpl::new(db.pool());

    let created = dao
        .create(
            None,
            constraint_input(allocation_id, ResourceType::IpBlock, ConstraintType::Reserved),
        )
        .await
        .expect("Failed to create constraint");

    let derived = Uuid::new_v4();
    let updated = dao
        .update(
            None,
            AllocationConstraintUpdateInput {
                id: created.id,
                constraint_value: Some(8),
                derived_resource_id: Some(derived),
                ..AllocationConstraintUpdateInput::default()
            },
        )
        .await
        .expect("Failed to update constraint");
    assert_eq!(updated.constraint_value, 8);
    assert_eq!(updated.derived_resource_id, Some(derived));

    let by_derived = dao
        .get_all(
            None,
            AllocationConstraintFilterInput {
                derived_resource_ids: Some(vec![derived]),
                ..AllocationConstraintFilterInput::default()
            },
            PageInput::default(),
            &[],
        )
        .await
        .expect("Failed to list constraints");
    assert_eq!(by_derived.total(), 1);

    let cleared = dao
        .clear(
            None,
            AllocationConstraintClearInput { id: created.id, derived_resource_id: true },
        )
        .await
        .expect("Failed to clear constraint");
    assert!(cleared.derived_resource_id.is_none());

    dao.delete(None, created.id).await.expect("Failed to delete constraint");
    assert!(dao.get_by_id(None, created.id, &[]).await.unwrap_err().is_not_found());
}
