//! PostgreSQL implementation of [`AllocationConstraintDao`].

use super::common;
use crate::dao::allocation_constraint_dao::{
    AllocationConstraintClearInput, AllocationConstraintCreateInput, AllocationConstraintDao,
    AllocationConstraintFilterInput, AllocationConstraintUpdateInput,
};
use crate::model::{Allocation, AllocationConstraint, Model};
use crate::paginator::{OrderColumn, Paginator};
use crate::query::{Assignments, Bind, SelectQuery};
use crate::relation::{attach, ensure_supported, Relation};
use crate::session::{db_now, DbConn, Tx};
use crate::DatabasePoolInterface;
use async_trait::async_trait;
use bmm_core::{BmmResult, Page, PageInput, ValidateExt};
use shaku::Component;
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const RELATIONS: &[Relation] = &[Relation::Allocation];

const ORDER_COLUMNS: &[OrderColumn] = &[
    OrderColumn::new("resource_type", &["resource_type"]),
    OrderColumn::new("constraint_type", &["constraint_type"]),
    OrderColumn::new("created", &["created"]),
    OrderColumn::new("updated", &["updated"]),
];

const INSERT_SQL: &str = r#"
    INSERT INTO allocation_constraint (
        id, allocation_id, resource_type, resource_type_id, constraint_type,
        constraint_value, derived_resource_id, created, updated, created_by
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9)
    RETURNING id, allocation_id, resource_type, resource_type_id, constraint_type,
              constraint_value, derived_resource_id, created, updated, deleted, created_by
"#;

/// PostgreSQL allocation constraint DAO.
#[derive(Component, Clone)]
#[shaku(interface = AllocationConstraintDao)]
pub struct PgAllocationConstraintDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgAllocationConstraintDaoImpl {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

fn key(id: Uuid) -> [(&'static str, Bind); 1] {
    [("id", Bind::Uuid(id))]
}

async fn load_relations(
    conn: &mut PgConnection,
    items: &mut [AllocationConstraint],
    relations: &[Relation],
) -> BmmResult<()> {
    if relations.contains(&Relation::Allocation) {
        attach::<_, Allocation, _, _>(
            conn,
            items,
            |c| Some(c.allocation_id),
            |c, r| c.allocation = Some(r),
        )
        .await?;
    }
    Ok(())
}

#[async_trait]
impl AllocationConstraintDao for PgAllocationConstraintDaoImpl {
    #[tracing::instrument(
        name = "allocation_constraint.create",
        skip_all,
        fields(db.system = "postgresql", db.table = "allocation_constraint", allocation_id = %input.allocation_id)
    )]
    async fn create(
        &self,
        tx: Option<&mut Tx>,
        input: AllocationConstraintCreateInput,
    ) -> BmmResult<AllocationConstraint> {
        input.validate_request()?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let id = Uuid::new_v4();
        debug!(
            "Creating {} constraint {} on {} {}",
            input.constraint_type, id, input.resource_type, input.resource_type_id
        );

        let constraint = sqlx::query_as::<_, AllocationConstraint>(INSERT_SQL)
            .bind(id)
            .bind(input.allocation_id)
            .bind(input.resource_type.as_str())
            .bind(input.resource_type_id)
            .bind(input.constraint_type.as_str())
            .bind(input.constraint_value)
            .bind(input.derived_resource_id)
            .bind(db_now())
            .bind(input.created_by)
            .fetch_one(&mut *conn)
            .await?;

        Ok(constraint)
    }

    #[tracing::instrument(
        name = "allocation_constraint.get_by_id",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "allocation_constraint")
    )]
    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<AllocationConstraint> {
        ensure_supported(AllocationConstraint::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;

        let constraint =
            common::fetch_by_key::<AllocationConstraint>(&mut conn, &key(id), &id.to_string())
                .await?;
        let mut items = [constraint];
        load_relations(&mut conn, &mut items, relations).await?;
        let [constraint] = items;
        Ok(constraint)
    }

    #[tracing::instrument(
        name = "allocation_constraint.get_all",
        skip_all,
        fields(db.system = "postgresql", db.table = "allocation_constraint")
    )]
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: AllocationConstraintFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<AllocationConstraint>> {
        ensure_supported(AllocationConstraint::RESOURCE, relations, RELATIONS)?;
        let paginator = Paginator::new(&page, ORDER_COLUMNS)?;

        let mut query = SelectQuery::of::<AllocationConstraint>();
        query
            .any_opt("allocation_id", filter.allocation_ids)
            .eq_opt("resource_type", filter.resource_type)
            .any_opt("resource_type_id", filter.resource_type_ids)
            .eq_opt("constraint_type", filter.constraint_type)
            .any_opt("derived_resource_id", filter.derived_resource_ids);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let mut page = paginator.fetch::<AllocationConstraint>(&mut conn, query).await?;
        load_relations(&mut conn, &mut page.items, relations).await?;
        Ok(page)
    }

    #[tracing::instrument(
        name = "allocation_constraint.update",
        skip_all,
        fields(db.system = "postgresql", db.table = "allocation_constraint", allocation_constraint.id = %input.id)
    )]
    async fn update(
        &self,
        tx: Option<&mut Tx>,
        input: AllocationConstraintUpdateInput,
    ) -> BmmResult<AllocationConstraint> {
        input.validate_request()?;
        let mut sets = Assignments::new();
        sets.set_opt("allocation_id", input.allocation_id)
            .set_opt("resource_type", input.resource_type)
            .set_opt("resource_type_id", input.resource_type_id)
            .set_opt("constraint_type", input.constraint_type)
            .set_opt("constraint_value", input.constraint_value)
            .set_opt("derived_resource_id", input.derived_resource_id);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<AllocationConstraint>(
            &mut conn,
            sets,
            &key(input.id),
            &input.id.to_string(),
        )
        .await
    }

    #[tracing::instrument(
        name = "allocation_constraint.clear",
        skip_all,
        fields(db.system = "postgresql", db.table = "allocation_constraint", allocation_constraint.id = %input.id)
    )]
    async fn clear(
        &self,
        tx: Option<&mut Tx>,
        input: AllocationConstraintClearInput,
    ) -> BmmResult<AllocationConstraint> {
        let mut sets = Assignments::new();
        sets.clear_if("derived_resource_id", input.derived_resource_id);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let constraint = common::update_by_key::<AllocationConstraint>(
            &mut conn,
            sets,
            &key(input.id),
            &input.id.to_string(),
        )
        .await?;
        let mut items = [constraint];
        load_relations(&mut conn, &mut items, RELATIONS).await?;
        let [constraint] = items;
        Ok(constraint)
    }

    #[tracing::instrument(
        name = "allocation_constraint.delete",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "allocation_constraint")
    )]
    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::soft_delete_by_key::<AllocationConstraint>(&mut conn, &key(id)).await?;
        Ok(())
    }
}
