//! PostgreSQL implementation of [`FabricDao`].

use super::common;
use crate::dao::fabric_dao::{FabricCreateInput, FabricDao, FabricFilterInput, FabricUpdateInput};
use crate::model::{text_list, Fabric, InfrastructureProvider, Model, Site};
use crate::paginator::{OrderColumn, Paginator};
use crate::query::{Assignments, Bind, SelectQuery};
use crate::relation::{attach, ensure_supported, Relation};
use crate::session::{db_now, DbConn, Tx};
use crate::DatabasePoolInterface;
use async_trait::async_trait;
use bmm_core::{BmmResult, Page, PageInput, ValidateExt};
use shaku::Component;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const RELATIONS: &[Relation] = &[Relation::Site, Relation::InfrastructureProvider];

const ORDER_COLUMNS: &[OrderColumn] = &[
    OrderColumn::new("id", &["id"]),
    OrderColumn::new("status", &["status"]),
    OrderColumn::new("created", &["created"]),
    OrderColumn::new("updated", &["updated"]),
];

const SEARCH_COLUMNS: &[&str] = &["id", "org", "status"];

const INSERT_SQL: &str = r#"
    INSERT INTO fabric (
        id, site_id, org, infrastructure_provider_id, status, is_missing_on_site,
        created, updated
    )
    VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6)
    RETURNING id, site_id, org, infrastructure_provider_id, status, is_missing_on_site,
              created, updated, deleted
"#;

/// PostgreSQL fabric DAO.
#[derive(Component, Clone)]
#[shaku(interface = FabricDao)]
pub struct PgFabricDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgFabricDaoImpl {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

fn key(id: &str, site_id: Uuid) -> [(&'static str, Bind); 2] {
    [("id", Bind::from(id)), ("site_id", Bind::Uuid(site_id))]
}

fn display_key(id: &str, site_id: Uuid) -> String {
    format!("{id}/{site_id}")
}

async fn load_relations(
    conn: &mut PgConnection,
    items: &mut [Fabric],
    relations: &[Relation],
) -> BmmResult<()> {
    for relation in relations {
        match relation {
            Relation::Site => {
                attach::<_, Site, _, _>(conn, items, |f| Some(f.site_id), |f, r| f.site = Some(r))
                    .await?;
            }
            Relation::InfrastructureProvider => {
                attach::<_, InfrastructureProvider, _, _>(
                    conn,
                    items,
                    |f| Some(f.infrastructure_provider_id),
                    |f, r| f.infrastructure_provider = Some(r),
                )
                .await?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// `UPDATE fabric SET deleted = now ...` over live rows matching the criteria.
fn delete_all_builder(ids: Option<Vec<String>>, site_id: Option<Uuid>) -> QueryBuilder<'static, Postgres> {
    let now = db_now();
    let mut qb = QueryBuilder::new("UPDATE fabric SET deleted = ");
    qb.push_bind(now)
        .push(", updated = ")
        .push_bind(now)
        .push(" WHERE deleted IS NULL");
    if let Some(ids) = ids {
        qb.push(" AND id = ANY(").push_bind(ids).push(")");
    }
    if let Some(site_id) = site_id {
        qb.push(" AND site_id = ").push_bind(site_id);
    }
    qb
}

#[async_trait]
impl FabricDao for PgFabricDaoImpl {
    #[tracing::instrument(
        name = "fabric.create",
        skip_all,
        fields(db.system = "postgresql", db.table = "fabric", fabric.id = %input.id, site_id = %input.site_id)
    )]
    async fn create(&self, tx: Option<&mut Tx>, input: FabricCreateInput) -> BmmResult<Fabric> {
        input.validate_request()?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        debug!("Creating fabric {} at site {}", input.id, input.site_id);

        let fabric = sqlx::query_as::<_, Fabric>(INSERT_SQL)
            .bind(&input.id)
            .bind(input.site_id)
            .bind(&input.org)
            .bind(input.infrastructure_provider_id)
            .bind(input.status.as_str())
            .bind(db_now())
            .fetch_one(&mut *conn)
            .await?;

        Ok(fabric)
    }

    #[tracing::instrument(
        name = "fabric.get_by_id",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "fabric")
    )]
    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: &str,
        site_id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<Fabric> {
        ensure_supported(Fabric::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;

        let fabric =
            common::fetch_by_key::<Fabric>(&mut conn, &key(id, site_id), &display_key(id, site_id))
                .await?;
        let mut items = [fabric];
        load_relations(&mut conn, &mut items, relations).await?;
        let [fabric] = items;
        Ok(fabric)
    }

    #[tracing::instrument(
        name = "fabric.get_all",
        skip_all,
        fields(db.system = "postgresql", db.table = "fabric")
    )]
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: FabricFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<Fabric>> {
        ensure_supported(Fabric::RESOURCE, relations, RELATIONS)?;
        let paginator = Paginator::new(&page, ORDER_COLUMNS)?;
        if filter.ids.as_ref().is_some_and(Vec::is_empty) {
            return Ok(Page::empty(&page));
        }

        let mut query = SelectQuery::of::<Fabric>();
        query
            .eq_opt("org", filter.org)
            .eq_opt("site_id", filter.site_id)
            .eq_opt("infrastructure_provider_id", filter.infrastructure_provider_id)
            .any_opt("status", filter.statuses.map(|v| text_list(&v)))
            .any_opt("id", filter.ids);
        if let Some(search_query) = filter.search_query.as_deref() {
            query.search(SEARCH_COLUMNS, search_query);
        }

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let mut page = paginator.fetch::<Fabric>(&mut conn, query).await?;
        load_relations(&mut conn, &mut page.items, relations).await?;
        Ok(page)
    }

    #[tracing::instrument(
        name = "fabric.update",
        skip_all,
        fields(db.system = "postgresql", db.table = "fabric", fabric.id = %input.id, site_id = %input.site_id)
    )]
    async fn update(&self, tx: Option<&mut Tx>, input: FabricUpdateInput) -> BmmResult<Fabric> {
        let mut sets = Assignments::new();
        sets.set_opt("infrastructure_provider_id", input.infrastructure_provider_id)
            .set_opt("status", input.status)
            .set_opt("is_missing_on_site", input.is_missing_on_site);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<Fabric>(
            &mut conn,
            sets,
            &key(&input.id, input.site_id),
            &display_key(&input.id, input.site_id),
        )
        .await
    }

    #[tracing::instrument(
        name = "fabric.delete_by_id",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "fabric")
    )]
    async fn delete_by_id(&self, tx: Option<&mut Tx>, id: &str, site_id: Uuid) -> BmmResult<()> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::soft_delete_by_key::<Fabric>(&mut conn, &key(id, site_id)).await?;
        Ok(())
    }

    #[tracing::instrument(
        name = "fabric.delete_all",
        skip(self, tx, ids),
        fields(db.system = "postgresql", db.table = "fabric")
    )]
    async fn delete_all(
        &self,
        tx: Option<&mut Tx>,
        ids: Option<Vec<String>>,
        site_id: Option<Uuid>,
    ) -> BmmResult<u64> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let affected = delete_all_builder(ids, site_id)
            .build()
            .execute(&mut *conn)
            .await?
            .rows_affected();

        info!("Deleted {} fabrics", affected);
        Ok(affected)
    }
}
