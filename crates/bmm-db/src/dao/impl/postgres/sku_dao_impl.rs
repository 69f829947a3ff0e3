//! PostgreSQL implementation of [`SkuDao`].

use super::common;
use crate::dao::sku_dao::{SkuClearInput, SkuCreateInput, SkuDao, SkuFilterInput, SkuUpdateInput};
use crate::model::{Model, Site, Sku};
use crate::paginator::{OrderColumn, Paginator};
use crate::query::{Assignments, Bind, SelectQuery};
use crate::relation::{attach, ensure_supported, Relation};
use crate::session::{db_now, DbConn, Tx};
use crate::DatabasePoolInterface;
use async_trait::async_trait;
use bmm_core::{BmmResult, Page, PageInput, ValidateExt};
use shaku::Component;
use sqlx::types::Json;
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::debug;

const RELATIONS: &[Relation] = &[Relation::Site];

const ORDER_COLUMNS: &[OrderColumn] = &[
    OrderColumn::new("created", &["created"]),
    OrderColumn::new("updated", &["updated"]),
];

const INSERT_SQL: &str = r#"
    INSERT INTO sku (id, site_id, device_type, components, associated_machine_ids, created, updated)
    VALUES ($1, $2, $3, $4, $5, $6, $6)
    RETURNING id, site_id, device_type, components, associated_machine_ids, created, updated
"#;

/// PostgreSQL SKU DAO.
#[derive(Component, Clone)]
#[shaku(interface = SkuDao)]
pub struct PgSkuDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgSkuDaoImpl {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

fn key(id: &str) -> [(&'static str, Bind); 1] {
    [("id", Bind::from(id))]
}

async fn load_relations(
    conn: &mut PgConnection,
    items: &mut [Sku],
    relations: &[Relation],
) -> BmmResult<()> {
    if relations.contains(&Relation::Site) {
        attach::<_, Site, _, _>(conn, items, |s| Some(s.site_id), |s, r| s.site = Some(r)).await?;
    }
    Ok(())
}

fn build_filter(filter: SkuFilterInput) -> SelectQuery {
    let mut query = SelectQuery::of::<Sku>();
    if !filter.site_ids.is_empty() {
        query.any("site_id", filter.site_ids);
    }
    if !filter.sku_ids.is_empty() {
        query.any("id", filter.sku_ids);
    }
    if !filter.device_types.is_empty() {
        query.any("device_type", filter.device_types);
    }
    if !filter.associated_machine_ids.is_empty() {
        query.overlaps("associated_machine_ids", filter.associated_machine_ids);
    }
    query
}

fn update_assignments(input: SkuUpdateInput) -> Assignments {
    let mut sets = Assignments::new();
    sets.set_opt("device_type", input.device_type)
        .set_opt("components", input.components)
        .set_opt("associated_machine_ids", input.associated_machine_ids);
    sets
}

#[async_trait]
impl SkuDao for PgSkuDaoImpl {
    #[tracing::instrument(
        name = "sku.create",
        skip_all,
        fields(db.system = "postgresql", db.table = "sku", sku.id = %input.id, site_id = %input.site_id)
    )]
    async fn create(&self, tx: Option<&mut Tx>, input: SkuCreateInput) -> BmmResult<Sku> {
        input.validate_request()?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        debug!("Creating SKU {} at site {}", input.id, input.site_id);

        let sku = sqlx::query_as::<_, Sku>(INSERT_SQL)
            .bind(&input.id)
            .bind(input.site_id)
            .bind(&input.device_type)
            .bind(input.components.map(Json))
            .bind(&input.associated_machine_ids)
            .bind(db_now())
            .fetch_one(&mut *conn)
            .await?;

        Ok(sku)
    }

    #[tracing::instrument(
        name = "sku.get",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "sku")
    )]
    async fn get(&self, tx: Option<&mut Tx>, id: &str, relations: &[Relation]) -> BmmResult<Sku> {
        ensure_supported(Sku::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        debug!("Finding SKU by id: {}", id);

        let sku = common::fetch_by_key::<Sku>(&mut conn, &key(id), id).await?;
        let mut items = [sku];
        load_relations(&mut conn, &mut items, relations).await?;
        let [sku] = items;
        Ok(sku)
    }

    #[tracing::instrument(
        name = "sku.get_all",
        skip_all,
        fields(db.system = "postgresql", db.table = "sku")
    )]
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: SkuFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<Sku>> {
        ensure_supported(Sku::RESOURCE, relations, RELATIONS)?;
        let paginator = Paginator::new(&page, ORDER_COLUMNS)?;
        let query = build_filter(filter);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let mut page = paginator.fetch::<Sku>(&mut conn, query).await?;
        load_relations(&mut conn, &mut page.items, relations).await?;
        Ok(page)
    }

    #[tracing::instrument(
        name = "sku.update",
        skip_all,
        fields(db.system = "postgresql", db.table = "sku", sku.id = %input.id)
    )]
    async fn update(&self, tx: Option<&mut Tx>, input: SkuUpdateInput) -> BmmResult<Sku> {
        let id = input.id.clone();
        let sets = update_assignments(input);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<Sku>(&mut conn, sets, &key(&id), &id).await
    }

    #[tracing::instrument(
        name = "sku.clear",
        skip_all,
        fields(db.system = "postgresql", db.table = "sku", sku.id = %input.id)
    )]
    async fn clear(&self, tx: Option<&mut Tx>, input: SkuClearInput) -> BmmResult<Sku> {
        let mut sets = Assignments::new();
        sets.clear_if("device_type", input.device_type)
            .clear_if("components", input.components);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<Sku>(&mut conn, sets, &key(&input.id), &input.id).await
    }

    #[tracing::instrument(
        name = "sku.delete",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "sku")
    )]
    async fn delete(&self, tx: Option<&mut Tx>, id: &str) -> BmmResult<()> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::hard_delete_by_key::<Sku>(&mut conn, &key(id)).await?;
        Ok(())
    }
}
