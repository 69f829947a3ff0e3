//! PostgreSQL implementation of [`IpBlockDao`].

use super::common;
use crate::dao::ip_block_dao::{
    IpBlockClearInput, IpBlockCreateInput, IpBlockDao, IpBlockFilterInput, IpBlockUpdateInput,
};
use crate::model::{text_list, InfrastructureProvider, IpBlock, IpBlockStatus, Model, Site, Tenant};
use crate::paginator::{OrderColumn, Paginator};
use crate::query::{Assignments, Bind, SelectQuery};
use crate::relation::{attach, ensure_supported, Relation};
use crate::session::{db_now, DbConn, Tx};
use crate::DatabasePoolInterface;
use async_trait::async_trait;
use bmm_core::{BmmError, BmmResult, Page, PageInput, ValidateExt};
use shaku::Component;
use sqlx::PgConnection;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const RELATIONS: &[Relation] = &[
    Relation::Site,
    Relation::InfrastructureProvider,
    Relation::Tenant,
];

const ORDER_COLUMNS: &[OrderColumn] = &[
    OrderColumn::new("name", &["name"]),
    OrderColumn::new("prefix", &["prefix", "prefix_length"]),
    OrderColumn::new("status", &["status"]),
    OrderColumn::new("created", &["created"]),
    OrderColumn::new("updated", &["updated"]),
];

const SEARCH_COLUMNS: &[&str] = &["name", "description", "status"];

const INSERT_SQL: &str = r#"
    INSERT INTO ip_block (
        id, name, description, site_id, infrastructure_provider_id, tenant_id,
        routing_type, prefix, prefix_length, protocol_version, full_grant,
        status, created, updated, created_by
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13, $14)
    RETURNING id, name, description, site_id, infrastructure_provider_id, tenant_id,
              routing_type, prefix, prefix_length, protocol_version, full_grant,
              status, created, updated, deleted, created_by
"#;

/// PostgreSQL IP block DAO.
#[derive(Component, Clone)]
#[shaku(interface = IpBlockDao)]
pub struct PgIpBlockDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgIpBlockDaoImpl {
    /// Creates a new DAO over `pool`.
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
    items: &mut [IpBlock],
    relations: &[Relation],
) -> BmmResult<()> {
    for relation in relations {
        match relation {
            Relation::Site => {
                attach::<_, Site, _, _>(conn, items, |b| Some(b.site_id), |b, r| b.site = Some(r))
                    .await?;
            }
            Relation::InfrastructureProvider => {
                attach::<_, InfrastructureProvider, _, _>(
                    conn,
                    items,
                    |b| Some(b.infrastructure_provider_id),
                    |b, r| b.infrastructure_provider = Some(r),
                )
                .await?;
            }
            Relation::Tenant => {
                attach::<_, Tenant, _, _>(conn, items, |b| b.tenant_id, |b, r| b.tenant = Some(r))
                    .await?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn build_filter(filter: IpBlockFilterInput) -> BmmResult<SelectQuery> {
    if filter.exclude_derived && filter.tenant_ids.is_some() {
        return Err(BmmError::invalid_params(
            "tenant_ids cannot be combined with exclude_derived",
        ));
    }

    let mut query = SelectQuery::of::<IpBlock>();
    query
        .any_opt("id", filter.ids)
        .any_opt("name", filter.names)
        .any_opt("site_id", filter.site_ids)
        .any_opt("infrastructure_provider_id", filter.infrastructure_provider_ids)
        .any_opt("tenant_id", filter.tenant_ids)
        .any_opt("routing_type", filter.routing_types.map(|v| text_list(&v)))
        .any_opt("prefix", filter.prefixes)
        .any_opt("prefix_length", filter.prefix_lengths)
        .any_opt("protocol_version", filter.protocol_versions.map(|v| text_list(&v)))
        .eq_opt("full_grant", filter.full_grant)
        .any_opt("status", filter.statuses.map(|v| text_list(&v)));
    if filter.exclude_derived {
        query.is_null("tenant_id");
    }
    if let Some(search_query) = filter.search_query.as_deref() {
        query.search(SEARCH_COLUMNS, search_query);
    }
    Ok(query)
}

#[async_trait]
impl IpBlockDao for PgIpBlockDaoImpl {
    #[tracing::instrument(
        name = "ip_block.create",
        skip_all,
        fields(db.system = "postgresql", db.table = "ip_block", ip_block.name = %input.name)
    )]
    async fn create(&self, tx: Option<&mut Tx>, input: IpBlockCreateInput) -> BmmResult<IpBlock> {
        input.validate_request()?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let id = input.id.unwrap_or_else(Uuid::new_v4);
        debug!("Creating IP block {}", id);

        let block = sqlx::query_as::<_, IpBlock>(INSERT_SQL)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.site_id)
            .bind(input.infrastructure_provider_id)
            .bind(input.tenant_id)
            .bind(input.routing_type.as_str())
            .bind(&input.prefix)
            .bind(input.prefix_length)
            .bind(input.protocol_version.as_str())
            .bind(input.full_grant)
            .bind(input.status.as_str())
            .bind(db_now())
            .bind(input.created_by)
            .fetch_one(&mut *conn)
            .await?;

        Ok(block)
    }

    #[tracing::instrument(
        name = "ip_block.get_by_id",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "ip_block")
    )]
    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<IpBlock> {
        ensure_supported(IpBlock::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        debug!("Finding IP block by id: {}", id);

        let block = common::fetch_by_key::<IpBlock>(&mut conn, &key(id), &id.to_string()).await?;
        let mut items = [block];
        load_relations(&mut conn, &mut items, relations).await?;
        let [block] = items;
        Ok(block)
    }

    #[tracing::instrument(
        name = "ip_block.get_all",
        skip_all,
        fields(db.system = "postgresql", db.table = "ip_block")
    )]
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: IpBlockFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<IpBlock>> {
        ensure_supported(IpBlock::RESOURCE, relations, RELATIONS)?;
        let paginator = Paginator::new(&page, ORDER_COLUMNS)?;
        let query = build_filter(filter)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;

        let mut page = paginator.fetch::<IpBlock>(&mut conn, query).await?;
        load_relations(&mut conn, &mut page.items, relations).await?;
        Ok(page)
    }

    #[tracing::instrument(
        name = "ip_block.update",
        skip_all,
        fields(db.system = "postgresql", db.table = "ip_block", ip_block.id = %input.id)
    )]
    async fn update(&self, tx: Option<&mut Tx>, input: IpBlockUpdateInput) -> BmmResult<IpBlock> {
        input.validate_request()?;
        let mut sets = Assignments::new();
        sets.set_opt("name", input.name)
            .set_opt("description", input.description)
            .set_opt("site_id", input.site_id)
            .set_opt("infrastructure_provider_id", input.infrastructure_provider_id)
            .set_opt("tenant_id", input.tenant_id)
            .set_opt("routing_type", input.routing_type)
            .set_opt("prefix", input.prefix)
            .set_opt("prefix_length", input.prefix_length)
            .set_opt("protocol_version", input.protocol_version)
            .set_opt("full_grant", input.full_grant)
            .set_opt("status", input.status);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<IpBlock>(&mut conn, sets, &key(input.id), &input.id.to_string())
            .await
    }

    #[tracing::instrument(
        name = "ip_block.clear",
        skip_all,
        fields(db.system = "postgresql", db.table = "ip_block", ip_block.id = %input.id)
    )]
    async fn clear(&self, tx: Option<&mut Tx>, input: IpBlockClearInput) -> BmmResult<IpBlock> {
        let mut sets = Assignments::new();
        sets.clear_if("description", input.description)
            .clear_if("tenant_id", input.tenant_id);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<IpBlock>(&mut conn, sets, &key(input.id), &input.id.to_string())
            .await
    }

    #[tracing::instrument(
        name = "ip_block.delete",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "ip_block")
    )]
    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::soft_delete_by_key::<IpBlock>(&mut conn, &key(id)).await?;
        Ok(())
    }

    #[tracing::instrument(
        name = "ip_block.get_count_by_status",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "ip_block")
    )]
    async fn get_count_by_status(
        &self,
        tx: Option<&mut Tx>,
        infrastructure_provider_id: Option<Uuid>,
        site_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
    ) -> BmmResult<BTreeMap<String, u64>> {
        let mut query = SelectQuery::of::<IpBlock>();
        query
            .eq_opt("infrastructure_provider_id", infrastructure_provider_id)
            .eq_opt("site_id", site_id)
            .eq_opt("tenant_id", tenant_id);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::count_by_status(&mut conn, &query, IpBlockStatus::NAMES).await
    }
}
