//! PostgreSQL implementation of [`MachineInterfaceDao`].

use super::common;
use crate::dao::machine_interface_dao::{
    MachineInterfaceClearInput, MachineInterfaceCreateInput, MachineInterfaceDao,
    MachineInterfaceFilterInput, MachineInterfaceUpdateInput,
};
use crate::model::{Machine, MachineInterface, Model, Subnet};
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
use tracing::{debug, info};
use uuid::Uuid;

const RELATIONS: &[Relation] = &[Relation::Machine, Relation::Subnet];

const ORDER_COLUMNS: &[OrderColumn] = &[
    OrderColumn::new("hostname", &["hostname"]),
    OrderColumn::new("created", &["created"]),
    OrderColumn::new("updated", &["updated"]),
];

const SEARCH_COLUMNS: &[&str] = &["hostname", "mac_address", "machine_id"];

const INSERT_SQL: &str = r#"
    INSERT INTO machine_interface (
        id, machine_id, controller_interface_id, controller_segment_id,
        attached_dpu_machine_id, subnet_id, hostname, is_primary, mac_address,
        ip_addresses, created, updated
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
    RETURNING id, machine_id, controller_interface_id, controller_segment_id,
              attached_dpu_machine_id, subnet_id, hostname, is_primary, mac_address,
              ip_addresses, created, updated, deleted
"#;

/// PostgreSQL machine interface DAO.
#[derive(Component, Clone)]
#[shaku(interface = MachineInterfaceDao)]
pub struct PgMachineInterfaceDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgMachineInterfaceDaoImpl {
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
    items: &mut [MachineInterface],
    relations: &[Relation],
) -> BmmResult<()> {
    for relation in relations {
        match relation {
            Relation::Machine => {
                attach::<_, Machine, _, _>(
                    conn,
                    items,
                    |mi| Some(mi.machine_id.clone()),
                    |mi, r| mi.machine = Some(r),
                )
                .await?;
            }
            Relation::Subnet => {
                attach::<_, Subnet, _, _>(conn, items, |mi| mi.subnet_id, |mi, r| mi.subnet = Some(r))
                    .await?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn build_filter(filter: MachineInterfaceFilterInput) -> SelectQuery {
    let mut query = SelectQuery::of::<MachineInterface>();
    query
        .any_opt("machine_id", filter.machine_ids)
        .any_opt("controller_interface_id", filter.controller_interface_ids)
        .any_opt("controller_segment_id", filter.controller_segment_ids)
        .any_opt("attached_dpu_machine_id", filter.attached_dpu_machine_ids)
        .any_opt("subnet_id", filter.subnet_ids)
        .any_opt("hostname", filter.hostnames)
        .eq_opt("is_primary", filter.is_primary)
        .any_opt("mac_address", filter.mac_addresses);
    if let Some(ip_addresses) = filter.ip_addresses {
        query.overlaps("ip_addresses", ip_addresses);
    }
    if let Some(search_query) = filter.search_query.as_deref() {
        query.search(SEARCH_COLUMNS, search_query);
    }
    query
}

#[async_trait]
impl MachineInterfaceDao for PgMachineInterfaceDaoImpl {
    #[tracing::instrument(
        name = "machine_interface.create",
        skip_all,
        fields(db.system = "postgresql", db.table = "machine_interface", machine_id = %input.machine_id)
    )]
    async fn create(
        &self,
        tx: Option<&mut Tx>,
        input: MachineInterfaceCreateInput,
    ) -> BmmResult<MachineInterface> {
        input.validate_request()?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let id = input.id.unwrap_or_else(Uuid::new_v4);
        debug!("Creating machine interface {} for machine {}", id, input.machine_id);

        let interface = sqlx::query_as::<_, MachineInterface>(INSERT_SQL)
            .bind(id)
            .bind(&input.machine_id)
            .bind(input.controller_interface_id)
            .bind(input.controller_segment_id)
            .bind(&input.attached_dpu_machine_id)
            .bind(input.subnet_id)
            .bind(&input.hostname)
            .bind(input.is_primary)
            .bind(&input.mac_address)
            .bind(&input.ip_addresses)
            .bind(db_now())
            .fetch_one(&mut *conn)
            .await?;

        Ok(interface)
    }

    #[tracing::instrument(
        name = "machine_interface.get_by_id",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "machine_interface")
    )]
    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<MachineInterface> {
        ensure_supported(MachineInterface::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;

        let interface =
            common::fetch_by_key::<MachineInterface>(&mut conn, &key(id), &id.to_string()).await?;
        let mut items = [interface];
        load_relations(&mut conn, &mut items, relations).await?;
        let [interface] = items;
        Ok(interface)
    }

    #[tracing::instrument(
        name = "machine_interface.get_all",
        skip_all,
        fields(db.system = "postgresql", db.table = "machine_interface")
    )]
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: MachineInterfaceFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<MachineInterface>> {
        ensure_supported(MachineInterface::RESOURCE, relations, RELATIONS)?;
        let paginator = Paginator::new(&page, ORDER_COLUMNS)?;
        let query = build_filter(filter);
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;

        let mut page = paginator.fetch::<MachineInterface>(&mut conn, query).await?;
        load_relations(&mut conn, &mut page.items, relations).await?;
        Ok(page)
    }

    #[tracing::instrument(
        name = "machine_interface.update",
        skip_all,
        fields(db.system = "postgresql", db.table = "machine_interface", machine_interface.id = %input.id)
    )]
    async fn update(
        &self,
        tx: Option<&mut Tx>,
        input: MachineInterfaceUpdateInput,
    ) -> BmmResult<MachineInterface> {
        input.validate_request()?;
        let mut sets = Assignments::new();
        sets.set_opt("machine_id", input.machine_id)
            .set_opt("controller_interface_id", input.controller_interface_id)
            .set_opt("controller_segment_id", input.controller_segment_id)
            .set_opt("attached_dpu_machine_id", input.attached_dpu_machine_id)
            .set_opt("subnet_id", input.subnet_id)
            .set_opt("hostname", input.hostname)
            .set_opt("is_primary", input.is_primary)
            .set_opt("mac_address", input.mac_address)
            .set_opt("ip_addresses", input.ip_addresses);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<MachineInterface>(
            &mut conn,
            sets,
            &key(input.id),
            &input.id.to_string(),
        )
        .await
    }

    #[tracing::instrument(
        name = "machine_interface.clear",
        skip_all,
        fields(db.system = "postgresql", db.table = "machine_interface", machine_interface.id = %input.id)
    )]
    async fn clear(
        &self,
        tx: Option<&mut Tx>,
        input: MachineInterfaceClearInput,
    ) -> BmmResult<MachineInterface> {
        let mut sets = Assignments::new();
        sets.clear_if("controller_interface_id", input.controller_interface_id)
            .clear_if("controller_segment_id", input.controller_segment_id)
            .clear_if("attached_dpu_machine_id", input.attached_dpu_machine_id)
            .clear_if("subnet_id", input.subnet_id)
            .clear_if("hostname", input.hostname)
            .clear_if("mac_address", input.mac_address);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<MachineInterface>(
            &mut conn,
            sets,
            &key(input.id),
            &input.id.to_string(),
        )
        .await
    }

    #[tracing::instrument(
        name = "machine_interface.delete",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "machine_interface")
    )]
    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid, purge: bool) -> BmmResult<()> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        if purge {
            let removed = common::hard_delete_by_key::<MachineInterface>(&mut conn, &key(id)).await?;
            info!("Purged machine interface {} ({} rows)", id, removed);
        } else {
            common::soft_delete_by_key::<MachineInterface>(&mut conn, &key(id)).await?;
        }
        Ok(())
    }
}
