//! PostgreSQL implementation of [`InterfaceDao`].

use super::common;
use crate::dao::interface_dao::{
    InterfaceClearInput, InterfaceCreateInput, InterfaceDao, InterfaceFilterInput,
    InterfaceUpdateInput, MAX_BATCH_ITEMS,
};
use crate::model::{
    text_list, Instance, Interface, MachineInterface, Model, Subnet, VpcPrefix,
};
use crate::paginator::{OrderColumn, Paginator};
use crate::query::{plain_columns, Assignments, Bind, SelectQuery};
use crate::relation::{attach, ensure_supported, Relation};
use crate::session::{db_now, DbConn, Tx};
use crate::DatabasePoolInterface;
use async_trait::async_trait;
use bmm_core::{BmmError, BmmResult, Page, PageInput, ValidateExt};
use shaku::Component;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const RELATIONS: &[Relation] = &[
    Relation::Instance,
    Relation::Subnet,
    Relation::VpcPrefix,
    Relation::MachineInterface,
];

const ORDER_COLUMNS: &[OrderColumn] = &[
    OrderColumn::new("status", &["status"]),
    OrderColumn::new("device", &["device", "device_instance"]),
    OrderColumn::new("created", &["created"]),
    OrderColumn::new("updated", &["updated"]),
];

const INSERT_COLUMNS: &str = "INSERT INTO interface (\
    id, instance_id, subnet_id, vpc_prefix_id, machine_interface_id, device, \
    device_instance, is_physical, virtual_function_id, mac_address, ip_addresses, \
    status, created, updated, created_by) ";

/// PostgreSQL instance interface DAO.
#[derive(Component, Clone)]
#[shaku(interface = InterfaceDao)]
pub struct PgInterfaceDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgInterfaceDaoImpl {
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
    items: &mut [Interface],
    relations: &[Relation],
) -> BmmResult<()> {
    for relation in relations {
        match relation {
            Relation::Instance => {
                attach::<_, Instance, _, _>(
                    conn,
                    items,
                    |i| Some(i.instance_id),
                    |i, r| i.instance = Some(r),
                )
                .await?;
            }
            Relation::Subnet => {
                attach::<_, Subnet, _, _>(conn, items, |i| i.subnet_id, |i, r| i.subnet = Some(r))
                    .await?;
            }
            Relation::VpcPrefix => {
                attach::<_, VpcPrefix, _, _>(
                    conn,
                    items,
                    |i| i.vpc_prefix_id,
                    |i, r| i.vpc_prefix = Some(r),
                )
                .await?;
            }
            Relation::MachineInterface => {
                attach::<_, MachineInterface, _, _>(
                    conn,
                    items,
                    |i| i.machine_interface_id,
                    |i, r| i.machine_interface = Some(r),
                )
                .await?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Renders one multi-row `INSERT ... RETURNING` for `rows`.
fn insert_builder(rows: Vec<(Uuid, InterfaceCreateInput)>) -> QueryBuilder<'static, Postgres> {
    let now = db_now();
    let mut qb = QueryBuilder::new(INSERT_COLUMNS);
    qb.push_values(rows, |mut b, (id, input)| {
        b.push_bind(id)
            .push_bind(input.instance_id)
            .push_bind(input.subnet_id)
            .push_bind(input.vpc_prefix_id)
            .push_bind(input.machine_interface_id)
            .push_bind(input.device)
            .push_bind(input.device_instance)
            .push_bind(input.is_physical)
            .push_bind(input.virtual_function_id)
            .push_bind(input.mac_address)
            .push_bind(input.ip_addresses)
            .push_bind(input.status.as_str())
            .push_bind(now)
            .push_bind(now)
            .push_bind(input.created_by);
    });
    qb.push(" RETURNING ").push(plain_columns::<Interface>());
    qb
}

/// Puts `rows` back into the order of `ids`.
fn in_input_order(ids: &[Uuid], rows: Vec<Interface>) -> BmmResult<Vec<Interface>> {
    let mut by_id: HashMap<Uuid, Interface> = rows.into_iter().map(|row| (row.id, row)).collect();
    ids.iter()
        .map(|id| {
            by_id
                .remove(id)
                .ok_or_else(|| BmmError::internal(format!("inserted interface {id} was not returned")))
        })
        .collect()
}

#[async_trait]
impl InterfaceDao for PgInterfaceDaoImpl {
    #[tracing::instrument(
        name = "interface.create",
        skip_all,
        fields(db.system = "postgresql", db.table = "interface", instance_id = %input.instance_id)
    )]
    async fn create(&self, tx: Option<&mut Tx>, input: InterfaceCreateInput) -> BmmResult<Interface> {
        let mut created = self.create_multiple(tx, vec![input]).await?;
        created
            .pop()
            .ok_or_else(|| BmmError::internal("insert returned no interface"))
    }

    #[tracing::instrument(
        name = "interface.create_multiple",
        skip_all,
        fields(db.system = "postgresql", db.table = "interface", count = inputs.len())
    )]
    async fn create_multiple(
        &self,
        tx: Option<&mut Tx>,
        inputs: Vec<InterfaceCreateInput>,
    ) -> BmmResult<Vec<Interface>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        if inputs.len() > MAX_BATCH_ITEMS {
            return Err(BmmError::BatchTooLarge {
                size: inputs.len(),
                max: MAX_BATCH_ITEMS,
            });
        }
        for input in &inputs {
            input.validate_request()?;
        }

        let rows: Vec<(Uuid, InterfaceCreateInput)> = inputs
            .into_iter()
            .map(|input| (input.id.unwrap_or_else(Uuid::new_v4), input))
            .collect();
        let ids: Vec<Uuid> = rows.iter().map(|(id, _)| *id).collect();
        debug!("Creating {} interfaces", ids.len());

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let created = insert_builder(rows)
            .build_query_as::<Interface>()
            .fetch_all(&mut *conn)
            .await?;

        in_input_order(&ids, created)
    }

    #[tracing::instrument(
        name = "interface.get_by_id",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "interface")
    )]
    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<Interface> {
        ensure_supported(Interface::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;

        let interface =
            common::fetch_by_key::<Interface>(&mut conn, &key(id), &id.to_string()).await?;
        let mut items = [interface];
        load_relations(&mut conn, &mut items, relations).await?;
        let [interface] = items;
        Ok(interface)
    }

    #[tracing::instrument(
        name = "interface.get_all",
        skip_all,
        fields(db.system = "postgresql", db.table = "interface")
    )]
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: InterfaceFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<Interface>> {
        ensure_supported(Interface::RESOURCE, relations, RELATIONS)?;
        let paginator = Paginator::new(&page, ORDER_COLUMNS)?;

        let mut query = SelectQuery::of::<Interface>();
        query
            .any_opt("instance_id", filter.instance_ids)
            .any_opt("subnet_id", filter.subnet_ids)
            .any_opt("vpc_prefix_id", filter.vpc_prefix_ids)
            .any_opt("machine_interface_id", filter.machine_interface_ids)
            .any_opt("device", filter.devices)
            .any_opt("device_instance", filter.device_instances)
            .eq_opt("is_physical", filter.is_physical)
            .any_opt("status", filter.statuses.map(|v| text_list(&v)));
        if let Some(ip_addresses) = filter.ip_addresses {
            query.overlaps("ip_addresses", ip_addresses);
        }

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let mut page = paginator.fetch::<Interface>(&mut conn, query).await?;
        load_relations(&mut conn, &mut page.items, relations).await?;
        Ok(page)
    }

    #[tracing::instrument(
        name = "interface.update",
        skip_all,
        fields(db.system = "postgresql", db.table = "interface", interface.id = %input.id)
    )]
    async fn update(&self, tx: Option<&mut Tx>, input: InterfaceUpdateInput) -> BmmResult<Interface> {
        input.validate_request()?;
        let mut sets = Assignments::new();
        sets.set_opt("subnet_id", input.subnet_id)
            .set_opt("vpc_prefix_id", input.vpc_prefix_id)
            .set_opt("machine_interface_id", input.machine_interface_id)
            .set_opt("device", input.device)
            .set_opt("device_instance", input.device_instance)
            .set_opt("is_physical", input.is_physical)
            .set_opt("virtual_function_id", input.virtual_function_id)
            .set_opt("mac_address", input.mac_address)
            .set_opt("ip_addresses", input.ip_addresses)
            .set_opt("status", input.status);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<Interface>(&mut conn, sets, &key(input.id), &input.id.to_string())
            .await
    }

    #[tracing::instrument(
        name = "interface.clear",
        skip_all,
        fields(db.system = "postgresql", db.table = "interface", interface.id = %input.id)
    )]
    async fn clear(&self, tx: Option<&mut Tx>, input: InterfaceClearInput) -> BmmResult<Interface> {
        let mut sets = Assignments::new();
        sets.clear_if("subnet_id", input.subnet_id)
            .clear_if("vpc_prefix_id", input.vpc_prefix_id)
            .clear_if("machine_interface_id", input.machine_interface_id)
            .clear_if("device", input.device)
            .clear_if("device_instance", input.device_instance)
            .clear_if("virtual_function_id", input.virtual_function_id)
            .clear_if("mac_address", input.mac_address);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<Interface>(&mut conn, sets, &key(input.id), &input.id.to_string())
            .await
    }

    #[tracing::instrument(
        name = "interface.delete",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "interface")
    )]
    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::soft_delete_by_key::<Interface>(&mut conn, &key(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InterfaceStatus;
    use chrono::Utc;

    fn input(id: Uuid) -> InterfaceCreateInput {
        InterfaceCreateInput {
            id: Some(id),
            instance_id: Uuid::nil(),
            subnet_id: None,
            vpc_prefix_id: None,
            machine_interface_id: None,
            device: None,
            device_instance: None,
            is_physical: false,
            virtual_function_id: None,
            mac_address: None,
            ip_addresses: Vec::new(),
            status: InterfaceStatus::Pending,
            created_by: None,
        }
    }

    fn row(id: Uuid) -> Interface {
        let now = Utc::now();
        Interface {
            id,
            instance_id: Uuid::nil(),
            subnet_id: None,
            vpc_prefix_id: None,
            machine_interface_id: None,
            device: None,
            device_instance: None,
            is_physical: false,
            virtual_function_id: None,
            mac_address: None,
            ip_addresses: Vec::new(),
            status: InterfaceStatus::Pending,
            created: now,
            updated: now,
            deleted: None,
            created_by: None,
            instance: None,
            subnet: None,
            vpc_prefix: None,
            machine_interface: None,
        }
    }

    #[test]
    fn test_insert_builder_renders_one_statement() {
        let rows = vec![(Uuid::new_v4(), input(Uuid::nil())), (Uuid::new_v4(), input(Uuid::nil()))];
        let sql = insert_builder(rows).into_sql();
        assert!(sql.starts_with("INSERT INTO interface (id, instance_id,"));
        assert!(sql.contains("VALUES ($1, $2,"));
        assert!(sql.contains("($16, $17,"));
        assert!(sql.contains(" RETURNING id, instance_id,"));
    }

    #[test]
    fn test_results_follow_input_order() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ordered = in_input_order(&[a, b, c], vec![row(c), row(a), row(b)]).unwrap();
        let ids: Vec<Uuid> = ordered.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_missing_row_is_reported() {
        let err = in_input_order(&[Uuid::new_v4()], Vec::new()).unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}
