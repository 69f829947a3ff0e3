//! PostgreSQL implementation of [`TenantAccountDao`].

use super::common;
use crate::dao::tenant_account_dao::{
    TenantAccountClearInput, TenantAccountCreateInput, TenantAccountDao,
    TenantAccountFilterInput, TenantAccountUpdateInput,
};
use crate::model::{
    text_list, InfrastructureProvider, Model, Tenant, TenantAccount, TenantAccountStatus, User,
};
use crate::paginator::{OrderColumn, Paginator};
use crate::query::{Assignments, Bind, SelectQuery};
use crate::relation::{attach, ensure_supported, Relation};
use crate::session::{db_now, DbConn, Tx};
use crate::DatabasePoolInterface;
use async_trait::async_trait;
use bmm_core::{BmmResult, Page, PageInput, ValidateExt};
use shaku::Component;
use sqlx::PgConnection;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const RELATIONS: &[Relation] = &[
    Relation::InfrastructureProvider,
    Relation::Tenant,
    Relation::TenantContact,
];

const JOIN_TENANT: &str = "LEFT JOIN tenant AS tn ON tn.id = ta.tenant_id";
const JOIN_TENANT_CONTACT: &str = r#"LEFT JOIN "user" AS usr ON usr.id = ta.tenant_contact_id"#;

const ORDER_COLUMNS: &[OrderColumn] = &[
    OrderColumn::new("account_number", &["account_number"]),
    OrderColumn::new("status", &["status"]),
    OrderColumn::new("created", &["created"]),
    OrderColumn::new("updated", &["updated"]),
    OrderColumn::joined("tenant_org_name", &["tn.org"], JOIN_TENANT),
    OrderColumn::joined("tenant_org_display_name", &["tn.org_display_name"], JOIN_TENANT),
    OrderColumn::joined("tenant_contact_email", &["usr.email"], JOIN_TENANT_CONTACT),
    OrderColumn::joined(
        "tenant_contact_full_name",
        &["usr.first_name", "usr.last_name"],
        JOIN_TENANT_CONTACT,
    ),
];

const SEARCH_COLUMNS: &[&str] = &["account_number", "tenant_org", "status"];

const INSERT_SQL: &str = r#"
    INSERT INTO tenant_account (
        id, account_number, tenant_id, tenant_org, infrastructure_provider_id,
        infrastructure_provider_org, subscription_id, subscription_tier, tenant_contact_id,
        status, created, updated, created_by
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11, $12)
    RETURNING id, account_number, tenant_id, tenant_org, infrastructure_provider_id,
              infrastructure_provider_org, subscription_id, subscription_tier, tenant_contact_id,
              status, created, updated, deleted, created_by
"#;

/// PostgreSQL tenant account DAO.
#[derive(Component, Clone)]
#[shaku(interface = TenantAccountDao)]
pub struct PgTenantAccountDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgTenantAccountDaoImpl {
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
    items: &mut [TenantAccount],
    relations: &[Relation],
) -> BmmResult<()> {
    for relation in relations {
        match relation {
            Relation::InfrastructureProvider => {
                attach::<_, InfrastructureProvider, _, _>(
                    conn,
                    items,
                    |a| Some(a.infrastructure_provider_id),
                    |a, r| a.infrastructure_provider = Some(r),
                )
                .await?;
            }
            Relation::Tenant => {
                attach::<_, Tenant, _, _>(conn, items, |a| a.tenant_id, |a, r| a.tenant = Some(r))
                    .await?;
            }
            Relation::TenantContact => {
                attach::<_, User, _, _>(
                    conn,
                    items,
                    |a| a.tenant_contact_id,
                    |a, r| a.tenant_contact = Some(r),
                )
                .await?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn build_filter(filter: TenantAccountFilterInput) -> SelectQuery {
    let mut query = SelectQuery::of::<TenantAccount>();
    query
        .eq_opt("infrastructure_provider_id", filter.infrastructure_provider_id)
        .any_opt("tenant_id", filter.tenant_ids)
        .any_opt("tenant_org", filter.tenant_orgs)
        .any_opt("status", filter.statuses.map(|v| text_list(&v)));
    if let Some(search_query) = filter.search_query.as_deref() {
        query.search(SEARCH_COLUMNS, search_query);
    }
    query
}

#[async_trait]
impl TenantAccountDao for PgTenantAccountDaoImpl {
    #[tracing::instrument(
        name = "tenant_account.create",
        skip_all,
        fields(db.system = "postgresql", db.table = "tenant_account", account_number = %input.account_number)
    )]
    async fn create(
        &self,
        tx: Option<&mut Tx>,
        input: TenantAccountCreateInput,
    ) -> BmmResult<TenantAccount> {
        input.validate_request()?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let id = Uuid::new_v4();
        debug!(
            "Creating tenant account {} for {} under provider {}",
            input.account_number, input.tenant_org, input.infrastructure_provider_org
        );

        let account = sqlx::query_as::<_, TenantAccount>(INSERT_SQL)
            .bind(id)
            .bind(&input.account_number)
            .bind(input.tenant_id)
            .bind(&input.tenant_org)
            .bind(input.infrastructure_provider_id)
            .bind(&input.infrastructure_provider_org)
            .bind(&input.subscription_id)
            .bind(&input.subscription_tier)
            .bind(input.tenant_contact_id)
            .bind(input.status.as_str())
            .bind(db_now())
            .bind(input.created_by)
            .fetch_one(&mut *conn)
            .await?;

        Ok(account)
    }

    #[tracing::instrument(
        name = "tenant_account.get_by_id",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "tenant_account")
    )]
    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<TenantAccount> {
        ensure_supported(TenantAccount::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        debug!("Finding tenant account by id: {}", id);

        let account =
            common::fetch_by_key::<TenantAccount>(&mut conn, &key(id), &id.to_string()).await?;
        let mut items = [account];
        load_relations(&mut conn, &mut items, relations).await?;
        let [account] = items;
        Ok(account)
    }

    #[tracing::instrument(
        name = "tenant_account.get_by_account_number",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "tenant_account")
    )]
    async fn get_by_account_number(
        &self,
        tx: Option<&mut Tx>,
        account_number: &str,
        relations: &[Relation],
    ) -> BmmResult<TenantAccount> {
        ensure_supported(TenantAccount::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        debug!("Finding tenant account by number: {}", account_number);

        let account = common::fetch_by_key::<TenantAccount>(
            &mut conn,
            &[("account_number", Bind::from(account_number))],
            account_number,
        )
        .await?;
        let mut items = [account];
        load_relations(&mut conn, &mut items, relations).await?;
        let [account] = items;
        Ok(account)
    }

    #[tracing::instrument(
        name = "tenant_account.get_all",
        skip_all,
        fields(db.system = "postgresql", db.table = "tenant_account")
    )]
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: TenantAccountFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<TenantAccount>> {
        ensure_supported(TenantAccount::RESOURCE, relations, RELATIONS)?;
        let paginator = Paginator::new(&page, ORDER_COLUMNS)?;
        let query = build_filter(filter);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let mut page = paginator.fetch::<TenantAccount>(&mut conn, query).await?;
        load_relations(&mut conn, &mut page.items, relations).await?;
        Ok(page)
    }

    #[tracing::instrument(
        name = "tenant_account.get_count",
        skip_all,
        fields(db.system = "postgresql", db.table = "tenant_account")
    )]
    async fn get_count(&self, tx: Option<&mut Tx>, filter: TenantAccountFilterInput) -> BmmResult<u64> {
        let query = build_filter(filter);
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::count(&mut conn, &query).await
    }

    #[tracing::instrument(
        name = "tenant_account.get_count_by_status",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "tenant_account")
    )]
    async fn get_count_by_status(
        &self,
        tx: Option<&mut Tx>,
        infrastructure_provider_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
    ) -> BmmResult<BTreeMap<String, u64>> {
        let mut query = SelectQuery::of::<TenantAccount>();
        query
            .eq_opt("infrastructure_provider_id", infrastructure_provider_id)
            .eq_opt("tenant_id", tenant_id);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::count_by_status(&mut conn, &query, TenantAccountStatus::NAMES).await
    }

    #[tracing::instrument(
        name = "tenant_account.update",
        skip_all,
        fields(db.system = "postgresql", db.table = "tenant_account", tenant_account.id = %input.id)
    )]
    async fn update(
        &self,
        tx: Option<&mut Tx>,
        input: TenantAccountUpdateInput,
    ) -> BmmResult<TenantAccount> {
        let mut sets = Assignments::new();
        sets.set_opt("tenant_id", input.tenant_id)
            .set_opt("subscription_id", input.subscription_id)
            .set_opt("subscription_tier", input.subscription_tier)
            .set_opt("tenant_contact_id", input.tenant_contact_id)
            .set_opt("status", input.status);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<TenantAccount>(&mut conn, sets, &key(input.id), &input.id.to_string())
            .await
    }

    #[tracing::instrument(
        name = "tenant_account.clear",
        skip_all,
        fields(db.system = "postgresql", db.table = "tenant_account", tenant_account.id = %input.id)
    )]
    async fn clear(
        &self,
        tx: Option<&mut Tx>,
        input: TenantAccountClearInput,
    ) -> BmmResult<TenantAccount> {
        let mut sets = Assignments::new();
        sets.clear_if("tenant_id", input.tenant_id)
            .clear_if("subscription_id", input.subscription_id)
            .clear_if("subscription_tier", input.subscription_tier)
            .clear_if("tenant_contact_id", input.tenant_contact_id);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<TenantAccount>(&mut conn, sets, &key(input.id), &input.id.to_string())
            .await
    }

    #[tracing::instrument(
        name = "tenant_account.delete",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "tenant_account")
    )]
    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::soft_delete_by_key::<TenantAccount>(&mut conn, &key(id)).await?;
        Ok(())
    }
}
