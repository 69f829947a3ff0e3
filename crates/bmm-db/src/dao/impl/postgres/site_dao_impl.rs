//! PostgreSQL implementation of [`SiteDao`].

use super::common;
use crate::dao::site_dao::{
    SiteClearInput, SiteCreateInput, SiteDao, SiteFilterInput, SiteUpdateInput,
};
use crate::model::{text_list, InfrastructureProvider, Model, Site, SiteStatus};
use crate::paginator::{OrderColumn, Paginator};
use crate::query::{Assignments, Bind, SelectQuery};
use crate::relation::{attach, ensure_supported, Relation};
use crate::session::{db_now, DbConn, Tx};
use crate::DatabasePoolInterface;
use async_trait::async_trait;
use bmm_core::{BmmResult, Page, PageInput, ValidateExt};
use serde::Serialize;
use shaku::Component;
use sqlx::types::Json;
use sqlx::PgConnection;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const RELATIONS: &[Relation] = &[Relation::InfrastructureProvider];

const ORDER_COLUMNS: &[OrderColumn] = &[
    OrderColumn::new("name", &["name"]),
    OrderColumn::new("status", &["status"]),
    OrderColumn::new("created", &["created"]),
    OrderColumn::new("updated", &["updated"]),
];

const SEARCH_COLUMNS: &[&str] = &["name", "display_name", "description", "org", "status"];

const INSERT_SQL: &str = r#"
    INSERT INTO site (
        id, name, display_name, description, org, infrastructure_provider_id,
        site_controller_version, site_agent_version, registration_token,
        registration_token_expiration, serial_console_hostname, is_serial_console_enabled,
        serial_console_idle_timeout, serial_console_max_session_length,
        is_serial_console_ssh_keys_enabled, location, contact, status,
        created, updated, created_by
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
            $19, $19, $20)
    RETURNING id, name, display_name, description, org, infrastructure_provider_id,
              site_controller_version, site_agent_version, registration_token,
              registration_token_expiration, serial_console_hostname, is_serial_console_enabled,
              serial_console_idle_timeout, serial_console_max_session_length,
              is_serial_console_ssh_keys_enabled, location, contact, status,
              created, updated, deleted, created_by
"#;

/// PostgreSQL site DAO.
#[derive(Component, Clone)]
#[shaku(interface = SiteDao)]
pub struct PgSiteDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgSiteDaoImpl {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

fn key(id: Uuid) -> [(&'static str, Bind); 1] {
    [("id", Bind::Uuid(id))]
}

/// Serializes a `jsonb` column value for an assignment.
fn json_value<T: Serialize>(value: Option<T>) -> BmmResult<Option<serde_json::Value>> {
    Ok(value.map(serde_json::to_value).transpose()?)
}

async fn load_relations(
    conn: &mut PgConnection,
    items: &mut [Site],
    relations: &[Relation],
) -> BmmResult<()> {
    if relations.contains(&Relation::InfrastructureProvider) {
        attach::<_, InfrastructureProvider, _, _>(
            conn,
            items,
            |s| Some(s.infrastructure_provider_id),
            |s, r| s.infrastructure_provider = Some(r),
        )
        .await?;
    }
    Ok(())
}

fn build_filter(filter: SiteFilterInput) -> SelectQuery {
    let mut query = SelectQuery::of::<Site>();
    query
        .any_opt("id", filter.ids)
        .any_opt("name", filter.names)
        .any_opt("org", filter.orgs)
        .any_opt("infrastructure_provider_id", filter.infrastructure_provider_ids)
        .any_opt("status", filter.statuses.map(|v| text_list(&v)))
        .eq_opt("is_serial_console_enabled", filter.is_serial_console_enabled);
    if let Some(search_query) = filter.search_query.as_deref() {
        query.search(SEARCH_COLUMNS, search_query);
    }
    query
}

fn update_assignments(input: SiteUpdateInput) -> BmmResult<Assignments> {
    let mut sets = Assignments::new();
    sets.set_opt("name", input.name)
        .set_opt("display_name", input.display_name)
        .set_opt("description", input.description)
        .set_opt("site_controller_version", input.site_controller_version)
        .set_opt("site_agent_version", input.site_agent_version)
        .set_opt("registration_token", input.registration_token)
        .set_opt("registration_token_expiration", input.registration_token_expiration)
        .set_opt("serial_console_hostname", input.serial_console_hostname)
        .set_opt("is_serial_console_enabled", input.is_serial_console_enabled)
        .set_opt("serial_console_idle_timeout", input.serial_console_idle_timeout)
        .set_opt(
            "serial_console_max_session_length",
            input.serial_console_max_session_length,
        )
        .set_opt(
            "is_serial_console_ssh_keys_enabled",
            input.is_serial_console_ssh_keys_enabled,
        )
        .set_opt("location", json_value(input.location)?)
        .set_opt("contact", json_value(input.contact)?)
        .set_opt("status", input.status);
    Ok(sets)
}

fn clear_assignments(input: &SiteClearInput) -> Assignments {
    let mut sets = Assignments::new();
    sets.clear_if("display_name", input.display_name)
        .clear_if("description", input.description)
        .clear_if("site_controller_version", input.site_controller_version)
        .clear_if("site_agent_version", input.site_agent_version)
        .clear_if("registration_token", input.registration_token)
        .clear_if("registration_token_expiration", input.registration_token_expiration)
        .clear_if("serial_console_hostname", input.serial_console_hostname)
        .clear_if("serial_console_idle_timeout", input.serial_console_idle_timeout)
        .clear_if(
            "serial_console_max_session_length",
            input.serial_console_max_session_length,
        )
        .clear_if("location", input.location)
        .clear_if("contact", input.contact);
    sets
}

#[async_trait]
impl SiteDao for PgSiteDaoImpl {
    #[tracing::instrument(
        name = "site.create",
        skip_all,
        fields(db.system = "postgresql", db.table = "site", site.name = %input.name)
    )]
    async fn create(&self, tx: Option<&mut Tx>, input: SiteCreateInput) -> BmmResult<Site> {
        input.validate_request()?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let id = Uuid::new_v4();
        debug!("Creating site {} ({}) for org {}", input.name, id, input.org);

        let site = sqlx::query_as::<_, Site>(INSERT_SQL)
            .bind(id)
            .bind(&input.name)
            .bind(&input.display_name)
            .bind(&input.description)
            .bind(&input.org)
            .bind(input.infrastructure_provider_id)
            .bind(&input.site_controller_version)
            .bind(&input.site_agent_version)
            .bind(&input.registration_token)
            .bind(input.registration_token_expiration)
            .bind(&input.serial_console_hostname)
            .bind(input.is_serial_console_enabled)
            .bind(input.serial_console_idle_timeout)
            .bind(input.serial_console_max_session_length)
            .bind(input.is_serial_console_ssh_keys_enabled)
            .bind(input.location.map(Json))
            .bind(input.contact.map(Json))
            .bind(input.status.as_str())
            .bind(db_now())
            .bind(input.created_by)
            .fetch_one(&mut *conn)
            .await?;

        Ok(site)
    }

    #[tracing::instrument(
        name = "site.get_by_id",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "site")
    )]
    async fn get_by_id(&self, tx: Option<&mut Tx>, id: Uuid, relations: &[Relation]) -> BmmResult<Site> {
        ensure_supported(Site::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        debug!("Finding site by id: {}", id);

        let site = common::fetch_by_key::<Site>(&mut conn, &key(id), &id.to_string()).await?;
        let mut items = [site];
        load_relations(&mut conn, &mut items, relations).await?;
        let [site] = items;
        Ok(site)
    }

    #[tracing::instrument(
        name = "site.get_all",
        skip_all,
        fields(db.system = "postgresql", db.table = "site")
    )]
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: SiteFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<Site>> {
        ensure_supported(Site::RESOURCE, relations, RELATIONS)?;
        let paginator = Paginator::new(&page, ORDER_COLUMNS)?;
        let query = build_filter(filter);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let mut page = paginator.fetch::<Site>(&mut conn, query).await?;
        load_relations(&mut conn, &mut page.items, relations).await?;
        Ok(page)
    }

    #[tracing::instrument(
        name = "site.update",
        skip_all,
        fields(db.system = "postgresql", db.table = "site", site.id = %input.id)
    )]
    async fn update(&self, tx: Option<&mut Tx>, input: SiteUpdateInput) -> BmmResult<Site> {
        input.validate_request()?;
        let id = input.id;
        let sets = update_assignments(input)?;

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<Site>(&mut conn, sets, &key(id), &id.to_string()).await
    }

    #[tracing::instrument(
        name = "site.clear",
        skip_all,
        fields(db.system = "postgresql", db.table = "site", site.id = %input.id)
    )]
    async fn clear(&self, tx: Option<&mut Tx>, input: SiteClearInput) -> BmmResult<Site> {
        let sets = clear_assignments(&input);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<Site>(&mut conn, sets, &key(input.id), &input.id.to_string()).await
    }

    #[tracing::instrument(
        name = "site.delete",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "site")
    )]
    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::soft_delete_by_key::<Site>(&mut conn, &key(id)).await?;
        Ok(())
    }

    #[tracing::instrument(
        name = "site.get_count_by_status",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "site")
    )]
    async fn get_count_by_status(
        &self,
        tx: Option<&mut Tx>,
        infrastructure_provider_id: Option<Uuid>,
    ) -> BmmResult<BTreeMap<String, u64>> {
        let mut query = SelectQuery::of::<Site>();
        query.eq_opt("infrastructure_provider_id", infrastructure_provider_id);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::count_by_status(&mut conn, &query, SiteStatus::NAMES).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SiteLocation;

    #[test]
    fn test_update_assignments_serializes_location() {
        let input = SiteUpdateInput {
            id: Uuid::nil(),
            location: Some(SiteLocation {
                city: Some("Santa Clara".to_string()),
                ..SiteLocation::default()
            }),
            ..SiteUpdateInput::default()
        };
        let sets = update_assignments(input).unwrap();
        assert_eq!(sets.columns(), vec!["location"]);
    }

    #[test]
    fn test_empty_update_has_no_assignments() {
        let sets = update_assignments(SiteUpdateInput::default()).unwrap();
        assert!(sets.is_empty());
    }

    #[test]
    fn test_clear_assignments() {
        let input = SiteClearInput {
            id: Uuid::nil(),
            description: true,
            contact: true,
            ..SiteClearInput::default()
        };
        assert_eq!(clear_assignments(&input).columns(), vec!["description", "contact"]);
    }

    #[test]
    fn test_search_filter_renders_every_column() {
        let query = build_filter(SiteFilterInput {
            search_query: Some("west".to_string()),
            ..SiteFilterInput::default()
        });
        let sql = query.count_builder().into_sql();
        for column in SEARCH_COLUMNS {
            assert!(sql.contains(&format!("st.{column}::text ILIKE")), "{sql}");
        }
    }
}
