//! PostgreSQL implementation of [`OperatingSystemSiteAssociationDao`].

use super::common;
use crate::dao::os_site_association_dao::{
    OperatingSystemSiteAssociationClearInput, OperatingSystemSiteAssociationCreateInput,
    OperatingSystemSiteAssociationDao, OperatingSystemSiteAssociationFilterInput,
    OperatingSystemSiteAssociationUpdateInput,
};
use crate::model::{text_list, Model, OperatingSystem, OperatingSystemSiteAssociation, Site};
use crate::paginator::{OrderColumn, Paginator};
use crate::query::{Assignments, Bind, SelectQuery};
use crate::relation::{attach, ensure_supported, Relation};
use crate::session::{db_now, DbConn, Tx};
use crate::DatabasePoolInterface;
use async_trait::async_trait;
use bmm_core::{BmmResult, Page, PageInput};
use sha1::{Digest, Sha1};
use shaku::Component;
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const RELATIONS: &[Relation] = &[Relation::OperatingSystem, Relation::Site];

const ORDER_COLUMNS: &[OrderColumn] = &[
    OrderColumn::new("status", &["status"]),
    OrderColumn::new("created", &["created"]),
    OrderColumn::new("updated", &["updated"]),
];

const INSERT_SQL: &str = r#"
    INSERT INTO operating_system_site_association (
        id, operating_system_id, site_id, version, status, is_missing_on_site,
        created, updated, created_by
    )
    VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6, $7)
    RETURNING id, operating_system_id, site_id, version, status, is_missing_on_site,
              created, updated, deleted, created_by
"#;

/// PostgreSQL operating system site association DAO.
#[derive(Component, Clone)]
#[shaku(interface = OperatingSystemSiteAssociationDao)]
pub struct PgOperatingSystemSiteAssociationDaoImpl {
    #[shaku(inject)]
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PgOperatingSystemSiteAssociationDaoImpl {
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

fn key(id: Uuid) -> [(&'static str, Bind); 1] {
    [("id", Bind::Uuid(id))]
}

/// Hex SHA-1 over the operating system id, then each present image
/// attribute, then one byte for block storage.
///
/// Without an operating system only the id is hashed.
#[must_use]
pub fn image_version(operating_system_id: Uuid, os: Option<&OperatingSystem>) -> String {
    let mut hasher = Sha1::new();
    hasher.update(operating_system_id.to_string().as_bytes());

    if let Some(os) = os {
        let attributes = [
            &os.image_url,
            &os.image_sha,
            &os.image_auth_type,
            &os.image_auth_token,
            &os.image_disk,
            &os.root_fs_id,
            &os.root_fs_label,
        ];
        for value in attributes.into_iter().flatten() {
            hasher.update(value.as_bytes());
        }
        hasher.update([u8::from(os.enable_block_storage)]);
    }

    hex::encode(hasher.finalize())
}

async fn load_relations(
    conn: &mut PgConnection,
    items: &mut [OperatingSystemSiteAssociation],
    relations: &[Relation],
) -> BmmResult<()> {
    for relation in relations {
        match relation {
            Relation::OperatingSystem => {
                attach::<_, OperatingSystem, _, _>(
                    conn,
                    items,
                    |a| Some(a.operating_system_id),
                    |a, r| a.operating_system = Some(r),
                )
                .await?;
            }
            Relation::Site => {
                attach::<_, Site, _, _>(conn, items, |a| Some(a.site_id), |a, r| a.site = Some(r))
                    .await?;
            }
            _ => {}
        }
    }
    Ok(())
}

#[async_trait]
impl OperatingSystemSiteAssociationDao for PgOperatingSystemSiteAssociationDaoImpl {
    #[tracing::instrument(
        name = "operating_system_site_association.create",
        skip_all,
        fields(
            db.system = "postgresql",
            db.table = "operating_system_site_association",
            operating_system_id = %input.operating_system_id,
            site_id = %input.site_id
        )
    )]
    async fn create(
        &self,
        tx: Option<&mut Tx>,
        input: OperatingSystemSiteAssociationCreateInput,
    ) -> BmmResult<OperatingSystemSiteAssociation> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let id = Uuid::new_v4();
        debug!("Creating operating system site association {}", id);

        let association = sqlx::query_as::<_, OperatingSystemSiteAssociation>(INSERT_SQL)
            .bind(id)
            .bind(input.operating_system_id)
            .bind(input.site_id)
            .bind(&input.version)
            .bind(input.status.as_str())
            .bind(db_now())
            .bind(input.created_by)
            .fetch_one(&mut *conn)
            .await?;

        Ok(association)
    }

    #[tracing::instrument(
        name = "operating_system_site_association.get_by_id",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "operating_system_site_association")
    )]
    async fn get_by_id(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<OperatingSystemSiteAssociation> {
        ensure_supported(OperatingSystemSiteAssociation::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;

        let association = common::fetch_by_key::<OperatingSystemSiteAssociation>(
            &mut conn,
            &key(id),
            &id.to_string(),
        )
        .await?;
        let mut items = [association];
        load_relations(&mut conn, &mut items, relations).await?;
        let [association] = items;
        Ok(association)
    }

    #[tracing::instrument(
        name = "operating_system_site_association.get_by_operating_system_id_and_site_id",
        skip(self, tx, relations),
        fields(db.system = "postgresql", db.table = "operating_system_site_association")
    )]
    async fn get_by_operating_system_id_and_site_id(
        &self,
        tx: Option<&mut Tx>,
        operating_system_id: Uuid,
        site_id: Uuid,
        relations: &[Relation],
    ) -> BmmResult<OperatingSystemSiteAssociation> {
        ensure_supported(OperatingSystemSiteAssociation::RESOURCE, relations, RELATIONS)?;
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;

        let association = common::fetch_by_key::<OperatingSystemSiteAssociation>(
            &mut conn,
            &[
                ("operating_system_id", Bind::Uuid(operating_system_id)),
                ("site_id", Bind::Uuid(site_id)),
            ],
            &format!("{operating_system_id}/{site_id}"),
        )
        .await?;
        let mut items = [association];
        load_relations(&mut conn, &mut items, relations).await?;
        let [association] = items;
        Ok(association)
    }

    #[tracing::instrument(
        name = "operating_system_site_association.get_all",
        skip_all,
        fields(db.system = "postgresql", db.table = "operating_system_site_association")
    )]
    async fn get_all(
        &self,
        tx: Option<&mut Tx>,
        filter: OperatingSystemSiteAssociationFilterInput,
        page: PageInput,
        relations: &[Relation],
    ) -> BmmResult<Page<OperatingSystemSiteAssociation>> {
        ensure_supported(OperatingSystemSiteAssociation::RESOURCE, relations, RELATIONS)?;
        let paginator = Paginator::new(&page, ORDER_COLUMNS)?;

        let mut query = SelectQuery::of::<OperatingSystemSiteAssociation>();
        query
            .any_opt("operating_system_id", filter.operating_system_ids)
            .any_opt("site_id", filter.site_ids)
            .any_opt("version", filter.versions)
            .any_opt("status", filter.statuses.map(|v| text_list(&v)))
            .eq_opt("is_missing_on_site", filter.is_missing_on_site);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        let mut page = paginator
            .fetch::<OperatingSystemSiteAssociation>(&mut conn, query)
            .await?;
        load_relations(&mut conn, &mut page.items, relations).await?;
        Ok(page)
    }

    #[tracing::instrument(
        name = "operating_system_site_association.generate_and_update_version",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "operating_system_site_association")
    )]
    async fn generate_and_update_version(
        &self,
        tx: Option<&mut Tx>,
        id: Uuid,
    ) -> BmmResult<OperatingSystemSiteAssociation> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;

        let association = common::fetch_by_key::<OperatingSystemSiteAssociation>(
            &mut conn,
            &key(id),
            &id.to_string(),
        )
        .await?;
        let mut items = [association];
        load_relations(&mut conn, &mut items, &[Relation::OperatingSystem]).await?;
        let [association] = items;

        let version = image_version(
            association.operating_system_id,
            association.operating_system.as_ref(),
        );
        debug!("Computed version {} for association {}", version, id);

        let mut sets = Assignments::new();
        sets.set("version", version);
        common::update_by_key::<OperatingSystemSiteAssociation>(
            &mut conn,
            sets,
            &key(id),
            &id.to_string(),
        )
        .await
    }

    #[tracing::instrument(
        name = "operating_system_site_association.update",
        skip_all,
        fields(
            db.system = "postgresql",
            db.table = "operating_system_site_association",
            operating_system_site_association.id = %input.id
        )
    )]
    async fn update(
        &self,
        tx: Option<&mut Tx>,
        input: OperatingSystemSiteAssociationUpdateInput,
    ) -> BmmResult<OperatingSystemSiteAssociation> {
        let mut sets = Assignments::new();
        sets.set_opt("operating_system_id", input.operating_system_id)
            .set_opt("site_id", input.site_id)
            .set_opt("version", input.version)
            .set_opt("status", input.status)
            .set_opt("is_missing_on_site", input.is_missing_on_site);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<OperatingSystemSiteAssociation>(
            &mut conn,
            sets,
            &key(input.id),
            &input.id.to_string(),
        )
        .await
    }

    #[tracing::instrument(
        name = "operating_system_site_association.clear",
        skip_all,
        fields(
            db.system = "postgresql",
            db.table = "operating_system_site_association",
            operating_system_site_association.id = %input.id
        )
    )]
    async fn clear(
        &self,
        tx: Option<&mut Tx>,
        input: OperatingSystemSiteAssociationClearInput,
    ) -> BmmResult<OperatingSystemSiteAssociation> {
        let mut sets = Assignments::new();
        sets.clear_if("version", input.version);

        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::update_by_key::<OperatingSystemSiteAssociation>(
            &mut conn,
            sets,
            &key(input.id),
            &input.id.to_string(),
        )
        .await
    }

    #[tracing::instrument(
        name = "operating_system_site_association.delete",
        skip(self, tx),
        fields(db.system = "postgresql", db.table = "operating_system_site_association")
    )]
    async fn delete(&self, tx: Option<&mut Tx>, id: Uuid) -> BmmResult<()> {
        let mut conn = DbConn::acquire(self.pool.inner(), tx).await?;
        common::soft_delete_by_key::<OperatingSystemSiteAssociation>(&mut conn, &key(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn operating_system(image_url: Option<&str>, enable_block_storage: bool) -> OperatingSystem {
        let now = Utc::now();
        OperatingSystem {
            id: Uuid::nil(),
            name: "ubuntu".to_string(),
            description: None,
            org: "acme".to_string(),
            image_url: image_url.map(str::to_string),
            image_sha: None,
            image_auth_type: None,
            image_auth_token: None,
            image_disk: None,
            root_fs_id: None,
            root_fs_label: None,
            enable_block_storage,
            status: "Ready".to_string(),
            created: now,
            updated: now,
        }
    }

    #[test]
    fn test_version_without_operating_system_hashes_id_only() {
        let id = Uuid::nil();
        let expected = hex::encode(Sha1::digest(id.to_string().as_bytes()));
        assert_eq!(image_version(id, None), expected);
        assert_eq!(image_version(id, None), "b602d594afd2b0b327e07a06f36ca6a7e42546d0");
    }

    #[test]
    fn test_version_appends_block_storage_byte() {
        let id = Uuid::nil();
        let os = operating_system(Some("https://img/ubuntu.qcow2"), true);

        let mut bytes = id.to_string().into_bytes();
        bytes.extend_from_slice(b"https://img/ubuntu.qcow2");
        bytes.push(1);
        assert_eq!(image_version(id, Some(&os)), hex::encode(Sha1::digest(&bytes)));
    }

    #[test]
    fn test_version_changes_with_image_attributes() {
        let id = Uuid::nil();
        let a = image_version(id, Some(&operating_system(Some("https://img/a"), false)));
        let b = image_version(id, Some(&operating_system(Some("https://img/b"), false)));
        let c = image_version(id, Some(&operating_system(Some("https://img/a"), true)));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 40);
    }
}
