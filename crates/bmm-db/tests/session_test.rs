//! Integration tests for transactions, advisory locks and the DAO module.

mod common;

use bmm_core::BmmError;
use bmm_db::{
    advisory_lock_id, dao_module_with_pool, DaoModule, FabricCreateInput, FabricDao,
    FabricStatus, PgFabricDaoImpl, Session, SessionInterface, SiteDao,
};
use common::{Fixture, TestDatabase};
use shaku::HasComponent;
use std::sync::Arc;

fn fabric_input(fixture: &Fixture, id: &str) -> FabricCreateInput {
    FabricCreateInput {
        id: id.to_string(),
        site_id: fixture.site_id,
        org: "provider-org".to_string(),
        infrastructure_provider_id: fixture.provider_id,
        status: FabricStatus::Pending,
    }
}

#[tokio::test]
async fn test_commit_persists_and_rollback_discards() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let session = Session::new(db.pool(), db.config());
    let dao = PgFabricDaoImpl::new(db.pool());

    let mut tx = session.begin_tx().await.expect("Failed to begin");
    dao.create(Some(&mut tx), fabric_input(&fixture, "committed"))
        .await
        .expect("Failed to create fabric");
    dao.get_by_id(Some(&mut tx), "committed", fixture.site_id, &[])
        .await
        .expect("Row should be visible inside its transaction");
    tx.commit().await.expect("Failed to commit");

    let mut tx = session.begin_tx().await.expect("Failed to begin");
    dao.create(Some(&mut tx), fabric_input(&fixture, "rolled-back"))
        .await
        .expect("Failed to create fabric");
    tx.rollback().await.expect("Failed to roll back");

    dao.get_by_id(None, "committed", fixture.site_id, &[])
        .await
        .expect("Committed fabric missing");
    let err = dao
        .get_by_id(None, "rolled-back", fixture.site_id, &[])
        .await
        .expect_err("Rolled back fabric visible");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_dropped_transaction_rolls_back() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let session = Session::new(db.pool(), db.config());
    let dao = PgFabricDaoImpl::new(db.pool());

    {
        let mut tx = session.begin_tx().await.expect("Failed to begin");
        dao.create(Some(&mut tx), fabric_input(&fixture, "dropped"))
            .await
            .expect("Failed to create fabric");
    }

    let err = dao
        .get_by_id(None, "dropped", fixture.site_id, &[])
        .await
        .expect_err("Dropped transaction committed");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_advisory_lock_contention() {
    let db = TestDatabase::new().await;
    let session = Session::new(db.pool(), db.config());
    let lock_id = advisory_lock_id("fabric/site-a");

    let mut holder = session.begin_tx().await.expect("Failed to begin");
    holder
        .acquire_advisory_lock(lock_id, false)
        .await
        .expect("First acquisition should succeed");

    let mut contender = session.begin_tx().await.expect("Failed to begin");
    let err = contender
        .acquire_advisory_lock(lock_id, false)
        .await
        .expect_err("Lock acquired twice");
    assert!(matches!(err, BmmError::AdvisoryLockFailed { lock_id: id } if id == lock_id));

    let err = contender
        .try_acquire_advisory_lock(lock_id)
        .await
        .expect_err("Lock acquired while held");
    assert!(matches!(err, BmmError::AdvisoryLockFailed { .. }));
    contender.rollback().await.expect("Failed to roll back");

    holder.commit().await.expect("Failed to commit");

    let mut next = session.begin_tx().await.expect("Failed to begin");
    next.try_acquire_advisory_lock(lock_id)
        .await
        .expect("Lock should be free after commit");
    next.acquire_advisory_lock(lock_id, true)
        .await
        .expect("Re-entrant blocking acquisition");
    next.commit().await.expect("Failed to commit");
}

#[tokio::test]
async fn test_dao_module_resolves_every_dao() {
    let db = TestDatabase::new().await;
    let fixture = Fixture::seed(db.pg()).await;
    let module = dao_module_with_pool(db.pg().clone(), db.config());

    let sites: Arc<dyn SiteDao> = module.resolve();
    let site = sites
        .get_by_id(None, fixture.site_id, &[])
        .await
        .expect("Failed to get site through module");
    assert_eq!(site.name, "site-a");

    let session: Arc<dyn SessionInterface> = module.resolve();
    let fabrics: Arc<dyn FabricDao> = module.resolve();
    let mut tx = session.begin_tx().await.expect("Failed to begin");
    fabrics
        .create(Some(&mut tx), fabric_input(&fixture, "via-module"))
        .await
        .expect("Failed to create fabric");
    tx.commit().await.expect("Failed to commit");

    resolves_all(&module);
}

fn resolves_all(module: &DaoModule) {
    let _: Arc<dyn bmm_db::IpBlockDao> = module.resolve();
    let _: Arc<dyn bmm_db::MachineInterfaceDao> = module.resolve();
    let _: Arc<dyn bmm_db::OperatingSystemSiteAssociationDao> = module.resolve();
    let _: Arc<dyn bmm_db::AllocationConstraintDao> = module.resolve();
    let _: Arc<dyn bmm_db::InterfaceDao> = module.resolve();
    let _: Arc<dyn bmm_db::SkuDao> = module.resolve();
    let _: Arc<dyn bmm_db::TenantAccountDao> = module.resolve();
}
