//! Dependency injection module using Shaku.
//!
//! [`DaoModule`] wires the pool, the session and every PostgreSQL DAO.
//! Callers resolve DAOs by interface:
//!
//! ```ignore
//! let module = build_dao_module(&config.database).await?;
//! let sites: Arc<dyn SiteDao> = module.resolve();
//! ```

use crate::dao::{
    PgAllocationConstraintDaoImpl, PgFabricDaoImpl, PgInterfaceDaoImpl, PgIpBlockDaoImpl,
    PgMachineInterfaceDaoImpl, PgOperatingSystemSiteAssociationDaoImpl, PgSiteDaoImpl,
    PgSkuDaoImpl, PgTenantAccountDaoImpl,
};
use crate::pool::{DatabasePool, DatabasePoolInterface, DatabasePoolParameters};
use crate::session::{Session, SessionParameters};
use bmm_config::DatabaseConfig;
use bmm_core::BmmResult;
use shaku::module;
use sqlx::PgPool;
use std::sync::Arc;

module! {
    pub DaoModule {
        components = [
            DatabasePool,
            Session,
            PgIpBlockDaoImpl,
            PgMachineInterfaceDaoImpl,
            PgOperatingSystemSiteAssociationDaoImpl,
            PgAllocationConstraintDaoImpl,
            PgInterfaceDaoImpl,
            PgFabricDaoImpl,
            PgSiteDaoImpl,
            PgSkuDaoImpl,
            PgTenantAccountDaoImpl,
        ],
        providers = [],
    }
}

/// Connects to the database and builds the DAO module.
pub async fn build_dao_module(config: &DatabaseConfig) -> BmmResult<Arc<DaoModule>> {
    let db_pool = DatabasePool::connect(config).await?;
    Ok(dao_module_with_pool(db_pool.inner().clone(), config))
}

/// Builds the DAO module over an existing pool.
#[must_use]
pub fn dao_module_with_pool(pool: PgPool, config: &DatabaseConfig) -> Arc<DaoModule> {
    let module = DaoModule::builder()
        .with_component_parameters::<DatabasePool>(DatabasePoolParameters { pool })
        .with_component_parameters::<Session>(SessionParameters {
            lock_timeout_secs: config.lock_timeout_secs,
            advisory_lock: config.advisory_lock.clone(),
        })
        .build();

    Arc::new(module)
}
