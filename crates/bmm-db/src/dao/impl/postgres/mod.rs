//! PostgreSQL DAOs built on SQLx.

mod common;

mod allocation_constraint_dao_impl;
mod fabric_dao_impl;
mod interface_dao_impl;
mod ip_block_dao_impl;
mod machine_interface_dao_impl;
mod os_site_association_dao_impl;
mod site_dao_impl;
mod sku_dao_impl;
mod tenant_account_dao_impl;

pub use allocation_constraint_dao_impl::PgAllocationConstraintDaoImpl;
pub use common::TOTAL_COUNT_KEY;
pub use fabric_dao_impl::PgFabricDaoImpl;
pub use interface_dao_impl::PgInterfaceDaoImpl;
pub use ip_block_dao_impl::PgIpBlockDaoImpl;
pub use machine_interface_dao_impl::PgMachineInterfaceDaoImpl;
pub use os_site_association_dao_impl::{image_version, PgOperatingSystemSiteAssociationDaoImpl};
pub use site_dao_impl::PgSiteDaoImpl;
pub use sku_dao_impl::PgSkuDaoImpl;
pub use tenant_account_dao_impl::PgTenantAccountDaoImpl;
