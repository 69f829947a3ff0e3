//! DAO layer.
//!
//! Each entity has a trait here and a PostgreSQL implementation under
//! `impl/postgres`. Every operation takes an optional [`Tx`](crate::Tx);
//! without one it runs on a pooled connection.

pub mod allocation_constraint_dao;
pub mod fabric_dao;
pub mod r#impl;
pub mod interface_dao;
pub mod ip_block_dao;
pub mod machine_interface_dao;
pub mod os_site_association_dao;
pub mod site_dao;
pub mod sku_dao;
pub mod tenant_account_dao;

pub use allocation_constraint_dao::*;
pub use fabric_dao::*;
pub use interface_dao::*;
pub use ip_block_dao::*;
pub use machine_interface_dao::*;
pub use os_site_association_dao::*;
pub use r#impl::*;
pub use site_dao::*;
pub use sku_dao::*;
pub use tenant_account_dao::*;
