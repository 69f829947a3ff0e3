//! # BMM DB
//!
//! PostgreSQL data access for bare-metal infrastructure entities.
//!
//! ```text
//! caller
//!   ↓  Arc<dyn SiteDao>, Arc<dyn IpBlockDao>, ...   (DAO interfaces)
//! PgSiteDaoImpl, PgIpBlockDaoImpl, ...              (DAO impls, SQLx)
//!   ↓  DbConn: pooled connection or caller's Tx
//! PostgreSQL
//! ```
//!
//! ## Structure
//!
//! ```text
//! src/
//!   pool.rs          ← DatabasePool (shaku component)
//!   session.rs       ← Session, Tx, advisory locks, DbConn
//!   model/           ← row types, one file per entity
//!   query.rs         ← SelectQuery / Assignments on sqlx::QueryBuilder
//!   search.rs        ← tsquery and ILIKE term handling
//!   paginator.rs     ← order-by validation, count + window
//!   relation.rs      ← relation names and batched eager loading
//!   dao/
//!     <entity>_dao.rs          ← trait + inputs
//!     impl/postgres/           ← Pg<Entity>DaoImpl
//!   di.rs            ← DaoModule
//! ```

pub mod dao;
pub mod di;
pub mod model;
pub mod paginator;
pub mod pool;
pub mod query;
pub mod relation;
pub mod search;
pub mod session;

pub use dao::*;
pub use di::*;
pub use model::*;
pub use paginator::{OrderColumn, Paginator, DEFAULT_ORDER_FIELD};
pub use pool::*;
pub use relation::{parse_relations, Relation};
pub use session::*;
