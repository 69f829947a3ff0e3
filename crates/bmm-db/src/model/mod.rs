//! Database-backed entities.
//!
//! Each entity maps one table. [`Model`] carries the table metadata the
//! query helpers need; [`Keyed`] marks entities that can be eager-loaded as
//! a relation of another entity.

use crate::query::Bind;
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use std::hash::Hash;
use uuid::Uuid;

/// Declares a status-like enum persisted as text.
///
/// Generates `as_str`, `ALL`, `Display`, `FromStr`, `TryFrom<String>` (used
/// by `#[sqlx(try_from = "String")]`) and a conversion into a text bind.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Persisted text of every variant, in declaration order.
            pub const NAMES: &'static [&'static str] = &[$($text),+];

            /// Persisted text value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = bmm_core::BmmError;

            fn from_str(s: &str) -> Result<Self, bmm_core::BmmError> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(bmm_core::BmmError::validation(format!(
                        "invalid {} value: '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = bmm_core::BmmError;

            fn try_from(value: String) -> Result<Self, bmm_core::BmmError> {
                value.parse()
            }
        }

        impl From<$name> for $crate::query::Bind {
            fn from(value: $name) -> Self {
                $crate::query::Bind::Text(value.as_str().to_string())
            }
        }
    };
}

pub(crate) use text_enum;

pub mod allocation_constraint;
pub mod fabric;
pub mod interface;
pub mod ip_block;
pub mod machine_interface;
pub mod os_site_association;
pub mod related;
pub mod site;
pub mod sku;
pub mod tenant_account;

pub use allocation_constraint::*;
pub use fabric::*;
pub use interface::*;
pub use ip_block::*;
pub use machine_interface::*;
pub use os_site_association::*;
pub use related::*;
pub use site::*;
pub use sku::*;
pub use tenant_account::*;

/// Table metadata for an entity.
pub trait Model: for<'r> FromRow<'r, PgRow> + Send + Unpin + Clone {
    /// Table name.
    const TABLE: &'static str;
    /// Alias used in `SELECT` statements.
    const ALIAS: &'static str;
    /// Name reported in not-found errors.
    const RESOURCE: &'static str;
    /// Selected columns, in struct order.
    const COLUMNS: &'static [&'static str];
    /// Primary key columns.
    const PRIMARY_KEY: &'static [&'static str] = &["id"];
    /// Whether rows are soft deleted through a `deleted` timestamp.
    const SOFT_DELETE: bool = true;
}

/// Key type usable in `= ANY($1)` lookups.
pub trait ModelKey: Clone + Eq + Hash + Send + Sync + 'static {
    /// Wraps a batch of keys into an array bind.
    fn into_bind(keys: Vec<Self>) -> Bind;
}

impl ModelKey for Uuid {
    fn into_bind(keys: Vec<Self>) -> Bind {
        Bind::Uuids(keys)
    }
}

impl ModelKey for String {
    fn into_bind(keys: Vec<Self>) -> Bind {
        Bind::Texts(keys)
    }
}

/// An entity with a single-column key that relations point at.
pub trait Keyed: Model + Sync {
    /// Key type.
    type Key: ModelKey;

    /// Returns the row key.
    fn key(&self) -> Self::Key;
}


/// Converts a list of text enums into an array bind.
pub(crate) fn text_list<T: Copy + Into<Bind>>(values: &[T]) -> Bind {
    Bind::Texts(
        values
            .iter()
            .filter_map(|v| match (*v).into() {
                Bind::Text(s) => Some(s),
                _ => None,
            })
            .collect(),
    )
}
