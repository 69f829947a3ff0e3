//! Relation inclusion.
//!
//! Callers name the relations to eager-load; each DAO declares which ones it
//! supports. Loading is batched: one `id = ANY($1)` query per relation per
//! call, and soft-deleted related rows are never attached.

use crate::model::{Keyed, ModelKey};
use crate::query::SelectQuery;
use bmm_core::{BmmError, BmmResult};
use sqlx::PgConnection;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A relation that can be eager-loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Site,
    InfrastructureProvider,
    Tenant,
    TenantContact,
    OperatingSystem,
    Allocation,
    Machine,
    Subnet,
    Instance,
    VpcPrefix,
    MachineInterface,
}

impl Relation {
    /// Name callers use to request the relation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Site => "Site",
            Self::InfrastructureProvider => "InfrastructureProvider",
            Self::Tenant => "Tenant",
            Self::TenantContact => "TenantContact",
            Self::OperatingSystem => "OperatingSystem",
            Self::Allocation => "Allocation",
            Self::Machine => "Machine",
            Self::Subnet => "Subnet",
            Self::Instance => "Instance",
            Self::VpcPrefix => "VpcPrefix",
            Self::MachineInterface => "MachineInterface",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Relation {
    type Err = BmmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Site" => Ok(Self::Site),
            "InfrastructureProvider" => Ok(Self::InfrastructureProvider),
            "Tenant" => Ok(Self::Tenant),
            "TenantContact" => Ok(Self::TenantContact),
            "OperatingSystem" => Ok(Self::OperatingSystem),
            "Allocation" => Ok(Self::Allocation),
            "Machine" => Ok(Self::Machine),
            "Subnet" => Ok(Self::Subnet),
            "Instance" => Ok(Self::Instance),
            "VpcPrefix" => Ok(Self::VpcPrefix),
            "MachineInterface" => Ok(Self::MachineInterface),
            other => Err(BmmError::invalid_params(format!("unknown relation '{other}'"))),
        }
    }
}

/// Parses caller-supplied relation names, dropping duplicates.
pub fn parse_relations<S: AsRef<str>>(names: &[S]) -> BmmResult<Vec<Relation>> {
    let mut relations = Vec::with_capacity(names.len());
    for name in names {
        let relation: Relation = name.as_ref().parse()?;
        if !relations.contains(&relation) {
            relations.push(relation);
        }
    }
    Ok(relations)
}

/// Rejects relations the entity cannot load.
pub(crate) fn ensure_supported(
    entity: &str,
    requested: &[Relation],
    supported: &[Relation],
) -> BmmResult<()> {
    match requested.iter().find(|r| !supported.contains(r)) {
        Some(relation) => Err(BmmError::invalid_params(format!(
            "relation '{relation}' is not supported by {entity}"
        ))),
        None => Ok(()),
    }
}

/// Loads live rows of `T` by key in one query.
pub(crate) async fn load_map<T: Keyed>(
    conn: &mut PgConnection,
    keys: Vec<T::Key>,
) -> BmmResult<HashMap<T::Key, T>> {
    let keys: Vec<T::Key> = keys
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if keys.is_empty() {
        return Ok(HashMap::new());
    }

    let mut query = SelectQuery::of::<T>();
    query.any("id", <T::Key as ModelKey>::into_bind(keys));
    let rows: Vec<T> = query
        .select_builder(None)
        .build_query_as::<T>()
        .fetch_all(&mut *conn)
        .await?;

    debug!(table = T::TABLE, count = rows.len(), "Loaded relation rows");
    Ok(rows.into_iter().map(|row| (row.key(), row)).collect())
}

/// Loads `T` for every item that references one and stores it with `set`.
pub(crate) async fn attach<P, T, K, S>(
    conn: &mut PgConnection,
    items: &mut [P],
    key_of: K,
    set: S,
) -> BmmResult<()>
where
    P: Send,
    T: Keyed,
    K: Fn(&P) -> Option<T::Key> + Send,
    S: Fn(&mut P, T) + Send,
{
    let keys: Vec<T::Key> = items.iter().filter_map(&key_of).collect();
    let related = load_map::<T>(conn, keys).await?;

    for item in items.iter_mut() {
        if let Some(row) = key_of(&*item).and_then(|key| related.get(&key).cloned()) {
            set(item, row);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relations() {
        let relations = parse_relations(&["Site", "Tenant", "Site"]).unwrap();
        assert_eq!(relations, vec![Relation::Site, Relation::Tenant]);
    }

    #[test]
    fn test_parse_unknown_relation() {
        let err = parse_relations(&["Site", "Vpc"]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMS");
        assert!(err.to_string().contains("Vpc"));
    }

    #[test]
    fn test_relation_names_round_trip() {
        for relation in [
            Relation::Site,
            Relation::InfrastructureProvider,
            Relation::Tenant,
            Relation::TenantContact,
            Relation::OperatingSystem,
            Relation::Allocation,
            Relation::Machine,
            Relation::Subnet,
            Relation::Instance,
            Relation::VpcPrefix,
            Relation::MachineInterface,
        ] {
            assert_eq!(relation.name().parse::<Relation>().unwrap(), relation);
        }
    }

    #[test]
    fn test_ensure_supported() {
        let supported = [Relation::Site, Relation::Tenant];
        assert!(ensure_supported("IpBlock", &[Relation::Site], &supported).is_ok());
        assert!(ensure_supported("IpBlock", &[], &supported).is_ok());

        let err = ensure_supported("IpBlock", &[Relation::Machine], &supported).unwrap_err();
        assert!(matches!(err, BmmError::InvalidParams(_)));
    }
}
