//! Statement helpers shared by the PostgreSQL DAOs.

use crate::model::Model;
use crate::query::{push_key_filter, push_key_predicates, Assignments, Bind, SelectQuery};
use crate::session::db_now;
use bmm_core::{BmmError, BmmResult};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use tracing::debug;

/// Key of the all-statuses entry in status counts.
pub const TOTAL_COUNT_KEY: &str = "total";

/// Loads one live row by key or fails with the not-found sentinel.
pub(crate) async fn fetch_by_key<M: Model>(
    conn: &mut PgConnection,
    key: &[(&'static str, Bind)],
    id: &str,
) -> BmmResult<M> {
    let mut query = SelectQuery::of::<M>();
    for (column, value) in key {
        query.eq(column, value.clone());
    }

    query
        .select_builder(None)
        .build_query_as::<M>()
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| BmmError::not_found(M::RESOURCE, id))
}

/// Applies `sets` to a live row and returns it as stored.
///
/// An empty assignment list writes nothing and returns the current row.
pub(crate) async fn update_by_key<M: Model>(
    conn: &mut PgConnection,
    sets: Assignments,
    key: &[(&'static str, Bind)],
    id: &str,
) -> BmmResult<M> {
    if sets.is_empty() {
        debug!(table = M::TABLE, id, "Nothing to update");
        return fetch_by_key::<M>(conn, key, id).await;
    }

    debug!(table = M::TABLE, id, columns = ?sets.columns(), "Updating row");
    sets.update_builder::<M>(key, db_now())
        .build_query_as::<M>()
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| BmmError::not_found(M::RESOURCE, id))
}

/// Marks a live row deleted. Returns the number of rows affected.
pub(crate) async fn soft_delete_by_key<M: Model>(
    conn: &mut PgConnection,
    key: &[(&'static str, Bind)],
) -> BmmResult<u64> {
    let now = db_now();
    let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new("UPDATE ");
    qb.push(M::TABLE)
        .push(" SET deleted = ")
        .push_bind(now)
        .push(", updated = ")
        .push_bind(now);
    push_key_filter::<M>(&mut qb, key);

    let affected = qb.build().execute(&mut *conn).await?.rows_affected();
    debug!(table = M::TABLE, affected, "Soft deleted rows");
    Ok(affected)
}

/// Removes a row, deleted or not. Returns the number of rows affected.
pub(crate) async fn hard_delete_by_key<M: Model>(
    conn: &mut PgConnection,
    key: &[(&'static str, Bind)],
) -> BmmResult<u64> {
    let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new("DELETE FROM ");
    qb.push(M::TABLE);
    push_key_predicates(&mut qb, key);

    let affected = qb.build().execute(&mut *conn).await?.rows_affected();
    debug!(table = M::TABLE, affected, "Hard deleted rows");
    Ok(affected)
}

/// Counts rows per status; every known status is present, plus
/// [`TOTAL_COUNT_KEY`].
pub(crate) async fn count_by_status(
    conn: &mut PgConnection,
    query: &SelectQuery,
    statuses: &[&'static str],
) -> BmmResult<BTreeMap<String, u64>> {
    let rows: Vec<(String, i64)> = query
        .group_count_builder("status")
        .build_query_as::<(String, i64)>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(status_counts(statuses, rows))
}

fn status_counts(statuses: &[&'static str], rows: Vec<(String, i64)>) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> =
        statuses.iter().map(|status| ((*status).to_string(), 0)).collect();
    let mut total = 0;
    for (status, count) in rows {
        let count = u64::try_from(count).unwrap_or_default();
        total += count;
        counts.insert(status, count);
    }
    counts.insert(TOTAL_COUNT_KEY.to_string(), total);
    counts
}

/// Counts rows matching `query`.
pub(crate) async fn count(conn: &mut PgConnection, query: &SelectQuery) -> BmmResult<u64> {
    let total: i64 = query
        .count_builder()
        .build_query_scalar::<i64>()
        .fetch_one(&mut *conn)
        .await?;
    Ok(u64::try_from(total).unwrap_or_default())
}
