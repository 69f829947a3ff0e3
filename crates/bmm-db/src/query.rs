//! Dynamic SQL assembly on top of `sqlx::QueryBuilder`.
//!
//! Predicates are written with `?` placeholders and a matching list of
//! [`Bind`] values; rendering turns each `?` into a numbered parameter. The
//! same [`SelectQuery`] renders both the `COUNT(*)` and the windowed `SELECT`
//! so filters are applied identically to both.

use crate::model::Model;
use crate::search;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// A value bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Uuid(Uuid),
    Uuids(Vec<Uuid>),
    Text(String),
    Texts(Vec<String>),
    Int(i32),
    Ints(Vec<i32>),
    BigInt(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
    /// Rendered as a literal `NULL` so the column type is inferred.
    Null,
}

impl Bind {
    fn push_to(self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Self::Uuid(v) => {
                qb.push_bind(v);
            }
            Self::Uuids(v) => {
                qb.push_bind(v);
            }
            Self::Text(v) => {
                qb.push_bind(v);
            }
            Self::Texts(v) => {
                qb.push_bind(v);
            }
            Self::Int(v) => {
                qb.push_bind(v);
            }
            Self::Ints(v) => {
                qb.push_bind(v);
            }
            Self::BigInt(v) => {
                qb.push_bind(v);
            }
            Self::Bool(v) => {
                qb.push_bind(v);
            }
            Self::Timestamp(v) => {
                qb.push_bind(v);
            }
            Self::Json(v) => {
                qb.push_bind(sqlx::types::Json(v));
            }
            Self::Null => {
                qb.push("NULL");
            }
        }
    }
}

macro_rules! bind_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Bind {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        })*
    };
}

bind_from! {
    Uuid => Uuid,
    Vec<Uuid> => Uuids,
    String => Text,
    Vec<String> => Texts,
    i32 => Int,
    Vec<i32> => Ints,
    i64 => BigInt,
    bool => Bool,
    DateTime<Utc> => Timestamp,
    serde_json::Value => Json,
}

impl From<&str> for Bind {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Bind>> From<Option<T>> for Bind {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A SQL fragment with `?` placeholders and its binds.
#[derive(Debug, Clone)]
pub struct Fragment {
    sql: String,
    binds: Vec<Bind>,
}

impl Fragment {
    /// Creates a fragment; the number of `?` must equal `binds.len()`.
    #[must_use]
    pub fn new(sql: impl Into<String>, binds: Vec<Bind>) -> Self {
        let sql = sql.into();
        debug_assert_eq!(sql.matches('?').count(), binds.len(), "placeholder mismatch: {sql}");
        Self { sql, binds }
    }

    /// Appends the fragment to a builder, numbering the placeholders.
    pub fn push_to(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut binds = self.binds.iter().cloned();
        let mut parts = self.sql.split('?');
        if let Some(first) = parts.next() {
            qb.push(first);
        }
        for part in parts {
            if let Some(bind) = binds.next() {
                bind.push_to(qb);
            }
            qb.push(part);
        }
    }
}

/// A `SELECT` over one model table with accumulated predicates.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: &'static str,
    alias: &'static str,
    columns: String,
    joins: Vec<&'static str>,
    predicates: Vec<Fragment>,
    order: Vec<String>,
}

impl SelectQuery {
    /// Starts a query for `M`, excluding soft-deleted rows when the table has them.
    #[must_use]
    pub fn of<M: Model>() -> Self {
        let mut query = Self {
            table: M::TABLE,
            alias: M::ALIAS,
            columns: qualified_columns::<M>(),
            joins: Vec::new(),
            predicates: Vec::new(),
            order: Vec::new(),
        };
        if M::SOFT_DELETE {
            query.raw(format!("{}.deleted IS NULL", M::ALIAS), Vec::new());
        }
        query
    }

    /// Table alias used by column references.
    #[must_use]
    pub const fn alias(&self) -> &'static str {
        self.alias
    }

    /// Qualifies a column with the table alias.
    #[must_use]
    pub fn col(&self, column: &str) -> String {
        format!("{}.{}", self.alias, column)
    }

    /// Adds an arbitrary predicate.
    pub fn raw(&mut self, sql: impl Into<String>, binds: Vec<Bind>) -> &mut Self {
        self.predicates.push(Fragment::new(sql, binds));
        self
    }

    /// `column = value`.
    pub fn eq(&mut self, column: &str, value: impl Into<Bind>) -> &mut Self {
        let sql = format!("{} = ?", self.col(column));
        self.raw(sql, vec![value.into()])
    }

    /// `column = value` when the value is present.
    pub fn eq_opt<T: Into<Bind>>(&mut self, column: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.eq(column, value);
        }
        self
    }

    /// `column = ANY(values)`; an empty list matches nothing.
    pub fn any(&mut self, column: &str, values: impl Into<Bind>) -> &mut Self {
        let sql = format!("{} = ANY(?)", self.col(column));
        self.raw(sql, vec![values.into()])
    }

    /// `column = ANY(values)` when the list is present.
    pub fn any_opt<T: Into<Bind>>(&mut self, column: &str, values: Option<T>) -> &mut Self {
        if let Some(values) = values {
            self.any(column, values);
        }
        self
    }

    /// Array overlap: `column && values::text[]`.
    pub fn overlaps(&mut self, column: &str, values: Vec<String>) -> &mut Self {
        let sql = format!("{} && ?::text[]", self.col(column));
        self.raw(sql, vec![Bind::Texts(values)])
    }

    /// `column IS NULL`.
    pub fn is_null(&mut self, column: &str) -> &mut Self {
        let sql = format!("{} IS NULL", self.col(column));
        self.raw(sql, Vec::new())
    }

    /// Full-text search over `columns`, OR-ed with a per-column `ILIKE`.
    ///
    /// A blank query adds nothing; a query without usable terms only
    /// keeps the `ILIKE` branch.
    pub fn search(&mut self, columns: &[&str], query: &str) -> &mut Self {
        if query.trim().is_empty() || columns.is_empty() {
            return self;
        }

        let qualified: Vec<String> = columns.iter().map(|c| self.col(c)).collect();
        let mut branches = Vec::new();
        let mut binds = Vec::new();

        if let Some(tsquery) = search::to_tsquery_text(query) {
            let document = qualified
                .iter()
                .map(|c| format!("coalesce({c}::text, ' ')"))
                .collect::<Vec<_>>()
                .join(" || ' ' || ");
            branches.push(format!(
                "to_tsvector('english', {document}) @@ to_tsquery('english', ?)"
            ));
            binds.push(Bind::Text(tsquery));
        }

        let pattern = search::ilike_pattern(query);
        for column in &qualified {
            branches.push(format!("{column}::text ILIKE ?"));
            binds.push(Bind::Text(pattern.clone()));
        }

        self.raw(format!("({})", branches.join(" OR ")), binds)
    }

    /// Adds a join clause once.
    pub fn join(&mut self, clause: &'static str) -> &mut Self {
        if !self.joins.contains(&clause) {
            self.joins.push(clause);
        }
        self
    }

    /// Appends an `ORDER BY` term (already qualified, with direction).
    pub fn order(&mut self, term: impl Into<String>) -> &mut Self {
        self.order.push(term.into());
        self
    }

    fn push_from_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" FROM ").push(self.table).push(" AS ").push(self.alias);
        for join in &self.joins {
            qb.push(" ").push(*join);
        }
        for (i, predicate) in self.predicates.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            predicate.push_to(qb);
        }
    }

    /// Renders `SELECT COUNT(*) ...`.
    #[must_use]
    pub fn count_builder(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*)");
        self.push_from_where(&mut qb);
        qb
    }

    /// Renders `SELECT column, COUNT(*) ... GROUP BY column`.
    #[must_use]
    pub fn group_count_builder(&self, column: &str) -> QueryBuilder<'static, Postgres> {
        let column = self.col(column);
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(&column).push(", COUNT(*)");
        self.push_from_where(&mut qb);
        qb.push(" GROUP BY ").push(column);
        qb
    }

    /// Renders the row `SELECT` with ordering and an optional window.
    #[must_use]
    pub fn select_builder(&self, window: Option<(u64, u64)>) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(&self.columns);
        self.push_from_where(&mut qb);
        if !self.order.is_empty() {
            qb.push(" ORDER BY ").push(self.order.join(", "));
        }
        if let Some((offset, limit)) = window {
            qb.push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .push(" OFFSET ")
                .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
        }
        qb
    }
}

/// `alias.col1, alias.col2, ...` for `M`.
#[must_use]
pub fn qualified_columns<M: Model>() -> String {
    M::COLUMNS
        .iter()
        .map(|c| format!("{}.{}", M::ALIAS, c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `col1, col2, ...` for `RETURNING` / `INSERT` lists.
#[must_use]
pub fn plain_columns<M: Model>() -> String {
    M::COLUMNS.join(", ")
}

/// `SET` list of an `UPDATE`.
///
/// `updated` is appended automatically when at least one column changes.
#[derive(Debug, Default)]
pub struct Assignments {
    sets: Vec<(&'static str, Bind)>,
}

impl Assignments {
    /// Creates an empty assignment list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = value`.
    pub fn set(&mut self, column: &'static str, value: impl Into<Bind>) -> &mut Self {
        self.sets.push((column, value.into()));
        self
    }

    /// `column = value` when the value is present.
    pub fn set_opt<T: Into<Bind>>(&mut self, column: &'static str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    /// `column = NULL` when `flag` is set.
    pub fn clear_if(&mut self, column: &'static str, flag: bool) -> &mut Self {
        if flag {
            self.sets.push((column, Bind::Null));
        }
        self
    }

    /// Returns true when nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Column names that will be written, in order.
    #[must_use]
    pub fn columns(&self) -> Vec<&'static str> {
        self.sets.iter().map(|(c, _)| *c).collect()
    }

    /// Renders `UPDATE table SET ..., updated = now WHERE <key>` (live rows only)
    /// `RETURNING` all model columns.
    #[must_use]
    pub fn update_builder<M: Model>(
        self,
        key: &[(&'static str, Bind)],
        now: DateTime<Utc>,
    ) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("UPDATE ");
        qb.push(M::TABLE).push(" SET ");
        for (column, value) in self.sets {
            qb.push(column).push(" = ");
            value.push_to(&mut qb);
            qb.push(", ");
        }
        qb.push("updated = ").push_bind(now);
        push_key_filter::<M>(&mut qb, key);
        qb.push(" RETURNING ").push(plain_columns::<M>());
        qb
    }
}

/// ` WHERE k1 = $1 AND k2 = $2 [AND deleted IS NULL]`.
pub fn push_key_filter<M: Model>(qb: &mut QueryBuilder<'_, Postgres>, key: &[(&'static str, Bind)]) {
    push_key_predicates(qb, key);
    if M::SOFT_DELETE {
        qb.push(" AND deleted IS NULL");
    }
}

/// ` WHERE k1 = $1 AND k2 = $2`, matching deleted rows too.
pub fn push_key_predicates(qb: &mut QueryBuilder<'_, Postgres>, key: &[(&'static str, Bind)]) {
    for (i, (column, value)) in key.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(*column).push(" = ");
        value.clone().push_to(qb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sku;
    use crate::model::IpBlock;

    #[test]
    fn test_fragment_numbers_placeholders() {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT 1 WHERE ");
        Fragment::new("a = ? AND b = ANY(?)", vec![Bind::Int(1), Bind::Ints(vec![2, 3])])
            .push_to(&mut qb);
        assert_eq!(qb.sql(), "SELECT 1 WHERE a = $1 AND b = ANY($2)");
    }

    #[test]
    fn test_null_bind_renders_literal() {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("");
        Fragment::new("x = ?", vec![Bind::from(None::<Uuid>)]).push_to(&mut qb);
        assert_eq!(qb.sql(), "x = NULL");
    }

    #[test]
    fn test_soft_delete_guard_added() {
        let query = SelectQuery::of::<IpBlock>();
        let qb = query.count_builder();
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM ip_block AS ipb WHERE ipb.deleted IS NULL"
        );
    }

    #[test]
    fn test_hard_delete_table_has_no_guard() {
        let query = SelectQuery::of::<Sku>();
        assert_eq!(query.count_builder().sql(), "SELECT COUNT(*) FROM sku AS sk");
    }

    #[test]
    fn test_filters_and_window() {
        let mut query = SelectQuery::of::<IpBlock>();
        query
            .any("site_id", vec![Uuid::nil()])
            .eq_opt("full_grant", Some(true))
            .eq_opt::<bool>("unused", None)
            .is_null("tenant_id")
            .order("ipb.created ASC");
        let sql = query.select_builder(Some((10, 5))).into_sql();
        assert!(sql.contains(
            "WHERE ipb.deleted IS NULL AND ipb.site_id = ANY($1) AND ipb.full_grant = $2 AND ipb.tenant_id IS NULL"
        ));
        assert!(sql.ends_with("ORDER BY ipb.created ASC LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn test_search_clause_shape() {
        let mut query = SelectQuery::of::<IpBlock>();
        query.search(&["name", "status"], "ready");
        let sql = query.count_builder().into_sql();
        assert!(sql.contains(
            "(to_tsvector('english', coalesce(ipb.name::text, ' ') || ' ' || coalesce(ipb.status::text, ' ')) @@ to_tsquery('english', $1) OR ipb.name::text ILIKE $2 OR ipb.status::text ILIKE $3)"
        ));
    }

    #[test]
    fn test_search_without_terms_keeps_ilike_only() {
        let mut query = SelectQuery::of::<IpBlock>();
        query.search(&["name"], "%%");
        let sql = query.count_builder().into_sql();
        assert!(!sql.contains("to_tsvector"));
        assert!(sql.contains("(ipb.name::text ILIKE $1)"));
    }

    #[test]
    fn test_blank_search_adds_nothing() {
        let mut query = SelectQuery::of::<IpBlock>();
        query.search(&["name"], "   ");
        assert!(!query.count_builder().into_sql().contains("ILIKE"));
    }

    #[test]
    fn test_joins_are_deduplicated() {
        let mut query = SelectQuery::of::<IpBlock>();
        query
            .join("LEFT JOIN site AS st ON st.id = ipb.site_id")
            .join("LEFT JOIN site AS st ON st.id = ipb.site_id");
        assert_eq!(
            query.count_builder().into_sql().matches("LEFT JOIN").count(),
            1
        );
    }

    #[test]
    fn test_group_count_builder() {
        let mut query = SelectQuery::of::<IpBlock>();
        query.eq("site_id", Uuid::nil());
        assert_eq!(
            query.group_count_builder("status").sql(),
            "SELECT ipb.status, COUNT(*) FROM ip_block AS ipb WHERE ipb.deleted IS NULL AND ipb.site_id = $1 GROUP BY ipb.status"
        );
    }

    #[test]
    fn test_update_builder() {
        let mut sets = Assignments::new();
        sets.set("name", "blk").clear_if("description", true).clear_if("tenant_id", false);
        assert_eq!(sets.columns(), vec!["name", "description"]);

        let sql = sets
            .update_builder::<IpBlock>(&[("id", Bind::Uuid(Uuid::nil()))], Utc::now())
            .into_sql();
        assert!(sql.starts_with(
            "UPDATE ip_block SET name = $1, description = NULL, updated = $2 WHERE id = $3 AND deleted IS NULL RETURNING id, "
        ));
    }
}
