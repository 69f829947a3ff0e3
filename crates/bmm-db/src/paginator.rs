//! Offset pagination with validated ordering.

use crate::model::Model;
use crate::query::SelectQuery;
use bmm_core::{BmmError, BmmResult, Page, PageInput, SortOrder};
use sqlx::PgConnection;
use tracing::debug;

/// Field used when the caller does not ask for an order.
pub const DEFAULT_ORDER_FIELD: &str = "created";

/// A field callers may order by, and the columns it sorts on.
#[derive(Debug, Clone, Copy)]
pub struct OrderColumn {
    pub field: &'static str,
    /// Own columns are qualified with the table alias; columns of a joined
    /// table are used as written.
    pub columns: &'static [&'static str],
    pub join: Option<&'static str>,
}

impl OrderColumn {
    /// Orders by columns of the entity's own table.
    #[must_use]
    pub const fn new(field: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            field,
            columns,
            join: None,
        }
    }

    /// Orders by columns of a table reached through `join`.
    #[must_use]
    pub const fn joined(
        field: &'static str,
        columns: &'static [&'static str],
        join: &'static str,
    ) -> Self {
        Self {
            field,
            columns,
            join: Some(join),
        }
    }
}

/// Applies ordering, counting and windowing to a [`SelectQuery`].
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    offset: u64,
    limit: u64,
    order: SortOrder,
    column: OrderColumn,
}

impl Paginator {
    /// Validates the requested order against `allowed`.
    pub fn new(input: &PageInput, allowed: &[OrderColumn]) -> BmmResult<Self> {
        let (field, order) = input.order_by.as_ref().map_or(
            (DEFAULT_ORDER_FIELD, SortOrder::Asc),
            |order_by| (order_by.field.as_str(), order_by.order),
        );

        let column = allowed
            .iter()
            .find(|c| c.field == field)
            .copied()
            .ok_or_else(|| BmmError::InvalidOrderBy {
                field: field.to_string(),
            })?;

        Ok(Self {
            offset: input.offset(),
            limit: input.limit(),
            order,
            column,
        })
    }

    /// Window offset.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Window size.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Adds the `ORDER BY` terms, including a primary key tiebreak so pages
    /// are stable.
    pub fn apply_order<M: Model>(&self, query: &mut SelectQuery) {
        let direction = self.order.as_sql();
        if let Some(join) = self.column.join {
            query.join(join);
            for column in self.column.columns {
                query.order(format!("{column} {direction}"));
            }
        } else {
            for column in self.column.columns {
                query.order(format!("{} {direction}", query.col(column)));
            }
        }
        for key in M::PRIMARY_KEY {
            if !(self.column.join.is_none() && self.column.columns.contains(key)) {
                query.order(format!("{} {direction}", query.col(key)));
            }
        }
    }

    /// Counts all matching rows, then fetches the requested window.
    pub async fn fetch<M: Model>(
        &self,
        conn: &mut PgConnection,
        mut query: SelectQuery,
    ) -> BmmResult<Page<M>> {
        self.apply_order::<M>(&mut query);

        let total: i64 = query
            .count_builder()
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await?;
        let total = u64::try_from(total).unwrap_or_default();

        let items = if total == 0 || self.offset >= total {
            Vec::new()
        } else {
            query
                .select_builder(Some((self.offset, self.limit)))
                .build_query_as::<M>()
                .fetch_all(&mut *conn)
                .await?
        };

        debug!(
            table = M::TABLE,
            total,
            returned = items.len(),
            offset = self.offset,
            limit = self.limit,
            "Fetched page"
        );
        Ok(Page::new(items, self.offset, self.limit, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fabric, IpBlock, TenantAccount};
    use bmm_core::OrderBy;

    const IP_BLOCK_ORDER: &[OrderColumn] = &[
        OrderColumn::new("name", &["name"]),
        OrderColumn::new("created", &["created"]),
    ];

    #[test]
    fn test_default_order_is_created_ascending() {
        let paginator = Paginator::new(&PageInput::default(), IP_BLOCK_ORDER).unwrap();
        let mut query = SelectQuery::of::<IpBlock>();
        paginator.apply_order::<IpBlock>(&mut query);
        let sql = query.select_builder(None).into_sql();
        assert!(sql.ends_with("ORDER BY ipb.created ASC, ipb.id ASC"));
        assert_eq!(paginator.limit(), PageInput::DEFAULT_LIMIT);
        assert_eq!(paginator.offset(), 0);
    }

    #[test]
    fn test_unknown_order_field_is_rejected() {
        let input = PageInput::default().with_order_by(OrderBy::desc("prefix_length"));
        let err = Paginator::new(&input, IP_BLOCK_ORDER).unwrap_err();
        assert!(matches!(err, BmmError::InvalidOrderBy { field } if field == "prefix_length"));
    }

    #[test]
    fn test_limit_is_clamped() {
        let input = PageInput::new(40, 10_000);
        let paginator = Paginator::new(&input, IP_BLOCK_ORDER).unwrap();
        assert_eq!(paginator.limit(), PageInput::MAX_LIMIT);
        assert_eq!(paginator.offset(), 40);
    }

    #[test]
    fn test_composite_key_tiebreak() {
        let input = PageInput::default().with_order_by(OrderBy::desc("id"));
        let paginator = Paginator::new(&input, &[OrderColumn::new("id", &["id"])]).unwrap();
        let mut query = SelectQuery::of::<Fabric>();
        paginator.apply_order::<Fabric>(&mut query);
        let sql = query.select_builder(None).into_sql();
        assert!(sql.ends_with("ORDER BY fb.id DESC, fb.site_id DESC"));
    }

    #[test]
    fn test_joined_order_adds_join() {
        let order = [OrderColumn::joined(
            "tenant_org_name",
            &["tn.org"],
            "LEFT JOIN tenant AS tn ON tn.id = ta.tenant_id",
        )];
        let input = PageInput::default().with_order_by(OrderBy::asc("tenant_org_name"));
        let paginator = Paginator::new(&input, &order).unwrap();
        let mut query = SelectQuery::of::<TenantAccount>();
        paginator.apply_order::<TenantAccount>(&mut query);
        let sql = query.select_builder(None).into_sql();
        assert!(sql.contains("FROM tenant_account AS ta LEFT JOIN tenant AS tn ON tn.id = ta.tenant_id WHERE"));
        assert!(sql.ends_with("ORDER BY tn.org ASC, ta.id ASC"));
    }
}
