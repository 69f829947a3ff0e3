//! Pagination types for list operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::BmmError;

/// Sort direction of an order-by clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortOrder {
    type Err = BmmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(BmmError::invalid_params(format!("invalid sort order: {other}"))),
        }
    }
}

/// A requested ordering: an entity-level field name and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Field name as exposed to callers (e.g. `name`, `tenant_org_name`).
    pub field: String,
    /// Direction.
    #[serde(default)]
    pub order: SortOrder,
}

impl OrderBy {
    /// Ascending order on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    /// Descending order on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// A request for a window of results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInput {
    /// Number of rows to skip.
    #[serde(default)]
    pub offset: Option<u64>,
    /// Maximum number of rows to return.
    #[serde(default)]
    pub limit: Option<u64>,
    /// Ordering; the entity default applies when absent.
    #[serde(default)]
    pub order_by: Option<OrderBy>,
}

impl PageInput {
    /// The default page size.
    pub const DEFAULT_LIMIT: u64 = 20;
    /// The maximum allowed page size.
    pub const MAX_LIMIT: u64 = 100;

    /// Creates a page input with an explicit window.
    #[must_use]
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset: Some(offset),
            limit: Some(limit),
            order_by: None,
        }
    }

    /// Sets the ordering.
    #[must_use]
    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Returns the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }

    /// Returns the limit for database queries, clamped to `MAX_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }
}

/// Information about a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Rows skipped.
    pub offset: u64,
    /// Requested window size.
    pub limit: u64,
    /// Total number of matching rows, ignoring the window.
    pub total: u64,
    /// Number of rows on this page.
    pub returned: usize,
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Information about this page.
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<T> Page<T> {
    /// Creates a new page.
    #[must_use]
    pub fn new(items: Vec<T>, offset: u64, limit: u64, total: u64) -> Self {
        let returned = items.len();
        Self {
            items,
            info: PageInfo {
                offset,
                limit,
                total,
                returned,
            },
        }
    }

    /// Creates an empty page for the given request.
    #[must_use]
    pub fn empty(input: &PageInput) -> Self {
        Self::new(Vec::new(), input.offset(), input.limit(), 0)
    }

    /// Maps the page content to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }

    /// Returns true if the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns the total number of matching rows.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.info.total
    }

    /// Returns true if rows remain after this page.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.info.offset + (self.info.returned as u64) < self.info.total
    }

    /// Splits the page into its items and the total count.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, u64) {
        (self.items, self.info.total)
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
