//! Predicate fragments, ordering and pagination consumed by statement
//! templates.
//!
//! Filters render to SQL fragments that reference named parameters
//! (`creation_date>=:creation_date`), so the value itself travels in the
//! argument struct next to the filter group.

use std::fmt::Debug;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, SignetError};

/// A predicate that renders itself as a SQL fragment.
pub trait Filter: Debug + Send + Sync {
    fn to_sql_stmt(&self) -> String;
}

/// `by=:by`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualFilter {
    pub by: String,
}

impl EqualFilter {
    pub fn new(by: impl Into<String>) -> Self {
        Self { by: by.into() }
    }
}

impl Filter for EqualFilter {
    fn to_sql_stmt(&self) -> String {
        format!("{}=:{}", self.by, self.by)
    }
}

/// `by>=min AND by<=max`, with both bounds spliced literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetweenFilter {
    pub by: String,
    pub min_value: String,
    pub max_value: String,
}

impl BetweenFilter {
    pub fn new(
        by: impl Into<String>,
        min_value: impl Into<String>,
        max_value: impl Into<String>,
    ) -> Self {
        Self {
            by: by.into(),
            min_value: min_value.into(),
            max_value: max_value.into(),
        }
    }
}

impl Filter for BetweenFilter {
    fn to_sql_stmt(&self) -> String {
        format!(
            "{}>={} AND {}<={}",
            self.by, self.min_value, self.by, self.max_value
        )
    }
}

macro_rules! comparison_filter {
    ($(#[$doc:meta])* $name:ident, $op:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub by: String,
        }

        impl $name {
            pub fn new(by: impl Into<String>) -> Self {
                Self { by: by.into() }
            }
        }

        impl Filter for $name {
            fn to_sql_stmt(&self) -> String {
                format!(concat!("{}", $op, ":{}"), self.by, self.by)
            }
        }
    };
}

comparison_filter!(
    /// `by<:by`
    LessFilter,
    "<"
);
comparison_filter!(
    /// `by<=:by`
    LessOrEqualFilter,
    "<="
);
comparison_filter!(
    /// `by>:by`
    GreaterFilter,
    ">"
);
comparison_filter!(
    /// `by>=:by`
    GreaterOrEqualFilter,
    ">="
);

/// `(by='a' OR by='b')`; an empty value list matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEqualFilter {
    pub by: String,
    pub values: Vec<String>,
}

impl ListEqualFilter {
    pub fn new(by: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            by: by.into(),
            values,
        }
    }
}

impl Filter for ListEqualFilter {
    fn to_sql_stmt(&self) -> String {
        if self.values.is_empty() {
            return "FALSE".to_string();
        }

        let clauses: Vec<String> = self
            .values
            .iter()
            .map(|value| format!("{}='{}'", self.by, value.replace('\'', "''")))
            .collect();
        format!("({})", clauses.join(" OR "))
    }
}

/// An ordered set of filters, joined with `AND` by the statement templates.
#[derive(Debug, Clone, Default)]
pub struct FilterGroup {
    pub filters: Vec<Arc<dyn Filter>>,
}

impl FilterGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Arc::new(filter));
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Rendered fragments in insertion order.
    pub fn to_sql_stmts(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.to_sql_stmt()).collect()
    }
}

impl Serialize for FilterGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FilterGroup", 1)?;
        state.serialize_field("filters", &self.to_sql_stmts())?;
        state.end()
    }
}

/// Column used to order a listing.
///
/// The name is spliced into `ORDER BY` as is, so only plain identifiers are
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct OrderByOption(String);

impl OrderByOption {
    /// Order by `column`, rejecting anything but `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn column(column: impl Into<String>) -> Result<Self> {
        let column = column.into();
        let mut chars = column.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(SignetError::InvalidArgument(format!(
                "invalid order by column [{}]",
                column
            )));
        }
        Ok(Self(column))
    }

    pub fn creation_date() -> Self {
        Self("creation_date".to_string())
    }

    pub fn last_update() -> Self {
        Self("last_update".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrderByOption {
    type Error = SignetError;

    fn try_from(column: String) -> Result<Self> {
        Self::column(column)
    }
}

impl From<OrderByOption> for String {
    fn from(option: OrderByOption) -> Self {
        option.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub by: OrderByOption,
    pub direction: OrderDirection,
}

/// Limit/offset navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of entries to return.
    pub limit: i64,
    /// Zero-based offset of the first entry.
    pub offset: i64,
}

/// Argument struct for listing statements: the entity's own fields plus
/// optional filters, ordering and pagination.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListFilter<T> {
    #[serde(flatten)]
    pub entity: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_group: Option<FilterGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ListFilter<T> {
    pub fn new(entity: T) -> Self {
        Self {
            entity,
            order: None,
            filter_group: None,
            pagination: None,
        }
    }

    pub fn append_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filter_group
            .get_or_insert_with(FilterGroup::new)
            .push(filter);
        self
    }

    pub fn paged(mut self, limit: i64, offset: i64) -> Self {
        self.pagination = Some(Pagination { limit, offset });
        self
    }

    pub fn sort(mut self, by: OrderByOption, direction: OrderDirection) -> Self {
        self.order = Some(Order { by, direction });
        self
    }
}
