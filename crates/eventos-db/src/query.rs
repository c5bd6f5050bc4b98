//! List queries: search filters and ordering.
//!
//! A [`ListQuery`] is what the CRUD controller hands a repository on the
//! read path. The in-memory repository evaluates it directly through
//! [`ListQuery::matches`] and [`ListQuery::compare`]; the SQLite repository
//! translates it into a `WHERE ... LIKE` / `ORDER BY` clause.
//!
//! Every ordering ends with an ascending `id` tie-break, so records with
//! equal sort keys keep a stable position across pages.

use std::cmp::Ordering;

use eventos_core::{EventosError, EventosResult};

use crate::model::{Model, ModelMeta};

/// A single ordering term.
///
/// # Examples
///
/// ```
/// use eventos_db::query::OrderBy;
///
/// let o = OrderBy::parse("-fecha");
/// assert_eq!(o.field, "fecha");
/// assert!(o.descending);
/// assert_eq!(OrderBy::parse("id"), OrderBy::asc("id"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The field to order by.
    pub field: String,
    /// Whether the order is reversed.
    pub descending: bool,
}

impl OrderBy {
    /// Ascending order on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending order on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parses a sort key where a leading `-` means descending.
    pub fn parse(key: &str) -> Self {
        key.strip_prefix('-')
            .map_or_else(|| Self::asc(key), Self::desc)
    }

    /// Renders the term as an `ORDER BY` fragment.
    pub fn to_sql(&self) -> String {
        let dir = if self.descending { "DESC" } else { "ASC" };
        format!("\"{}\" {dir}", self.field)
    }
}

/// A case-insensitive substring search over a set of fields.
///
/// A record matches when ANY of the fields contains the term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    /// The raw search term.
    pub term: String,
    /// The fields the term is looked for in.
    pub fields: Vec<String>,
}

impl SearchFilter {
    /// Creates a new filter.
    pub fn new<I, S>(term: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            term: term.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` when the filter keeps every record: the term is
    /// empty or there is no field to look in.
    pub fn is_empty(&self) -> bool {
        self.term.is_empty() || self.fields.is_empty()
    }

    /// Tests one record against the filter.
    pub fn matches<M: Model>(&self, record: &M) -> bool {
        if self.is_empty() {
            return true;
        }
        let needle = self.term.to_lowercase();
        self.fields.iter().any(|field| {
            record
                .field_value(field)
                .is_some_and(|v| v.contains_ci(&needle))
        })
    }

    /// The term as a `LIKE` pattern, with `%`, `_` and `\` escaped.
    pub fn like_pattern(&self) -> String {
        let mut escaped = String::with_capacity(self.term.len() + 2);
        escaped.push('%');
        for c in self.term.chars() {
            if matches!(c, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped.push('%');
        escaped
    }
}

/// The filter and ordering applied on a listing.
///
/// # Examples
///
/// ```
/// use eventos_db::query::{ListQuery, OrderBy, SearchFilter};
///
/// let q = ListQuery::new()
///     .search(SearchFilter::new("feria", ["titulo", "descripcion"]))
///     .order_by(OrderBy::parse("-fecha"));
/// assert_eq!(q.effective_ordering().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Optional search filter.
    pub search: Option<SearchFilter>,
    /// Ordering terms, most significant first.
    pub ordering: Vec<OrderBy>,
}

impl ListQuery {
    /// An unfiltered query ordered by `id`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search filter. A filter with no term or no fields clears it.
    #[must_use]
    pub fn search(mut self, filter: SearchFilter) -> Self {
        self.search = if filter.is_empty() { None } else { Some(filter) };
        self
    }

    /// Appends an ordering term.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.ordering.push(order);
        self
    }

    /// The ordering terms followed by the `id` tie-break.
    pub fn effective_ordering(&self) -> Vec<OrderBy> {
        let mut ordering = self.ordering.clone();
        if !ordering.iter().any(|o| o.field == "id") {
            ordering.push(OrderBy::asc("id"));
        }
        ordering
    }

    /// Checks every referenced field exists on the model.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::ConfigurationError`] naming the first unknown
    /// field.
    pub fn validate(&self, meta: &ModelMeta) -> EventosResult<()> {
        let search_fields = self.search.iter().flat_map(|s| s.fields.iter());
        let order_fields = self.ordering.iter().map(|o| &o.field);
        for field in search_fields.chain(order_fields) {
            if !meta.has_field(field) {
                return Err(EventosError::ConfigurationError(format!(
                    "Cannot resolve keyword '{field}' on model '{}'. Choices are: {}",
                    meta.model_name,
                    meta.field_names().join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Returns `true` if the record passes the search filter.
    pub fn matches<M: Model>(&self, record: &M) -> bool {
        self.search.as_ref().map_or(true, |s| s.matches(record))
    }

    /// Compares two records by the effective ordering.
    pub fn compare<M: Model>(&self, a: &M, b: &M) -> Ordering {
        for order in self.effective_ordering() {
            let left = a.field_value(&order.field);
            let right = b.field_value(&order.field);
            let ord = if order.descending {
                right.cmp(&left)
            } else {
                left.cmp(&right)
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Filters and sorts `records` in memory.
    pub fn apply<M: Model>(&self, records: impl IntoIterator<Item = M>) -> Vec<M> {
        let mut out: Vec<M> = records.into_iter().filter(|r| self.matches(r)).collect();
        out.sort_by(|a, b| self.compare(a, b));
        out
    }
}
