//! Typed query language shared by the repository and datastores.
//!
//! # Purpose
//! Expresses the small set of predicates, orderings, and paging options the
//! scoped repository needs, without tying it to a particular engine.
//!
//! # Semantics
//! - Filters are AND-ed.
//! - Comparisons follow SQL null rules: a missing or `Null` column value
//!   satisfies only `IsNull`.
//! - Values of different kinds never compare equal or ordered.
//!
//! `Query::to_sql` renders a parameterized statement for diagnostics; it is
//! not executed by the in-memory backend.
use crate::ScopedEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Owner,
    Unit,
    CreatedAt,
    UpdatedAt,
    /// Entity-specific column resolved through [`ScopedEntity::field`].
    Field(String),
}

impl Column {
    pub fn field(name: impl Into<String>) -> Self {
        Column::Field(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Column::Id => "id",
            Column::Owner => "owner_id",
            Column::Unit => "unit_id",
            Column::CreatedAt => "created_at",
            Column::UpdatedAt => "updated_at",
            Column::Field(name) => name,
        }
    }

    /// Read this column from `entity`; unknown fields read as `Null`.
    pub fn read<T: ScopedEntity>(&self, entity: &T) -> Value {
        match self {
            Column::Id => Value::Uuid(entity.id()),
            Column::Owner => entity.owner_id().map_or(Value::Null, Value::from),
            Column::Unit => entity.unit_id().map_or(Value::Null, Value::from),
            Column::CreatedAt => Value::Timestamp(entity.created_at()),
            Column::UpdatedAt => Value::Timestamp(entity.updated_at()),
            Column::Field(name) => entity.field(name).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(Column, Value),
    Ne(Column, Value),
    In(Column, Vec<Value>),
    IsNull(Column),
    Gt(Column, Value),
    Lt(Column, Value),
}

impl Filter {
    pub fn column(&self) -> &Column {
        match self {
            Filter::Eq(column, _)
            | Filter::Ne(column, _)
            | Filter::In(column, _)
            | Filter::IsNull(column)
            | Filter::Gt(column, _)
            | Filter::Lt(column, _) => column,
        }
    }

    pub fn matches<T: ScopedEntity>(&self, entity: &T) -> bool {
        let actual = self.column().read(entity);
        match self {
            Filter::IsNull(_) => actual.is_null(),
            Filter::Eq(_, expected) => actual.compare(expected) == Some(Ordering::Equal),
            Filter::Ne(_, expected) => actual
                .compare(expected)
                .is_some_and(|ordering| ordering != Ordering::Equal),
            Filter::In(_, candidates) => candidates
                .iter()
                .any(|candidate| actual.compare(candidate) == Some(Ordering::Equal)),
            Filter::Gt(_, bound) => actual.compare(bound) == Some(Ordering::Greater),
            Filter::Lt(_, bound) => actual.compare(bound) == Some(Ordering::Less),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Desc,
        }
    }

    /// Newest first; applied whenever the caller supplies no ordering.
    pub fn newest_first() -> Self {
        Self::desc(Column::CreatedAt)
    }
}

/// A read/delete request against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: &'static str,
    alias: Option<String>,
    filters: Vec<Filter>,
    order: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            alias: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into()).filter(|alias| !alias.is_empty());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub(crate) fn without_order(mut self) -> Self {
        self.order.clear();
        self
    }

    pub fn matches<T: ScopedEntity>(&self, entity: &T) -> bool {
        self.filters.iter().all(|filter| filter.matches(entity))
    }

    /// Filter, order, and page `rows` the way a SQL engine would.
    ///
    /// Rows that tie on every ordering column fall back to id order so
    /// results are stable.
    pub fn apply<T: ScopedEntity>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        let mut rows: Vec<T> = rows.into_iter().filter(|row| self.matches(row)).collect();
        rows.sort_by(|a, b| {
            self.order
                .iter()
                .map(|order| {
                    let ordering = compare_nulls_first(
                        &order.column.read(a),
                        &order.column.read(b),
                    );
                    match order.direction {
                        Direction::Asc => ordering,
                        Direction::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or_else(|| a.id().cmp(&b.id()))
        });
        let offset = self.offset.unwrap_or(0) as usize;
        let limit = self.limit.map_or(usize::MAX, |limit| limit as usize);
        rows.into_iter().skip(offset).take(limit).collect()
    }

    /// Render as a parameterized SELECT with `$n` placeholders.
    ///
    /// Identifiers are double-quoted with embedded quotes doubled; every value
    /// is a bind parameter.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = format!("SELECT * FROM {}", quote_ident(&self.table));
        if let Some(alias) = &self.alias {
            sql.push_str(&format!(" AS {}", quote_ident(alias)));
        }
        if !self.filters.is_empty() {
            let clauses: Vec<String> = self
                .filters
                .iter()
                .map(|filter| self.render_filter(filter, &mut params))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if !self.order.is_empty() {
            let orders: Vec<String> = self
                .order
                .iter()
                .map(|order| {
                    let direction = match order.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{} {direction}", self.qualified(&order.column))
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        (sql, params)
    }

    fn qualified(&self, column: &Column) -> String {
        let name = quote_ident(column.name());
        match &self.alias {
            Some(alias) => format!("{}.{name}", quote_ident(alias)),
            None => name,
        }
    }

    fn render_filter(&self, filter: &Filter, params: &mut Vec<Value>) -> String {
        let column = self.qualified(filter.column());
        let mut bind = |value: &Value| {
            params.push(value.clone());
            format!("${}", params.len())
        };
        match filter {
            Filter::Eq(_, value) => format!("{column} = {}", bind(value)),
            Filter::Ne(_, value) => format!("{column} <> {}", bind(value)),
            Filter::Gt(_, value) => format!("{column} > {}", bind(value)),
            Filter::Lt(_, value) => format!("{column} < {}", bind(value)),
            Filter::IsNull(_) => format!("{column} IS NULL"),
            Filter::In(_, values) if values.is_empty() => "FALSE".to_string(),
            Filter::In(_, values) => {
                let placeholders: Vec<String> = values.iter().map(&mut bind).collect();
                format!("{column} IN ({})", placeholders.join(", "))
            }
        }
    }
}

fn compare_nulls_first(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
