//! A small table query builder.
//!
//! Queries are assembled from chained filters and rendered to SQL with
//! numbered placeholders (`$1`, `$2`, ...) plus the matching bind values:
//!
//! ```
//! use vacationstay_db::query::{Order, TableQuery};
//!
//! let (sql, values) = TableQuery::select("properties")
//!     .like("location", "%alps%")
//!     .gt("price", 10_000)
//!     .order_by("id", Order::Asc)
//!     .limit(20)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM properties WHERE LOWER(location) LIKE LOWER($1) AND price > $2 ORDER BY id ASC LIMIT 20"
//! );
//! assert_eq!(values.len(), 2);
//! ```
//!
//! `NULL` is written into the SQL as a literal and never bound.

use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::Any;
use tracing::{debug, error};

use crate::error::DbError;
use crate::DbClient;

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Int(i64),
    Text(String),
    Null,
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        QueryValue::Int(v)
    }
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        QueryValue::Int(v as i64)
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Text(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Text(v)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(QueryValue::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Gte => ">=",
            Op::Lte => "<=",
            Op::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone)]
struct Filter {
    column: String,
    op: Op,
    value: QueryValue,
}

/// Shared placeholder numbering and value list while rendering.
#[derive(Debug, Default)]
struct Binder {
    values: Vec<QueryValue>,
}

impl Binder {
    /// Returns the SQL for `value`: a fresh placeholder, or `NULL`.
    fn push(&mut self, value: &QueryValue) -> String {
        match value {
            QueryValue::Null => "NULL".to_string(),
            other => {
                self.values.push(other.clone());
                format!("${}", self.values.len())
            }
        }
    }
}

/// `true` for plain SQL identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(name: &str) -> Result<(), DbError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(DbError::QueryError(format!("Invalid identifier: {:?}", name)))
    }
}

fn render_filters(filters: &[Filter], binder: &mut Binder) -> Result<String, DbError> {
    let mut clauses = Vec::with_capacity(filters.len());
    for filter in filters {
        check_identifier(&filter.column)?;
        let clause = match (filter.op, &filter.value) {
            (Op::Eq, QueryValue::Null) => format!("{} IS NULL", filter.column),
            (_, QueryValue::Null) => {
                return Err(DbError::QueryError(format!(
                    "NULL can only be compared with eq (column {})",
                    filter.column
                )))
            }
            (Op::Like, value) => format!(
                "LOWER({}) LIKE LOWER({})",
                filter.column,
                binder.push(value)
            ),
            (op, value) => format!("{} {} {}", filter.column, op.symbol(), binder.push(value)),
        };
        clauses.push(clause);
    }
    if clauses.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }
}

fn render_returning(columns: &[String]) -> Result<String, DbError> {
    if columns.is_empty() {
        return Ok(String::new());
    }
    for column in columns {
        if column != "*" {
            check_identifier(column)?;
        }
    }
    Ok(format!(" RETURNING {}", columns.join(", ")))
}

/// Binds `values` in order onto an `Any` query.
pub fn bind_values<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    values: &'q [QueryValue],
) -> Query<'q, Any, AnyArguments<'q>> {
    for value in values {
        query = match value {
            QueryValue::Int(v) => query.bind(*v),
            QueryValue::Text(v) => query.bind(v.as_str()),
            // Rendered as a literal, never bound.
            QueryValue::Null => query,
        };
    }
    query
}

/// `SELECT` with chained filters, ordering and a limit.
#[derive(Debug, Clone)]
pub struct TableQuery {
    table: String,
    columns: Vec<String>,
    filters: Vec<Filter>,
    order: Vec<(String, Order)>,
    limit: Option<u32>,
}

impl TableQuery {
    /// Starts a `SELECT *` over `table`.
    pub fn select(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restricts the selected columns.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    fn filter(mut self, column: &str, op: Op, value: impl Into<QueryValue>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, column: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(column, Op::Eq, value)
    }

    pub fn gt(self, column: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(column, Op::Gt, value)
    }

    pub fn lt(self, column: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(column, Op::Lt, value)
    }

    pub fn gte(self, column: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(column, Op::Gte, value)
    }

    pub fn lte(self, column: &str, value: impl Into<QueryValue>) -> Self {
        self.filter(column, Op::Lte, value)
    }

    /// Case-insensitive `LIKE`; `pattern` carries its own `%` wildcards.
    pub fn like(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(column, Op::Like, QueryValue::Text(pattern.into()))
    }

    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        self.order.push((column.to_string(), order));
        self
    }

    /// Caps the number of rows. The last call wins.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> Result<(String, Vec<QueryValue>), DbError> {
        check_identifier(&self.table)?;
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            for column in &self.columns {
                check_identifier(column)?;
            }
            self.columns.join(", ")
        };

        let mut binder = Binder::default();
        let mut sql = format!("SELECT {} FROM {}", columns, self.table);
        sql.push_str(&render_filters(&self.filters, &mut binder)?);

        if !self.order.is_empty() {
            let mut parts = Vec::with_capacity(self.order.len());
            for (column, order) in &self.order {
                check_identifier(column)?;
                let dir = match order {
                    Order::Asc => "ASC",
                    Order::Desc => "DESC",
                };
                parts.push(format!("{} {}", column, dir));
            }
            sql.push_str(&format!(" ORDER BY {}", parts.join(", ")));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok((sql, binder.values))
    }

    pub async fn fetch_all(&self, db_client: &DbClient) -> Result<Vec<AnyRow>, DbError> {
        let (sql, values) = self.build()?;
        debug!("Running select: {}", sql);
        bind_values(sqlx::query(&sql), &values)
            .fetch_all(db_client.pool())
            .await
            .map_err(|e| {
                error!("Select on {} failed: {}", self.table, e);
                DbError::QueryError(e.to_string())
            })
    }

    pub async fn fetch_optional(&self, db_client: &DbClient) -> Result<Option<AnyRow>, DbError> {
        let (sql, values) = self.build()?;
        debug!("Running select: {}", sql);
        bind_values(sqlx::query(&sql), &values)
            .fetch_optional(db_client.pool())
            .await
            .map_err(|e| {
                error!("Select on {} failed: {}", self.table, e);
                DbError::QueryError(e.to_string())
            })
    }
}

/// `INSERT INTO table (...) VALUES (...)`, optionally with `RETURNING`.
#[derive(Debug, Clone)]
pub struct InsertQuery {
    table: String,
    values: Vec<(String, QueryValue)>,
    returning: Vec<String>,
}

impl InsertQuery {
    pub fn insert_into(table: &str) -> Self {
        Self {
            table: table.to_string(),
            values: Vec::new(),
            returning: Vec::new(),
        }
    }

    pub fn value(mut self, column: &str, value: impl Into<QueryValue>) -> Self {
        self.values.push((column.to_string(), value.into()));
        self
    }

    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn build(&self) -> Result<(String, Vec<QueryValue>), DbError> {
        check_identifier(&self.table)?;
        if self.values.is_empty() {
            return Err(DbError::QueryError(format!(
                "Insert into {} has no values",
                self.table
            )));
        }

        let mut binder = Binder::default();
        let mut columns = Vec::with_capacity(self.values.len());
        let mut placeholders = Vec::with_capacity(self.values.len());
        for (column, value) in &self.values {
            check_identifier(column)?;
            columns.push(column.as_str());
            placeholders.push(binder.push(value));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}){}",
            self.table,
            columns.join(", "),
            placeholders.join(", "),
            render_returning(&self.returning)?
        );
        Ok((sql, binder.values))
    }

    /// Runs the insert and returns the `RETURNING` row.
    pub async fn fetch_one(&self, db_client: &DbClient) -> Result<AnyRow, DbError> {
        let (sql, values) = self.build()?;
        debug!("Running insert: {}", sql);
        bind_values(sqlx::query(&sql), &values)
            .fetch_one(db_client.pool())
            .await
            .map_err(|e| map_write_error(&self.table, e))
    }
}

/// `UPDATE table SET ... WHERE ...`, optionally with `RETURNING`.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    table: String,
    sets: Vec<(String, QueryValue)>,
    filters: Vec<Filter>,
    returning: Vec<String>,
}

impl UpdateQuery {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            sets: Vec::new(),
            filters: Vec::new(),
            returning: Vec::new(),
        }
    }

    pub fn set(mut self, column: &str, value: impl Into<QueryValue>) -> Self {
        self.sets.push((column.to_string(), value.into()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<QueryValue>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op: Op::Eq,
            value: value.into(),
        });
        self
    }

    pub fn returning(mut self, columns: &[&str]) -> Self {
        self.returning = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn build(&self) -> Result<(String, Vec<QueryValue>), DbError> {
        check_identifier(&self.table)?;
        if self.sets.is_empty() {
            return Err(DbError::QueryError(format!(
                "Update of {} sets no columns",
                self.table
            )));
        }
        // An unfiltered update would rewrite the whole table.
        if self.filters.is_empty() {
            return Err(DbError::QueryError(format!(
                "Update of {} has no filter",
                self.table
            )));
        }

        let mut binder = Binder::default();
        let mut assignments = Vec::with_capacity(self.sets.len());
        for (column, value) in &self.sets {
            check_identifier(column)?;
            assignments.push(format!("{} = {}", column, binder.push(value)));
        }

        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
        sql.push_str(&render_filters(&self.filters, &mut binder)?);
        sql.push_str(&render_returning(&self.returning)?);
        Ok((sql, binder.values))
    }

    /// Runs the update and returns the updated row, if any matched.
    pub async fn fetch_optional(&self, db_client: &DbClient) -> Result<Option<AnyRow>, DbError> {
        let (sql, values) = self.build()?;
        debug!("Running update: {}", sql);
        bind_values(sqlx::query(&sql), &values)
            .fetch_optional(db_client.pool())
            .await
            .map_err(|e| map_write_error(&self.table, e))
    }

    /// Runs the update and returns the number of affected rows.
    pub async fn execute(&self, db_client: &DbClient) -> Result<u64, DbError> {
        let (sql, values) = self.build()?;
        debug!("Running update: {}", sql);
        bind_values(sqlx::query(&sql), &values)
            .execute(db_client.pool())
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| map_write_error(&self.table, e))
    }
}

fn map_write_error(table: &str, e: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return DbError::Conflict(format!("Duplicate value in {}", table));
        }
    }
    error!("Write to {} failed: {}", table, e);
    DbError::QueryError(e.to_string())
}
