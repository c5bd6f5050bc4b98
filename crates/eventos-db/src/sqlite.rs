//! SQLite storage using `rusqlite`.
//!
//! [`SqliteBackend`] owns one connection behind a tokio `Mutex`; every
//! statement runs inside `tokio::task::spawn_blocking` so the async runtime
//! is never blocked. [`SqliteRepository`] builds SQL for one model from its
//! [`ModelMeta`](crate::model::ModelMeta) and runs it on a shared backend.
//!
//! Searches use `LIKE ... ESCAPE '\'`, which SQLite compares
//! case-insensitively for ASCII letters only.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use eventos_core::{EventosError, EventosResult};
use tokio::sync::Mutex;

use crate::model::{Model, Row};
use crate::query::ListQuery;
use crate::repository::Repository;
use crate::value::Value;

/// A SQLite connection usable from async code.
///
/// Cloning is cheap and shares the connection.
#[derive(Clone)]
pub struct SqliteBackend {
    path: PathBuf,
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens a database at the given path; `:memory:` opens an in-memory one.
    ///
    /// WAL journal mode is enabled for file-based databases.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> EventosResult<Self> {
        let path = path.into();
        let in_memory = path.to_str() == Some(":memory:");
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| EventosError::OperationalError(format!("SQLite open failed: {e}")))?;

        if !in_memory {
            conn.execute_batch("PRAGMA journal_mode=WAL;")
                .map_err(|e| {
                    EventosError::OperationalError(format!("Failed to set pragmas: {e}"))
                })?;
        }

        tracing::debug!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn memory() -> EventosResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> EventosResult<()> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::Date(d) => {
                    stmt.raw_bind_parameter(idx, d.format("%Y-%m-%d").to_string().as_str())
                }
            }
            .map_err(|e| EventosError::DatabaseError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> EventosResult<Row> {
        let mut values = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            let val_ref = sqlite_row
                .get_ref(i)
                .map_err(|e| EventosError::DatabaseError(format!("{e}")))?;
            values.push(match val_ref {
                rusqlite::types::ValueRef::Null => Value::Null,
                rusqlite::types::ValueRef::Integer(v) => Value::Int(v),
                rusqlite::types::ValueRef::Real(v) => Value::String(v.to_string()),
                rusqlite::types::ValueRef::Text(b) => {
                    Value::String(String::from_utf8_lossy(b).into_owned())
                }
                rusqlite::types::ValueRef::Blob(_) => {
                    return Err(EventosError::DatabaseError(format!(
                        "Unsupported BLOB in column '{}'",
                        column_names[i]
                    )))
                }
            });
        }
        Ok(Row::new(column_names.to_vec(), values))
    }

    /// Executes a statement and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> EventosResult<usize> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| EventosError::DatabaseError(format!("{e}")))?;
            Self::bind_params(&mut stmt, &params)?;
            stmt.raw_execute()
                .map_err(|e| EventosError::DatabaseError(format!("{e}")))
        })
        .await
        .map_err(|e| EventosError::OperationalError(format!("Task join error: {e}")))?
    }

    /// Runs a query and collects every row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn query(&self, sql: &str, params: &[Value]) -> EventosResult<Vec<Row>> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| EventosError::DatabaseError(format!("{e}")))?;

            let column_names: Vec<String> =
                stmt.column_names().into_iter().map(String::from).collect();

            Self::bind_params(&mut stmt, &params)?;

            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows
                .next()
                .map_err(|e| EventosError::DatabaseError(format!("{e}")))?
            {
                rows.push(Self::convert_row(row, &column_names)?);
            }
            Ok(rows)
        })
        .await
        .map_err(|e| EventosError::OperationalError(format!("Task join error: {e}")))?
    }

    /// Executes an `INSERT` and returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> EventosResult<i64> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| EventosError::DatabaseError(format!("{e}")))?;
            Self::bind_params(&mut stmt, &params)?;
            stmt.raw_execute()
                .map_err(|e| EventosError::DatabaseError(format!("{e}")))?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(|e| EventosError::OperationalError(format!("Task join error: {e}")))?
    }
}

/// A [`Repository`] backed by one SQLite table.
pub struct SqliteRepository<M: Model> {
    backend: SqliteBackend,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> std::fmt::Debug for SqliteRepository<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRepository")
            .field("table", &M::meta().db_table)
            .field("backend", &self.backend)
            .finish()
    }
}

impl<M: Model> SqliteRepository<M> {
    /// Creates a repository over a shared backend.
    pub fn new(backend: SqliteBackend) -> Self {
        Self {
            backend,
            _model: PhantomData,
        }
    }

    /// The `CREATE TABLE IF NOT EXISTS` statement for the model.
    pub fn create_table_sql() -> String {
        let meta = M::meta();
        let columns: Vec<String> = meta.fields.iter().map(|f| f.column_sql()).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            meta.db_table,
            columns.join(", ")
        )
    }

    /// Creates the model's table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails.
    pub async fn create_table(&self) -> EventosResult<()> {
        let sql = Self::create_table_sql();
        self.backend.execute(&sql, &[]).await?;
        tracing::info!(table = %M::meta().db_table, "table ready");
        Ok(())
    }

    fn select_columns() -> String {
        M::meta()
            .fields
            .iter()
            .map(|f| format!("\"{}\"", f.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Builds the `SELECT` for a listing along with its parameters.
    pub fn select_sql(query: &ListQuery) -> (String, Vec<Value>) {
        let meta = M::meta();
        let mut sql = format!(
            "SELECT {} FROM \"{}\"",
            Self::select_columns(),
            meta.db_table
        );
        let mut params = Vec::new();

        if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
            let pattern = search.like_pattern();
            let clauses: Vec<String> = search
                .fields
                .iter()
                .map(|f| {
                    params.push(Value::String(pattern.clone()));
                    format!("\"{f}\" LIKE ? ESCAPE '\\'")
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" OR "));
        }

        let ordering: Vec<String> = query
            .effective_ordering()
            .iter()
            .map(crate::query::OrderBy::to_sql)
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&ordering.join(", "));

        (sql, params)
    }

    fn rows_to_models(rows: &[Row]) -> EventosResult<Vec<M>> {
        rows.iter().map(M::from_row).collect()
    }
}

#[async_trait]
impl<M: Model> Repository<M> for SqliteRepository<M> {
    async fn find_all(&self, query: &ListQuery) -> EventosResult<Vec<M>> {
        query.validate(M::meta())?;
        let (sql, params) = Self::select_sql(query);
        let rows = self.backend.query(&sql, &params).await?;
        Self::rows_to_models(&rows)
    }

    async fn find_by_id(&self, id: i64) -> EventosResult<Option<M>> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE \"id\" = ?",
            Self::select_columns(),
            M::meta().db_table
        );
        let rows = self.backend.query(&sql, &[Value::Int(id)]).await?;
        rows.first().map(M::from_row).transpose()
    }

    async fn save(&self, mut record: M) -> EventosResult<M> {
        let meta = M::meta();
        let values = record.field_values();
        let columns: Vec<String> = values.iter().map(|(n, _)| format!("\"{n}\"")).collect();
        let mut params: Vec<Value> = values.into_iter().map(|(_, v)| v).collect();

        match record.id() {
            None => {
                let placeholders = vec!["?"; columns.len()].join(", ");
                let sql = format!(
                    "INSERT INTO \"{}\" ({}) VALUES ({placeholders})",
                    meta.db_table,
                    columns.join(", ")
                );
                let id = self.backend.insert_returning_id(&sql, &params).await?;
                record.set_id(id);
            }
            Some(id) => {
                let assignments: Vec<String> =
                    columns.iter().map(|c| format!("{c} = ?")).collect();
                let sql = format!(
                    "UPDATE \"{}\" SET {} WHERE \"id\" = ?",
                    meta.db_table,
                    assignments.join(", ")
                );
                params.push(Value::Int(id));
                let affected = self.backend.execute(&sql, &params).await?;
                if affected == 0 {
                    return Err(EventosError::DoesNotExist(format!(
                        "{} matching id={id} does not exist",
                        meta.model_name
                    )));
                }
            }
        }
        Ok(record)
    }

    async fn delete(&self, id: i64) -> EventosResult<bool> {
        let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = ?", M::meta().db_table);
        let affected = self.backend.execute(&sql, &[Value::Int(id)]).await?;
        Ok(affected > 0)
    }
}
