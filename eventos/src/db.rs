//! Storage for the application's records.
//!
//! [`Database`] hands out one repository per model, backed either by a
//! shared SQLite connection or by process-local memory, as chosen by
//! [`DatabaseSettings::engine`].

use std::sync::Arc;

use eventos_core::{DatabaseEngine, DatabaseSettings, EventosResult};
use eventos_db::{InMemoryRepository, Model, Repository, SqliteBackend, SqliteRepository};

use crate::models::{Evento, Voluntario};

/// The repositories of every model, sharing one backend.
#[derive(Clone)]
pub struct Database {
    eventos: Arc<dyn Repository<Evento>>,
    voluntarios: Arc<dyn Repository<Voluntario>>,
    sqlite: Option<SqliteBackend>,
}

impl Database {
    /// Opens the configured storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the SQLite database cannot be opened.
    pub fn connect(settings: &DatabaseSettings) -> EventosResult<Self> {
        match settings.engine {
            DatabaseEngine::Memory => Ok(Self::in_memory()),
            DatabaseEngine::Sqlite => Ok(Self::sqlite(SqliteBackend::open(settings.name.as_str())?)),
        }
    }

    /// Empty in-memory storage; nothing survives the process.
    pub fn in_memory() -> Self {
        Self {
            eventos: Arc::new(InMemoryRepository::<Evento>::new()),
            voluntarios: Arc::new(InMemoryRepository::<Voluntario>::new()),
            sqlite: None,
        }
    }

    /// Repositories over an open SQLite connection.
    pub fn sqlite(backend: SqliteBackend) -> Self {
        Self {
            eventos: Arc::new(SqliteRepository::<Evento>::new(backend.clone())),
            voluntarios: Arc::new(SqliteRepository::<Voluntario>::new(backend.clone())),
            sqlite: Some(backend),
        }
    }

    /// The event repository.
    pub fn eventos(&self) -> Arc<dyn Repository<Evento>> {
        Arc::clone(&self.eventos)
    }

    /// The volunteer repository.
    pub fn voluntarios(&self) -> Arc<dyn Repository<Voluntario>> {
        Arc::clone(&self.voluntarios)
    }

    /// Creates any missing tables and returns the names of all tables
    /// checked. Running it again is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if a `CREATE TABLE` statement fails.
    pub async fn migrate(&self) -> EventosResult<Vec<String>> {
        let Some(backend) = &self.sqlite else {
            tracing::debug!("in-memory storage needs no tables");
            return Ok(Vec::new());
        };
        SqliteRepository::<Evento>::new(backend.clone())
            .create_table()
            .await?;
        SqliteRepository::<Voluntario>::new(backend.clone())
            .create_table()
            .await?;
        Ok(vec![
            Evento::meta().db_table.clone(),
            Voluntario::meta().db_table.clone(),
        ])
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("sqlite", &self.sqlite)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use eventos_db::ListQuery;

    #[tokio::test]
    async fn test_memory_engine() {
        let db = Database::connect(&DatabaseSettings {
            engine: DatabaseEngine::Memory,
            name: String::new(),
        })
        .unwrap();
        assert!(db.migrate().await.unwrap().is_empty());
        let saved = db
            .voluntarios()
            .save(Voluntario::new("Ana", "ana@example.com", "555"))
            .await
            .unwrap();
        assert_eq!(saved.id, Some(1));
    }

    #[tokio::test]
    async fn test_sqlite_file_is_migrated_once() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DatabaseSettings {
            engine: DatabaseEngine::Sqlite,
            name: dir.path().join("eventos.sqlite3").display().to_string(),
        };
        let db = Database::connect(&settings).unwrap();
        assert_eq!(
            db.migrate().await.unwrap(),
            vec!["myapp_evento".to_string(), "myapp_voluntario".to_string()]
        );
        db.migrate().await.unwrap();

        let fecha = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        db.eventos()
            .save(Evento::new("Feria", "Feria anual", fecha))
            .await
            .unwrap();

        let reopened = Database::connect(&settings).unwrap();
        let all = reopened.eventos().find_all(&ListQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].titulo, "Feria");
        assert_eq!(all[0].fecha, Some(fecha));
    }
}
