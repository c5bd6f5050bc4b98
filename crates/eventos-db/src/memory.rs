//! An in-memory [`Repository`].
//!
//! Records live in a `BTreeMap` keyed by id behind a tokio `RwLock`. Ids
//! come from a monotonically increasing counter and are never reused, even
//! after deletes.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use eventos_core::{EventosError, EventosResult};
use tokio::sync::RwLock;

use crate::model::Model;
use crate::query::ListQuery;
use crate::repository::Repository;

/// Stores records of one model type in process memory.
#[derive(Debug)]
pub struct InMemoryRepository<M: Model> {
    rows: RwLock<BTreeMap<i64, M>>,
    next_id: AtomicI64,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> InMemoryRepository<M> {
    /// Creates an empty repository; the first id handed out is 1.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            _model: PhantomData,
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl<M: Model> Default for InMemoryRepository<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<M: Model> Repository<M> for InMemoryRepository<M> {
    async fn find_all(&self, query: &ListQuery) -> EventosResult<Vec<M>> {
        query.validate(M::meta())?;
        let rows = self.rows.read().await;
        Ok(query.apply(rows.values().cloned()))
    }

    async fn find_by_id(&self, id: i64) -> EventosResult<Option<M>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, mut record: M) -> EventosResult<M> {
        let mut rows = self.rows.write().await;
        match record.id() {
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                record.set_id(id);
                rows.insert(id, record.clone());
                tracing::trace!(model = M::meta().model_name, id, "inserted");
            }
            Some(id) => {
                let slot = rows.get_mut(&id).ok_or_else(|| {
                    EventosError::DoesNotExist(format!(
                        "{} matching id={id} does not exist",
                        M::meta().model_name
                    ))
                })?;
                *slot = record.clone();
                tracing::trace!(model = M::meta().model_name, id, "updated");
            }
        }
        Ok(record)
    }

    async fn delete(&self, id: i64) -> EventosResult<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{OrderBy, SearchFilter};
    use crate::test_models::Charla;

    async fn seeded() -> InMemoryRepository<Charla> {
        let repo = InMemoryRepository::new();
        for (t, f) in [
            ("Rust async", "2024-03-01"),
            ("Bases de datos", "2024-05-01"),
            ("RUST embebido", "2023-11-20"),
        ] {
            repo.save(Charla::new(t, f)).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = seeded().await;
        let all = repo.find_all(&ListQuery::new()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|c| c.id.unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(repo.len().await, 3);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let repo = seeded().await;
        assert!(repo.delete(3).await.unwrap());
        let saved = repo.save(Charla::new("Nueva", "2024-01-01")).await.unwrap();
        assert_eq!(saved.id, Some(4));
    }

    #[tokio::test]
    async fn test_update_overwrites() {
        let repo = seeded().await;
        let mut c = repo.find_by_id(2).await.unwrap().unwrap();
        c.titulo = "Bases de datos II".to_string();
        repo.save(c).await.unwrap();
        let again = repo.find_by_id(2).await.unwrap().unwrap();
        assert_eq!(again.titulo, "Bases de datos II");
        assert_eq!(repo.len().await, 3);
    }

    #[tokio::test]
    async fn test_update_missing_is_does_not_exist() {
        let repo = seeded().await;
        let mut ghost = Charla::new("x", "2024-01-01");
        ghost.id = Some(99);
        assert!(matches!(
            repo.save(ghost).await,
            Err(EventosError::DoesNotExist(_))
        ));
        assert_eq!(repo.len().await, 3);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let repo = seeded().await;
        assert!(repo.delete(1).await.unwrap());
        assert!(!repo.delete(1).await.unwrap());
        assert!(repo.find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_and_order() {
        let repo = seeded().await;
        let q = ListQuery::new()
            .search(SearchFilter::new("rust", ["titulo"]))
            .order_by(OrderBy::desc("fecha"));
        let found = repo.find_all(&q).await.unwrap();
        let titles: Vec<_> = found.iter().map(|c| c.titulo.as_str()).collect();
        assert_eq!(titles, vec!["Rust async", "RUST embebido"]);
        assert_eq!(repo.count(&q).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_ties_broken_by_id() {
        let repo = InMemoryRepository::new();
        for t in ["c", "a", "b"] {
            repo.save(Charla::new(t, "2024-01-01")).await.unwrap();
        }
        let q = ListQuery::new().order_by(OrderBy::desc("fecha"));
        let ids: Vec<_> = repo
            .find_all(&q)
            .await
            .unwrap()
            .iter()
            .map(|c| c.id.unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unknown_field_rejected() {
        let repo = seeded().await;
        let q = ListQuery::new().order_by(OrderBy::asc("nombre"));
        assert!(matches!(
            repo.find_all(&q).await,
            Err(EventosError::ConfigurationError(_))
        ));
    }
}
