//! The [`Repository`] trait: the only way controllers reach stored records.

use async_trait::async_trait;
use eventos_core::EventosResult;

use crate::model::Model;
use crate::query::ListQuery;

/// Async storage for one model type.
///
/// Implementations own their records; callers receive clones and must call
/// [`Repository::save`] for any change to become visible.
#[async_trait]
pub trait Repository<M: Model>: Send + Sync {
    /// Returns every record passing the query's filter, in its order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query references unknown fields or the
    /// backend fails.
    async fn find_all(&self, query: &ListQuery) -> EventosResult<Vec<M>>;

    /// Looks up one record by id.
    ///
    /// # Errors
    ///
    /// Returns an error only on backend failure; a missing record is `None`.
    async fn find_by_id(&self, id: i64) -> EventosResult<Option<M>>;

    /// Inserts the record when its id is unset, overwrites it otherwise.
    ///
    /// Returns the stored record with its id assigned.
    ///
    /// # Errors
    ///
    /// Returns [`eventos_core::EventosError::DoesNotExist`] when updating an
    /// id that is not stored, or a backend error.
    async fn save(&self, record: M) -> EventosResult<M>;

    /// Removes a record. Returns `false` if no record had this id.
    ///
    /// # Errors
    ///
    /// Returns an error on backend failure.
    async fn delete(&self, id: i64) -> EventosResult<bool>;

    /// Counts the records passing the query's filter.
    ///
    /// # Errors
    ///
    /// Same as [`Repository::find_all`].
    async fn count(&self, query: &ListQuery) -> EventosResult<usize> {
        Ok(self.find_all(query).await?.len())
    }
}
