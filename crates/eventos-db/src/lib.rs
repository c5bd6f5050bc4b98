//! # eventos-db
//!
//! The persistence layer for eventos. Models describe their fields through
//! [`ModelMeta`]; controllers reach records only through the [`Repository`]
//! trait, which has an in-memory implementation (used by tests and the
//! `memory` engine) and a SQLite implementation.
//!
//! ## Modules
//!
//! - [`value`] - Backend-agnostic field values
//! - [`model`] - The `Model` trait, model metadata, and result rows
//! - [`query`] - Search filters, ordering, and `ListQuery`
//! - [`repository`] - The `Repository` trait
//! - [`memory`] - `InMemoryRepository`
//! - [`sqlite`] - `SqliteBackend` and `SqliteRepository` (feature `sqlite`)

pub mod memory;
pub mod model;
pub mod query;
pub mod repository;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod value;

#[cfg(test)]
pub(crate) mod test_models;

pub use memory::InMemoryRepository;
pub use model::{FieldDef, FieldType, FromValue, Model, ModelMeta, Row};
pub use query::{ListQuery, OrderBy, SearchFilter};
pub use repository::Repository;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteBackend, SqliteRepository};
pub use value::Value;
