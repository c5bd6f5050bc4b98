//! # eventos
//!
//! A small management tool for events and the volunteers who staff them.
//! Both record kinds get a listing with search and pagination plus create,
//! update and delete, all served by the generic controller in
//! [`eventos_views::crud`].
//!
//! | Path | Serves |
//! |---|---|
//! | `/` | landing page |
//! | `/eventos/`, `/eventos/{id}/` | events, newest date first |
//! | `/voluntarios`, `/voluntarios/{id}/` | volunteers, newest first |

pub mod app;
pub mod commands;
pub mod db;
pub mod forms;
pub mod models;
pub mod urls;
pub mod views;

pub use app::{build_app, router};
pub use db::Database;
pub use models::{Evento, Voluntario};
