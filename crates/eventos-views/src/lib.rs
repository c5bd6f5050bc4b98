//! # eventos-views
//!
//! The web layer of eventos: the generic search/paginate/CRUD controller and
//! the services it leans on.
//!
//! ## Modules
//!
//! - [`crud`] - [`CrudConfig`], [`CrudAction`], [`CrudController`]
//! - [`pagination`] - [`Paginator`] and [`Page`]
//! - [`messages`] - Flash notifications in a signed cookie
//! - [`templates`] - Tera-backed [`TemplateRenderer`]
//! - [`urls`] - Named routes and reverse lookup
//! - [`error`] - HTTP mapping of errors
//! - [`server`] - [`EventosApp`], the application builder

pub mod crud;
pub mod error;
pub mod messages;
pub mod pagination;
pub mod server;
pub mod templates;
pub mod urls;

pub use crud::{ActionError, CrudAction, CrudConfig, CrudController, ListContext, ListParams, WriteOutcome};
pub use error::{ViewError, ViewResult};
pub use messages::{CookieMessageStorage, Message, MessageLevel};
pub use pagination::{Page, PageContext, Paginator};
pub use server::{AppState, EventosApp};
pub use templates::TemplateRenderer;
pub use urls::RouteTable;
