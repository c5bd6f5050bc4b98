//! The generic list/search/CRUD controller.
//!
//! One [`CrudController`] serves one model. Its [`CrudConfig`] names the
//! searchable fields, page size, sort key, template and redirect target;
//! the records themselves live behind an injected [`Repository`].
//!
//! Reads ([`CrudController::list`]) filter by the `q` parameter with a
//! case-insensitive substring match OR'd across the search fields, sort,
//! and paginate. When an `id` is routed in, the record is exposed as
//! `object` and the form is pre-filled with it.
//!
//! Writes ([`CrudController::write`]) dispatch on the `action` field:
//!
//! | action   | effect                                 |
//! |----------|----------------------------------------|
//! | `create` | validate, insert                       |
//! | `update` | load `id`, validate onto a copy, save  |
//! | `delete` | remove `id`                            |
//!
//! Every write that does not hit a missing record ends in a notification
//! and a `303 See Other` to the configured route.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use eventos_core::{EventosError, EventosResult};
use eventos_db::{ListQuery, Model, OrderBy, Repository, SearchFilter};
use eventos_forms::{fields_for_model, FormContext, FormData, FormFieldDef, ModelForm};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::ViewResult;
use crate::messages::{Message, MessageContext};
use crate::pagination::{PageContext, Paginator};
use crate::server::AppState;
use crate::urls::RouteTable;

/// Static configuration of one [`CrudController`].
///
/// # Examples
///
/// ```ignore
/// let config = CrudConfig::<Evento>::new("eventos.html", "eventos", "eventos")
///     .form_fields(evento_form_fields)
///     .search_fields(["titulo", "descripcion"])
///     .paginate_by(5)
///     .order_by("-fecha");
/// ```
pub struct CrudConfig<M: Model> {
    form_fields: fn() -> Vec<FormFieldDef>,
    search_fields: Vec<String>,
    paginate_by: usize,
    order_by: OrderBy,
    context_object_name: String,
    success_url: String,
    template_name: String,
    _model: PhantomData<fn() -> M>,
}

fn all_form_fields<M: Model>() -> Vec<FormFieldDef> {
    fields_for_model::<M>(&M::meta().field_names())
}

impl<M: Model> CrudConfig<M> {
    /// A configuration with every editable field in the form, no search
    /// fields, five records per page, and the model's default ordering
    /// (newest `id` first when it has none).
    pub fn new(
        template_name: impl Into<String>,
        context_object_name: impl Into<String>,
        success_url: impl Into<String>,
    ) -> Self {
        Self {
            form_fields: all_form_fields::<M>,
            search_fields: Vec::new(),
            paginate_by: 5,
            order_by: M::meta()
                .ordering
                .first()
                .cloned()
                .unwrap_or_else(|| OrderBy::desc("id")),
            context_object_name: context_object_name.into(),
            success_url: success_url.into(),
            template_name: template_name.into(),
            _model: PhantomData,
        }
    }

    /// Sets the function that builds the form fields.
    #[must_use]
    pub fn form_fields(mut self, form_fields: fn() -> Vec<FormFieldDef>) -> Self {
        self.form_fields = form_fields;
        self
    }

    /// Sets the fields searched by `q`.
    #[must_use]
    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn paginate_by(mut self, paginate_by: usize) -> Self {
        self.paginate_by = paginate_by;
        self
    }

    /// Sets the sort key; a leading `-` sorts descending.
    #[must_use]
    pub fn order_by(mut self, key: &str) -> Self {
        self.order_by = OrderBy::parse(key);
        self
    }

    /// A fresh set of form fields.
    pub fn build_form_fields(&self) -> Vec<FormFieldDef> {
        (self.form_fields)()
    }

    /// Fields searched by `q`.
    pub fn search_field_names(&self) -> &[String] {
        &self.search_fields
    }

    /// Records per page.
    pub const fn page_size(&self) -> usize {
        self.paginate_by
    }

    /// The sort key.
    pub const fn sort_key(&self) -> &OrderBy {
        &self.order_by
    }

    /// Context name of the current page.
    pub fn context_object_name(&self) -> &str {
        &self.context_object_name
    }

    /// Route name writes redirect to.
    pub fn success_url(&self) -> &str {
        &self.success_url
    }

    /// Template used for reads.
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Checks the configuration against the model metadata.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::ConfigurationError`] for a zero page size, an
    /// empty template or context name, or any field the model lacks.
    pub fn validate(&self) -> EventosResult<()> {
        let meta = M::meta();
        if self.paginate_by == 0 {
            return Err(EventosError::ConfigurationError(format!(
                "paginate_by for {} must be positive",
                meta.model_name
            )));
        }
        if self.template_name.is_empty() || self.context_object_name.is_empty() {
            return Err(EventosError::ConfigurationError(format!(
                "template_name and context_object_name for {} must not be empty",
                meta.model_name
            )));
        }
        let form_fields = self.build_form_fields();
        let unknown = self
            .search_fields
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.order_by.field.as_str()))
            .chain(form_fields.iter().map(|f| f.name.as_str()))
            .find(|name| !meta.has_field(name));
        if let Some(name) = unknown {
            return Err(EventosError::ConfigurationError(format!(
                "Unknown field '{name}' in configuration of {}",
                meta.model_name
            )));
        }
        Ok(())
    }
}

impl<M: Model> Clone for CrudConfig<M> {
    fn clone(&self) -> Self {
        Self {
            form_fields: self.form_fields,
            search_fields: self.search_fields.clone(),
            paginate_by: self.paginate_by,
            order_by: self.order_by.clone(),
            context_object_name: self.context_object_name.clone(),
            success_url: self.success_url.clone(),
            template_name: self.template_name.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for CrudConfig<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudConfig")
            .field("model", &M::meta().model_name)
            .field("search_fields", &self.search_fields)
            .field("paginate_by", &self.paginate_by)
            .field("order_by", &self.order_by)
            .field("context_object_name", &self.context_object_name)
            .field("success_url", &self.success_url)
            .field("template_name", &self.template_name)
            .finish_non_exhaustive()
    }
}

/// A write requested through the `action` form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudAction {
    /// Insert a new record.
    Create,
    /// Overwrite the record `id`.
    Update {
        /// Target record.
        id: i64,
    },
    /// Remove the record `id`.
    Delete {
        /// Target record.
        id: i64,
    },
}

/// Why an `action`/`id` pair was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The action is not one of `create`, `update`, `delete`.
    Unknown(String),
    /// `update` or `delete` without a usable `id`.
    InvalidId(Option<String>),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(action) => write!(f, "Unknown action '{action}'"),
            Self::InvalidId(Some(raw)) => write!(f, "Invalid id '{raw}'"),
            Self::InvalidId(None) => write!(f, "Missing id"),
        }
    }
}

impl std::error::Error for ActionError {}

impl CrudAction {
    /// Parses the submitted `action` and `id` fields.
    ///
    /// # Errors
    ///
    /// [`ActionError::Unknown`] for anything but the three actions (a
    /// missing action included), [`ActionError::InvalidId`] when `update` or
    /// `delete` comes without an integer `id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use eventos_views::crud::{ActionError, CrudAction};
    ///
    /// assert_eq!(CrudAction::parse(Some("create"), None), Ok(CrudAction::Create));
    /// assert_eq!(
    ///     CrudAction::parse(Some("delete"), Some("4")),
    ///     Ok(CrudAction::Delete { id: 4 })
    /// );
    /// assert!(matches!(
    ///     CrudAction::parse(Some("archive"), Some("4")),
    ///     Err(ActionError::Unknown(_))
    /// ));
    /// ```
    pub fn parse(action: Option<&str>, id: Option<&str>) -> Result<Self, ActionError> {
        let parse_id = || {
            id.map(str::trim)
                .and_then(|raw| raw.parse::<i64>().ok())
                .ok_or_else(|| ActionError::InvalidId(id.map(str::to_string)))
        };
        match action.unwrap_or_default() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update { id: parse_id()? }),
            "delete" => Ok(Self::Delete { id: parse_id()? }),
            other => Err(ActionError::Unknown(other.to_string())),
        }
    }

    /// The action's form value.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// The targeted record, if any.
    pub const fn id(self) -> Option<i64> {
        match self {
            Self::Create => None,
            Self::Update { id } | Self::Delete { id } => Some(id),
        }
    }
}

/// Query parameters of a read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Search term.
    pub q: Option<String>,
    /// Raw page number.
    pub page: Option<String>,
}

/// Everything a listing template needs.
#[derive(Debug, Clone, Serialize)]
pub struct ListContext<M> {
    /// Context key of `page`.
    #[serde(skip)]
    pub list_label: String,
    /// The current page of records.
    pub page: PageContext<M>,
    /// The search term as submitted.
    pub search_query: String,
    /// The search term encoded for query strings.
    pub search_query_encoded: String,
    /// The draft, empty or pre-filled from `object`.
    pub form: FormContext,
    /// Plural display name, title-cased.
    pub model_verbose_name: String,
    /// Singular display name.
    pub verbose_name: String,
    /// The routed record, if any.
    pub object: Option<M>,
    /// Notifications consumed by this render.
    pub messages: Vec<MessageContext>,
}

impl<M: Serialize> ListContext<M> {
    /// Converts to a template context, with the page under
    /// [`ListContext::list_label`] and also as `page_obj`.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::TemplateError`] if a value fails to serialize.
    pub fn to_context(&self) -> EventosResult<tera::Context> {
        fn insert<T: Serialize + ?Sized>(
            ctx: &mut tera::Context,
            key: &str,
            value: &T,
        ) -> EventosResult<()> {
            ctx.try_insert(key, value)
                .map_err(|e| EventosError::TemplateError(e.to_string()))
        }

        let mut ctx = tera::Context::new();
        insert(&mut ctx, &self.list_label, &self.page)?;
        insert(&mut ctx, "page_obj", &self.page)?;
        insert(&mut ctx, "is_paginated", &self.page.has_other_pages)?;
        insert(&mut ctx, "search_query", &self.search_query)?;
        insert(&mut ctx, "search_query_encoded", &self.search_query_encoded)?;
        insert(&mut ctx, "form", &self.form)?;
        insert(&mut ctx, "model_verbose_name", &self.model_verbose_name)?;
        insert(&mut ctx, "verbose_name", &self.verbose_name)?;
        insert(&mut ctx, "object", &self.object)?;
        insert(&mut ctx, "messages", &self.messages)?;
        Ok(ctx)
    }
}

/// Result of a write: the notification and where to go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// The notification to show on the next render.
    pub message: Message,
    /// Redirect path.
    pub redirect_to: String,
}

/// Search, paginate, and CRUD for one model.
pub struct CrudController<M: Model> {
    config: CrudConfig<M>,
    repository: Arc<dyn Repository<M>>,
    success_path: String,
}

impl<M: Model> CrudController<M> {
    /// Validates `config` and resolves its redirect route.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::ConfigurationError`] if the configuration is
    /// invalid or `success_url` names no route without parameters.
    pub fn new(
        config: CrudConfig<M>,
        repository: Arc<dyn Repository<M>>,
        routes: &RouteTable,
    ) -> EventosResult<Self> {
        config.validate()?;
        let success_path = routes.reverse(config.success_url(), &[]).map_err(|e| {
            EventosError::ConfigurationError(format!(
                "success_url of {}: {e}",
                M::meta().model_name
            ))
        })?;
        Ok(Self {
            config,
            repository,
            success_path,
        })
    }

    /// The configuration.
    pub const fn config(&self) -> &CrudConfig<M> {
        &self.config
    }

    /// The repository.
    pub const fn repository(&self) -> &Arc<dyn Repository<M>> {
        &self.repository
    }

    /// Where writes redirect to.
    pub fn success_path(&self) -> &str {
        &self.success_path
    }

    /// An empty draft.
    pub fn new_form(&self) -> ModelForm<M> {
        ModelForm::new(self.config.build_form_fields())
    }

    /// The filter and sort for search term `q`.
    pub fn list_query(&self, q: &str) -> ListQuery {
        ListQuery::new()
            .search(SearchFilter::new(q, self.config.search_fields.iter().cloned()))
            .order_by(self.config.order_by.clone())
    }

    /// Loads record `id`.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::NotFound`] if it does not exist, or a
    /// repository error.
    pub async fn get_object(&self, id: i64) -> EventosResult<M> {
        self.repository.find_by_id(id).await?.ok_or_else(|| {
            EventosError::NotFound(format!(
                "No {} matches the given query (id {id}).",
                M::meta().verbose_name
            ))
        })
    }

    /// Builds the listing for a read.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::NotFound`] if `id` is given and missing, or a
    /// repository error.
    pub async fn list(
        &self,
        params: &ListParams,
        id: Option<i64>,
        messages: &[Message],
    ) -> EventosResult<ListContext<M>> {
        let meta = M::meta();
        let (object, form) = match id {
            Some(id) => {
                let record = self.get_object(id).await?;
                let form = self.new_form().with_instance(&record);
                (Some(record), form)
            }
            None => (None, self.new_form()),
        };

        let search_query = params.q.clone().unwrap_or_default();
        let records = self
            .repository
            .find_all(&self.list_query(&search_query))
            .await?;
        let paginator = Paginator::new(records, self.config.paginate_by);
        let page = paginator.get_page_from_query(params.page.as_deref());
        tracing::debug!(
            model = meta.model_name,
            q = %search_query,
            total = paginator.count(),
            page = page.number(),
            id = ?id,
            "listing"
        );

        Ok(ListContext {
            list_label: self.config.context_object_name.clone(),
            page: page.to_context(),
            search_query_encoded: utf8_percent_encode(&search_query, NON_ALPHANUMERIC)
                .to_string(),
            search_query,
            form: form.as_context(),
            model_verbose_name: meta.verbose_name_plural_title(),
            verbose_name: meta.verbose_name.clone(),
            object,
            messages: messages.iter().map(MessageContext::from).collect(),
        })
    }

    /// Performs the write described by `data`.
    ///
    /// Validation failures and unknown actions are not errors: they produce
    /// an error notification and leave storage untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::NotFound`] when `update`/`delete` target a
    /// missing or unparseable `id`, or a repository error.
    pub async fn write(&self, data: &FormData) -> EventosResult<WriteOutcome> {
        let meta = M::meta();
        let parsed = CrudAction::parse(
            data.get("action").map(String::as_str),
            data.get("id").map(String::as_str),
        );
        let message = match parsed {
            Ok(CrudAction::Create) => self.create(data).await?,
            Ok(CrudAction::Update { id }) => self.update(id, data).await?,
            Ok(CrudAction::Delete { id }) => self.delete(id).await?,
            Err(ActionError::Unknown(action)) => {
                tracing::warn!(model = meta.model_name, action = %action, "unknown action");
                Message::error("Acción no válida.")
            }
            Err(err @ ActionError::InvalidId(_)) => {
                return Err(EventosError::NotFound(format!(
                    "No {} matches the given query: {err}",
                    meta.verbose_name
                )));
            }
        };
        Ok(WriteOutcome {
            message,
            redirect_to: self.success_path.clone(),
        })
    }

    async fn create(&self, data: &FormData) -> EventosResult<Message> {
        let meta = M::meta();
        let mut form = self.new_form();
        form.bind(data);
        if !form.is_valid() {
            tracing::warn!(
                model = meta.model_name,
                errors = ?form.form().errors(),
                "create rejected"
            );
            return Ok(Message::error(format!(
                "Error al crear el {}.",
                meta.verbose_name
            )));
        }
        let record = form.construct_instance(&M::default())?;
        let saved = self.repository.save(record).await?;
        tracing::info!(model = meta.model_name, id = ?saved.id(), "created");
        Ok(Message::success(format!(
            "{} creado correctamente.",
            meta.verbose_name_capitalized()
        )))
    }

    async fn update(&self, id: i64, data: &FormData) -> EventosResult<Message> {
        let meta = M::meta();
        let current = self.get_object(id).await?;
        let mut form = self.new_form().with_instance(&current);
        form.bind(data);
        if !form.is_valid() {
            tracing::warn!(
                model = meta.model_name,
                id,
                errors = ?form.form().errors(),
                "update rejected"
            );
            return Ok(Message::error(format!(
                "Error al actualizar el {}.",
                meta.verbose_name
            )));
        }
        let record = form.construct_instance(&current)?;
        self.repository.save(record).await?;
        tracing::info!(model = meta.model_name, id, "updated");
        Ok(Message::success(format!(
            "{} actualizado correctamente.",
            meta.verbose_name_capitalized()
        )))
    }

    async fn delete(&self, id: i64) -> EventosResult<Message> {
        let meta = M::meta();
        if !self.repository.delete(id).await? {
            return Err(EventosError::NotFound(format!(
                "No {} matches the given query (id {id}).",
                meta.verbose_name
            )));
        }
        tracing::info!(model = meta.model_name, id, "deleted");
        Ok(Message::success(format!(
            "{} eliminado correctamente.",
            meta.verbose_name_capitalized()
        )))
    }

    /// Mounts the controller at `list_path` and `detail_path` (which must
    /// capture `{id}`). Both accept GET for reads and POST for writes.
    pub fn into_router(self, list_path: &str, detail_path: &str, state: AppState) -> Router {
        let route = Arc::new(CrudRoute {
            controller: self,
            state,
        });
        Router::new()
            .route(list_path, get(list_handler::<M>).post(write_handler::<M>))
            .route(detail_path, get(detail_handler::<M>).post(write_handler::<M>))
            .with_state(route)
    }
}

impl<M: Model> fmt::Debug for CrudController<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudController")
            .field("config", &self.config)
            .field("success_path", &self.success_path)
            .finish_non_exhaustive()
    }
}

struct CrudRoute<M: Model> {
    controller: CrudController<M>,
    state: AppState,
}

impl<M: Model> CrudRoute<M> {
    async fn render(
        &self,
        params: &ListParams,
        id: Option<i64>,
        headers: &HeaderMap,
    ) -> ViewResult<Response> {
        let messages = self.state.messages.load(headers);
        let view = self.controller.list(params, id, &messages).await?;
        let body = self
            .state
            .renderer
            .render(self.controller.config.template_name(), &view.to_context()?)?;
        Ok(self.state.html_response(headers, body))
    }
}

async fn list_handler<M: Model>(
    State(route): State<Arc<CrudRoute<M>>>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> ViewResult<Response> {
    route.render(&params, None, &headers).await
}

async fn detail_handler<M: Model>(
    State(route): State<Arc<CrudRoute<M>>>,
    Path(raw_id): Path<String>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> ViewResult<Response> {
    let id = raw_id
        .parse::<i64>()
        .map_err(|_| EventosError::NotFound(format!("Invalid id '{raw_id}'")))?;
    route.render(&params, Some(id), &headers).await
}

async fn write_handler<M: Model>(
    State(route): State<Arc<CrudRoute<M>>>,
    headers: HeaderMap,
    Form(data): Form<FormData>,
) -> ViewResult<Response> {
    let outcome = route.controller.write(&data).await?;
    let mut pending = route.state.messages.load(&headers);
    pending.push(outcome.message);
    let cookie = route.state.messages.store(&pending)?;
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Redirect::to(&outcome.redirect_to),
    )
        .into_response())
}
