//! HTTP server integration.
//!
//! [`EventosApp`] mounts pages and CRUD controllers under the paths of a
//! [`RouteTable`], adds static files and request tracing, and runs the
//! result on axum.
//!
//! # Examples
//!
//! ```no_run
//! use eventos_core::Settings;
//! use eventos_views::server::EventosApp;
//! use eventos_views::templates::TemplateRenderer;
//! use eventos_views::urls::RouteTable;
//!
//! # async fn example() -> eventos_core::EventosResult<()> {
//! let routes = RouteTable::new().route("index", "/");
//! let renderer = TemplateRenderer::from_embedded(&[("index.html", "hola")])?;
//! let app = EventosApp::new(Settings::default(), renderer, routes).page("index", "index.html")?;
//! app.run().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, Request};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use eventos_core::logging::request_span;
use eventos_core::{EventosError, EventosResult, Settings};
use eventos_db::{Model, Repository};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::crud::{CrudConfig, CrudController};
use crate::error::{ViewError, ViewResult};
use crate::messages::{CookieMessageStorage, MessageContext};
use crate::templates::TemplateRenderer;
use crate::urls::RouteTable;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Template renderer.
    pub renderer: Arc<TemplateRenderer>,
    /// Flash message storage.
    pub messages: CookieMessageStorage,
}

impl AppState {
    /// Creates state that signs messages with `secret_key`.
    pub fn new(renderer: TemplateRenderer, secret_key: &str) -> Self {
        Self {
            renderer: Arc::new(renderer),
            messages: CookieMessageStorage::new(secret_key),
        }
    }

    /// An HTML response that also clears the messages cookie if the request
    /// sent one, since rendering consumed its messages.
    pub fn html_response(&self, request_headers: &HeaderMap, body: String) -> Response {
        let mut response = Html(body).into_response();
        if CookieMessageStorage::has_cookie(request_headers) {
            response
                .headers_mut()
                .append(SET_COOKIE, CookieMessageStorage::clear());
        }
        response
    }

    /// Renders a template whose only context is the pending messages.
    ///
    /// # Errors
    ///
    /// Returns a template error if rendering fails.
    pub fn render_page(&self, template_name: &str, headers: &HeaderMap) -> ViewResult<Response> {
        let messages: Vec<MessageContext> = self
            .messages
            .load(headers)
            .iter()
            .map(MessageContext::from)
            .collect();
        let mut context = tera::Context::new();
        context.insert("messages", &messages);
        let body = self.renderer.render(template_name, &context)?;
        Ok(self.html_response(headers, body))
    }
}

struct Page {
    template_name: String,
    state: AppState,
}

async fn page_handler(State(page): State<Arc<Page>>, headers: HeaderMap) -> ViewResult<Response> {
    page.state.render_page(&page.template_name, &headers)
}

async fn not_found() -> ViewError {
    ViewError(EventosError::NotFound("Page not found".to_string()))
}

/// The application builder.
pub struct EventosApp {
    settings: Settings,
    state: AppState,
    routes: RouteTable,
    router: Router,
}

impl EventosApp {
    /// Creates an application with no handlers mounted yet.
    pub fn new(settings: Settings, renderer: TemplateRenderer, routes: RouteTable) -> Self {
        let state = AppState::new(renderer, &settings.secret_key);
        Self {
            settings,
            state,
            routes,
            router: Router::new(),
        }
    }

    /// The settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The shared handler state.
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// The route table.
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    fn require_template(&self, template_name: &str) -> EventosResult<()> {
        if self.state.renderer.has_template(template_name) {
            Ok(())
        } else {
            Err(EventosError::ConfigurationError(format!(
                "Template '{template_name}' is not loaded"
            )))
        }
    }

    fn require_pattern(&self, name: &str, arity: usize) -> EventosResult<String> {
        self.routes
            .pattern(name, arity)
            .map(str::to_string)
            .ok_or_else(|| {
                EventosError::ConfigurationError(format!(
                    "Route '{name}' has no pattern with {arity} parameter(s)"
                ))
            })
    }

    /// Serves `template_name` with GET at the parameterless pattern of
    /// route `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::ConfigurationError`] if the route or the
    /// template is missing.
    pub fn page(mut self, name: &str, template_name: &str) -> EventosResult<Self> {
        let path = self.require_pattern(name, 0)?;
        self.require_template(template_name)?;
        let page = Arc::new(Page {
            template_name: template_name.to_string(),
            state: self.state.clone(),
        });
        self.router = self
            .router
            .route(&path, get(page_handler).with_state(page));
        tracing::debug!(route = name, path = %path, "page mounted");
        Ok(self)
    }

    /// Mounts a CRUD controller for `M` at the patterns of route `name`:
    /// the parameterless one lists, the one with `{id}` edits.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::ConfigurationError`] if `config` is invalid,
    /// either pattern is missing, or the template is not loaded.
    pub fn crud<M: Model>(
        mut self,
        name: &str,
        config: CrudConfig<M>,
        repository: Arc<dyn Repository<M>>,
    ) -> EventosResult<Self> {
        let list_path = self.require_pattern(name, 0)?;
        let detail_path = self.require_pattern(name, 1)?;
        self.require_template(config.template_name())?;
        let controller = CrudController::new(config, repository, &self.routes)?;
        tracing::debug!(
            route = name,
            model = M::meta().model_name,
            list = %list_path,
            detail = %detail_path,
            "CRUD controller mounted"
        );
        self.router = self.router.merge(controller.into_router(
            &list_path,
            &detail_path,
            self.state.clone(),
        ));
        Ok(self)
    }

    /// Adds an arbitrary router.
    #[must_use]
    pub fn merge(mut self, router: Router) -> Self {
        self.router = self.router.merge(router);
        self
    }

    /// Converts the application into an axum router with static files,
    /// a 404 fallback, and request tracing.
    pub fn into_router(self) -> Router {
        let mut router = self.router.fallback(not_found);

        if let Some(dir) = self.settings.static_dir.as_ref().filter(|d| d.is_dir()) {
            let prefix = self.settings.static_url.trim_end_matches('/');
            if !prefix.starts_with('/') {
                tracing::warn!(
                    static_url = %self.settings.static_url,
                    "static_url must be an absolute path other than '/', static files are not served"
                );
            } else {
                router = router.nest_service(prefix, ServeDir::new(dir));
            }
        }

        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    request_span(req.method().as_str(), req.uri().path())
                }),
        )
    }

    /// Runs the server on the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails or the server stops with an error.
    pub async fn run(self) -> EventosResult<()> {
        let addr = self.settings.bind_address.clone();
        self.run_on(&addr).await
    }

    /// Runs the server on `addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails or the server stops with an error.
    pub async fn run_on(self, addr: &str) -> EventosResult<()> {
        let debug = self.settings.debug;
        let router = self.into_router();
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            EventosError::ConfigurationError(format!("Failed to bind to {addr}: {e}"))
        })?;

        if debug {
            tracing::info!("Starting development server at http://{addr}/");
        } else {
            tracing::info!(addr, "listening");
        }

        axum::serve(listener, router)
            .await
            .map_err(|e| EventosError::OperationalError(format!("Server error: {e}")))?;

        Ok(())
    }
}

impl std::fmt::Debug for EventosApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventosApp")
            .field("routes", &self.routes.routes().len())
            .field("debug", &self.settings.debug)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::messages::Message;

    fn app() -> EventosApp {
        let renderer = TemplateRenderer::from_embedded(&[(
            "index.html",
            "inicio{% for m in messages %}[{{ m.message }}]{% endfor %}",
        )])
        .unwrap();
        let settings = Settings {
            static_dir: None,
            ..Settings::default()
        };
        EventosApp::new(settings, renderer, RouteTable::new().route("index", "/"))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_page_requires_route_and_template() {
        assert!(app().page("index", "index.html").is_ok());
        assert!(app().page("missing", "index.html").is_err());
        assert!(app().page("index", "missing.html").is_err());
    }

    #[tokio::test]
    async fn test_page_renders() {
        let router = app().page("index", "index.html").unwrap().into_router();
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(body_text(response).await, "inicio");
    }

    #[tokio::test]
    async fn test_page_consumes_messages() {
        let app = app().page("index", "index.html").unwrap();
        let cookie = app
            .state()
            .messages
            .store(&[Message::success("listo")])
            .unwrap();
        let pair = cookie.to_str().unwrap().split(';').next().unwrap().to_string();
        let response = app
            .into_router()
            .oneshot(
                Request::get("/")
                    .header("cookie", pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));
        assert_eq!(body_text(response).await, "inicio[listo]");
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let router = app().page("index", "index.html").unwrap().into_router();
        let response = router
            .oneshot(Request::get("/nada").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_files_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.css"), "body{}").unwrap();
        let renderer = TemplateRenderer::from_embedded(&[]).unwrap();
        let settings = Settings {
            static_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };
        let router = EventosApp::new(settings, renderer, RouteTable::new()).into_router();
        let response = router
            .oneshot(Request::get("/static/app.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "body{}");
    }

    #[test]
    fn test_debug_output() {
        let text = format!("{:?}", app());
        assert!(text.contains("EventosApp"));
    }
}
