//! Assembles the web application.

use axum::Router;
use eventos_core::{EventosResult, Settings};
use eventos_views::{EventosApp, TemplateRenderer};

use crate::db::Database;
use crate::urls::routes;
use crate::views::{evento_view, voluntario_view, INDEX_TEMPLATE};

/// Templates compiled into the binary. Files of the same name in
/// `Settings::template_dirs` take precedence.
pub const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("_form.html", include_str!("../templates/_form.html")),
    ("_pagination.html", include_str!("../templates/_pagination.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("eventos.html", include_str!("../templates/eventos.html")),
    ("voluntarios.html", include_str!("../templates/voluntarios.html")),
];

/// Builds the application over `db`.
///
/// # Errors
///
/// Returns an error if a template fails to compile or a controller is
/// misconfigured.
pub fn build_app(settings: Settings, db: &Database) -> EventosResult<EventosApp> {
    let renderer = TemplateRenderer::new(&settings.template_dirs, TEMPLATES)?;
    let paginate_by = settings.paginate_by;
    EventosApp::new(settings, renderer, routes())
        .page("index", INDEX_TEMPLATE)?
        .crud("eventos", evento_view(paginate_by), db.eventos())?
        .crud("voluntarios", voluntario_view(paginate_by), db.voluntarios())
}

/// Builds the application and converts it into a router.
///
/// # Errors
///
/// See [`build_app`].
pub fn router(settings: Settings, db: &Database) -> EventosResult<Router> {
    Ok(build_app(settings, db)?.into_router())
}
