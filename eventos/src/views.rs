//! Controller configurations for the two listings.

use eventos_views::CrudConfig;

use crate::forms::{evento_form_fields, voluntario_form_fields};
use crate::models::{Evento, Voluntario};

/// The landing page template.
pub const INDEX_TEMPLATE: &str = "index.html";

/// Events: searched by title and description, newest date first.
pub fn evento_view(paginate_by: usize) -> CrudConfig<Evento> {
    CrudConfig::new("eventos.html", "eventos", "eventos")
        .form_fields(evento_form_fields)
        .search_fields(["titulo", "descripcion"])
        .paginate_by(paginate_by)
        .order_by("-fecha")
}

/// Volunteers: searched by name, email and phone, most recently added
/// first.
pub fn voluntario_view(paginate_by: usize) -> CrudConfig<Voluntario> {
    CrudConfig::new("voluntarios.html", "voluntarios", "voluntarios")
        .form_fields(voluntario_form_fields)
        .search_fields(["nombre", "email", "telefono"])
        .paginate_by(paginate_by)
        .order_by("-id")
}
