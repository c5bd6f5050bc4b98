//! The application's URL configuration.

use eventos_views::RouteTable;

/// Every route the application serves.
///
/// `eventos` and `voluntarios` each name two patterns: the listing and the
/// listing with one record loaded for editing.
pub fn routes() -> RouteTable {
    RouteTable::new()
        .route("index", "/")
        .route("eventos", "/eventos/")
        .route("eventos", "/eventos/{id}/")
        .route("voluntarios", "/voluntarios")
        .route("voluntarios", "/voluntarios/{id}/")
}
