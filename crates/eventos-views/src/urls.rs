//! Named routes and reverse URL resolution.
//!
//! A [`RouteTable`] records the path pattern behind each route name so code
//! can refer to destinations by name. Patterns use axum's `{param}` syntax;
//! one name may own several patterns (a listing and its `{id}` detail), and
//! [`RouteTable::reverse`] picks the one whose parameter count matches the
//! arguments given.
//!
//! # Examples
//!
//! ```
//! use eventos_views::urls::RouteTable;
//!
//! let routes = RouteTable::new()
//!     .route("eventos", "/eventos/")
//!     .route("eventos", "/eventos/{id}/");
//!
//! assert_eq!(routes.reverse("eventos", &[]).unwrap(), "/eventos/");
//! assert_eq!(routes.reverse("eventos", &["3"]).unwrap(), "/eventos/3/");
//! assert!(routes.reverse("missing", &[]).is_err());
//! ```

use eventos_core::{EventosError, EventosResult};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when an argument is placed into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One named path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRoute {
    /// Route name used for reversing.
    pub name: String,
    /// Path pattern, e.g. `/eventos/{id}/`.
    pub path: String,
}

impl NamedRoute {
    /// Parameter names in the order they appear.
    pub fn params(&self) -> Vec<&str> {
        let mut params = Vec::new();
        let mut rest = self.path.as_str();
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            params.push(&rest[start + 1..start + len]);
            rest = &rest[start + len + 1..];
        }
        params
    }
}

/// Every named route of the application.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<NamedRoute>,
}

impl RouteTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `path` under `name`.
    #[must_use]
    pub fn route(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.routes.push(NamedRoute {
            name: name.into(),
            path: path.into(),
        });
        self
    }

    /// All registered routes in registration order.
    pub fn routes(&self) -> &[NamedRoute] {
        &self.routes
    }

    /// Returns `true` if any pattern is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.routes.iter().any(|r| r.name == name)
    }

    /// The pattern registered under `name` that takes `arity` parameters.
    pub fn pattern(&self, name: &str, arity: usize) -> Option<&str> {
        self.routes
            .iter()
            .find(|r| r.name == name && r.params().len() == arity)
            .map(|r| r.path.as_str())
    }

    /// Builds the path for `name` with `args` filled in positionally.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::NotFound`] if no pattern under `name` takes
    /// exactly `args.len()` parameters, or [`EventosError::ConfigurationError`]
    /// if a pattern has an unclosed brace.
    pub fn reverse(&self, name: &str, args: &[&str]) -> EventosResult<String> {
        let candidate = self
            .routes
            .iter()
            .filter(|r| r.name == name)
            .find(|r| r.params().len() == args.len())
            .ok_or_else(|| {
                EventosError::NotFound(format!(
                    "Reverse for '{name}' with arguments {args:?} not found"
                ))
            })?;
        substitute(&candidate.path, args)
    }
}

fn substitute(pattern: &str, args: &[&str]) -> EventosResult<String> {
    let mut result = String::with_capacity(pattern.len());
    let mut remaining = pattern;
    let mut args = args.iter();

    while let Some(start) = remaining.find('{') {
        result.push_str(&remaining[..start]);
        let end = remaining[start..].find('}').ok_or_else(|| {
            EventosError::ConfigurationError(format!("Unclosed brace in route pattern: {pattern}"))
        })? + start;
        let value = args.next().ok_or_else(|| {
            EventosError::NotFound(format!("Too few arguments for route pattern: {pattern}"))
        })?;
        result.extend(utf8_percent_encode(value, SEGMENT));
        remaining = &remaining[end + 1..];
    }
    result.push_str(remaining);

    if result.starts_with('/') {
        Ok(result)
    } else {
        Ok(format!("/{result}"))
    }
}
