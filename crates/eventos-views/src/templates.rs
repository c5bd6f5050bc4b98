//! Template rendering backed by [`tera`].
//!
//! Templates come from two places: files under the configured template
//! directories, and templates embedded in the binary. A file on disk takes
//! precedence over an embedded template with the same name, which lets a
//! deployment override the built-in look without recompiling.
//!
//! Autoescaping is on for `.html` templates; pre-rendered HTML such as form
//! widgets must be output with `| safe`.

use std::error::Error as _;
use std::path::{Path, PathBuf};

use eventos_core::{EventosError, EventosResult};
use serde::Serialize;
use tera::{Context, Tera};

/// Renders named templates.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Loads every `.html` file under `dirs`, then adds each embedded
    /// `(name, source)` pair whose name was not found on disk.
    ///
    /// Directories that do not exist are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::IoError`] if a directory cannot be read and
    /// [`EventosError::TemplateError`] if a template does not parse.
    pub fn new(dirs: &[PathBuf], embedded: &[(&str, &str)]) -> EventosResult<Self> {
        let mut sources: Vec<(String, String)> = Vec::new();
        for dir in dirs {
            if dir.is_dir() {
                collect_templates(dir, dir, &mut sources)?;
            } else {
                tracing::debug!(dir = %dir.display(), "template directory not found, skipping");
            }
        }
        for (name, source) in embedded {
            if !sources.iter().any(|(n, _)| n == name) {
                sources.push(((*name).to_string(), (*source).to_string()));
            }
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources).map_err(template_error)?;
        tracing::debug!(count = tera.get_template_names().count(), "templates loaded");
        Ok(Self { tera })
    }

    /// A renderer over embedded templates only.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::TemplateError`] if a template does not parse.
    pub fn from_embedded(embedded: &[(&str, &str)]) -> EventosResult<Self> {
        Self::new(&[], embedded)
    }

    /// Returns `true` if a template with this name is loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Names of all loaded templates, sorted.
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tera.get_template_names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Renders `name` with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::TemplateError`] if the template is missing or
    /// fails to render.
    pub fn render(&self, name: &str, context: &Context) -> EventosResult<String> {
        self.tera.render(name, context).map_err(template_error)
    }

    /// Renders `name` with the fields of a serializable struct as context.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::TemplateError`] if `value` does not serialize
    /// to an object or rendering fails.
    pub fn render_serialize<T: Serialize>(&self, name: &str, value: &T) -> EventosResult<String> {
        let context = Context::from_serialize(value).map_err(template_error)?;
        self.render(name, &context)
    }
}

fn collect_templates(
    root: &Path,
    dir: &Path,
    out: &mut Vec<(String, String)>,
) -> EventosResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_templates(root, &path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if out.iter().any(|(n, _)| *n == name) {
                continue;
            }
            let source = std::fs::read_to_string(&path)?;
            out.push((name, source));
        }
    }
    Ok(())
}

/// Flattens a tera error and its causes into one message.
fn template_error(err: tera::Error) -> EventosError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    EventosError::TemplateError(message)
}
