//! A form field paired with its current value and errors.
//!
//! [`BoundField`] is what templates iterate over: every piece is already
//! rendered to a string, so the template only needs `{{ field.html | safe }}`.

use serde::Serialize;

use crate::fields::FormFieldDef;
use crate::widgets::escape_html;

/// One renderable form row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundField {
    /// HTML `name`.
    pub name: String,
    /// HTML `id` of the widget.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Help text.
    pub help_text: String,
    /// Whether the field is required.
    pub required: bool,
    /// The value shown in the widget.
    pub value: String,
    /// Validation errors.
    pub errors: Vec<String>,
    /// The rendered widget.
    pub html: String,
    /// The rendered `<label>`.
    pub label_tag: String,
}

impl BoundField {
    /// Builds a bound field from its definition and current state.
    pub fn new(field: &FormFieldDef, value: Option<String>, errors: Vec<String>) -> Self {
        let id = format!("id_{}", field.name);
        let mut attrs = field.attrs.clone();
        attrs.entry("id".to_string()).or_insert_with(|| id.clone());
        if field.required {
            attrs.insert("required".to_string(), "required".to_string());
        }
        let html = field.widget.render(&field.name, value.as_deref(), &attrs);
        let label_tag = format!(
            r#"<label for="{}">{}</label>"#,
            escape_html(&id),
            escape_html(&field.label)
        );
        Self {
            name: field.name.clone(),
            id,
            label: field.label.clone(),
            help_text: field.help_text.clone(),
            required: field.required,
            value: value.unwrap_or_default(),
            errors,
            html,
            label_tag,
        }
    }

    /// Returns `true` if this field has any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders the errors as `<ul class="errorlist">`.
    pub fn errors_as_ul(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        let items: String = self
            .errors
            .iter()
            .map(|e| format!("<li>{}</li>", escape_html(e)))
            .collect();
        format!(r#"<ul class="errorlist">{items}</ul>"#)
    }
}
