//! HTML rendering for form inputs.
//!
//! Attribute values and field contents are HTML-escaped; attributes are
//! emitted in sorted order so output is deterministic.

use std::collections::BTreeMap;
use std::fmt;

/// The built-in widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="email">`.
    EmailInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="date">`.
    DateInput,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::EmailInput => "EmailInput",
            Self::Textarea => "Textarea",
            Self::DateInput => "DateInput",
        };
        write!(f, "{name}")
    }
}

impl WidgetType {
    /// The `type` attribute of the `<input>`, or `None` for a textarea.
    pub const fn input_type(self) -> Option<&'static str> {
        match self {
            Self::TextInput => Some("text"),
            Self::EmailInput => Some("email"),
            Self::DateInput => Some("date"),
            Self::Textarea => None,
        }
    }

    /// Renders the widget.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use eventos_forms::widgets::WidgetType;
    ///
    /// let mut attrs = BTreeMap::new();
    /// attrs.insert("class".to_string(), "form-control".to_string());
    /// let html = WidgetType::DateInput.render("fecha", Some("2024-05-01"), &attrs);
    /// assert_eq!(
    ///     html,
    ///     r#"<input type="date" name="fecha" value="2024-05-01" class="form-control" />"#
    /// );
    /// ```
    pub fn render(self, name: &str, value: Option<&str>, attrs: &BTreeMap<String, String>) -> String {
        let name = escape_html(name);
        let attrs = render_attrs(attrs);
        match self.input_type() {
            Some(input_type) => {
                let value = value
                    .filter(|v| !v.is_empty())
                    .map(|v| format!(r#" value="{}""#, escape_html(v)))
                    .unwrap_or_default();
                format!(r#"<input type="{input_type}" name="{name}"{value}{attrs} />"#)
            }
            None => {
                let body = escape_html(value.unwrap_or(""));
                format!(r#"<textarea name="{name}"{attrs}>{body}</textarea>"#)
            }
        }
    }
}

/// Formats attributes as ` key="value"` pairs.
fn render_attrs(attrs: &BTreeMap<String, String>) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!(r#" {}="{}""#, escape_html(k), escape_html(v)))
        .collect()
}

/// Escapes the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}
