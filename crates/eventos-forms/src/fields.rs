//! Form field definitions and per-field cleaning.
//!
//! A [`FormFieldDef`] describes one input: its type, whether it is required,
//! how it renders, and any custom error messages. [`clean_field_value`]
//! turns the raw submitted string into a typed [`Value`] or a list of error
//! messages.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use chrono::NaiveDate;
use eventos_db::Value;
use regex::Regex;

use crate::widgets::WidgetType;

/// The type of a form field, with its type-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormFieldType {
    /// Free text.
    Char {
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
        /// Whether to strip leading and trailing whitespace.
        strip: bool,
    },
    /// An email address.
    Email,
    /// A calendar date in `YYYY-MM-DD` form.
    Date,
}

impl FormFieldType {
    /// A stripped text field with an optional maximum length.
    pub const fn char(max_length: Option<usize>) -> Self {
        Self::Char {
            min_length: None,
            max_length,
            strip: true,
        }
    }
}

/// Complete definition of a form field.
#[derive(Debug, Clone)]
pub struct FormFieldDef {
    /// The field name (HTML `name` attribute).
    pub name: String,
    /// Parsing and coercion rules.
    pub field_type: FormFieldType,
    /// Whether an empty submission is an error.
    pub required: bool,
    /// Value shown on an unbound form.
    pub initial: Option<Value>,
    /// Help text rendered next to the input.
    pub help_text: String,
    /// Human-readable label.
    pub label: String,
    /// How the field renders.
    pub widget: WidgetType,
    /// Extra HTML attributes for the widget.
    pub attrs: BTreeMap<String, String>,
    /// Custom error messages keyed by error code.
    pub error_messages: HashMap<String, String>,
}

impl FormFieldDef {
    /// Creates a required field with the default widget for its type.
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let name = name.into();
        let widget = default_widget_for_field_type(&field_type);
        let label = capfirst(&name.replace('_', " "));
        let mut attrs = BTreeMap::new();
        if let FormFieldType::Char {
            max_length: Some(max),
            ..
        } = &field_type
        {
            attrs.insert("maxlength".to_string(), max.to_string());
        }
        Self {
            name,
            field_type,
            required: true,
            initial: None,
            help_text: String::new(),
            label,
            widget,
            attrs,
            error_messages: HashMap::new(),
        }
    }

    /// Sets whether this field is required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn initial(mut self, value: Value) -> Self {
        self.initial = Some(value);
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the widget type.
    #[must_use]
    pub fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }

    /// Adds an HTML attribute to the widget.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Sets a custom error message for a given code.
    #[must_use]
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), msg.into());
        self
    }

    fn message(&self, code: &str, default: impl FnOnce() -> String) -> String {
        self.error_messages
            .get(code)
            .cloned()
            .unwrap_or_else(default)
    }
}

/// Returns the default widget for a field type.
pub const fn default_widget_for_field_type(field_type: &FormFieldType) -> WidgetType {
    match field_type {
        FormFieldType::Char { .. } => WidgetType::TextInput,
        FormFieldType::Email => WidgetType::EmailInput,
        FormFieldType::Date => WidgetType::DateInput,
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9\-]+(\.[a-zA-Z0-9\-]+)*\.[a-zA-Z]{2,}$")
            .expect("valid regex")
    })
}

fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Cleans a raw submitted string into a typed [`Value`].
///
/// Runs the required check, then type coercion and the type's own
/// constraints. Text and email input is stripped before any check, so a
/// whitespace-only submission counts as empty.
///
/// # Errors
///
/// Returns every error message produced for the field.
///
/// # Examples
///
/// ```
/// use eventos_db::Value;
/// use eventos_forms::fields::{clean_field_value, FormFieldDef, FormFieldType};
///
/// let f = FormFieldDef::new("telefono", FormFieldType::char(Some(15)));
/// assert_eq!(clean_field_value(&f, Some(" 600123123 ")), Ok(Value::from("600123123")));
/// assert!(clean_field_value(&f, Some("")).is_err());
/// ```
pub fn clean_field_value(field: &FormFieldDef, raw: Option<&str>) -> Result<Value, Vec<String>> {
    let raw = raw.unwrap_or("");
    let input = match &field.field_type {
        FormFieldType::Char { strip: false, .. } => raw,
        _ => raw.trim(),
    };

    if input.is_empty() {
        if field.required {
            return Err(vec![
                field.message("required", || "This field is required.".to_string())
            ]);
        }
        return Ok(field.initial.clone().unwrap_or(Value::Null));
    }

    let mut errors = Vec::new();
    let value = match &field.field_type {
        FormFieldType::Char {
            min_length,
            max_length,
            ..
        } => {
            let len = input.chars().count();
            if let Some(min) = min_length {
                if len < *min {
                    errors.push(field.message("min_length", || {
                        format!("Ensure this value has at least {min} characters (it has {len}).")
                    }));
                }
            }
            if let Some(max) = max_length {
                if len > *max {
                    errors.push(field.message("max_length", || {
                        format!("Ensure this value has at most {max} characters (it has {len}).")
                    }));
                }
            }
            Value::String(input.to_string())
        }
        FormFieldType::Email => {
            if !email_regex().is_match(input) {
                errors.push(field.message("invalid", || "Enter a valid email address.".to_string()));
            }
            Value::String(input.to_string())
        }
        FormFieldType::Date => match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            Ok(d) => Value::Date(d),
            Err(_) => {
                errors.push(field.message("invalid", || "Enter a valid date.".to_string()));
                Value::Null
            }
        },
    };

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_field(max: usize) -> FormFieldDef {
        FormFieldDef::new("titulo", FormFieldType::char(Some(max)))
    }

    #[test]
    fn test_defaults() {
        let f = FormFieldDef::new("fecha_evento", FormFieldType::Date);
        assert!(f.required);
        assert_eq!(f.label, "Fecha evento");
        assert_eq!(f.widget, WidgetType::DateInput);
        assert!(f.attrs.is_empty());
        assert_eq!(char_field(200).attrs.get("maxlength").map(String::as_str), Some("200"));
    }

    #[test]
    fn test_required() {
        let f = char_field(10);
        assert_eq!(
            clean_field_value(&f, None),
            Err(vec!["This field is required.".to_string()])
        );
        assert!(clean_field_value(&f, Some("   ")).is_err());
    }

    #[test]
    fn test_not_required_empty_is_null() {
        let f = char_field(10).required(false);
        assert_eq!(clean_field_value(&f, Some("")), Ok(Value::Null));
    }

    #[test]
    fn test_custom_required_message() {
        let f = char_field(10).error_message("required", "Obligatorio.");
        assert_eq!(clean_field_value(&f, None), Err(vec!["Obligatorio.".to_string()]));
    }

    #[test]
    fn test_max_length_counts_characters() {
        let f = char_field(5);
        assert_eq!(clean_field_value(&f, Some("ñañañ")), Ok(Value::from("ñañañ")));
        assert_eq!(
            clean_field_value(&f, Some("ñañaña")),
            Err(vec![
                "Ensure this value has at most 5 characters (it has 6).".to_string()
            ])
        );
    }

    #[test]
    fn test_min_length() {
        let f = FormFieldDef::new(
            "nombre",
            FormFieldType::Char {
                min_length: Some(3),
                max_length: None,
                strip: true,
            },
        );
        assert!(clean_field_value(&f, Some("ab")).is_err());
        assert!(clean_field_value(&f, Some("abc")).is_ok());
    }

    #[test]
    fn test_no_strip_keeps_whitespace() {
        let f = FormFieldDef::new(
            "nota",
            FormFieldType::Char {
                min_length: None,
                max_length: None,
                strip: false,
            },
        );
        assert_eq!(clean_field_value(&f, Some(" x ")), Ok(Value::from(" x ")));
    }

    #[test]
    fn test_email() {
        let f = FormFieldDef::new("email", FormFieldType::Email);
        assert_eq!(
            clean_field_value(&f, Some(" ana@example.com ")),
            Ok(Value::from("ana@example.com"))
        );
        for bad in ["ana", "ana@", "@example.com", "ana@example", "a b@example.com"] {
            assert_eq!(
                clean_field_value(&f, Some(bad)),
                Err(vec!["Enter a valid email address.".to_string()]),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_date() {
        let f = FormFieldDef::new("fecha", FormFieldType::Date);
        assert_eq!(
            clean_field_value(&f, Some("2024-05-01")),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()))
        );
        assert_eq!(
            clean_field_value(&f, Some("2024-02-30")),
            Err(vec!["Enter a valid date.".to_string()])
        );
        assert!(clean_field_value(&f, Some("01/05/2024")).is_err());
    }
}
