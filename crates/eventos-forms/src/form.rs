//! Forms: binding, validation, and template context.
//!
//! A [`Form`] starts unbound, showing its initial values. [`Form::bind`]
//! attaches submitted data; [`Form::is_valid`] cleans every field and
//! collects all errors at once rather than stopping at the first.

use std::collections::{BTreeMap, HashMap};

use eventos_db::Value;
use serde::Serialize;

use crate::bound_field::BoundField;
use crate::fields::{clean_field_value, FormFieldDef};

/// Submitted form data, keyed by field name.
pub type FormData = HashMap<String, String>;

/// A set of fields with their binding and validation state.
///
/// # Examples
///
/// ```
/// use eventos_forms::{Form, FormData, FormFieldDef, FormFieldType};
///
/// let mut form = Form::new(vec![FormFieldDef::new("email", FormFieldType::Email)]);
/// let mut data = FormData::new();
/// data.insert("email".to_string(), "not-an-email".to_string());
/// form.bind(&data);
/// assert!(!form.is_valid());
/// assert_eq!(form.errors()["email"], vec!["Enter a valid email address."]);
/// ```
#[derive(Debug, Clone)]
pub struct Form {
    field_defs: Vec<FormFieldDef>,
    initial: HashMap<String, Value>,
    bound: bool,
    raw_data: HashMap<String, Option<String>>,
    errors: BTreeMap<String, Vec<String>>,
    cleaned_data: HashMap<String, Value>,
}

impl Form {
    /// Creates an unbound form over the given fields.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self {
            field_defs: fields,
            initial: HashMap::new(),
            bound: false,
            raw_data: HashMap::new(),
            errors: BTreeMap::new(),
            cleaned_data: HashMap::new(),
        }
    }

    /// Sets initial values shown while the form is unbound.
    #[must_use]
    pub fn with_initial(mut self, initial: HashMap<String, Value>) -> Self {
        self.initial = initial;
        self
    }

    /// The field definitions.
    pub fn fields(&self) -> &[FormFieldDef] {
        &self.field_defs
    }

    /// Initial values.
    pub fn initial(&self) -> &HashMap<String, Value> {
        &self.initial
    }

    /// Attaches submitted data, discarding any previous validation state.
    ///
    /// Keys that are not form fields are ignored.
    pub fn bind(&mut self, data: &FormData) {
        self.bound = true;
        self.raw_data.clear();
        self.errors.clear();
        self.cleaned_data.clear();
        for field in &self.field_defs {
            self.raw_data
                .insert(field.name.clone(), data.get(&field.name).cloned());
        }
    }

    /// Returns `true` once data has been bound.
    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// Cleans every field; returns `true` if none produced an error.
    ///
    /// An unbound form is never valid.
    pub fn is_valid(&mut self) -> bool {
        if !self.bound {
            return false;
        }
        self.errors.clear();
        self.cleaned_data.clear();
        for field in &self.field_defs {
            let raw = self.raw_data.get(&field.name).and_then(|v| v.as_deref());
            match clean_field_value(field, raw) {
                Ok(value) => {
                    self.cleaned_data.insert(field.name.clone(), value);
                }
                Err(errors) => {
                    self.errors.insert(field.name.clone(), errors);
                }
            }
        }
        if !self.errors.is_empty() {
            self.cleaned_data.clear();
        }
        self.errors.is_empty()
    }

    /// Per-field errors from the last [`Form::is_valid`] call.
    pub const fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    /// Cleaned values; empty unless the last validation succeeded.
    pub const fn cleaned_data(&self) -> &HashMap<String, Value> {
        &self.cleaned_data
    }

    /// The value a widget should show for `name`.
    ///
    /// Bound forms echo the submitted text; unbound forms show the initial
    /// value, falling back to the field's own default.
    pub fn display_value(&self, name: &str) -> Option<String> {
        if self.bound {
            return self.raw_data.get(name).cloned().flatten();
        }
        self.initial
            .get(name)
            .or_else(|| {
                self.field_defs
                    .iter()
                    .find(|f| f.name == name)
                    .and_then(|f| f.initial.as_ref())
            })
            .map(Value::to_form_string)
    }

    /// Bound fields in declaration order.
    pub fn bound_fields(&self) -> Vec<BoundField> {
        self.field_defs
            .iter()
            .map(|field| {
                let errors = self.errors.get(&field.name).cloned().unwrap_or_default();
                BoundField::new(field, self.display_value(&field.name), errors)
            })
            .collect()
    }

    /// A serializable snapshot for templates.
    pub fn as_context(&self) -> FormContext {
        FormContext {
            fields: self.bound_fields(),
            errors: self.errors.clone(),
            is_bound: self.bound,
        }
    }
}

/// The template view of a [`Form`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormContext {
    /// Rendered fields in order.
    pub fields: Vec<BoundField>,
    /// Per-field errors.
    pub errors: BTreeMap<String, Vec<String>>,
    /// Whether data was bound.
    pub is_bound: bool,
}
