//! # eventos-forms
//!
//! Binds raw request fields to a record schema and validates them.
//!
//! - [`fields`] - field definitions and per-field cleaning
//! - [`widgets`] - HTML rendering of inputs
//! - [`bound_field`] - a field paired with its value and errors, for templates
//! - [`form`] - binding, validation, and template context
//! - [`model_form`] - forms that read from and write onto a [`Model`](eventos_db::Model)

pub mod bound_field;
pub mod fields;
pub mod form;
pub mod model_form;
pub mod widgets;

pub use bound_field::BoundField;
pub use fields::{FormFieldDef, FormFieldType};
pub use form::{Form, FormContext, FormData};
pub use model_form::{fields_for_model, ModelForm};
pub use widgets::WidgetType;
