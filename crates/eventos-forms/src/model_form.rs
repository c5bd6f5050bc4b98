//! Forms backed by a [`Model`].
//!
//! [`fields_for_model`] derives form fields from model metadata.
//! [`ModelForm`] pre-fills from an existing record and, once valid, applies
//! its cleaned data onto a copy of a record. The stored record only changes
//! when the caller saves that copy.

use std::collections::HashMap;
use std::marker::PhantomData;

use eventos_core::{EventosError, EventosResult, ValidationError};
use eventos_db::{FieldDef, FieldType, Model};

use crate::fields::{FormFieldDef, FormFieldType};
use crate::form::{Form, FormContext, FormData};
use crate::widgets::WidgetType;

/// Maps one model field to a form field.
///
/// Returns `None` for primary keys, which are never edited through forms.
pub fn form_field_for(model_field: &FieldDef) -> Option<FormFieldDef> {
    let field_type = match model_field.field_type {
        FieldType::BigAutoField => return None,
        FieldType::CharField | FieldType::TextField => {
            FormFieldType::char(model_field.max_length)
        }
        FieldType::EmailField => FormFieldType::Email,
        FieldType::DateField => FormFieldType::Date,
    };
    let mut form_field =
        FormFieldDef::new(model_field.name, field_type).label(capfirst(&model_field.verbose_name));
    if model_field.field_type == FieldType::TextField {
        form_field = form_field.widget(WidgetType::Textarea);
    }
    Some(form_field)
}

/// Form fields for the named model fields, in the order given.
///
/// Unknown names and primary keys are skipped.
pub fn fields_for_model<M: Model>(names: &[&str]) -> Vec<FormFieldDef> {
    let meta = M::meta();
    names
        .iter()
        .filter_map(|name| meta.get_field(name))
        .filter_map(form_field_for)
        .collect()
}

fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// A form that edits records of model `M`.
#[derive(Debug, Clone)]
pub struct ModelForm<M: Model> {
    form: Form,
    instance: Option<M>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> ModelForm<M> {
    /// An empty draft over the given fields.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self {
            form: Form::new(fields),
            instance: None,
            _model: PhantomData,
        }
    }

    /// Pre-fills the form with a record's current values.
    #[must_use]
    pub fn with_instance(mut self, instance: &M) -> Self {
        let initial: HashMap<String, _> = self
            .form
            .fields()
            .iter()
            .filter_map(|f| instance.field_value(&f.name).map(|v| (f.name.clone(), v)))
            .collect();
        self.form = self.form.with_initial(initial);
        self.instance = Some(instance.clone());
        self
    }

    /// The record this form was pre-filled from, if any.
    pub const fn instance(&self) -> Option<&M> {
        self.instance.as_ref()
    }

    /// Attaches submitted data.
    pub fn bind(&mut self, data: &FormData) {
        self.form.bind(data);
    }

    /// Validates the bound data.
    pub fn is_valid(&mut self) -> bool {
        self.form.is_valid()
    }

    /// The underlying form.
    pub const fn form(&self) -> &Form {
        &self.form
    }

    /// A serializable snapshot for templates.
    pub fn as_context(&self) -> FormContext {
        self.form.as_context()
    }

    /// Applies the cleaned data onto a copy of `base`.
    ///
    /// `base` keeps its id, so saving the result overwrites that record; a
    /// default `base` yields a new record.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::ValidationError`] if the form has not been
    /// validated successfully, or an error from
    /// [`Model::set_field_value`].
    pub fn construct_instance(&self, base: &M) -> EventosResult<M> {
        let validated = self.form.is_bound()
            && self.form.errors().is_empty()
            && !self.form.cleaned_data().is_empty();
        if !validated {
            let err = if self.form.errors().is_empty() {
                ValidationError::new("The form has not been validated.", "unvalidated")
            } else {
                ValidationError::with_field_errors(self.form.errors().clone())
            };
            return Err(EventosError::ValidationError(err));
        }
        let mut record = base.clone();
        for field in self.form.fields() {
            if let Some(value) = self.form.cleaned_data().get(&field.name) {
                record.set_field_value(&field.name, value.clone())?;
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    use chrono::NaiveDate;
    use eventos_db::{FromValue, ModelMeta, Row, Value};
    use serde::Serialize;

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    struct Taller {
        id: Option<i64>,
        nombre: String,
        resumen: String,
        contacto: String,
        dia: Option<NaiveDate>,
    }

    impl Model for Taller {
        fn meta() -> &'static ModelMeta {
            static META: OnceLock<ModelMeta> = OnceLock::new();
            META.get_or_init(|| ModelMeta {
                model_name: "taller",
                db_table: "test_taller".to_string(),
                verbose_name: "taller".to_string(),
                verbose_name_plural: "talleres".to_string(),
                fields: vec![
                    FieldDef::new("id", FieldType::BigAutoField),
                    FieldDef::new("nombre", FieldType::CharField).max_length(20),
                    FieldDef::new("resumen", FieldType::TextField),
                    FieldDef::new("contacto", FieldType::EmailField)
                        .verbose_name("correo de contacto"),
                    FieldDef::new("dia", FieldType::DateField),
                ],
                ordering: vec![],
            })
        }
        fn id(&self) -> Option<i64> {
            self.id
        }
        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }
        fn field_values(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("nombre", Value::from(self.nombre.as_str())),
                ("resumen", Value::from(self.resumen.as_str())),
                ("contacto", Value::from(self.contacto.as_str())),
                ("dia", Value::from(self.dia)),
            ]
        }
        fn set_field_value(&mut self, name: &str, value: Value) -> EventosResult<()> {
            match name {
                "nombre" => self.nombre = String::from_value(&value)?,
                "resumen" => self.resumen = String::from_value(&value)?,
                "contacto" => self.contacto = String::from_value(&value)?,
                "dia" => self.dia = Option::<NaiveDate>::from_value(&value)?,
                other => {
                    return Err(EventosError::BadRequest(format!("Unknown field '{other}'")))
                }
            }
            Ok(())
        }
        fn from_row(_row: &Row) -> EventosResult<Self> {
            unreachable!("not stored in these tests")
        }
    }

    fn fields() -> Vec<FormFieldDef> {
        fields_for_model::<Taller>(&["nombre", "resumen", "contacto", "dia"])
    }

    fn data(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn stored() -> Taller {
        Taller {
            id: Some(7),
            nombre: "Cerámica".to_string(),
            resumen: "Iniciación".to_string(),
            contacto: "taller@example.com".to_string(),
            dia: NaiveDate::from_ymd_opt(2024, 6, 1),
        }
    }

    #[test]
    fn test_fields_for_model() {
        let f = fields_for_model::<Taller>(&["id", "dia", "nombre", "nope", "resumen", "contacto"]);
        let names: Vec<_> = f.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["dia", "nombre", "resumen", "contacto"]);
        assert_eq!(f[1].field_type, FormFieldType::char(Some(20)));
        assert_eq!(f[2].widget, WidgetType::Textarea);
        assert_eq!(f[3].label, "Correo de contacto");
        assert_eq!(f[3].widget, WidgetType::EmailInput);
    }

    #[test]
    fn test_with_instance_prefills() {
        let form = ModelForm::<Taller>::new(fields()).with_instance(&stored());
        assert_eq!(form.form().display_value("dia").as_deref(), Some("2024-06-01"));
        assert_eq!(form.form().display_value("nombre").as_deref(), Some("Cerámica"));
        assert_eq!(form.instance().and_then(Model::id), Some(7));
    }

    #[test]
    fn test_construct_new_instance() {
        let mut form = ModelForm::<Taller>::new(fields());
        form.bind(&data(&[
            ("nombre", "Pintura"),
            ("resumen", "Acuarela"),
            ("contacto", "p@example.com"),
            ("dia", "2024-07-15"),
        ]));
        assert!(form.is_valid());
        let t = form.construct_instance(&Taller::default()).unwrap();
        assert_eq!(t.id, None);
        assert_eq!(t.nombre, "Pintura");
        assert_eq!(t.dia, NaiveDate::from_ymd_opt(2024, 7, 15));
    }

    #[test]
    fn test_construct_onto_copy_keeps_base() {
        let base = stored();
        let mut form = ModelForm::<Taller>::new(fields()).with_instance(&base);
        form.bind(&data(&[
            ("nombre", "Cerámica II"),
            ("resumen", "Avanzado"),
            ("contacto", "taller@example.com"),
            ("dia", "2024-06-08"),
        ]));
        assert!(form.is_valid());
        let updated = form.construct_instance(&base).unwrap();
        assert_eq!(updated.id, Some(7));
        assert_eq!(updated.nombre, "Cerámica II");
        assert_eq!(base, stored());
    }

    #[test]
    fn test_construct_invalid_is_error() {
        let mut form = ModelForm::<Taller>::new(fields());
        form.bind(&data(&[("nombre", "x".repeat(21).as_str())]));
        assert!(!form.is_valid());
        match form.construct_instance(&Taller::default()) {
            Err(EventosError::ValidationError(e)) => {
                assert!(e.field_errors.contains_key("nombre"));
                assert!(e.field_errors.contains_key("dia"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_construct_before_validation_is_error() {
        let form = ModelForm::<Taller>::new(fields());
        assert!(form.construct_instance(&Taller::default()).is_err());
    }
}
