//! Form layouts for the two record kinds.
//!
//! Fields derive from model metadata; every widget carries the
//! `form-control` class used by the templates' stylesheet.

use eventos_db::Model;
use eventos_forms::{fields_for_model, FormFieldDef, WidgetType};

use crate::models::{Evento, Voluntario};

const INPUT_CLASS: &str = "form-control";

fn styled<M: Model>(names: &[&str]) -> Vec<FormFieldDef> {
    fields_for_model::<M>(names)
        .into_iter()
        .map(|field| field.attr("class", INPUT_CLASS))
        .collect()
}

/// `titulo`, `descripcion` (two-row textarea) and `fecha` (date picker).
pub fn evento_form_fields() -> Vec<FormFieldDef> {
    styled::<Evento>(&["titulo", "descripcion", "fecha"])
        .into_iter()
        .map(|field| {
            if field.name == "descripcion" {
                field.widget(WidgetType::Textarea).attr("rows", "2")
            } else if field.name == "fecha" {
                field.widget(WidgetType::DateInput)
            } else {
                field
            }
        })
        .collect()
}

/// `nombre`, `email` and `telefono`. Length limits reach the browser as
/// `maxlength`.
pub fn voluntario_form_fields() -> Vec<FormFieldDef> {
    styled::<Voluntario>(&["nombre", "email", "telefono"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventos_forms::{FormData, ModelForm};

    fn data(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_evento_widgets() {
        let fields = evento_form_fields();
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["titulo", "descripcion", "fecha"]);
        assert!(fields.iter().all(|f| f.attrs["class"] == "form-control"));
        assert_eq!(fields[0].widget, WidgetType::TextInput);
        assert_eq!(fields[1].widget, WidgetType::Textarea);
        assert_eq!(fields[1].attrs["rows"], "2");
        assert_eq!(fields[2].widget, WidgetType::DateInput);
    }

    #[test]
    fn test_voluntario_widgets() {
        let fields = voluntario_form_fields();
        assert_eq!(fields[1].widget, WidgetType::EmailInput);
        assert_eq!(fields[2].attrs["maxlength"], "15");
        assert_eq!(fields[0].attrs["maxlength"], "100");
        assert!(!fields[1].attrs.contains_key("maxlength"));
    }

    #[test]
    fn test_evento_validation() {
        let mut form = ModelForm::<Evento>::new(evento_form_fields());
        form.bind(&data(&[
            ("titulo", &"t".repeat(201)),
            ("descripcion", ""),
            ("fecha", "2024-13-01"),
        ]));
        assert!(!form.is_valid());
        let errors = form.as_context().errors;
        assert!(errors.contains_key("titulo"));
        assert!(errors.contains_key("descripcion"));
        assert!(errors.contains_key("fecha"));
    }

    #[test]
    fn test_voluntario_validation() {
        let mut form = ModelForm::<Voluntario>::new(voluntario_form_fields());
        form.bind(&data(&[
            ("nombre", "Ana"),
            ("email", "no-es-correo"),
            ("telefono", "1234567890123456"),
        ]));
        assert!(!form.is_valid());
        let errors = form.as_context().errors;
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("telefono"));
        assert!(!errors.contains_key("nombre"));

        let mut form = ModelForm::<Voluntario>::new(voluntario_form_fields());
        form.bind(&data(&[
            ("nombre", " Ana "),
            ("email", "ana@example.com"),
            ("telefono", "555-0101"),
        ]));
        assert!(form.is_valid());
        let voluntario = form.construct_instance(&Voluntario::default()).unwrap();
        assert_eq!(voluntario.nombre, "Ana");
        assert_eq!(voluntario.email, "ana@example.com");
    }
}
