//! The two record kinds managed by the application.

use std::sync::OnceLock;

use chrono::NaiveDate;
use eventos_core::{EventosError, EventosResult};
use eventos_db::{FieldDef, FieldType, FromValue, Model, ModelMeta, Row, Value};
use serde::Serialize;

/// An event on the calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evento {
    pub id: Option<i64>,
    pub titulo: String,
    pub descripcion: String,
    pub fecha: Option<NaiveDate>,
}

impl Evento {
    /// An unsaved event.
    pub fn new(titulo: impl Into<String>, descripcion: impl Into<String>, fecha: NaiveDate) -> Self {
        Self {
            id: None,
            titulo: titulo.into(),
            descripcion: descripcion.into(),
            fecha: Some(fecha),
        }
    }
}

impl Model for Evento {
    fn meta() -> &'static ModelMeta {
        static META: OnceLock<ModelMeta> = OnceLock::new();
        META.get_or_init(|| ModelMeta {
            model_name: "evento",
            db_table: "myapp_evento".to_string(),
            verbose_name: "evento".to_string(),
            verbose_name_plural: "eventos".to_string(),
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField),
                FieldDef::new("titulo", FieldType::CharField).max_length(200),
                FieldDef::new("descripcion", FieldType::TextField),
                FieldDef::new("fecha", FieldType::DateField),
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
            ("titulo", Value::from(self.titulo.as_str())),
            ("descripcion", Value::from(self.descripcion.as_str())),
            ("fecha", Value::from(self.fecha)),
        ]
    }

    fn set_field_value(&mut self, name: &str, value: Value) -> EventosResult<()> {
        match name {
            "titulo" => self.titulo = String::from_value(&value)?,
            "descripcion" => self.descripcion = String::from_value(&value)?,
            "fecha" => self.fecha = Option::<NaiveDate>::from_value(&value)?,
            other => {
                return Err(EventosError::BadRequest(format!(
                    "Evento has no field '{other}'"
                )))
            }
        }
        Ok(())
    }

    fn from_row(row: &Row) -> EventosResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            titulo: row.get("titulo")?,
            descripcion: row.get("descripcion")?,
            fecha: row.get("fecha")?,
        })
    }
}

/// A registered volunteer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Voluntario {
    pub id: Option<i64>,
    pub nombre: String,
    pub email: String,
    pub telefono: String,
}

impl Voluntario {
    /// An unsaved volunteer.
    pub fn new(
        nombre: impl Into<String>,
        email: impl Into<String>,
        telefono: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            nombre: nombre.into(),
            email: email.into(),
            telefono: telefono.into(),
        }
    }
}

impl Model for Voluntario {
    fn meta() -> &'static ModelMeta {
        static META: OnceLock<ModelMeta> = OnceLock::new();
        META.get_or_init(|| ModelMeta {
            model_name: "voluntario",
            db_table: "myapp_voluntario".to_string(),
            verbose_name: "voluntario".to_string(),
            verbose_name_plural: "voluntarios".to_string(),
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField),
                FieldDef::new("nombre", FieldType::CharField).max_length(100),
                FieldDef::new("email", FieldType::EmailField).max_length(254),
                FieldDef::new("telefono", FieldType::CharField).max_length(15),
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
            ("email", Value::from(self.email.as_str())),
            ("telefono", Value::from(self.telefono.as_str())),
        ]
    }

    fn set_field_value(&mut self, name: &str, value: Value) -> EventosResult<()> {
        match name {
            "nombre" => self.nombre = String::from_value(&value)?,
            "email" => self.email = String::from_value(&value)?,
            "telefono" => self.telefono = String::from_value(&value)?,
            other => {
                return Err(EventosError::BadRequest(format!(
                    "Voluntario has no field '{other}'"
                )))
            }
        }
        Ok(())
    }

    fn from_row(row: &Row) -> EventosResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            nombre: row.get("nombre")?,
            email: row.get("email")?,
            telefono: row.get("telefono")?,
        })
    }
}
