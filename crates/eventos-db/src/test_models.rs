//! A small model shared by the unit tests of this crate.

use std::sync::OnceLock;

use chrono::NaiveDate;
use eventos_core::{EventosError, EventosResult};
use serde::Serialize;

use crate::model::{FieldDef, FieldType, FromValue, Model, ModelMeta, Row};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Charla {
    pub id: Option<i64>,
    pub titulo: String,
    pub fecha: Option<NaiveDate>,
}

impl Charla {
    pub fn new(titulo: &str, fecha: &str) -> Self {
        Self {
            id: None,
            titulo: titulo.to_string(),
            fecha: NaiveDate::parse_from_str(fecha, "%Y-%m-%d").ok(),
        }
    }
}

impl Model for Charla {
    fn meta() -> &'static ModelMeta {
        static META: OnceLock<ModelMeta> = OnceLock::new();
        META.get_or_init(|| ModelMeta {
            model_name: "charla",
            db_table: "test_charla".to_string(),
            verbose_name: "charla".to_string(),
            verbose_name_plural: "charlas".to_string(),
            fields: vec![
                FieldDef::new("id", FieldType::BigAutoField),
                FieldDef::new("titulo", FieldType::CharField).max_length(50),
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
            ("fecha", Value::from(self.fecha)),
        ]
    }

    fn set_field_value(&mut self, name: &str, value: Value) -> EventosResult<()> {
        match name {
            "titulo" => self.titulo = String::from_value(&value)?,
            "fecha" => self.fecha = Option::<NaiveDate>::from_value(&value)?,
            other => {
                return Err(EventosError::BadRequest(format!("Unknown field '{other}'")))
            }
        }
        Ok(())
    }

    fn from_row(row: &Row) -> EventosResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            titulo: row.get("titulo")?,
            fecha: row.get("fecha")?,
        })
    }
}
