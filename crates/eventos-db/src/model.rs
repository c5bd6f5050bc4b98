//! The [`Model`] trait and its metadata.
//!
//! A model is a plain struct whose fields are described by a static
//! [`ModelMeta`]. Repositories, forms, and the CRUD controller work against
//! this description rather than against concrete types, so one generic
//! controller can serve every record kind.

use chrono::NaiveDate;
use eventos_core::{EventosError, EventosResult};
use serde::Serialize;

use crate::query::OrderBy;
use crate::value::Value;

/// The storage kind of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Auto-incrementing 64-bit primary key.
    BigAutoField,
    /// Bounded text; requires `max_length`.
    CharField,
    /// Unbounded text.
    TextField,
    /// Text shaped as an email address.
    EmailField,
    /// Calendar date, stored as `YYYY-MM-DD`.
    DateField,
}

impl FieldType {
    /// The SQLite column type used by `create_table`.
    pub fn sql_type(self, max_length: Option<usize>) -> String {
        match self {
            Self::BigAutoField => "integer".to_string(),
            Self::CharField => format!("varchar({})", max_length.unwrap_or(255)),
            Self::TextField => "text".to_string(),
            Self::EmailField => format!("varchar({})", max_length.unwrap_or(254)),
            Self::DateField => "date".to_string(),
        }
    }
}

/// A single field of a model.
///
/// # Examples
///
/// ```
/// use eventos_db::model::{FieldDef, FieldType};
///
/// let f = FieldDef::new("titulo", FieldType::CharField).max_length(200);
/// assert_eq!(f.max_length, Some(200));
/// assert_eq!(f.verbose_name, "titulo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Attribute and column name.
    pub name: &'static str,
    /// Storage kind.
    pub field_type: FieldType,
    /// Whether this is the primary key.
    pub primary_key: bool,
    /// Maximum length for bounded text.
    pub max_length: Option<usize>,
    /// Human-readable name, used as the form label.
    pub verbose_name: String,
}

impl FieldDef {
    /// Creates a field whose verbose name defaults to its name.
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            primary_key: matches!(field_type, FieldType::BigAutoField),
            max_length: None,
            verbose_name: name.replace('_', " "),
        }
    }

    /// Sets the maximum length.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets the human-readable name.
    #[must_use]
    pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = verbose_name.into();
        self
    }

    /// Column definition for `CREATE TABLE`.
    pub fn column_sql(&self) -> String {
        let mut sql = format!(
            "\"{}\" {} NOT NULL",
            self.name,
            self.field_type.sql_type(self.max_length)
        );
        if self.primary_key {
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        }
        sql
    }
}

/// Static metadata about a model.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    /// Lowercase model name (e.g. "evento").
    pub model_name: &'static str,
    /// Database table name.
    pub db_table: String,
    /// Human-readable singular name.
    pub verbose_name: String,
    /// Human-readable plural name.
    pub verbose_name_plural: String,
    /// Field definitions, primary key first.
    pub fields: Vec<FieldDef>,
    /// Default ordering.
    pub ordering: Vec<OrderBy>,
}

impl ModelMeta {
    /// Looks up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns `true` if the model has a field with this name.
    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// Names of every field, primary key included.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Fields that are written on insert and update.
    pub fn concrete_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.primary_key)
    }

    /// The plural name with each word capitalized ("eventos" -> "Eventos").
    pub fn verbose_name_plural_title(&self) -> String {
        title_case(&self.verbose_name_plural)
    }

    /// The singular name with its first letter capitalized.
    pub fn verbose_name_capitalized(&self) -> String {
        capfirst(&self.verbose_name)
    }
}

fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn title_case(s: &str) -> String {
    s.split(' ').map(capfirst).collect::<Vec<_>>().join(" ")
}

/// The core trait for persisted record kinds.
///
/// # Examples
///
/// ```
/// use std::sync::OnceLock;
///
/// use eventos_core::{EventosError, EventosResult};
/// use eventos_db::model::{FieldDef, FieldType, FromValue, Model, ModelMeta, Row};
/// use eventos_db::value::Value;
///
/// #[derive(Debug, Clone, Default, serde::Serialize)]
/// struct Nota {
///     id: Option<i64>,
///     texto: String,
/// }
///
/// impl Model for Nota {
///     fn meta() -> &'static ModelMeta {
///         static META: OnceLock<ModelMeta> = OnceLock::new();
///         META.get_or_init(|| ModelMeta {
///             model_name: "nota",
///             db_table: "app_nota".to_string(),
///             verbose_name: "nota".to_string(),
///             verbose_name_plural: "notas".to_string(),
///             fields: vec![
///                 FieldDef::new("id", FieldType::BigAutoField),
///                 FieldDef::new("texto", FieldType::TextField),
///             ],
///             ordering: vec![],
///         })
///     }
///     fn id(&self) -> Option<i64> { self.id }
///     fn set_id(&mut self, id: i64) { self.id = Some(id); }
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("texto", Value::from(self.texto.as_str()))]
///     }
///     fn set_field_value(&mut self, name: &str, value: Value) -> EventosResult<()> {
///         match name {
///             "texto" => self.texto = String::from_value(&value)?,
///             other => return Err(EventosError::BadRequest(format!("Unknown field '{other}'"))),
///         }
///         Ok(())
///     }
///     fn from_row(row: &Row) -> EventosResult<Self> {
///         Ok(Self { id: row.get("id")?, texto: row.get("texto")? })
///     }
/// }
///
/// let mut n = Nota::default();
/// n.set_field_value("texto", Value::from("hola")).unwrap();
/// assert_eq!(n.field_value("texto"), Some(Value::from("hola")));
/// ```
pub trait Model: Clone + Default + Send + Sync + Serialize + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// The primary key, or `None` if the record was never saved.
    fn id(&self) -> Option<i64>;

    /// Sets the primary key (used after insert).
    fn set_id(&mut self, id: i64);

    /// Name-value pairs of every non-primary-key field, in declaration order.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Overwrites one non-primary-key field.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown fields or values of the wrong type.
    fn set_field_value(&mut self, name: &str, value: Value) -> EventosResult<()>;

    /// Builds an instance from a result row.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or has the wrong type.
    fn from_row(row: &Row) -> EventosResult<Self>;

    /// Returns the value of one field by name, `id` included.
    fn field_value(&self, name: &str) -> Option<Value> {
        if name == "id" {
            return Some(Value::from(self.id()));
        }
        self.field_values()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// A result row: column names and their values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Builds a row from a model instance, `id` first.
    pub fn from_model<M: Model>(record: &M) -> Self {
        let mut columns = vec!["id".to_string()];
        let mut values = vec![Value::from(record.id())];
        for (name, value) in record.field_values() {
            columns.push(name.to_string());
            values.push(value);
        }
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or the value cannot be
    /// converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> EventosResult<T> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| {
                EventosError::DatabaseError(format!("Column '{column}' not found in row"))
            })?;
        T::from_value(&self.values[idx])
    }
}

/// Conversion from a [`Value`] into a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts the conversion.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has an incompatible type.
    fn from_value(value: &Value) -> EventosResult<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> EventosResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(EventosError::DatabaseError(format!(
                "Expected Int, got {value:?}"
            ))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> EventosResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(EventosError::DatabaseError(format!(
                "Expected String, got {value:?}"
            ))),
        }
    }
}

// SQLite hands dates back as TEXT.
impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> EventosResult<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::String(s) => Self::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                EventosError::DatabaseError(format!("Invalid date '{s}': {e}"))
            }),
            _ => Err(EventosError::DatabaseError(format!(
                "Expected Date, got {value:?}"
            ))),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> EventosResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
