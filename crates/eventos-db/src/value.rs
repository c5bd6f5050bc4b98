//! Field values in a backend-agnostic form.
//!
//! [`Value`] is passed between models, forms, and repositories. Variant
//! order matters: the derived `Ord` sorts `Null` first, then integers,
//! strings, and dates, which is the ordering listings rely on.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A backend-agnostic representation of a stored field value.
///
/// # Examples
///
/// ```
/// use eventos_db::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hola");
/// assert_eq!(v, Value::String("hola".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL / no value.
    Null,
    /// A 64-bit signed integer.
    Int(i64),
    /// A UTF-8 string.
    String(String),
    /// A calendar date without time.
    Date(NaiveDate),
}

impl Value {
    /// Returns `true` if this is [`Value::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string contents of a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value the way an HTML form input expects it.
    ///
    /// `Null` becomes the empty string and dates use `YYYY-MM-DD`.
    pub fn to_form_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(i) => i.to_string(),
            Self::String(s) => s.clone(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Case-insensitive substring test against an already lowercased needle.
    pub fn contains_ci(&self, needle_lower: &str) -> bool {
        match self {
            Self::Null => false,
            Self::String(s) => s.to_lowercase().contains(needle_lower),
            other => other.to_form_string().to_lowercase().contains(needle_lower),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(i) => write!(f, "{i}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{d}"),
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(7_i32), Value::Int(7));
        assert_eq!(Value::from("x".to_string()), Value::String("x".into()));
        assert_eq!(Value::from(date("2024-05-01")), Value::Date(date("2024-05-01")));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    }

    #[test]
    fn test_ordering_within_type() {
        assert!(Value::Date(date("2024-05-01")) > Value::Date(date("2023-12-31")));
        assert!(Value::Int(2) > Value::Int(1));
        assert!(Value::from("b") > Value::from("a"));
    }

    #[test]
    fn test_null_sorts_first() {
        assert!(Value::Null < Value::Int(i64::MIN));
        assert!(Value::Null < Value::Date(date("1900-01-01")));
    }

    #[test]
    fn test_to_form_string() {
        assert_eq!(Value::Null.to_form_string(), "");
        assert_eq!(Value::Int(12).to_form_string(), "12");
        assert_eq!(Value::Date(date("2024-05-01")).to_form_string(), "2024-05-01");
    }

    #[test]
    fn test_contains_ci() {
        let v = Value::from("Feria Anual");
        assert!(v.contains_ci("feria"));
        assert!(v.contains_ci("ria an"));
        assert!(!v.contains_ci("fiesta"));
        assert!(!Value::Null.contains_ci(""));
    }

    #[test]
    fn test_contains_ci_unicode() {
        let v = Value::from("ÁNGELA Núñez");
        assert!(v.contains_ci("ángela"));
        assert!(v.contains_ci("núñez"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::from("hola").to_string(), "hola");
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_value(Value::Int(5)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Int", "value": 5}));
    }
}
