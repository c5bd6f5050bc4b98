//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with [`Settings::default`].
//! 2. Overlay a TOML file (keys not present keep their defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `EVENTOS_SECRET_KEY` | `secret_key` |
//! | `EVENTOS_DEBUG` | `debug` |
//! | `EVENTOS_BIND_ADDRESS` | `bind_address` |
//! | `EVENTOS_DATABASE_NAME` | `database.name` |
//! | `EVENTOS_LOG_LEVEL` | `log_level` |
//! | `EVENTOS_PAGINATE_BY` | `paginate_by` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use eventos_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("eventos.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::EventosError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// The TOML is converted to JSON and deep-merged over the serialized
/// defaults, so any key not present keeps its default value.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or does not match the
/// settings schema.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, EventosError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| EventosError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    let json_value = toml_to_json(toml_value);
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        EventosError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, json_value);
    let settings: Settings = serde_json::from_value(merged).map_err(|e| {
        EventosError::ConfigurationError(format!("Failed to deserialize settings from TOML: {e}"))
    })?;
    validate(&settings)?;
    Ok(settings)
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, EventosError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        EventosError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the TOML is malformed, or an
/// override produces an invalid configuration.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, EventosError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings)?;
    validate(&settings)?;
    Ok(settings)
}

/// Loads settings from defaults plus environment variables.
///
/// # Errors
///
/// Returns an error if an override produces an invalid configuration.
pub fn from_env() -> Result<Settings, EventosError> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings)?;
    validate(&settings)?;
    Ok(settings)
}

/// Applies `EVENTOS_*` environment variable overrides to `settings`.
///
/// # Errors
///
/// See [`apply_overrides`].
pub fn apply_env_overrides(settings: &mut Settings) -> Result<(), EventosError> {
    apply_overrides(settings, |key| std::env::var(key).ok())
}

/// Applies overrides using `lookup` to resolve variable names.
///
/// Split out from [`apply_env_overrides`] so tests do not have to mutate
/// the process environment.
///
/// # Errors
///
/// Returns [`EventosError::ConfigurationError`] if `EVENTOS_PAGINATE_BY` is
/// not a number.
pub fn apply_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), EventosError> {
    if let Some(val) = lookup("EVENTOS_SECRET_KEY") {
        settings.secret_key = val;
    }

    if let Some(val) = lookup("EVENTOS_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("EVENTOS_BIND_ADDRESS") {
        settings.bind_address = val;
    }

    if let Some(val) = lookup("EVENTOS_DATABASE_NAME") {
        settings.database.name = val;
    }

    if let Some(val) = lookup("EVENTOS_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("EVENTOS_PAGINATE_BY") {
        settings.paginate_by = val.parse::<usize>().map_err(|_| {
            EventosError::ConfigurationError(format!(
                "EVENTOS_PAGINATE_BY must be a positive integer, got '{val}'"
            ))
        })?;
    }
    Ok(())
}

/// Rejects configurations the application cannot run with.
fn validate(settings: &Settings) -> Result<(), EventosError> {
    if settings.paginate_by == 0 {
        return Err(EventosError::ConfigurationError(
            "paginate_by must be a positive integer".to_string(),
        ));
    }
    if settings.secret_key.is_empty() {
        return Err(EventosError::ConfigurationError(
            "secret_key must not be empty".to_string(),
        ));
    }
    Ok(())
}

// ============================================================
// Helpers
// ============================================================

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            let map = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
