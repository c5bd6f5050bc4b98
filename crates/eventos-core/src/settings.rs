//! Settings for the eventos application.
//!
//! [`Settings`] holds all runtime configuration with defaults suitable for
//! local development. Use [`settings_loader`](crate::settings_loader) to
//! overlay a TOML file and environment variables on top of the defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The storage engine backing the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    /// A SQLite database file (or `:memory:`).
    Sqlite,
    /// A process-local in-memory store; data is lost on exit.
    Memory,
}

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// The storage engine.
    pub engine: DatabaseEngine,
    /// The database file path (ignored by the memory engine).
    pub name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: DatabaseEngine::Sqlite,
            name: "eventos.sqlite3".to_string(),
        }
    }
}

/// The complete set of application settings.
///
/// # Examples
///
/// ```
/// use eventos_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.paginate_by, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The secret key used to sign the flash-message cookie.
    pub secret_key: String,
    /// The socket address `runserver` binds to.
    pub bind_address: String,

    // ── Database ─────────────────────────────────────────────────────

    /// Repository storage configuration.
    pub database: DatabaseSettings,

    // ── Templates & static files ─────────────────────────────────────

    /// Extra directories searched for templates; files found there
    /// replace the built-in templates of the same name.
    pub template_dirs: Vec<PathBuf>,
    /// URL prefix for static files.
    pub static_url: String,
    /// Directory served under `static_url`, if it exists.
    pub static_dir: Option<PathBuf>,

    // ── Listing ──────────────────────────────────────────────────────

    /// Records per page for every listing.
    pub paginate_by: usize,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter (e.g. "info", "eventos=debug,tower_http=info").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            secret_key: "eventos-insecure-development-key".to_string(),
            bind_address: "127.0.0.1:8000".to_string(),
            database: DatabaseSettings::default(),
            template_dirs: Vec::new(),
            static_url: "/static/".to_string(),
            static_dir: Some(PathBuf::from("static")),
            paginate_by: 5,
            log_level: "info".to_string(),
        }
    }
}
