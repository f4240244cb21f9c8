// Configuration module entry point
// Loads configuration layers and owns the runtime state handed to the dispatcher

mod state;
mod types;

use hyper::header::HeaderValue;
use std::collections::HashSet;
use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, LogFormat, LoggingConfig, RoutesConfig, StorageBackend, StorageConfig};

/// Environment variable that points at an alternate config file
const CONFIG_PATH_VAR: &str = "TIENDA_CONFIG";

/// Short variables kept for compatibility with the old scripts
const ENV_OVERRIDES: [(&str, &str); 6] = [
    ("PORT", "server.port"),
    ("DB_HOST", "storage.host"),
    ("DB_PORT", "storage.port"),
    ("DB_USER", "storage.user"),
    ("DB_PASSWORD", "storage.password"),
    ("DB_NAME", "storage.database"),
];

impl Config {
    /// Load configuration from `config.toml` (or `$TIENDA_CONFIG`) and the environment
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config".to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (extension optional)
    ///
    /// Layers, lowest priority first: built-in defaults, the file,
    /// `TIENDA_SECTION__KEY` variables, then the short variables (`PORT`, `DB_*`).
    pub fn load_from(config_path: &str) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Self::default())?)
            .add_source(::config::File::with_name(config_path).required(false))
            .add_source(
                ::config::Environment::with_prefix("TIENDA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(key, std::env::var(var).ok())?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".to_string());
        }
        if HeaderValue::from_str(&self.http.server_name).is_err() {
            return Err(format!(
                "http.server_name {:?} is not a valid header value",
                self.http.server_name
            ));
        }
        if self.http.max_body_size == 0 {
            return Err("http.max_body_size must be > 0".to_string());
        }
        if self.storage.max_connections == 0 {
            return Err("storage.max_connections must be >= 1".to_string());
        }
        if !is_sql_identifier(&self.storage.table) {
            return Err(format!(
                "storage.table '{}' is not a valid table name",
                self.storage.table
            ));
        }
        if !is_sql_identifier(&self.storage.database) {
            return Err(format!(
                "storage.database '{}' is not a valid database name",
                self.storage.database
            ));
        }
        if self.storage.messages_file.is_empty() {
            return Err("storage.messages_file must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for (key, path) in self.routes.entries() {
            if !path.starts_with('/') {
                return Err(format!("routes.{key} must start with '/', got '{path}'"));
            }
            if !seen.insert(path) {
                return Err(format!("routes.{key} duplicates another route: '{path}'"));
            }
        }

        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`, the only names interpolated into SQL
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
