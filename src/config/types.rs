// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub routes: RoutesConfig,
    pub performance: PerformanceConfig,
}

/// Listening address
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    /// Request bodies above this many bytes reset the connection
    pub max_body_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_name: "tienda-server/0.1".to_string(),
            max_body_size: crate::http::body::DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Product record backend
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mysql,
    Memory,
}

/// Storage configuration: product table connection and message file
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub table: String,
    /// Upper bound on simultaneous store operations
    pub max_connections: u32,
    pub messages_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Mysql,
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "clase".to_string(),
            table: "productos".to_string(),
            max_connections: 5,
            messages_file: "messages.txt".to_string(),
        }
    }
}

/// Request log line format
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Append one line per handled request
    pub request_log: bool,
    pub request_log_file: String,
    pub format: LogFormat,
    /// Error/warning output file (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            request_log: true,
            request_log_file: "log.txt".to_string(),
            format: LogFormat::Plain,
            error_log_file: None,
        }
    }
}

/// Route paths. `home`, `read_file`, `info` and `time` match exactly,
/// the others also match any sub-path below them.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RoutesConfig {
    pub home: String,
    pub read_file: String,
    pub create_file: String,
    pub append_file: String,
    pub delete_file: String,
    pub info: String,
    pub time: String,
    pub products: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            home: "/".to_string(),
            read_file: "/leer".to_string(),
            create_file: "/crear".to_string(),
            append_file: "/actualizar".to_string(),
            delete_file: "/eliminar".to_string(),
            info: "/info".to_string(),
            time: "/time".to_string(),
            products: "/productos".to_string(),
        }
    }
}

impl RoutesConfig {
    /// All configured paths with their config key
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("home", &self.home),
            ("read_file", &self.read_file),
            ("create_file", &self.create_file),
            ("append_file", &self.append_file),
            ("delete_file", &self.delete_file),
            ("info", &self.info),
            ("time", &self.time),
            ("products", &self.products),
        ]
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    pub listen_backlog: u32,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive: true,
            listen_backlog: 128,
            max_connections: None,
        }
    }
}
