//! Logger module
//!
//! Two channels:
//! - the diagnostic channel (lifecycle, warnings, errors) through [`writer`]
//! - the append-only request log through [`request_log::RequestLog`]

mod format;
pub mod request_log;
mod writer;

pub use format::RequestLogEntry;

use crate::config::{Config, StorageConfig};
use std::net::SocketAddr;

/// Initialize the diagnostic channel
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(config.logging.error_log_file.as_deref())
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Tienda server started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Products:     {}", config.routes.products));
    write_info(&format!(
        "Message file: {} ({}, {}, {}, {})",
        config.storage.messages_file,
        config.routes.read_file,
        config.routes.create_file,
        config.routes.append_file,
        config.routes.delete_file
    ));
    if config.logging.request_log {
        write_info(&format!(
            "Request log:  {} ({:?})",
            config.logging.request_log_file, config.logging.format
        ));
    } else {
        write_info("Request log:  disabled");
    }
    write_info(&format!("Max body:     {} bytes", config.http.max_body_size));
    write_info("Single-threaded Tokio runtime");
    write_info("======================================\n");
}

pub fn log_store_ready(storage: &StorageConfig, backend: &str) {
    match backend {
        "mysql" => write_info(&format!(
            "[Store] MySQL ready: {}@{}:{}/{} table `{}`",
            storage.user, storage.host, storage.port, storage.database, storage.table
        )),
        other => write_info(&format!("[Store] {other} store ready")),
    }
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    write_error(&format!("[ERROR] Connection closed with error: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_shutdown(reason: &str) {
    write_info(&format!("\n[Shutdown] {reason}; no longer accepting connections"));
}
