// Application state module
// Everything a request handler needs, constructed once at startup

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use super::types::Config;
use crate::logger::request_log::RequestLog;
use crate::store::{FlatFile, RecordStore};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Product records, already initialized
    pub records: Arc<dyn RecordStore>,
    /// Message file behind the flat-file routes
    pub messages: FlatFile,
    pub request_log: RequestLog,
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config, records: Arc<dyn RecordStore>, request_log: RequestLog) -> Self {
        let messages = FlatFile::new(&config.storage.messages_file);
        Self {
            config,
            records,
            messages,
            request_log,
            active_connections: AtomicUsize::new(0),
        }
    }
}
