//! Append-only request log
//!
//! `record` only enqueues; a background task owns the file and appends one
//! line per entry in arrival order. A failed append is reported on the
//! diagnostic channel and the entry is dropped.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::format::RequestLogEntry;
use crate::config::{LogFormat, LoggingConfig};

/// Cheap-to-clone handle to the request log writer
#[derive(Clone)]
pub struct RequestLog {
    tx: Option<mpsc::UnboundedSender<RequestLogEntry>>,
}

impl RequestLog {
    /// Start the writer task. Returns `None` for the task when logging is off.
    ///
    /// The task ends once every handle has been dropped and the queue is empty.
    pub fn spawn(config: &LoggingConfig) -> (Self, Option<JoinHandle<()>>) {
        if !config.request_log {
            return (Self::disabled(), None);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let path = PathBuf::from(&config.request_log_file);
        let task = tokio::spawn(run_writer(path, config.format, rx));
        (Self { tx: Some(tx) }, Some(task))
    }

    /// A log that discards every entry
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// Queue an entry; never blocks and never fails the caller
    pub fn record(&self, entry: RequestLogEntry) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(entry).is_err() {
            super::log_warning("Request log writer has stopped; entry dropped");
        }
    }
}

async fn run_writer(
    path: PathBuf,
    format: LogFormat,
    mut rx: mpsc::UnboundedReceiver<RequestLogEntry>,
) {
    while let Some(entry) = rx.recv().await {
        let line = entry.format(format);
        if let Err(e) = append_line(&path, &line).await {
            super::log_error(&format!(
                "Failed to append to request log {}: {e}",
                path.display()
            ));
        }
    }
}

/// Open in append mode per entry so a removed log file is simply recreated
async fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{line}\n").as_bytes()).await?;
    file.flush().await
}
