//! Diagnostic writer module
//!
//! Lifecycle messages go to stdout; warnings and errors go to stderr or to
//! `logging.error_log_file` when one is configured.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global diagnostic writer instance
static DIAGNOSTIC_WRITER: OnceLock<DiagnosticWriter> = OnceLock::new();

/// Where error lines end up
enum ErrorTarget {
    Stderr,
    File(Mutex<File>),
}

pub struct DiagnosticWriter {
    error: ErrorTarget,
}

impl DiagnosticWriter {
    fn new(error_log_file: Option<&str>) -> io::Result<Self> {
        let error = match error_log_file {
            Some(path) => ErrorTarget::File(Mutex::new(open_log_file(path)?)),
            None => ErrorTarget::Stderr,
        };
        Ok(Self { error })
    }

    #[allow(clippy::unused_self)]
    pub fn write_info(&self, message: &str) {
        println!("{message}");
    }

    pub fn write_error(&self, message: &str) {
        match &self.error {
            ErrorTarget::Stderr => eprintln!("{message}"),
            ErrorTarget::File(file) => {
                let written = file
                    .lock()
                    .map(|mut f| writeln!(f, "{message}").is_ok())
                    .unwrap_or(false);
                if !written {
                    eprintln!("{message}");
                }
            }
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global diagnostic writer
///
/// Returns error if the error log file cannot be opened or on a second call.
pub fn init(error_log_file: Option<&str>) -> io::Result<()> {
    let writer = DiagnosticWriter::new(error_log_file)?;
    DIAGNOSTIC_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Diagnostic writer already initialized",
        )
    })
}

/// The global writer, if `init()` has run
pub fn get() -> Option<&'static DiagnosticWriter> {
    DIAGNOSTIC_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_lines_go_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("error.log");
        let writer = DiagnosticWriter::new(path.to_str()).unwrap();

        writer.write_error("[ERROR] first");
        writer.write_error("[WARN] second");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "[ERROR] first\n[WARN] second\n");
    }

    #[test]
    fn test_unopenable_error_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DiagnosticWriter::new(dir.path().to_str()).is_err());
    }
}
