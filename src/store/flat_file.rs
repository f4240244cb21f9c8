//! Flat-file store
//!
//! One unstructured file: read, replace, append, delete

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct FlatFile {
    path: PathBuf,
}

impl FlatFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for messages and log details
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    }

    /// Read the whole file as UTF-8 (lossy)
    pub async fn read(&self) -> Result<String> {
        let bytes = fs::read(&self.path).await.map_err(|e| self.map_err(e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Replace the file contents, creating it if needed
    pub async fn write(&self, data: &[u8]) -> Result<()> {
        fs::write(&self.path, data).await?;
        Ok(())
    }

    /// Append to the file, creating it if needed
    pub async fn append(&self, data: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn delete(&self) -> Result<()> {
        fs::remove_file(&self.path)
            .await
            .map_err(|e| self.map_err(e))
    }

    fn map_err(&self, err: std::io::Error) -> StoreError {
        if err.kind() == ErrorKind::NotFound {
            StoreError::FileNotFound(self.path.clone())
        } else {
            StoreError::Io(err)
        }
    }
}
