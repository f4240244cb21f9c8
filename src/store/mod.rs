//! Resource store module
//!
//! Product records live behind the [`RecordStore`] trait so the dispatcher
//! does not care whether they sit in a MySQL table or in process memory.
//! The message file used by the plain-text routes is a [`FlatFile`].

mod flat_file;
mod memory;
mod mysql;
mod product;

pub use flat_file::FlatFile;
pub use memory::MemoryRecordStore;
pub use mysql::MySqlRecordStore;
pub use product::{Product, ProductInput, ValidationError};

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Producto {0} no encontrado")]
    NotFound(u64),

    #[error("Archivo no encontrado: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// CRUD over product records keyed by a store-assigned id.
///
/// Ids are positive, unique and never handed out twice by the same store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the backing schema if it is missing. Idempotent.
    async fn init(&self) -> Result<()>;

    async fn create(&self, input: ProductInput) -> Result<Product>;

    async fn get(&self, id: u64) -> Result<Product>;

    /// All records in ascending id order
    async fn list(&self) -> Result<Vec<Product>>;

    /// Replace `nombre`, `precio` and `descripcion`; nothing changes when `id` is absent
    async fn update(&self, id: u64, input: ProductInput) -> Result<Product>;

    async fn delete(&self, id: u64) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

/// Build the configured record store. The store is not initialized yet.
pub fn open_record_store(config: &StorageConfig) -> Result<Arc<dyn RecordStore>> {
    match config.backend {
        StorageBackend::Mysql => Ok(Arc::new(MySqlRecordStore::new(config)?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryRecordStore::new())),
    }
}
