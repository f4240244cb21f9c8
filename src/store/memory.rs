//! In-process record store
//!
//! Keeps products in a map behind an async mutex; ids come from a counter that never rewinds

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::{Product, ProductInput, RecordStore, Result, StoreError};

struct Inner {
    next_id: u64,
    records: BTreeMap<u64, Product>,
}

pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                records: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn create(&self, input: ProductInput) -> Result<Product> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let product = Product {
            id,
            nombre: input.nombre,
            precio: input.precio,
            descripcion: input.descripcion,
            creado_en: Utc::now(),
        };
        inner.records.insert(id, product.clone());
        Ok(product)
    }

    async fn get(&self, id: u64) -> Result<Product> {
        let inner = self.inner.lock().await;
        inner
            .records
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let inner = self.inner.lock().await;
        Ok(inner.records.values().cloned().collect())
    }

    async fn update(&self, id: u64, input: ProductInput) -> Result<Product> {
        let mut inner = self.inner.lock().await;
        let product = inner
            .records
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        product.nombre = input.nombre;
        product.precio = input.precio;
        product.descripcion = input.descripcion;
        Ok(product.clone())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
