//! MySQL record store.
//!
//! The pool is built lazily at startup; [`RecordStore::init`] then creates the
//! database and the table, in that order, before the listener is bound.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{ConnectOptions, Connection, Row};

use super::{Product, ProductInput, RecordStore, Result, StoreError};
use crate::config::{is_sql_identifier, StorageConfig};

/// SQL for one table. The table name is checked before it is interpolated.
#[derive(Debug)]
struct Queries {
    create_table: String,
    insert: String,
    select_one: String,
    select_all: String,
    update: String,
    delete: String,
}

impl Queries {
    fn new(table: &str) -> Self {
        let columns = "id, nombre, CAST(precio AS CHAR) AS precio, descripcion, creado_en";
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS `{table}` (
                    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
                    nombre VARCHAR(255) NOT NULL,
                    precio DECIMAL(10,2) NOT NULL,
                    descripcion TEXT NULL,
                    creado_en TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )"
            ),
            insert: format!(
                "INSERT INTO `{table}` (nombre, precio, descripcion) VALUES (?, ?, ?)"
            ),
            select_one: format!("SELECT {columns} FROM `{table}` WHERE id = ?"),
            select_all: format!("SELECT {columns} FROM `{table}` ORDER BY id"),
            update: format!(
                "UPDATE `{table}` SET nombre = ?, precio = ?, descripcion = ? WHERE id = ?"
            ),
            delete: format!("DELETE FROM `{table}` WHERE id = ?"),
        }
    }
}

/// A record store backed by a MySQL connection pool.
pub struct MySqlRecordStore {
    pool: MySqlPool,
    /// Same server, no database selected; used to create the database
    server_options: MySqlConnectOptions,
    database: String,
    queries: Queries,
}

impl MySqlRecordStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        if !is_sql_identifier(&config.table) {
            return Err(StoreError::InvalidConfig(format!(
                "invalid table name '{}'",
                config.table
            )));
        }
        if !is_sql_identifier(&config.database) {
            return Err(StoreError::InvalidConfig(format!(
                "invalid database name '{}'",
                config.database
            )));
        }

        let server_options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password);

        // Requests beyond max_connections wait inside the pool
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(server_options.clone().database(&config.database));

        Ok(Self {
            pool,
            server_options,
            database: config.database.clone(),
            queries: Queries::new(&config.table),
        })
    }
}

impl MySqlRecordStore {
    /// Read one product on the given connection, inside its transaction if any
    async fn fetch(&self, conn: &mut MySqlConnection, id: u64) -> Result<Product> {
        let row = sqlx::query(&self.queries.select_one)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        match row {
            Some(row) => product_from_row(&row),
            None => Err(StoreError::NotFound(id)),
        }
    }
}

fn product_from_row(row: &MySqlRow) -> Result<Product> {
    let precio: String = row.try_get("precio")?;
    let precio = precio
        .parse::<f64>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Product {
        id: row.try_get("id")?,
        nombre: row.try_get("nombre")?,
        precio,
        descripcion: row.try_get("descripcion")?,
        creado_en: row.try_get("creado_en")?,
    })
}

#[async_trait]
impl RecordStore for MySqlRecordStore {
    async fn init(&self) -> Result<()> {
        let mut conn = self.server_options.connect().await?;
        sqlx::query(&format!("CREATE DATABASE IF NOT EXISTS `{}`", self.database))
            .execute(&mut conn)
            .await?;
        conn.close().await?;

        sqlx::query(&self.queries.create_table)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create(&self, input: ProductInput) -> Result<Product> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&self.queries.insert)
            .bind(&input.nombre)
            .bind(input.precio)
            .bind(&input.descripcion)
            .execute(&mut *tx)
            .await?;
        let product = self.fetch(&mut tx, result.last_insert_id()).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn get(&self, id: u64) -> Result<Product> {
        let mut conn = self.pool.acquire().await?;
        self.fetch(&mut conn, id).await
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&self.queries.select_all)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn update(&self, id: u64, input: ProductInput) -> Result<Product> {
        // MySQL reports changed rows, not matched rows, so re-read instead of
        // trusting rows_affected. The row lock holds until commit.
        let mut tx = self.pool.begin().await?;
        sqlx::query(&self.queries.update)
            .bind(&input.nombre)
            .bind(input.precio)
            .bind(&input.descripcion)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let product = self.fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let result = sqlx::query(&self.queries.delete)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mysql"
    }
}
