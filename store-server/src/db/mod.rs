//! Database Module
//!
//! Embedded SurrealDB (RocksDB engine) under the configured work directory.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use std::path::Path;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

const NAMESPACE: &str = "store";
const DATABASE: &str = "store";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the embedded database at `db_dir`
    pub async fn new(db_dir: &Path) -> Result<Self, AppError> {
        let path = db_dir.to_string_lossy().to_string();
        let db = Surreal::new::<RocksDb>(path.as_str())
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_indexes(&db)
            .await
            .map_err(|e| AppError::database(format!("Failed to define indexes: {e}")))?;

        tracing::info!(path = %path, "Database connection established (SurrealDB/RocksDB)");

        Ok(Self { db })
    }
}

/// Tables stay schemaless; only the uniqueness constraints are declared.
/// Checkout relies on the database rejecting a second order row with the
/// same idempotency key, so the index must exist before any insert.
pub async fn define_indexes(db: &Surreal<Db>) -> Result<(), surrealdb::Error> {
    db.query(
        "DEFINE INDEX IF NOT EXISTS order_idempotency_key \
         ON TABLE order FIELDS idempotency_key UNIQUE",
    )
    .await?;
    Ok(())
}

/// In-memory database for tests
#[cfg(test)]
pub async fn memory_db() -> Surreal<Db> {
    let db = Surreal::new::<surrealdb::engine::local::Mem>(())
        .await
        .expect("in-memory database");
    db.use_ns("test").use_db("test").await.expect("namespace");
    define_indexes(&db).await.expect("indexes");
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_embedded_database_at_path() {
        let dir = tempfile::tempdir().unwrap();
        let service = DbService::new(dir.path()).await.unwrap();
        service.db.query("RETURN 1").await.unwrap();
    }
}
