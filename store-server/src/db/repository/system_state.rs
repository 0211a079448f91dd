//! System State Repository
//!
//! Single-row counters. The order-number sequence is incremented atomically
//! inside the database so two concurrent checkouts never share a number.

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::SystemState;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct SystemStateRepository {
    base: BaseRepository,
}

impl SystemStateRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Increment and return the order-number sequence
    pub async fn next_order_sequence(&self) -> RepoResult<i64> {
        let rows: Vec<SystemState> = self
            .base
            .db()
            .query("UPSERT system_state:counters SET next_order_number += 1 RETURN AFTER")
            .await?
            .take(0)?;
        rows.into_iter()
            .next()
            .map(|s| s.next_order_number)
            .ok_or_else(|| RepoError::Database("counter row missing".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_db;

    #[tokio::test]
    async fn sequence_is_monotonic() {
        let db = memory_db().await;
        let repo = SystemStateRepository::new(db);

        let first = repo.next_order_sequence().await.unwrap();
        let second = repo.next_order_sequence().await.unwrap();
        assert_eq!(second, first + 1);
    }
}
