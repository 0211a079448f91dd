//! Product Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Product, ProductCreate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn record_id(id: &str) -> RecordId {
        if id.contains(':') {
            id.parse()
                .unwrap_or_else(|_| RecordId::from_table_key(PRODUCT_TABLE, id))
        } else {
            RecordId::from_table_key(PRODUCT_TABLE, id)
        }
    }

    /// Find all active products
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_active = true ORDER BY sort_order")
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self.base.db().select(Self::record_id(id)).await?;
        Ok(product)
    }

    /// Create a new product (admin import, test seeding)
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        let product: Option<Product> = self.base.db().create(PRODUCT_TABLE).content(data).await?;
        product.ok_or_else(|| RepoError::Database("product insert returned no row".into()))
    }
}
