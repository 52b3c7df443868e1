use async_trait::async_trait;
use thiserror::Error;

use perfumery_core::domain::product::{NewProduct, Product, ProductId};
use perfumery_core::domain::review::Review;

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
}

/// Access to the product catalog. Products own their reviews, so every read
/// returns the full document and reviews are only ever appended.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products in insertion order.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Stores a new product under a freshly generated id.
    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Appends `review` as the last review of the product and returns the
    /// updated product, or `None` without touching the store when no product
    /// has this id. The append is atomic with respect to concurrent appends.
    async fn append_review(
        &self,
        id: &ProductId,
        review: Review,
    ) -> Result<Option<Product>, RepositoryError>;
}
