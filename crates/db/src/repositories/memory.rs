use tokio::sync::RwLock;

use perfumery_core::domain::product::{NewProduct, Product, ProductId};
use perfumery_core::domain::review::Review;

use super::{ProductRepository, RepositoryError};

/// Catalog kept in process memory. Insertion order is preserved.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.clone())
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|product| &product.id == id).cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let product = product.into_product(ProductId::generate());
        let mut products = self.products.write().await;
        products.push(product.clone());
        Ok(product)
    }

    async fn append_review(
        &self,
        id: &ProductId,
        review: Review,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|product| &product.id == id) else {
            return Ok(None);
        };
        product.reviews.push(review);
        Ok(Some(product.clone()))
    }
}
