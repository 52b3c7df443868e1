use rust_decimal::Decimal;

use perfumery_core::domain::product::{NewProduct, Product, ProductId};
use perfumery_core::domain::review::Review;
use perfumery_core::errors::DomainError;

use crate::connection::DbPool;
use crate::repositories::product::insert_product;
use crate::repositories::RepositoryError;

const DEMO_SIZES: &[&str] = &["30ml", "50ml", "100ml"];

/// Storefront demo catalog. Each perfume leads with its own bottle shot.
const DEMO_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Floral Bliss",
        description: "A delightful blend of rose and jasmine, creating a romantic and feminine fragrance.",
        price_cents: 8999,
        images: &[
            "../../Perfume1.jpg",
            "../../Perfume2.jpg",
            "../../Perfume3.jpg",
            "../../Perfume4.jpg",
            "../../Perfume5.jpg",
        ],
        reviews: &[SeedReview {
            author: "Jane Doe",
            rating: 5,
            comment: "Absolutely love this scent! It's become my go-to perfume.",
        }],
    },
    SeedProduct {
        name: "Ocean Breeze",
        description: "Fresh and invigorating scent of the sea.",
        price_cents: 7999,
        images: &[
            "../../Perfume2.jpg",
            "../../Perfume1.jpg",
            "../../Perfume3.jpg",
            "../../Perfume4.jpg",
            "../../Perfume5.jpg",
        ],
        reviews: &[],
    },
    SeedProduct {
        name: "Woody Elegance",
        description: "Sophisticated blend of sandalwood and cedar.",
        price_cents: 9999,
        images: &[
            "../../Perfume3.jpg",
            "../../Perfume2.jpg",
            "../../Perfume1.jpg",
            "../../Perfume4.jpg",
            "../../Perfume5.jpg",
        ],
        reviews: &[],
    },
    SeedProduct {
        name: "Citrus Spark",
        description: "Energizing mix of lemon and bergamot.",
        price_cents: 6999,
        images: &[
            "../../Perfume4.jpg",
            "../../Perfume2.jpg",
            "../../Perfume3.jpg",
            "../../Perfume1.jpg",
            "../../Perfume5.jpg",
        ],
        reviews: &[],
    },
    SeedProduct {
        name: "Vanilla Dream",
        description: "Sweet and comforting vanilla fragrance.",
        price_cents: 8499,
        images: &[
            "../../Perfume5.jpg",
            "../../Perfume2.jpg",
            "../../Perfume3.jpg",
            "../../Perfume4.jpg",
            "../../Perfume1.jpg",
        ],
        reviews: &[],
    },
];

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price_cents: i64,
    images: &'static [&'static str],
    reviews: &'static [SeedReview],
}

struct SeedReview {
    author: &'static str,
    rating: i64,
    comment: &'static str,
}

impl SeedProduct {
    fn to_product(&self) -> Result<Product, RepositoryError> {
        let invalid = |error: DomainError| {
            RepositoryError::Encode(format!("demo product {}: {error}", self.name))
        };

        let mut product = NewProduct::new(
            self.name,
            self.description,
            Decimal::new(self.price_cents, 2),
            self.images.iter().map(ToString::to_string).collect(),
            DEMO_SIZES.iter().map(ToString::to_string).collect(),
        )
        .map_err(invalid)?
        .into_product(ProductId::generate());

        product.reviews = self
            .reviews
            .iter()
            .map(|review| Review::new(review.author, review.rating, review.comment))
            .collect::<Result<_, _>>()
            .map_err(invalid)?;

        Ok(product)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededProduct {
    pub id: ProductId,
    pub name: &'static str,
    pub review_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub products_seeded: Vec<SeededProduct>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

/// Demo perfume catalog used to populate a fresh storefront.
pub struct DemoCatalog;

impl DemoCatalog {
    pub fn product_names() -> Vec<&'static str> {
        DEMO_PRODUCTS.iter().map(|product| product.name).collect()
    }

    /// Replaces the whole catalog with the demo products in a single transaction.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let products =
            DEMO_PRODUCTS.iter().map(SeedProduct::to_product).collect::<Result<Vec<_>, _>>()?;

        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM product_review").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM product").execute(&mut *tx).await?;
        for product in &products {
            insert_product(&mut tx, product).await?;
        }
        tx.commit().await?;

        let products_seeded = DEMO_PRODUCTS
            .iter()
            .zip(&products)
            .map(|(seed, product)| SeededProduct {
                id: product.id,
                name: seed.name,
                review_count: product.reviews.len(),
            })
            .collect();

        Ok(SeedResult { products_seeded })
    }

    /// Checks that every demo product is present with its sizes and reviews.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let product_total: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM product").fetch_one(pool).await?;
        checks.push((
            "catalog-size".to_string(),
            usize::try_from(product_total).is_ok_and(|total| total == DEMO_PRODUCTS.len()),
        ));

        let expected_sizes = serde_json::to_string(DEMO_SIZES)
            .map_err(|error| RepositoryError::Encode(error.to_string()))?;

        for seed in DEMO_PRODUCTS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product WHERE name = ?1 AND sizes_json = ?2)",
            )
            .bind(seed.name)
            .bind(&expected_sizes)
            .fetch_one(pool)
            .await?;
            checks.push((seed.name.to_string(), exists == 1));

            let review_count: i64 = sqlx::query_scalar(
                "SELECT COUNT(1)
                 FROM product_review r
                 JOIN product p ON p.id = r.product_id
                 WHERE p.name = ?1",
            )
            .bind(seed.name)
            .fetch_one(pool)
            .await?;
            checks.push((
                format!("{} review-count", seed.name),
                usize::try_from(review_count).is_ok_and(|count| count == seed.reviews.len()),
            ));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

#[cfg(test)]
mod tests {
    use super::DemoCatalog;
    use crate::repositories::{ProductRepository, SqlProductRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn load_replaces_existing_catalog() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let first = DemoCatalog::load(&pool).await.expect("first load");
        let second = DemoCatalog::load(&pool).await.expect("second load");

        let repo = SqlProductRepository::new(pool.clone());
        let listed = repo.list().await.expect("list");

        assert_eq!(listed.len(), 5);
        assert_ne!(first.products_seeded[0].id, second.products_seeded[0].id);
        assert_eq!(listed[0].id, second.products_seeded[0].id);

        pool.close().await;
    }

    #[tokio::test]
    async fn verify_reports_missing_catalog() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let verification = DemoCatalog::verify(&pool).await.expect("verify");

        assert!(!verification.all_present);
        assert!(verification.checks.contains(&("catalog-size".to_string(), false)));

        pool.close().await;
    }

    #[tokio::test]
    async fn verify_names_the_product_whose_reviews_drifted() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DemoCatalog::load(&pool).await.expect("load");

        sqlx::query(
            "DELETE FROM product_review
             WHERE product_id = (SELECT id FROM product WHERE name = 'Floral Bliss')",
        )
        .execute(&pool)
        .await
        .expect("drop seeded review");

        let verification = DemoCatalog::verify(&pool).await.expect("verify");
        let failed = verification
            .checks
            .iter()
            .filter(|(_, passed)| !passed)
            .map(|(label, _)| label.as_str())
            .collect::<Vec<_>>();

        assert!(!verification.all_present);
        assert_eq!(failed, vec!["Floral Bliss review-count"]);

        let mut labels = verification.checks.iter().map(|(label, _)| label).collect::<Vec<_>>();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), verification.checks.len());

        pool.close().await;
    }
}
