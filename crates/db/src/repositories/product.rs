use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use perfumery_core::domain::product::{NewProduct, Product, ProductId};
use perfumery_core::domain::review::Review;

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let rows = sqlx::query(
            "SELECT id, name, description, price, images_json, sizes_json
             FROM product
             ORDER BY rowid ASC",
        )
        .fetch_all(&mut *conn)
        .await?;

        let review_rows = sqlx::query(
            "SELECT product_id, author, rating, comment
             FROM product_review
             ORDER BY product_id ASC, position ASC",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut reviews_by_product: HashMap<String, Vec<Review>> = HashMap::new();
        for row in &review_rows {
            let product_id: String = row.try_get("product_id")?;
            reviews_by_product.entry(product_id).or_default().push(review_from_row(row)?);
        }

        rows.iter()
            .map(|row| {
                let mut product = product_from_row(row)?;
                product.reviews =
                    reviews_by_product.remove(&product.id.to_string()).unwrap_or_default();
                Ok(product)
            })
            .collect()
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let product = product.into_product(ProductId::generate());
        let mut conn = self.pool.acquire().await?;
        insert_product(&mut conn, &product).await?;
        Ok(product)
    }

    async fn append_review(
        &self,
        id: &ProductId,
        review: Review,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // The next position is computed inside the insert itself, so two
        // concurrent appends can never read the same tail.
        let appended = sqlx::query(
            "INSERT INTO product_review (product_id, position, author, rating, comment, created_at)
             SELECT p.id,
                    COALESCE(
                        (SELECT MAX(r.position) FROM product_review r WHERE r.product_id = p.id),
                        0
                    ) + 1,
                    ?, ?, ?, ?
             FROM product p
             WHERE p.id = ?",
        )
        .bind(&review.author)
        .bind(i64::from(review.rating))
        .bind(&review.comment)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if appended == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let product = fetch_product(&mut tx, id).await?;
        tx.commit().await?;
        Ok(product)
    }
}

/// Inserts a product row followed by its reviews in order.
pub(crate) async fn insert_product(
    conn: &mut SqliteConnection,
    product: &Product,
) -> Result<(), RepositoryError> {
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO product (id, name, description, price, images_json, sizes_json, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(product.id.to_string())
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price.to_string())
    .bind(encode_list("images", &product.images)?)
    .bind(encode_list("sizes", &product.sizes)?)
    .bind(&created_at)
    .execute(&mut *conn)
    .await?;

    for (position, review) in (1_i64..).zip(&product.reviews) {
        sqlx::query(
            "INSERT INTO product_review (product_id, position, author, rating, comment, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id.to_string())
        .bind(position)
        .bind(&review.author)
        .bind(i64::from(review.rating))
        .bind(&review.comment)
        .bind(&created_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let key = id.to_string();

    let row = sqlx::query(
        "SELECT id, name, description, price, images_json, sizes_json
         FROM product
         WHERE id = ?",
    )
    .bind(&key)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut product = product_from_row(&row)?;
    product.reviews = sqlx::query(
        "SELECT author, rating, comment
         FROM product_review
         WHERE product_id = ?
         ORDER BY position ASC",
    )
    .bind(&key)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(review_from_row)
    .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(product))
}

fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let id_raw = row.try_get::<String, _>("id")?;
    let id = ProductId::parse(&id_raw)
        .map_err(|_| RepositoryError::Decode(format!("invalid stored product id `{id_raw}`")))?;

    let price_raw = row.try_get::<String, _>("price")?;
    let price = Decimal::from_str(&price_raw).map_err(|error| {
        RepositoryError::Decode(format!("invalid price `{price_raw}` for product {id}: {error}"))
    })?;

    Ok(Product {
        id,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price,
        images: decode_list("images_json", &row.try_get::<String, _>("images_json")?)?,
        sizes: decode_list("sizes_json", &row.try_get::<String, _>("sizes_json")?)?,
        reviews: Vec::new(),
    })
}

fn review_from_row(row: &SqliteRow) -> Result<Review, RepositoryError> {
    let rating_raw = row.try_get::<i64, _>("rating")?;
    let rating = u8::try_from(rating_raw)
        .map_err(|_| RepositoryError::Decode(format!("invalid stored rating {rating_raw}")))?;

    Ok(Review { author: row.try_get("author")?, rating, comment: row.try_get("comment")? })
}

fn encode_list(field: &str, values: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(values)
        .map_err(|error| RepositoryError::Encode(format!("could not encode {field}: {error}")))
}

fn decode_list(column: &str, raw: &str) -> Result<Vec<String>, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("invalid `{column}` value: {error}")))
}
