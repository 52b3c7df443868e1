//! Catalog API routes, mounted under `/api`.
//!
//! - `GET  /products`               list every product in insertion order
//! - `GET  /products/{id}`          fetch one product
//! - `POST /products`               create a product
//! - `POST /products/{id}/reviews`  append a review and return the updated product

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use perfumery_core::domain::product::{NewProduct, Product, ProductId};
use perfumery_core::domain::review::Review;
use perfumery_core::errors::{ApplicationError, DomainError};
use perfumery_db::ProductRepository;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct CatalogState {
    repository: Arc<dyn ProductRepository>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> Result<NewProduct, DomainError> {
        let name = required("name", self.name)?;
        let description = required("description", self.description)?;
        let price = self.price.ok_or_else(|| missing("price"))?;
        NewProduct::new(name, description, price, self.images, self.sizes)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AddReviewRequest {
    pub author: Option<String>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl AddReviewRequest {
    pub fn into_review(self) -> Result<Review, DomainError> {
        let author = required("author", self.author)?;
        let rating = self.rating.ok_or_else(|| missing("rating"))?;
        let comment = required("comment", self.comment)?;
        Review::new(author, rating, comment)
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, DomainError> {
    value.ok_or_else(|| missing(field))
}

fn missing(field: &str) -> DomainError {
    DomainError::Validation(format!("{field} is required"))
}

pub fn router(repository: Arc<dyn ProductRepository>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/reviews", post(add_review))
        .with_state(CatalogState { repository })
}

async fn list_products(State(state): State<CatalogState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.repository.list().await?;
    Ok(Json(products))
}

async fn get_product(
    Path(raw_id): Path<String>,
    State(state): State<CatalogState>,
) -> Result<Json<Product>, ApiError> {
    let id = ProductId::parse(&raw_id)?;
    let product = state
        .repository
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApplicationError::ProductNotFound(id.to_string()))?;
    Ok(Json(product))
}

async fn create_product(
    State(state): State<CatalogState>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(request) = body.map_err(ApiError::rejected_body)?;
    let new_product = request.into_new_product()?;
    let product = state.repository.create(new_product).await?;

    info!(
        event_name = "catalog.product.created",
        product_id = %product.id,
        product_name = %product.name,
        "product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

async fn add_review(
    Path(raw_id): Path<String>,
    State(state): State<CatalogState>,
    body: Result<Json<AddReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let id = ProductId::parse(&raw_id)?;
    let Json(request) = body.map_err(ApiError::rejected_body)?;
    let review = request.into_review()?;

    let product = state
        .repository
        .append_review(&id, review)
        .await?
        .ok_or_else(|| ApplicationError::ProductNotFound(id.to_string()))?;

    info!(
        event_name = "catalog.review.appended",
        product_id = %product.id,
        review_count = product.reviews.len(),
        "review appended"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use perfumery_core::domain::product::{NewProduct, Product, ProductId};
    use perfumery_core::domain::review::Review;
    use perfumery_core::errors::DomainError;
    use perfumery_db::{InMemoryProductRepository, ProductRepository, RepositoryError};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, AddReviewRequest, CreateProductRequest};

    struct FailingRepository;

    #[async_trait]
    impl ProductRepository for FailingRepository {
        async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
            Err(RepositoryError::Decode("stored price 'abc' is not a decimal".to_string()))
        }

        async fn find_by_id(&self, _id: &ProductId) -> Result<Option<Product>, RepositoryError> {
            Err(RepositoryError::Decode("stored price 'abc' is not a decimal".to_string()))
        }

        async fn create(&self, _product: NewProduct) -> Result<Product, RepositoryError> {
            Err(RepositoryError::Encode("disk full".to_string()))
        }

        async fn append_review(
            &self,
            _id: &ProductId,
            _review: Review,
        ) -> Result<Option<Product>, RepositoryError> {
            Err(RepositoryError::Encode("disk full".to_string()))
        }
    }

    fn app() -> Router {
        router(Arc::new(InMemoryProductRepository::default()))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response =
            app.clone().oneshot(request.body(body).expect("request")).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    fn vanilla() -> Value {
        json!({
            "name": "Vanilla Dream",
            "description": "Sweet and comforting vanilla fragrance.",
            "price": 84.99,
            "images": ["../../Perfume5.jpg"],
            "sizes": ["30ml", "50ml"]
        })
    }

    #[tokio::test]
    async fn create_then_review_then_fetch() {
        let app = app();

        let (status, created) = send(&app, Method::POST, "/products", Some(vanilla())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["reviews"], json!([]));
        assert_eq!(created["price"], json!(84.99));
        let id = created["_id"].as_str().expect("id").to_string();

        let (status, updated) = send(
            &app,
            Method::POST,
            &format!("/products/{id}/reviews"),
            Some(json!({"author": "Jane", "rating": 5, "comment": "Great"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(updated["reviews"], json!([{"author": "Jane", "rating": 5, "comment": "Great"}]));

        let (status, fetched) = send(&app, Method::GET, &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn list_returns_products_in_creation_order() {
        let app = app();
        let (status, listed) = send(&app, Method::GET, "/products", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([]));

        let mut second = vanilla();
        second["name"] = json!("Citrus Spark");
        send(&app, Method::POST, "/products", Some(vanilla())).await;
        send(&app, Method::POST, "/products", Some(second)).await;

        let (_, listed) = send(&app, Method::GET, "/products", None).await;
        let names: Vec<&str> = listed
            .as_array()
            .expect("array")
            .iter()
            .map(|product| product["name"].as_str().expect("name"))
            .collect();
        assert_eq!(names, ["Vanilla Dream", "Citrus Spark"]);
    }

    #[tokio::test]
    async fn malformed_id_is_rejected_before_lookup() {
        let app = router(Arc::new(FailingRepository));

        let (status, body) = send(&app, Method::GET, "/products/not-an-id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_id");

        let (status, body) = send(
            &app,
            Method::POST,
            "/products/not-an-id/reviews",
            Some(json!({"author": "Jane", "rating": 5, "comment": "Great"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_id");
    }

    #[tokio::test]
    async fn whitespace_padded_id_is_rejected() {
        let app = app();
        let (_, created) = send(&app, Method::POST, "/products", Some(vanilla())).await;
        let id = created["_id"].as_str().expect("id").to_string();

        let (status, body) = send(&app, Method::GET, &format!("/products/%20{id}%09"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_id");

        let (status, _) = send(&app, Method::GET, &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let app = app();
        let missing = ProductId::generate();

        let (status, body) = send(&app, Method::GET, &format!("/products/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/products/{missing}/reviews"),
            Some(json!({"author": "Jane", "rating": 5, "comment": "Great"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_review_leaves_product_unchanged() {
        let app = app();
        let (_, created) = send(&app, Method::POST, "/products", Some(vanilla())).await;
        let id = created["_id"].as_str().expect("id").to_string();

        for payload in [
            json!({"author": "Jane", "rating": 6, "comment": "Great"}),
            json!({"author": "Jane", "rating": 0, "comment": "Great"}),
            json!({"author": "   ", "rating": 4, "comment": "Great"}),
            json!({"author": "Jane", "rating": 4, "comment": "  "}),
            json!({"author": "Jane", "rating": 4}),
            json!({"author": "Jane", "rating": 4.5, "comment": "Great"}),
        ] {
            let (status, body) =
                send(&app, Method::POST, &format!("/products/{id}/reviews"), Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "validation_error");
        }

        let (_, fetched) = send(&app, Method::GET, &format!("/products/{id}"), None).await;
        assert_eq!(fetched["reviews"], json!([]));
    }

    #[tokio::test]
    async fn invalid_product_payloads_are_bad_requests() {
        let app = app();

        let mut negative = vanilla();
        negative["price"] = json!(-1);
        let mut no_sizes = vanilla();
        no_sizes["sizes"] = json!([]);
        let mut no_images = vanilla();
        no_images["images"] = json!([]);
        let mut no_name = vanilla();
        no_name.as_object_mut().expect("object").remove("name");

        for payload in [negative, no_sizes, no_images, no_name, json!("not an object")] {
            let (status, body) = send(&app, Method::POST, "/products", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "validation_error");
        }

        let (_, listed) = send(&app, Method::GET, "/products", None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn store_failures_are_internal_errors_without_details() {
        let app = router(Arc::new(FailingRepository));

        let (status, body) = send(&app, Method::GET, "/products", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        assert!(!body.to_string().contains("abc"));

        let (status, body) = send(&app, Method::POST, "/products", Some(vanilla())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("disk full"));
    }

    #[test]
    fn request_conversion_reports_missing_fields() {
        let error = CreateProductRequest::default().into_new_product().expect_err("missing");
        assert_eq!(error, DomainError::Validation("name is required".to_string()));

        let error = AddReviewRequest {
            author: Some("Jane".to_string()),
            rating: None,
            comment: Some("Great".to_string()),
        }
        .into_review()
        .expect_err("missing rating");
        assert_eq!(error, DomainError::Validation("rating is required".to_string()));

        let request = CreateProductRequest {
            name: Some("Ocean Breeze".to_string()),
            description: Some("Fresh and invigorating scent of the sea.".to_string()),
            price: Some(Decimal::new(7999, 2)),
            images: vec!["ocean.jpg".to_string()],
            sizes: vec!["50ml".to_string()],
        };
        let product = request.into_new_product().expect("valid");
        assert_eq!(product.price, Decimal::new(7999, 2));
    }
}
