use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use perfumery_core::config::ServerConfig;
use perfumery_db::{DbPool, ProductRepository};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{catalog, health};

/// Full HTTP surface: the catalog under `/api` plus `/health`.
pub fn router(
    server: &ServerConfig,
    repository: Arc<dyn ProductRepository>,
    db_pool: DbPool,
) -> Result<Router, header::InvalidHeaderValue> {
    let router = Router::new()
        .nest("/api", catalog::router(repository))
        .merge(health::router(db_pool))
        .layer(TraceLayer::new_for_http());

    match server.cors_origin() {
        Some(origin) => Ok(router.layer(cors_layer(origin)?)),
        None => Ok(router),
    }
}

fn cors_layer(origin: &str) -> Result<CorsLayer, header::InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin(HeaderValue::from_str(origin)?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}
