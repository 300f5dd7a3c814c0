//! Shared fixtures for the integration test suites.

#![cfg(feature = "http-server")]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use tower::ServiceExt;

use ventas_backend::db::repositories::LocalRepository;
use ventas_backend::db::services;
use ventas_backend::http::{create_router, AppState};
use ventas_backend::models::{ClientId, NewClient, NewOrder, NewOrderLine, NewProduct, ProductId};

/// A router wired to an in-memory repository, with the repository kept
/// accessible so tests can seed and inspect it directly.
pub struct TestApp {
    pub repo: Arc<LocalRepository>,
    pub router: Router,
}

pub fn test_app() -> TestApp {
    let repo = Arc::new(LocalRepository::new());
    let state = AppState::new(repo.clone());
    TestApp {
        repo,
        router: create_router(state),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub async fn seed_client(repo: &LocalRepository, name: &str) -> ClientId {
    services::register_client(
        repo,
        &NewClient {
            first_name: Some(name.to_string()),
            last_name: Some("Gomez".to_string()),
        },
    )
    .await
    .unwrap()
}

pub async fn seed_product(repo: &LocalRepository, name: &str) -> ProductId {
    services::register_product(
        repo,
        &NewProduct {
            name: Some(name.to_string()),
        },
    )
    .await
    .unwrap()
}

/// Insert `line_count` single-line orders for a product on a given date.
pub async fn seed_lines(
    repo: &LocalRepository,
    client_id: ClientId,
    product_id: ProductId,
    order_date: NaiveDateTime,
    line_count: usize,
) {
    for _ in 0..line_count {
        services::insert_order_with_lines(
            repo,
            &NewOrder {
                client_id,
                date: order_date,
                status: None,
                total: None,
                lines: vec![NewOrderLine {
                    product_id,
                    quantity: Some(1),
                    unit_price: Some(10),
                    subtotal: Some(10),
                }],
            },
        )
        .await
        .unwrap();
    }
}

/// Send a request through the router.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    send(
        router,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}
