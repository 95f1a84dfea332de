//! REST API tests against a live server.
//!
//! Covers the product search endpoint (substring match, case folding,
//! empty query) and the per-product supplier listing endpoint including
//! its 404 shape.
//!
//! Verification command: `cargo test --test catalog_api`

use std::sync::Arc;
use std::time::Duration;

use mandi_proto::catalog::{Product, SupplierListing};
use mandi_server::api::start_server;
use mandi_server::catalog::CatalogStore;
use mandi_server::session::ServerState;

async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    let state = Arc::new(ServerState::with_reply_delay(
        CatalogStore::with_demo_data(),
        Duration::from_millis(100),
    ));
    start_server("127.0.0.1:0", state)
        .await
        .expect("failed to start test server")
}

#[tokio::test]
async fn search_without_query_returns_full_catalog() {
    let (addr, _handle) = start_test_server().await;

    let products: Vec<Product> = reqwest::get(format!("http://{addr}/api/products/search"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(products.len(), 14);
}

#[tokio::test]
async fn search_matches_name_case_insensitive() {
    let (addr, _handle) = start_test_server().await;

    let products: Vec<Product> =
        reqwest::get(format!("http://{addr}/api/products/search?q=ONION"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "p1");
    assert_eq!(products[0].mrp, 25);
}

#[tokio::test]
async fn search_matches_supplier_name() {
    let (addr, _handle) = start_test_server().await;

    let products: Vec<Product> =
        reqwest::get(format!("http://{addr}/api/products/search?q=spice"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    // "Spice Mart" and "Spice Hub".
    assert_eq!(products.len(), 2);
}

#[tokio::test]
async fn search_with_no_match_returns_empty_array() {
    let (addr, _handle) = start_test_server().await;

    let products: Vec<Product> =
        reqwest::get(format!("http://{addr}/api/products/search?q=durian"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn suppliers_for_known_product() {
    let (addr, _handle) = start_test_server().await;

    let listings: Vec<SupplierListing> =
        reqwest::get(format!("http://{addr}/api/product-suppliers/p1"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].supplier_id, "s1");
}

#[tokio::test]
async fn suppliers_for_unknown_product_is_404_with_message() {
    let (addr, _handle) = start_test_server().await;

    let response = reqwest::get(format!("http://{addr}/api/product-suppliers/p999"))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "No suppliers found for this product.");
}
