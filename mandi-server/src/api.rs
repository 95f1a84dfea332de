//! HTTP surface of the marketplace server.
//!
//! Three routes on one axum router: product keyword search, per-product
//! supplier listings, and the WebSocket upgrade for the negotiation chat.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use mandi_proto::catalog::{Product, SupplierListing};

use crate::session::{self, ServerState};

/// Query parameters for `/api/products/search`.
#[derive(Debug, serde::Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// JSON error body for 404 responses.
#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    message: String,
}

/// Builds the application router over shared server state.
#[must_use]
pub fn router(state: Arc<ServerState>) -> axum::Router {
    axum::Router::new()
        .route("/api/products/search", axum::routing::get(search_products))
        .route(
            "/api/product-suppliers/{product_id}",
            axum::routing::get(product_suppliers),
        )
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(state)
}

/// `GET /api/products/search?q=` — case-insensitive substring match on
/// product name or supplier; an empty query returns the full catalog.
async fn search_products(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Product>> {
    let results = state.catalog.search(&params.q);
    tracing::debug!(query = %params.q, hits = results.len(), "product search");
    Json(results)
}

/// `GET /api/product-suppliers/{product_id}` — supplier listings for one
/// product, or 404 when none are known.
async fn product_suppliers(
    State(state): State<Arc<ServerState>>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<SupplierListing>>, (StatusCode, Json<ErrorBody>)> {
    state.catalog.listings(&product_id).map_or_else(
        || {
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    message: "No suppliers found for this product.".to_string(),
                }),
            ))
        },
        |listings| Ok(Json(listings.to_vec())),
    )
}

/// Upgrades an HTTP request to a WebSocket chat connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| session::handle_socket(socket, state))
}

/// Starts the server on the given address and returns the bound address
/// and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    state: Arc<ServerState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}
