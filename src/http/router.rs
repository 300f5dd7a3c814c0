//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
///
/// Route paths keep the legacy casing (mixed-case on the product rankings,
/// lowercase elsewhere) because deployed consumers call them verbatim.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/insertarPedidoDetalle",
            post(handlers::insert_order_with_lines),
        )
        .route(
            "/listarreportepedidocliente",
            get(handlers::list_order_client_report),
        )
        .route(
            "/ListarTop3ProductosMasPedidos",
            get(handlers::list_top_ordered_products),
        )
        .route(
            "/ListarTopProductosMasPedidos",
            get(handlers::list_top_ordered_products_in_range),
        )
        .route(
            "/eliminarclienteencascada/{id}",
            delete(handlers::delete_client_cascade),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo =
            Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::SalesRepository>;
        let state = AppState::new(repo);
        let _router = create_router(state);
        // If we got here, router was created successfully
    }
}
