//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic. Paths and response shapes follow the legacy
//! sales service so existing consumers keep working.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    parse_date_param, DateRangeQuery, HealthResponse, InsertOrderRequest, OrderReportRowDto,
    ProductCountDto,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::{ClientId, NewOrder};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the database
/// is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Order Insertion
// =============================================================================

/// POST /insertarPedidoDetalle
///
/// Insert an order together with its nested lines in one transaction.
/// A missing or malformed body is a validation error (400), not an internal
/// fault. On success the legacy contract is a bare 200 with no body.
pub async fn insert_order_with_lines(
    State(state): State<AppState>,
    payload: Result<Json<InsertOrderRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(request) = payload.map_err(|e| {
        AppError::BadRequest(format!("Debe ingresar un pedido con todos sus datos: {}", e))
    })?;

    let order = NewOrder::from(request);
    db_services::insert_order_with_lines(state.repository.as_ref(), &order).await?;

    Ok(StatusCode::OK)
}

// =============================================================================
// Reports
// =============================================================================

/// GET /listarreportepedidocliente
///
/// Project (client name, order date, product name) for every order line.
/// Row order is storage order and is undefined.
pub async fn list_order_client_report(
    State(state): State<AppState>,
) -> HandlerResult<Vec<OrderReportRowDto>> {
    let rows = db_services::order_client_product_report(state.repository.as_ref()).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /ListarTop3ProductosMasPedidos
///
/// The three products with the most order lines, descending. Ties keep the
/// order grouping yielded.
pub async fn list_top_ordered_products(
    State(state): State<AppState>,
) -> HandlerResult<Vec<ProductCountDto>> {
    let ranked = db_services::top_ordered_products(state.repository.as_ref()).await?;
    Ok(Json(ranked.into_iter().map(Into::into).collect()))
}

/// GET /ListarTopProductosMasPedidos?fechaInicio=...&fechaFin=...
///
/// The full ranked product list for orders dated within the inclusive range.
/// Missing or unparsable parameters are a validation error (400).
pub async fn list_top_ordered_products_in_range(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> HandlerResult<Vec<ProductCountDto>> {
    let Query(range) = query.map_err(|e| {
        AppError::BadRequest(format!(
            "Debe proporcionar fechaInicio y fechaFin: {}",
            e
        ))
    })?;

    let start = parse_date_param(&range.start).map_err(AppError::BadRequest)?;
    let end = parse_date_param(&range.end).map_err(AppError::BadRequest)?;

    let ranked =
        db_services::top_ordered_products_between(state.repository.as_ref(), start, end).await?;
    Ok(Json(ranked.into_iter().map(Into::into).collect()))
}

// =============================================================================
// Client Deletion
// =============================================================================

/// DELETE /eliminarclienteencascada/{id}
///
/// Delete a client; the schema's cascade removes its orders and their lines.
/// An unknown id answers 404 instead of faulting.
pub async fn delete_client_cascade(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> HandlerResult<&'static str> {
    db_services::delete_client_cascade(state.repository.as_ref(), ClientId::new(id)).await?;

    // Legacy contract: a bare JSON string.
    Ok(Json("Cliente eliminado"))
}
