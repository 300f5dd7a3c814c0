//! Service layer for the sales store.
//!
//! High-level business logic over any repository implementation. Handlers
//! and tests call these functions instead of talking to a backend directly,
//! so ranking and truncation behave identically for every backend.

use chrono::NaiveDateTime;

use crate::db::repository::{RepositoryResult, SalesRepository};
use crate::models::{
    ClientId, NewClient, NewOrder, NewProduct, Order, OrderId, OrderReportRow, ProductId,
    ProductOrderCount,
};

/// How many products the all-time "most ordered" report returns.
pub const TOP_PRODUCTS_LIMIT: usize = 3;

/// Insert an order together with its lines in one transaction.
///
/// Returns the generated order id. Fails if the referenced client or any
/// referenced product does not exist.
pub async fn insert_order_with_lines(
    repo: &dyn SalesRepository,
    order: &NewOrder,
) -> RepositoryResult<OrderId> {
    log::info!(
        "inserting order with {} lines for client {}",
        order.lines.len(),
        order.client_id
    );
    repo.insert_order_with_lines(order).await
}

/// Fetch an order with its lines.
pub async fn get_order(repo: &dyn SalesRepository, order_id: OrderId) -> RepositoryResult<Order> {
    repo.get_order(order_id).await
}

/// Register a new client.
pub async fn register_client(
    repo: &dyn SalesRepository,
    client: &NewClient,
) -> RepositoryResult<ClientId> {
    repo.insert_client(client).await
}

/// Register a new product.
pub async fn register_product(
    repo: &dyn SalesRepository,
    product: &NewProduct,
) -> RepositoryResult<ProductId> {
    repo.insert_product(product).await
}

/// Delete a client and everything that references it.
///
/// Returns `RepositoryError::NotFound` when the id is unknown instead of
/// faulting, so the HTTP layer can answer 404.
pub async fn delete_client_cascade(
    repo: &dyn SalesRepository,
    client_id: ClientId,
) -> RepositoryResult<()> {
    log::info!("deleting client {} with cascade", client_id);
    repo.delete_client_cascade(client_id).await
}

/// The client/order/product join report: one row per order line.
///
/// Row order is storage order and is undefined; callers must not rely on it.
pub async fn order_client_product_report(
    repo: &dyn SalesRepository,
) -> RepositoryResult<Vec<OrderReportRow>> {
    repo.fetch_order_client_product_rows().await
}

/// The three most-ordered products of all time.
///
/// Products are ranked by descending order-line count (lines, not summed
/// quantity) and truncated to [`TOP_PRODUCTS_LIMIT`]. Ties keep whatever
/// order grouping yielded.
pub async fn top_ordered_products(
    repo: &dyn SalesRepository,
) -> RepositoryResult<Vec<ProductOrderCount>> {
    let counts = repo.fetch_product_line_counts().await?;
    Ok(rank_product_counts(counts, Some(TOP_PRODUCTS_LIMIT)))
}

/// The full ranked product list for orders dated within `[start, end]`.
///
/// Both bounds are inclusive. The list is intentionally NOT truncated: the
/// legacy endpoint returns every product despite its "top" naming.
pub async fn top_ordered_products_between(
    repo: &dyn SalesRepository,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> RepositoryResult<Vec<ProductOrderCount>> {
    let counts = repo.fetch_product_line_counts_between(start, end).await?;
    Ok(rank_product_counts(counts, None))
}

/// Check that the backing store is reachable.
pub async fn health_check(repo: &dyn SalesRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Sort product counts by descending line count and optionally truncate.
///
/// The sort is stable, so tied groups keep their incoming order.
fn rank_product_counts(
    mut counts: Vec<ProductOrderCount>,
    limit: Option<usize>,
) -> Vec<ProductOrderCount> {
    counts.sort_by(|a, b| b.line_count.cmp(&a.line_count));
    if let Some(limit) = limit {
        counts.truncate(limit);
    }
    counts
}
