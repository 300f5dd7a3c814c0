//! Repository trait for read-only report projections.
//!
//! Reports reshape joined data into flat rows without persisting anything.
//! Grouping happens in the backend; ranking (sort + optional truncation) is
//! the service layer's job so both backends share identical semantics.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::error::RepositoryResult;
use crate::models::{OrderReportRow, ProductOrderCount};

/// Repository trait for reporting queries.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Project (client name, order date, product name) for every order line,
    /// following line -> order -> client and line -> product.
    ///
    /// No filter, no deduplication, no pagination. Row order is storage
    /// order: it is undefined and callers must not rely on it.
    async fn fetch_order_client_product_rows(&self) -> RepositoryResult<Vec<OrderReportRow>>;

    /// Count order lines per product across all orders.
    ///
    /// Lines are grouped by product id; the count is the number of lines in
    /// the group, not the summed quantity. The returned group order is
    /// unspecified.
    async fn fetch_product_line_counts(&self) -> RepositoryResult<Vec<ProductOrderCount>>;

    /// Count order lines per product, restricted to lines whose parent order
    /// date falls in `[start, end]` (inclusive on both ends).
    ///
    /// `start > end` is not rejected; it simply matches nothing.
    async fn fetch_product_line_counts_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<Vec<ProductOrderCount>>;
}
