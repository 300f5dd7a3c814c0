//! Repository traits for sales entity lifecycle operations.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{ClientId, NewClient, NewOrder, NewProduct, Order, OrderId, ProductId};

/// Repository trait for order persistence.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert an order and all of its lines atomically.
    ///
    /// The store assigns the order id and every line id; the new order id is
    /// wired into each line inside the same transaction. Either everything is
    /// persisted or nothing is.
    ///
    /// # Returns
    /// * `Ok(OrderId)` - The generated id of the inserted order
    /// * `Err(RepositoryError)` - If the insert fails (e.g. unknown client)
    async fn insert_order_with_lines(&self, order: &NewOrder) -> RepositoryResult<OrderId>;

    /// Fetch an order and its lines by id.
    ///
    /// # Returns
    /// * `Ok(Order)` - The order with lines in line-id order
    /// * `Err(RepositoryError::NotFound)` - If no such order exists
    async fn get_order(&self, order_id: OrderId) -> RepositoryResult<Order>;

    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}

/// Repository trait for client persistence.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Insert a client; the store assigns the id.
    async fn insert_client(&self, client: &NewClient) -> RepositoryResult<ClientId>;

    /// Delete a client and, transitively, every order and order line that
    /// references it. The cascade is the schema's foreign-key policy, not
    /// application code.
    ///
    /// # Returns
    /// * `Ok(())` - Client and dependents removed
    /// * `Err(RepositoryError::NotFound)` - If the id does not exist
    async fn delete_client_cascade(&self, client_id: ClientId) -> RepositoryResult<()>;
}

/// Repository trait for product persistence.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product; the store assigns the id.
    async fn insert_product(&self, product: &NewProduct) -> RepositoryResult<ProductId>;
}
