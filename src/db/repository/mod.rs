//! Abstract repository interface for the sales store.
//!
//! The interface is split per concern (orders, clients, products, reports) so
//! that callers can depend on exactly what they use. [`SalesRepository`] is
//! the umbrella trait implemented by every complete backend.

mod error;
mod reports;
mod sales;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use reports::ReportRepository;
pub use sales::{ClientRepository, OrderRepository, ProductRepository};

/// Umbrella trait for a complete sales repository backend.
pub trait SalesRepository:
    OrderRepository + ClientRepository + ProductRepository + ReportRepository
{
}

impl<T> SalesRepository for T where
    T: OrderRepository + ClientRepository + ProductRepository + ReportRepository
{
}
