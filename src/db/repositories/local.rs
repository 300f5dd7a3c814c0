//! In-memory repository implementation.
//!
//! Used for unit testing and local development. The store keeps every table
//! in a `BTreeMap` keyed by id, so iteration order matches insertion order of
//! the serial ids - the closest in-memory analogue to storage order.
//!
//! Foreign keys and cascade deletion are modeled explicitly so the backend
//! behaves like the Postgres schema: inserting an order with an unknown
//! client or product fails, and deleting a client removes its orders and
//! their lines transitively.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::RwLock;

use crate::db::repository::{
    ClientRepository, ErrorContext, OrderRepository, ProductRepository, ReportRepository,
    RepositoryError, RepositoryResult,
};
use crate::models::{
    Client, ClientId, NewClient, NewOrder, NewProduct, Order, OrderId, OrderLine, OrderLineId,
    OrderReportRow, Product, ProductId, ProductOrderCount,
};

#[derive(Debug, Clone)]
struct OrderRecord {
    client_id: i32,
    date: NaiveDateTime,
    status: Option<String>,
    total: Option<i32>,
}

#[derive(Debug, Clone)]
struct OrderLineRecord {
    order_id: i32,
    product_id: i32,
    quantity: Option<i32>,
    unit_price: Option<i32>,
    subtotal: Option<i32>,
}

#[derive(Debug, Default)]
struct Store {
    clients: BTreeMap<i32, NewClient>,
    products: BTreeMap<i32, NewProduct>,
    orders: BTreeMap<i32, OrderRecord>,
    order_lines: BTreeMap<i32, OrderLineRecord>,
    next_client_id: i32,
    next_product_id: i32,
    next_order_id: i32,
    next_order_line_id: i32,
}

impl Store {
    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }
}

/// In-memory implementation of the full sales repository.
#[derive(Debug, Default)]
pub struct LocalRepository {
    store: RwLock<Store>,
}

impl LocalRepository {
    /// Create a new, empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders currently stored. Intended for tests.
    pub fn order_count(&self) -> usize {
        self.store.read().orders.len()
    }

    /// Number of order lines currently stored. Intended for tests.
    pub fn order_line_count(&self) -> usize {
        self.store.read().order_lines.len()
    }

    /// Fetch a client by id, if present. Intended for tests.
    pub fn find_client(&self, client_id: ClientId) -> Option<Client> {
        let store = self.store.read();
        store.clients.get(&client_id.value()).map(|c| Client {
            id: client_id,
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
        })
    }

    /// Fetch a product by id, if present. Intended for tests.
    pub fn find_product(&self, product_id: ProductId) -> Option<Product> {
        let store = self.store.read();
        store.products.get(&product_id.value()).map(|p| Product {
            id: product_id,
            name: p.name.clone(),
        })
    }
}

#[async_trait]
impl OrderRepository for LocalRepository {
    async fn insert_order_with_lines(&self, order: &NewOrder) -> RepositoryResult<OrderId> {
        let mut store = self.store.write();

        if !store.clients.contains_key(&order.client_id.value()) {
            return Err(RepositoryError::query_with_context(
                format!("unknown client id {}", order.client_id),
                ErrorContext::new("insert_order_with_lines")
                    .with_entity("order")
                    .with_details("foreign key violation: client_id"),
            ));
        }
        for line in &order.lines {
            if !store.products.contains_key(&line.product_id.value()) {
                return Err(RepositoryError::query_with_context(
                    format!("unknown product id {}", line.product_id),
                    ErrorContext::new("insert_order_with_lines")
                        .with_entity("order_line")
                        .with_details("foreign key violation: product_id"),
                ));
            }
        }

        let order_id = Store::next_id(&mut store.next_order_id);
        store.orders.insert(
            order_id,
            OrderRecord {
                client_id: order.client_id.value(),
                date: order.date,
                status: order.status.clone(),
                total: order.total,
            },
        );

        for line in &order.lines {
            let line_id = Store::next_id(&mut store.next_order_line_id);
            store.order_lines.insert(
                line_id,
                OrderLineRecord {
                    order_id,
                    product_id: line.product_id.value(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal,
                },
            );
        }

        Ok(OrderId::new(order_id))
    }

    async fn get_order(&self, order_id: OrderId) -> RepositoryResult<Order> {
        let store = self.store.read();
        let record = store.orders.get(&order_id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Order {} does not exist", order_id),
                ErrorContext::new("get_order")
                    .with_entity("order")
                    .with_entity_id(order_id),
            )
        })?;

        let lines = store
            .order_lines
            .iter()
            .filter(|(_, line)| line.order_id == order_id.value())
            .map(|(id, line)| OrderLine {
                id: OrderLineId::new(*id),
                order_id,
                product_id: ProductId::new(line.product_id),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            })
            .collect();

        Ok(Order {
            id: order_id,
            client_id: ClientId::new(record.client_id),
            date: record.date,
            status: record.status.clone(),
            total: record.total,
            lines,
        })
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl ClientRepository for LocalRepository {
    async fn insert_client(&self, client: &NewClient) -> RepositoryResult<ClientId> {
        let mut store = self.store.write();
        let id = Store::next_id(&mut store.next_client_id);
        store.clients.insert(id, client.clone());
        Ok(ClientId::new(id))
    }

    async fn delete_client_cascade(&self, client_id: ClientId) -> RepositoryResult<()> {
        let mut store = self.store.write();

        if store.clients.remove(&client_id.value()).is_none() {
            return Err(RepositoryError::not_found_with_context(
                format!("Client {} does not exist", client_id),
                ErrorContext::new("delete_client_cascade")
                    .with_entity("client")
                    .with_entity_id(client_id),
            ));
        }

        let order_ids: Vec<i32> = store
            .orders
            .iter()
            .filter(|(_, order)| order.client_id == client_id.value())
            .map(|(id, _)| *id)
            .collect();

        for order_id in &order_ids {
            store.orders.remove(order_id);
        }
        store
            .order_lines
            .retain(|_, line| !order_ids.contains(&line.order_id));

        Ok(())
    }
}

#[async_trait]
impl ProductRepository for LocalRepository {
    async fn insert_product(&self, product: &NewProduct) -> RepositoryResult<ProductId> {
        let mut store = self.store.write();
        let id = Store::next_id(&mut store.next_product_id);
        store.products.insert(id, product.clone());
        Ok(ProductId::new(id))
    }
}

#[async_trait]
impl ReportRepository for LocalRepository {
    async fn fetch_order_client_product_rows(&self) -> RepositoryResult<Vec<OrderReportRow>> {
        let store = self.store.read();

        let mut rows = Vec::with_capacity(store.order_lines.len());
        for line in store.order_lines.values() {
            let order = store.orders.get(&line.order_id).ok_or_else(|| {
                RepositoryError::internal(format!("dangling order id {}", line.order_id))
            })?;
            let client = store.clients.get(&order.client_id).ok_or_else(|| {
                RepositoryError::internal(format!("dangling client id {}", order.client_id))
            })?;
            let product = store.products.get(&line.product_id).ok_or_else(|| {
                RepositoryError::internal(format!("dangling product id {}", line.product_id))
            })?;

            rows.push(OrderReportRow {
                client_name: client.first_name.clone(),
                order_date: order.date,
                product_name: product.name.clone(),
            });
        }

        Ok(rows)
    }

    async fn fetch_product_line_counts(&self) -> RepositoryResult<Vec<ProductOrderCount>> {
        let store = self.store.read();
        Ok(group_lines_by_product(&store, |_| true))
    }

    async fn fetch_product_line_counts_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<Vec<ProductOrderCount>> {
        let store = self.store.read();
        Ok(group_lines_by_product(&store, |order| {
            order.date >= start && order.date <= end
        }))
    }
}

/// Group order lines by product id, counting lines whose parent order passes
/// the filter. Groups come out in first-seen order; ranking is left to the
/// service layer.
fn group_lines_by_product(
    store: &Store,
    order_filter: impl Fn(&OrderRecord) -> bool,
) -> Vec<ProductOrderCount> {
    let mut first_seen: Vec<i32> = Vec::new();
    let mut counts: HashMap<i32, i64> = HashMap::new();

    for line in store.order_lines.values() {
        let Some(order) = store.orders.get(&line.order_id) else {
            continue;
        };
        if !order_filter(order) {
            continue;
        }
        let entry = counts.entry(line.product_id).or_insert(0);
        if *entry == 0 {
            first_seen.push(line.product_id);
        }
        *entry += 1;
    }

    first_seen
        .into_iter()
        .map(|product_id| ProductOrderCount {
            product_id: ProductId::new(product_id),
            product_name: store
                .products
                .get(&product_id)
                .and_then(|p| p.name.clone()),
            line_count: counts[&product_id],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewOrderLine;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn named_client(name: &str) -> NewClient {
        NewClient {
            first_name: Some(name.to_string()),
            last_name: None,
        }
    }

    fn named_product(name: &str) -> NewProduct {
        NewProduct {
            name: Some(name.to_string()),
        }
    }

    #[tokio::test]
    async fn insert_order_assigns_sequential_ids_and_wires_lines() {
        let repo = LocalRepository::new();
        let client_id = repo.insert_client(&named_client("Ana")).await.unwrap();
        let product_id = repo.insert_product(&named_product("Teclado")).await.unwrap();

        let order = NewOrder {
            client_id,
            date: date(2024, 4, 6),
            status: Some("nuevo".to_string()),
            total: Some(100),
            lines: vec![
                NewOrderLine {
                    product_id,
                    quantity: Some(2),
                    unit_price: Some(50),
                    subtotal: Some(100),
                },
                NewOrderLine {
                    product_id,
                    quantity: Some(1),
                    unit_price: Some(50),
                    subtotal: Some(50),
                },
            ],
        };

        let order_id = repo.insert_order_with_lines(&order).await.unwrap();
        let stored = repo.get_order(order_id).await.unwrap();
        assert_eq!(stored.lines.len(), 2);
        assert!(stored.lines.iter().all(|l| l.order_id == order_id));
    }

    #[tokio::test]
    async fn insert_order_rejects_unknown_client() {
        let repo = LocalRepository::new();
        let order = NewOrder {
            client_id: ClientId::new(99),
            date: date(2024, 4, 6),
            status: None,
            total: None,
            lines: vec![],
        };

        let err = repo.insert_order_with_lines(&order).await.unwrap_err();
        assert!(matches!(err, RepositoryError::QueryError { .. }));
    }

    #[tokio::test]
    async fn delete_client_cascade_removes_orders_and_lines() {
        let repo = LocalRepository::new();
        let client_id = repo.insert_client(&named_client("Luis")).await.unwrap();
        let other_client = repo.insert_client(&named_client("Eva")).await.unwrap();
        let product_id = repo.insert_product(&named_product("Mouse")).await.unwrap();

        let line = NewOrderLine {
            product_id,
            quantity: Some(1),
            unit_price: Some(10),
            subtotal: Some(10),
        };
        repo.insert_order_with_lines(&NewOrder {
            client_id,
            date: date(2024, 1, 1),
            status: None,
            total: None,
            lines: vec![line.clone(), line.clone()],
        })
        .await
        .unwrap();
        let kept_order = repo
            .insert_order_with_lines(&NewOrder {
                client_id: other_client,
                date: date(2024, 1, 2),
                status: None,
                total: None,
                lines: vec![line],
            })
            .await
            .unwrap();

        repo.delete_client_cascade(client_id).await.unwrap();

        assert!(repo.find_client(client_id).is_none());
        assert_eq!(repo.order_count(), 1);
        assert_eq!(repo.order_line_count(), 1);
        assert!(repo.get_order(kept_order).await.is_ok());
    }

    #[tokio::test]
    async fn delete_missing_client_is_not_found() {
        let repo = LocalRepository::new();
        let err = repo
            .delete_client_cascade(ClientId::new(404))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
