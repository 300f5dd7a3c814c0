//! Domain model for the sales system.
//!
//! These types are shared by the repository layer, the service layer and the
//! HTTP DTOs. Entities mirror the relational schema: a client places orders,
//! an order owns order lines, each line references a product.
//!
//! Identifier newtypes wrap the raw database ids so that a client id cannot
//! be passed where an order id is expected.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            pub fn new(id: i32) -> Self {
                Self(id)
            }

            pub fn value(&self) -> i32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Database identifier of a client.
    ClientId
);
id_type!(
    /// Database identifier of an order.
    OrderId
);
id_type!(
    /// Database identifier of an order line.
    OrderLineId
);
id_type!(
    /// Database identifier of a product.
    ProductId
);

/// A client as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    /// Nullable in the legacy schema.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Payload for inserting a new client; the store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A product as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Nullable in the legacy schema.
    pub name: Option<String>,
}

/// Payload for inserting a new product; the store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: Option<String>,
}

/// An order line as stored in the database.
///
/// Quantity, unit price and subtotal are nullable integers in the legacy
/// schema; no arithmetic is performed on them here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Option<i32>,
    pub unit_price: Option<i32>,
    pub subtotal: Option<i32>,
}

/// An order line inside a [`NewOrder`] payload.
///
/// The parent order id is not present: it is assigned by the store when the
/// order is inserted and wired into every line inside the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: Option<i32>,
    pub unit_price: Option<i32>,
    pub subtotal: Option<i32>,
}

/// An order with its lines, as read back from the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: ClientId,
    pub date: NaiveDateTime,
    pub status: Option<String>,
    /// Nullable; the legacy schema does not require a total.
    pub total: Option<i32>,
    pub lines: Vec<OrderLine>,
}

/// Parent-with-children payload for inserting an order and its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub client_id: ClientId,
    pub date: NaiveDateTime,
    pub status: Option<String>,
    pub total: Option<i32>,
    pub lines: Vec<NewOrderLine>,
}

/// One row of the client/order/product join report.
///
/// Projects (client name, order date, product name) for a single order line
/// by following line -> order -> client and line -> product. Row order is
/// whatever the underlying storage yields; callers must not rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReportRow {
    pub client_name: Option<String>,
    pub order_date: NaiveDateTime,
    pub product_name: Option<String>,
}

/// Aggregated order-line count for one product.
///
/// The metric counts order lines, not summed quantities; this matches the
/// legacy reports and is preserved on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOrderCount {
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub line_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_types_are_distinct_and_display_raw_value() {
        let client = ClientId::new(7);
        assert_eq!(client.value(), 7);
        assert_eq!(client.to_string(), "7");

        let order = OrderId::new(7);
        assert_eq!(order.value(), client.value());
    }

    #[test]
    fn id_serde_is_transparent() {
        let id = ProductId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }
}
