//! Data Transfer Objects for the HTTP API.
//!
//! The wire contract keeps the legacy Spanish field names (camelCased, as the
//! original service serialized them); domain types stay English. Conversions
//! between the two live here.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{
    ClientId, NewOrder, NewOrderLine, OrderReportRow, ProductId, ProductOrderCount,
};

/// Request body for the order + lines insert endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertOrderRequest {
    /// Order date
    #[serde(rename = "fecha")]
    pub date: NaiveDateTime,
    /// Order status, free-form
    #[serde(rename = "estado", default)]
    pub status: Option<String>,
    /// Order total; the legacy schema does not require it
    #[serde(rename = "total", default)]
    pub total: Option<i32>,
    /// Id of the client placing the order
    #[serde(rename = "idCliente")]
    pub client_id: i32,
    /// Nested order lines
    #[serde(rename = "detalles", default)]
    pub lines: Vec<InsertOrderLineRequest>,
}

/// One nested line of an [`InsertOrderRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertOrderLineRequest {
    #[serde(rename = "idProducto")]
    pub product_id: i32,
    #[serde(rename = "cantidad", default)]
    pub quantity: Option<i32>,
    #[serde(rename = "precio", default)]
    pub unit_price: Option<i32>,
    #[serde(rename = "subTotal", default)]
    pub subtotal: Option<i32>,
}

impl From<InsertOrderRequest> for NewOrder {
    fn from(request: InsertOrderRequest) -> Self {
        NewOrder {
            client_id: ClientId::new(request.client_id),
            date: request.date,
            status: request.status,
            total: request.total,
            lines: request
                .lines
                .into_iter()
                .map(|line| NewOrderLine {
                    product_id: ProductId::new(line.product_id),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal,
                })
                .collect(),
        }
    }
}

/// One row of the client/order/product join report.
///
/// `nombrePedido` actually carries the product name; the legacy report named
/// the field after the order and consumers depend on it, so it stays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReportRowDto {
    #[serde(rename = "nombreCliente")]
    pub client_name: Option<String>,
    #[serde(rename = "fechaPedido")]
    pub order_date: NaiveDateTime,
    #[serde(rename = "nombrePedido")]
    pub product_name: Option<String>,
}

impl From<OrderReportRow> for OrderReportRowDto {
    fn from(row: OrderReportRow) -> Self {
        Self {
            client_name: row.client_name,
            order_date: row.order_date,
            product_name: row.product_name,
        }
    }
}

/// Product ranking entry: product name plus its order-line count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCountDto {
    #[serde(rename = "nombreProducto")]
    pub product_name: Option<String>,
    #[serde(rename = "cantidad")]
    pub count: i64,
}

impl From<ProductOrderCount> for ProductCountDto {
    fn from(count: ProductOrderCount) -> Self {
        Self {
            product_name: count.product_name,
            count: count.line_count,
        }
    }
}

/// Query parameters for the date-range product ranking.
///
/// Both parameters are required; values are parsed by
/// [`parse_date_param`] so that plain dates and full timestamps both work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeQuery {
    #[serde(rename = "fechaInicio")]
    pub start: String,
    #[serde(rename = "fechaFin")]
    pub end: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Parse a date parameter, accepting an ISO datetime or a plain date.
///
/// A plain date means midnight of that day, matching how the legacy service
/// bound its date query parameters.
pub fn parse_date_param(raw: &str) -> Result<NaiveDateTime, String> {
    if let Ok(datetime) = raw.parse::<NaiveDateTime>() {
        return Ok(datetime);
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(format!(
        "invalid date '{}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS",
        raw
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_param_accepts_date_and_datetime() {
        let midnight = parse_date_param("2024-01-10").unwrap();
        assert_eq!(midnight.to_string(), "2024-01-10 00:00:00");

        let precise = parse_date_param("2024-01-10T13:45:00").unwrap();
        assert_eq!(precise.to_string(), "2024-01-10 13:45:00");

        assert!(parse_date_param("10/01/2024").is_err());
        assert!(parse_date_param("").is_err());
    }

    #[test]
    fn insert_request_uses_legacy_wire_names() {
        let body = r#"{
            "fecha": "2024-04-06T10:00:00",
            "estado": "nuevo",
            "total": 120,
            "idCliente": 1,
            "detalles": [
                {"idProducto": 2, "cantidad": 3, "precio": 40, "subTotal": 120}
            ]
        }"#;

        let request: InsertOrderRequest = serde_json::from_str(body).unwrap();
        let order = NewOrder::from(request);
        assert_eq!(order.client_id, ClientId::new(1));
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].product_id, ProductId::new(2));
        assert_eq!(order.lines[0].subtotal, Some(120));
    }

    #[test]
    fn report_row_serializes_legacy_field_names() {
        let dto = OrderReportRowDto {
            client_name: Some("Ana".to_string()),
            order_date: parse_date_param("2024-02-01").unwrap(),
            product_name: Some("Teclado".to_string()),
        };

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["nombreCliente"], "Ana");
        assert_eq!(json["nombrePedido"], "Teclado");
        assert!(json.get("fechaPedido").is_some());
    }
}
