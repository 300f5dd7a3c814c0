use chrono::NaiveDateTime;
use diesel::prelude::*;

use super::schema::{clients, order_lines, orders, products};

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = clients)]
pub struct NewClientRow {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub order_id: i32,
    pub client_id: i32,
    pub order_date: NaiveDateTime,
    pub status: Option<String>,
    pub total: Option<i32>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub client_id: i32,
    pub order_date: NaiveDateTime,
    pub status: Option<String>,
    pub total: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub order_line_id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: Option<i32>,
    pub unit_price: Option<i32>,
    pub subtotal: Option<i32>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_lines)]
pub struct NewOrderLineRow {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: Option<i32>,
    pub unit_price: Option<i32>,
    pub subtotal: Option<i32>,
}
