//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database
//! holding the sales schema (clients, orders, order_lines, products).
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//! - Pool health statistics
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    ClientRepository, ErrorContext, OrderRepository, ProductRepository, ReportRepository,
    RepositoryError, RepositoryResult,
};
use crate::models::{
    ClientId, NewClient, NewOrder, NewProduct, Order, OrderId, OrderLine, OrderLineId,
    OrderReportRow, ProductId, ProductOrderCount,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// See the module documentation for the variable list.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Automatic schema migrations on startup
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Diesel is synchronous, so the operation runs on the blocking thread
    /// pool. Retryable errors (connection acquisition, serialization
    /// failures) are retried up to `max_retries` times with exponential
    /// backoff.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn line_row_to_line(row: OrderLineRow) -> OrderLine {
    OrderLine {
        id: OrderLineId::new(row.order_line_id),
        order_id: OrderId::new(row.order_id),
        product_id: ProductId::new(row.product_id),
        quantity: row.quantity,
        unit_price: row.unit_price,
        subtotal: row.subtotal,
    }
}

#[async_trait]
impl OrderRepository for PostgresRepository {
    async fn insert_order_with_lines(&self, order: &NewOrder) -> RepositoryResult<OrderId> {
        let order = order.clone();
        self.with_conn(move |conn| {
            conn.transaction::<OrderId, diesel::result::Error, _>(|conn| {
                let order_id: i32 = diesel::insert_into(orders::table)
                    .values(NewOrderRow {
                        client_id: order.client_id.value(),
                        order_date: order.date,
                        status: order.status.clone(),
                        total: order.total,
                    })
                    .returning(orders::order_id)
                    .get_result(conn)?;

                let line_rows: Vec<NewOrderLineRow> = order
                    .lines
                    .iter()
                    .map(|line| NewOrderLineRow {
                        order_id,
                        product_id: line.product_id.value(),
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        subtotal: line.subtotal,
                    })
                    .collect();

                if !line_rows.is_empty() {
                    diesel::insert_into(order_lines::table)
                        .values(&line_rows)
                        .execute(conn)?;
                }

                Ok(OrderId::new(order_id))
            })
            .map_err(|e| {
                map_diesel_error(e).with_operation("insert_order_with_lines")
            })
        })
        .await
    }

    async fn get_order(&self, order_id: OrderId) -> RepositoryResult<Order> {
        self.with_conn(move |conn| {
            let order_row = orders::table
                .filter(orders::order_id.eq(order_id.value()))
                .select(OrderRow::as_select())
                .first::<OrderRow>(conn)
                .map_err(map_diesel_error)?;

            let line_rows = order_lines::table
                .filter(order_lines::order_id.eq(order_id.value()))
                .select(OrderLineRow::as_select())
                .order(order_lines::order_line_id.asc())
                .load::<OrderLineRow>(conn)
                .map_err(map_diesel_error)?;

            Ok(Order {
                id: OrderId::new(order_row.order_id),
                client_id: ClientId::new(order_row.client_id),
                date: order_row.order_date,
                status: order_row.status,
                total: order_row.total,
                lines: line_rows.into_iter().map(line_row_to_line).collect(),
            })
        })
        .await
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1").execute(conn).map_err(map_diesel_error)?;
            Ok(true)
        })
        .await
    }
}

#[async_trait]
impl ClientRepository for PostgresRepository {
    async fn insert_client(&self, client: &NewClient) -> RepositoryResult<ClientId> {
        let client = client.clone();
        self.with_conn(move |conn| {
            let id: i32 = diesel::insert_into(clients::table)
                .values(NewClientRow {
                    first_name: client.first_name.clone(),
                    last_name: client.last_name.clone(),
                })
                .returning(clients::client_id)
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(ClientId::new(id))
        })
        .await
    }

    async fn delete_client_cascade(&self, client_id: ClientId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            // ON DELETE CASCADE removes dependent orders and order lines.
            let deleted =
                diesel::delete(clients::table.filter(clients::client_id.eq(client_id.value())))
                    .execute(conn)
                    .map_err(map_diesel_error)?;

            if deleted == 0 {
                return Err(RepositoryError::not_found_with_context(
                    format!("Client {} does not exist", client_id),
                    ErrorContext::new("delete_client_cascade")
                        .with_entity("client")
                        .with_entity_id(client_id),
                ));
            }

            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ProductRepository for PostgresRepository {
    async fn insert_product(&self, product: &NewProduct) -> RepositoryResult<ProductId> {
        let product = product.clone();
        self.with_conn(move |conn| {
            let id: i32 = diesel::insert_into(products::table)
                .values(NewProductRow {
                    name: product.name.clone(),
                })
                .returning(products::product_id)
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(ProductId::new(id))
        })
        .await
    }
}

#[async_trait]
impl ReportRepository for PostgresRepository {
    async fn fetch_order_client_product_rows(&self) -> RepositoryResult<Vec<OrderReportRow>> {
        self.with_conn(|conn| {
            // Storage order on purpose: the report is documented as unsorted.
            let rows: Vec<(Option<String>, NaiveDateTime, Option<String>)> = order_lines::table
                .inner_join(orders::table.inner_join(clients::table))
                .inner_join(products::table)
                .select((clients::first_name, orders::order_date, products::name))
                .load(conn)
                .map_err(map_diesel_error)?;

            Ok(rows
                .into_iter()
                .map(|(client_name, order_date, product_name)| OrderReportRow {
                    client_name,
                    order_date,
                    product_name,
                })
                .collect())
        })
        .await
    }

    async fn fetch_product_line_counts(&self) -> RepositoryResult<Vec<ProductOrderCount>> {
        self.with_conn(|conn| {
            let rows: Vec<(i32, Option<String>, i64)> = order_lines::table
                .inner_join(products::table)
                .group_by((order_lines::product_id, products::name))
                .select((order_lines::product_id, products::name, count_star()))
                .load(conn)
                .map_err(map_diesel_error)?;

            Ok(rows.into_iter().map(count_row_to_product_count).collect())
        })
        .await
    }

    async fn fetch_product_line_counts_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<Vec<ProductOrderCount>> {
        self.with_conn(move |conn| {
            let rows: Vec<(i32, Option<String>, i64)> = order_lines::table
                .inner_join(orders::table)
                .inner_join(products::table)
                .filter(orders::order_date.ge(start))
                .filter(orders::order_date.le(end))
                .group_by((order_lines::product_id, products::name))
                .select((order_lines::product_id, products::name, count_star()))
                .load(conn)
                .map_err(map_diesel_error)?;

            Ok(rows.into_iter().map(count_row_to_product_count).collect())
        })
        .await
    }
}

fn count_row_to_product_count(row: (i32, Option<String>, i64)) -> ProductOrderCount {
    let (product_id, product_name, line_count) = row;
    ProductOrderCount {
        product_id: ProductId::new(product_id),
        product_name,
        line_count,
    }
}
