//! # Ventas Backend
//!
//! REST backend for a small sales system: clients place orders, orders carry
//! one or more order lines, each line references a product. The crate exposes
//! the legacy sales endpoints (order insertion, cascading client deletion and
//! three reporting queries) over a pluggable repository layer.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Domain entities (clients, orders, order lines, products) and
//!   report projections shared by every layer
//! - [`db`]: Repository pattern, persistence backends and the service layer
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! Storage backends are selected by feature flag: `local-repo` provides an
//! in-memory repository for tests and local development, `postgres-repo`
//! provides the production PostgreSQL backend with Diesel.

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;

#[cfg(feature = "http-server")]
pub mod http;
