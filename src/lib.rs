//! Shop API - e-commerce backend for a grocery storefront.
//!
//! Customers sign up, manage delivery addresses, fill a cart and check
//! it out. Administrators maintain the catalog, move placed orders
//! through their lifecycle and read sales analytics.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Entities, the order state machine and cart arithmetic
//! - **services**: Use cases behind trait objects
//! - **infra**: PostgreSQL (SeaORM), Redis and the unit of work
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared types (pagination, responses)
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve --port 8080
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Grant admin rights
//! cargo run -- users promote owner@example.com
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

pub use api::AppState;
pub use config::Config;
pub use domain::{Password, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::{Cache, Database};
