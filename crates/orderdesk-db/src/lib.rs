//! # orderdesk-db: Database Layer for Orderdesk
//!
//! SQLite storage for principals and the order aggregate, using sqlx for
//! async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orderdesk Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /createOrderProducts)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   orderdesk-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ Administrator      │  │ (embedded) │  │   │
//! │  │   │  SqlitePool   │    │ Client             │  │ 0001_*.sql │  │   │
//! │  │   │               │    │ Order (+ items)    │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   password.rs: argon2 hashing on the blocking pool              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (DATABASE_PATH)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`password`] - Password hashing and verification
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orderdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./orderdesk.db")).await?;
//! let orders = db.orders().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::administrator::AdministratorRepository;
pub use repository::client::ClientRepository;
pub use repository::order::OrderRepository;
