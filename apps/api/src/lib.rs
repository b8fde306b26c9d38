//! # Orderdesk API
//!
//! HTTP surface for customer accounts, sessions and sales orders.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Request Flow                                   │
//! │                                                                         │
//! │  HTTP ──► routes ──► validation gate ──► repositories ──► SQLite       │
//! │             │          (orderdesk-core)    (orderdesk-db)              │
//! │             │                                                           │
//! │             └──► Authenticator ──► TokenService (JWT HS256)             │
//! │                                                                         │
//! │  Failures of every layer end up as ApiError ──► { error, details? }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (a `.env` file is honoured):
//! - `BIND_ADDR` - listen address (default: 0.0.0.0:3001)
//! - `DATABASE_PATH` - SQLite file (default: ./orderdesk.db)
//! - `DATABASE_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - token signing secret
//! - `JWT_LIFETIME_SECS` - token lifetime (default: 5 days)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
