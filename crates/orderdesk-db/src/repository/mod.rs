//! # Repository Module
//!
//! Database repository implementations for Orderdesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.orders().create(new_order)                                 │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── create(&self, order)      one transaction: header + items         │
//! │  ├── update(&self, id, delta)  one transaction: header + replace-all   │
//! │  ├── list / get / delete                                               │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, mapped through *Record structs)         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`AdministratorRepository`](administrator::AdministratorRepository) - back-office principals
//! - [`ClientRepository`](client::ClientRepository) - customer principals, recovery codes
//! - [`OrderRepository`](order::OrderRepository) - order aggregate lifecycle

use std::str::FromStr;

use rand::Rng;
use rust_decimal::Decimal;

use crate::error::{DbError, DbResult};

pub mod administrator;
pub mod client;
pub mod order;

/// Decodes a decimal column stored as text.
pub(crate) fn decode_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw).map_err(|_| DbError::DataCorruption {
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Encodes a decimal for storage in its canonical text form.
pub(crate) fn encode_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Random six-digit numeric code (100000..=999999).
pub(crate) fn six_digit_code() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}
