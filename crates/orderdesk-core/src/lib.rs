//! # orderdesk-core: Pure Domain Logic for Orderdesk
//!
//! Domain types and the validation gate for the Orderdesk order-management
//! backend. Nothing in this crate touches a database, a socket or a file.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orderdesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api)                          │   │
//! │  │    /session ──► /createClient ──► /createOrderProducts ...     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ orderdesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐        │   │
//! │  │   │    types    │    │ validation  │    │    error    │        │   │
//! │  │   │ Order, Item │    │ Shape, Mode │    │ Validation  │        │   │
//! │  │   │ Client, ... │    │  validate() │    │   Errors    │        │   │
//! │  │   └─────────────┘    └─────────────┘    └─────────────┘        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  orderdesk-db (Database Layer)                  │   │
//! │  │           SQLite queries, migrations, transactions              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, LineItem, Client, Administrator, ...)
//! - [`validation`] - Declarative shapes, sanitization, the `validate` gate
//! - [`error`] - Field-level validation errors
//!
//! ## Example Usage
//!
//! ```rust
//! use orderdesk_core::NewLineItem;
//! use rust_decimal::Decimal;
//!
//! let item = NewLineItem {
//!     product_name: "Widget".to_string(),
//!     quantity: Decimal::from(3),
//!     price: Decimal::from(50),
//! };
//! assert_eq!(item.subtotal(), Decimal::from(150));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{FieldViolation, ValidationError, ValidationErrors};
pub use types::*;
pub use validation::{validate, Mode, Shape};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Upper bound accepted for any quantity, price or total.
///
/// Keeps `quantity * price` comfortably inside `Decimal` range.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Minimum password length for administrators and clients.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum length of any text field, in characters.
pub const MAX_TEXT_LEN: usize = 255;
