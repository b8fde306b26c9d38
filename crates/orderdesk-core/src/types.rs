//! # Domain Types
//!
//! Core domain types used throughout Orderdesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Principals (two disjoint tables)      Order aggregate                  │
//! │  ┌─────────────────┐                  ┌─────────────────┐              │
//! │  │  Administrator  │                  │      Order      │              │
//! │  │  id, name,      │                  │  id, client_id  │              │
//! │  │  email, hash    │                  │  order_number   │              │
//! │  └─────────────────┘                  │  status, total  │              │
//! │  ┌─────────────────┐                  └────────┬────────┘              │
//! │  │     Client      │◄─── client_id ───────────┘ 1..N                  │
//! │  │  + address      │                  ┌─────────────────┐              │
//! │  │  + account no.  │                  │    LineItem     │              │
//! │  │  + recovery     │                  │  quantity×price │              │
//! │  └─────────────────┘                  │  = subtotal     │              │
//! │                                       └─────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Client address fields keep the field names existing API consumers send
//! (`cpf_cnpj`, `cep`, `rua`, ...). The Rust names describe what they hold.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Role
// =============================================================================

/// Which principal table an identity came from.
///
/// Carried inside session tokens so a token can be resolved back to the
/// right table without probing both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    /// The tag used on the wire and inside tokens.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Administrator
// =============================================================================

/// A back-office user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Administrator {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Login email, unique among administrators.
    pub email: String,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    pub password_hash: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Registration payload for an administrator (after the validation gate).
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewAdministrator {
    pub name: String,
    pub email: String,
    pub password: String,
}

// =============================================================================
// Client
// =============================================================================

/// A customer account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Client {
    pub id: String,

    /// Display name, unique among clients.
    pub name: String,

    /// Login email, unique among clients.
    pub email: String,

    /// Absent when the client was registered without a password.
    #[serde(skip)]
    pub password_hash: Option<String>,

    /// Tax identifier (CPF/CNPJ). Stored exactly as entered, trimmed.
    #[serde(rename = "cpf_cnpj")]
    pub tax_id: String,

    #[serde(rename = "cep")]
    pub postal_code: String,

    #[serde(rename = "rua")]
    pub street: String,

    #[serde(rename = "number_house")]
    pub house_number: String,

    #[serde(rename = "bairro")]
    pub district: String,

    #[serde(rename = "cidade")]
    pub city: String,

    #[serde(rename = "uf")]
    pub state: String,

    /// Public-facing account code.
    #[serde(rename = "number_client")]
    pub account_number: String,

    /// Single-use password recovery code. Never serialized.
    #[serde(skip)]
    pub recovery_code: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Registration payload for a client (after the validation gate).
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    #[serde(rename = "cpf_cnpj")]
    pub tax_id: String,
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "rua")]
    pub street: String,
    #[serde(rename = "number_house")]
    pub house_number: String,
    #[serde(rename = "bairro")]
    pub district: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "uf")]
    pub state: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Partial update of a client. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct ClientChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, rename = "cpf_cnpj")]
    pub tax_id: Option<String>,
    #[serde(default, rename = "cep")]
    pub postal_code: Option<String>,
    #[serde(default, rename = "rua")]
    pub street: Option<String>,
    #[serde(default, rename = "number_house")]
    pub house_number: Option<String>,
    #[serde(default, rename = "bairro")]
    pub district: Option<String>,
    #[serde(default, rename = "cidade")]
    pub city: Option<String>,
    #[serde(default, rename = "uf")]
    pub state: Option<String>,
}

impl ClientChanges {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.tax_id.is_none()
            && self.postal_code.is_none()
            && self.street.is_none()
            && self.house_number.is_none()
            && self.district.is_none()
            && self.city.is_none()
            && self.state.is_none()
    }
}

/// Password reset through a client's recovery code.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct PasswordRecovery {
    #[serde(rename = "update_number")]
    pub recovery_code: String,
    pub password: String,
}

// =============================================================================
// Order
// =============================================================================

/// An order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,

    /// Owning client. Becomes `None` if the client is deleted.
    pub client_id: Option<String>,

    /// Human-readable order number.
    pub order_number: String,

    pub status: String,

    pub status_description: String,

    /// Caller-supplied total. Not derived from the line items.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total: Decimal,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Line Item
// =============================================================================

/// A persisted line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub order_id: String,
    pub product_name: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub quantity: Decimal,

    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub price: Decimal,

    /// quantity × price, computed when the line was written.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub subtotal: Decimal,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line as submitted by a caller, before it has an id.
#[derive(Debug, Clone, PartialEq, Deserialize, TS)]
#[ts(export)]
pub struct NewLineItem {
    pub product_name: String,

    #[ts(type = "number | string")]
    pub quantity: Decimal,

    #[ts(type = "number | string")]
    pub price: Decimal,
}

impl NewLineItem {
    /// Line subtotal (quantity × unit price).
    ///
    /// Both factors are bounded by [`crate::MAX_AMOUNT`] once they have passed
    /// the validation gate, so the product always fits in a `Decimal`.
    pub fn subtotal(&self) -> Decimal {
        self.quantity * self.price
    }
}

// =============================================================================
// Order Aggregate
// =============================================================================

/// An order together with its line items, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,

    /// Line items in the order they were submitted.
    pub products: Vec<LineItem>,
}

impl OrderWithItems {
    /// Sum of the line subtotals.
    ///
    /// Informational only: `order.total` is caller supplied and is never
    /// overwritten with this value.
    pub fn items_total(&self) -> Decimal {
        self.products.iter().map(|item| item.subtotal).sum()
    }
}

/// Creation payload for an order aggregate (after the validation gate).
#[derive(Debug, Clone, PartialEq, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub client_id: String,
    pub order_number: String,
    pub status: String,
    pub status_description: String,

    #[ts(type = "number | string")]
    pub total: Decimal,

    /// Never empty once validated.
    pub products: Vec<NewLineItem>,
}

impl NewOrder {
    /// Sum of the subtotals of the submitted lines.
    pub fn items_total(&self) -> Decimal {
        self.products.iter().map(NewLineItem::subtotal).sum()
    }
}

/// Partial update of an order aggregate.
///
/// Header fields set to `None` are left untouched. `products`:
/// - `None` → existing line items are kept as they are
/// - `Some(vec)` → existing line items are all replaced by `vec` (may be empty)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, TS)]
#[ts(export)]
pub struct OrderChanges {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_description: Option<String>,

    #[serde(default)]
    #[ts(type = "number | string | null")]
    pub total: Option<Decimal>,

    #[serde(default)]
    pub products: Option<Vec<NewLineItem>>,
}

impl OrderChanges {
    /// True when at least one header column would change.
    pub fn touches_header(&self) -> bool {
        self.client_id.is_some()
            || self.order_number.is_some()
            || self.status.is_some()
            || self.status_description.is_some()
            || self.total.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
