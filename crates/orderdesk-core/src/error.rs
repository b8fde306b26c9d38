//! # Error Types
//!
//! Domain-specific error types for orderdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  orderdesk-core errors (this file)                                     │
//! │  ├── ValidationError   - One violated field                            │
//! │  └── ValidationErrors  - Every violation found in one payload          │
//! │                                                                         │
//! │  orderdesk-db errors (separate crate)                                  │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  API errors (in app)                                                   │
//! │  └── ApiError          - What HTTP clients see (status + envelope)     │
//! │                                                                         │
//! │  Flow: ValidationErrors → ApiError (400) → JSON { error, details }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every variant names the field it is about
//! 3. Validation never stops at the first failure; see [`ValidationErrors`]

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// A single input validation failure.
///
/// `field` is the dotted path of the offending value, e.g. `total` or
/// `products[2].quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// List has fewer elements than allowed.
    #[error("{field} must contain at least {min} item(s)")]
    TooFewItems { field: String, min: usize },

    /// Value must be strictly greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Number exceeds the accepted range.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: i64 },

    /// Value has the wrong JSON type.
    #[error("{field} must be a {expected}")]
    InvalidType { field: String, expected: &'static str },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value does not reference an existing record.
    #[error("{field} does not reference an existing {entity}")]
    UnknownReference { field: String, entity: &'static str },
}

impl ValidationError {
    /// Returns the path of the field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::TooFewItems { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::InvalidType { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::UnknownReference { field, .. } => field,
        }
    }
}

// =============================================================================
// Validation Errors (collection)
// =============================================================================

/// Serializable view of one violation, as sent to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl From<&ValidationError> for FieldViolation {
    fn from(err: &ValidationError) -> Self {
        FieldViolation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// Every violation found while validating one payload.
///
/// Never empty when returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        ValidationErrors(Vec::new())
    }

    /// Records another violation.
    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the recorded violations.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Returns true if any violation concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }

    /// Converts the collection into client-facing violations.
    pub fn violations(&self) -> Vec<FieldViolation> {
        self.0.iter().map(FieldViolation::from).collect()
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors(vec![err])
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
