//! # Validation Gate
//!
//! Declarative input validation and sanitization for every mutating request.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary                                                │
//! │  └── Body must be JSON                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Shape rules (required / type / format / positivity)               │
//! │  ├── Sanitization (trim, HTML escaping of free text)                   │
//! │  └── ALL violations collected, never fail-fast                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shapes and Modes
//! A [`Shape`] is a static list of [`FieldSpec`]s. The same shape is checked
//! in two [`Mode`]s:
//!
//! - [`Mode::Create`]: required fields must be present and non-empty.
//! - [`Mode::Update`]: every field is optional, but a present field must
//!   satisfy the same rule. Empty strings count as absent and are dropped.
//!
//! ## Usage
//! ```rust
//! use orderdesk_core::validation::{validate, Mode, ORDER};
//! use serde_json::json;
//!
//! let payload = json!({ "status": "closed", "total": -1 });
//! let errors = validate(&ORDER, Mode::Update, &payload).unwrap_err();
//! assert!(errors.has_field("total"));
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationErrors};
use crate::{MAX_AMOUNT, MAX_TEXT_LEN, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationErrors>;

// =============================================================================
// Rule Definitions
// =============================================================================

/// What a field holds, which decides both its checks and its sanitization.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// Free text. Trimmed and HTML-escaped.
    Text,
    /// Structured identifier (tax id, postal code, recovery code).
    /// Trimmed but never escaped: its punctuation is significant.
    Identifier,
    /// Email address. Trimmed and format-checked, never escaped.
    Email,
    /// A password. Passed through untouched.
    Secret,
    /// UUID reference.
    Uuid,
    /// Number strictly greater than zero (JSON number or numeric string).
    /// Sanitized to canonical decimal text so no digits are lost.
    PositiveNumber,
    /// Array of objects, each validated against the inner shape.
    List(&'static Shape),
}

/// Rule for one field of a shape.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: Kind,
    /// Must be present in [`Mode::Create`].
    pub required: bool,
    /// Minimum length in characters (strings) or elements (lists, create only).
    pub min_len: usize,
    /// Maximum length in characters. Ignored for lists and numbers.
    pub max_len: usize,
}

impl FieldSpec {
    /// A field that must be present on creation.
    pub const fn required(name: &'static str, kind: Kind) -> Self {
        FieldSpec {
            name,
            kind,
            required: true,
            min_len: 0,
            max_len: MAX_TEXT_LEN,
        }
    }

    /// A field that may always be omitted.
    pub const fn optional(name: &'static str, kind: Kind) -> Self {
        FieldSpec {
            name,
            kind,
            required: false,
            min_len: 0,
            max_len: MAX_TEXT_LEN,
        }
    }

    /// Sets the minimum length.
    pub const fn min_len(mut self, min: usize) -> Self {
        self.min_len = min;
        self
    }
}

/// A named, declarative set of field rules.
#[derive(Debug)]
pub struct Shape {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Which variant of a shape to enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// All required fields must be present.
    Create,
    /// Every field optional; present fields still checked.
    Update,
}

// =============================================================================
// Shapes
// =============================================================================

/// Login request.
pub static SESSION: Shape = Shape {
    name: "session",
    fields: &[
        FieldSpec::required("email", Kind::Email),
        FieldSpec::required("password", Kind::Secret),
    ],
};

/// Administrator registration.
pub static ADMINISTRATOR: Shape = Shape {
    name: "administrator",
    fields: &[
        FieldSpec::required("name", Kind::Text),
        FieldSpec::required("email", Kind::Email),
        FieldSpec::required("password", Kind::Secret).min_len(MIN_PASSWORD_LEN),
    ],
};

/// Client registration and partial update.
pub static CLIENT: Shape = Shape {
    name: "client",
    fields: &[
        FieldSpec::required("name", Kind::Text),
        FieldSpec::required("email", Kind::Email),
        FieldSpec::required("cpf_cnpj", Kind::Identifier),
        FieldSpec::required("cep", Kind::Identifier),
        FieldSpec::required("rua", Kind::Text),
        FieldSpec::required("number_house", Kind::Text),
        FieldSpec::required("bairro", Kind::Text),
        FieldSpec::required("cidade", Kind::Text),
        FieldSpec::required("uf", Kind::Text),
        FieldSpec::optional("password", Kind::Secret).min_len(MIN_PASSWORD_LEN),
    ],
};

/// Password reset with a recovery code.
pub static PASSWORD_RECOVERY: Shape = Shape {
    name: "password_recovery",
    fields: &[
        FieldSpec::required("update_number", Kind::Identifier),
        FieldSpec::required("password", Kind::Secret).min_len(MIN_PASSWORD_LEN),
    ],
};

/// One line of an order.
pub static LINE_ITEM: Shape = Shape {
    name: "line_item",
    fields: &[
        FieldSpec::required("product_name", Kind::Text),
        FieldSpec::required("quantity", Kind::PositiveNumber),
        FieldSpec::required("price", Kind::PositiveNumber),
    ],
};

/// Order header plus its lines.
pub static ORDER: Shape = Shape {
    name: "order",
    fields: &[
        FieldSpec::required("client_id", Kind::Uuid),
        FieldSpec::required("order_number", Kind::Text),
        FieldSpec::required("status_description", Kind::Text),
        FieldSpec::required("status", Kind::Text),
        FieldSpec::required("total", Kind::PositiveNumber),
        FieldSpec::required("products", Kind::List(&LINE_ITEM)).min_len(1),
    ],
};

// =============================================================================
// Gate
// =============================================================================

/// Validates and sanitizes `payload` against `shape`.
///
/// ## Returns
/// * `Ok(map)` - sanitized payload containing only the fields of `shape`
///   that were present (and non-empty)
/// * `Err(errors)` - every violation found, with dotted field paths
///
/// Touches no storage.
pub fn validate(shape: &Shape, mode: Mode, payload: &Value) -> ValidationResult<Map<String, Value>> {
    let mut errors = ValidationErrors::new();
    let sanitized = validate_object(shape, mode, payload, "", &mut errors);
    errors.into_result(sanitized)
}

fn validate_object(
    shape: &Shape,
    mode: Mode,
    value: &Value,
    prefix: &str,
    errors: &mut ValidationErrors,
) -> Map<String, Value> {
    let mut sanitized = Map::new();

    let Some(object) = value.as_object() else {
        errors.push(ValidationError::InvalidType {
            field: if prefix.is_empty() { "body".to_string() } else { prefix.to_string() },
            expected: "object",
        });
        return sanitized;
    };

    for spec in shape.fields {
        let path = if prefix.is_empty() {
            spec.name.to_string()
        } else {
            format!("{}.{}", prefix, spec.name)
        };

        let present = match object.get(spec.name) {
            None | Some(Value::Null) => None,
            Some(raw) => check_field(spec, mode, raw, &path, errors),
        };

        match present {
            Some(clean) => {
                sanitized.insert(spec.name.to_string(), clean);
            }
            None if mode == Mode::Create && spec.required && !errors.has_field(&path) => {
                errors.push(ValidationError::Required { field: path });
            }
            None => {}
        }
    }

    sanitized
}

/// Checks one present field.
///
/// Returns `None` when the field must be treated as absent (empty after
/// sanitization) or when it failed a check; failures are recorded in `errors`.
fn check_field(
    spec: &FieldSpec,
    mode: Mode,
    raw: &Value,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<Value> {
    match spec.kind {
        Kind::PositiveNumber => check_positive_number(raw, path, errors),
        Kind::List(inner) => check_list(spec, inner, mode, raw, path, errors),
        kind => {
            let Some(text) = raw.as_str() else {
                errors.push(ValidationError::InvalidType {
                    field: path.to_string(),
                    expected: "string",
                });
                return None;
            };
            check_string(spec, kind, text, path, errors).map(Value::String)
        }
    }
}

fn check_string(
    spec: &FieldSpec,
    kind: Kind,
    text: &str,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let trimmed = match kind {
        Kind::Secret => text,
        _ => text.trim(),
    };

    if trimmed.is_empty() {
        return None;
    }

    let len = trimmed.chars().count();
    if len < spec.min_len {
        errors.push(ValidationError::TooShort {
            field: path.to_string(),
            min: spec.min_len,
        });
        return None;
    }
    if len > spec.max_len {
        errors.push(ValidationError::TooLong {
            field: path.to_string(),
            max: spec.max_len,
        });
        return None;
    }

    match kind {
        Kind::Text => Some(escape_html(trimmed)),
        Kind::Email => {
            if let Err(reason) = check_email(trimmed) {
                errors.push(ValidationError::InvalidFormat {
                    field: path.to_string(),
                    reason: reason.to_string(),
                });
                return None;
            }
            Some(trimmed.to_string())
        }
        Kind::Uuid => {
            if uuid::Uuid::parse_str(trimmed).is_err() {
                errors.push(ValidationError::InvalidFormat {
                    field: path.to_string(),
                    reason: "must be a valid UUID".to_string(),
                });
                return None;
            }
            Some(trimmed.to_string())
        }
        _ => Some(trimmed.to_string()),
    }
}

fn check_positive_number(raw: &Value, path: &str, errors: &mut ValidationErrors) -> Option<Value> {
    let parsed = match raw {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) if !s.trim().is_empty() => parse_decimal(s.trim()),
        Value::String(_) => return None,
        _ => None,
    };

    let Some(amount) = parsed else {
        errors.push(ValidationError::InvalidType {
            field: path.to_string(),
            expected: "number",
        });
        return None;
    };

    if amount <= Decimal::ZERO {
        errors.push(ValidationError::MustBePositive {
            field: path.to_string(),
        });
        return None;
    }

    if amount > Decimal::from(MAX_AMOUNT) {
        errors.push(ValidationError::TooLarge {
            field: path.to_string(),
            max: MAX_AMOUNT,
        });
        return None;
    }

    // Canonical decimal text: a JSON number would round-trip through f64.
    Some(Value::String(amount.normalize().to_string()))
}

fn check_list(
    spec: &FieldSpec,
    inner: &Shape,
    mode: Mode,
    raw: &Value,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<Value> {
    let Some(elements) = raw.as_array() else {
        errors.push(ValidationError::InvalidType {
            field: path.to_string(),
            expected: "list",
        });
        return None;
    };

    if mode == Mode::Create && elements.len() < spec.min_len {
        errors.push(ValidationError::TooFewItems {
            field: path.to_string(),
            min: spec.min_len,
        });
        return None;
    }

    // Elements of a batch are always complete records, even on update.
    let sanitized: Vec<Value> = elements
        .iter()
        .enumerate()
        .map(|(i, element)| {
            let element_path = format!("{}[{}]", path, i);
            Value::Object(validate_object(inner, Mode::Create, element, &element_path, errors))
        })
        .collect();

    Some(Value::Array(sanitized))
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

// =============================================================================
// Sanitization Helpers
// =============================================================================

/// HTML-escapes `& < > " ' / \` and the backtick.
///
/// ## Example
/// ```rust
/// use orderdesk_core::validation::escape_html;
///
/// assert_eq!(escape_html("<b>Tom & Jerry</b>"), "&lt;b&gt;Tom &amp; Jerry&lt;&#x2F;b&gt;");
/// ```
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Normalizes an email for storage: trimmed and lowercased.
///
/// Applied on the registration/update path only. Login lookups use the
/// address as typed (trimmed), so a mixed-case login does not match.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Structural email check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
fn check_email(email: &str) -> Result<(), &'static str> {
    if email.chars().any(char::is_whitespace) {
        return Err("must not contain whitespace");
    }

    let (local, domain) = email.split_once('@').ok_or("must contain an @ symbol")?;

    if local.is_empty() {
        return Err("local part cannot be empty");
    }
    if domain.contains('@') {
        return Err("must contain a single @ symbol");
    }
    if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
        return Err("domain must be a dotted host name");
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
