//! Session token module.
//!
//! Issues and verifies signed, time-limited tokens binding a principal id to
//! the table it came from.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::auth_service::AuthError;
use crate::state::AppState;
use orderdesk_core::Role;

/// An authenticated identity: which row, in which table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn admin(id: impl Into<String>) -> Self {
        Principal {
            id: id.into(),
            role: Role::Admin,
        }
    }

    pub fn client(id: impl Into<String>) -> Self {
        Principal {
            id: id.into(),
            role: Role::Client,
        }
    }
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal id)
    pub sub: String,

    /// Table the principal lives in
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Session token issuer and verifier (HS256).
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a new token service.
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Issue a token for `principal`.
    pub fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: principal.id.clone(),
            role: principal.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenSigning(e.to_string()))
    }

    /// Validate and decode a token.
    ///
    /// ## Errors
    /// * `AuthError::TokenExpired` - signature fine, `exp` in the past
    /// * `AuthError::TokenInvalid` - anything else (malformed, bad signature, bad claims)
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })?;

        Ok(Principal {
            id: token_data.claims.sub,
            role: token_data.claims.role,
        })
    }
}

/// Extract the token from an `Authorization: <scheme> <token>` header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let (_scheme, token) = auth_header.trim().split_once(' ')?;
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Extractor yielding the principal named by a valid bearer token.
///
/// ```rust,ignore
/// async fn handler(CurrentPrincipal(principal): CurrentPrincipal) -> ... { }
/// ```
pub struct CurrentPrincipal(pub Principal);

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let principal = state.auth().tokens().verify(token)?;
        Ok(CurrentPrincipal(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let tokens = TokenService::new("test-secret", 3600);

        for principal in [Principal::admin("admin-1"), Principal::client("client-7")] {
            let token = tokens.issue(&principal).unwrap();
            assert_eq!(tokens.verify(&token).unwrap(), principal);
        }
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let tokens = TokenService::new("test-secret", 3600);
        let now = Utc::now().timestamp();

        // Well past the default validation leeway.
        let claims = Claims {
            sub: "admin-1".to_string(),
            role: Role::Admin,
            iat: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_foreign_or_garbage_tokens_are_invalid() {
        let tokens = TokenService::new("test-secret", 3600);
        let other = TokenService::new("other-secret", 3600);

        let token = other.issue(&Principal::admin("admin-1")).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::TokenInvalid)));
        assert!(matches!(tokens.verify("not.a.token"), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Token abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("abc.def"), None);
    }
}
