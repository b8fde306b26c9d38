//! Authentication resolver.
//!
//! Turns an email/password pair into a session token by probing both
//! principal tables, and resolves a verified token back to its principal.
//!
//! ## Lookup Order
//! ```text
//! authenticate(email, password)
//!   │
//!   ├── administrators: email matches AND password verifies? → admin token
//!   │        (a miss or a mismatch here never stops the next lookup)
//!   ├── clients:        email matches AND password verifies? → client token
//!   │
//!   └── InvalidCredentials (same answer whether or not the email exists)
//! ```
//!
//! The login email is trimmed but not lowercased, so lookups are exact.
//! Registration stores emails lowercased.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{Principal, TokenService};
use orderdesk_core::{Administrator, Client, Role};
use orderdesk_db::password::verify_password_blocking;
use orderdesk_db::{Database, DbError, DbResult};

// =============================================================================
// Errors
// =============================================================================

/// Authentication and token failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No principal matched the email/password pair.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Request carried no usable `Authorization` header.
    #[error("Token not provided")]
    MissingToken,

    /// Token signature is valid but it has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Token is malformed, forged or carries unexpected claims.
    #[error("Token is invalid")]
    TokenInvalid,

    /// Token was valid but its principal no longer exists.
    #[error("User not found")]
    PrincipalNotFound,

    /// Token could not be signed.
    #[error("Failed to sign token: {0}")]
    TokenSigning(String),

    /// Credential lookup failed.
    #[error("Credential lookup failed: {0}")]
    Storage(#[from] DbError),
}

// =============================================================================
// Credential Store
// =============================================================================

/// Read access to both principal tables.
///
/// Implemented by [`Database`]; tests substitute an in-memory fake.
pub trait CredentialStore: Send + Sync {
    fn find_administrator_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = DbResult<Option<Administrator>>> + Send;

    fn find_client_by_email(&self, email: &str) -> impl Future<Output = DbResult<Option<Client>>> + Send;

    fn find_administrator_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = DbResult<Option<Administrator>>> + Send;

    fn find_client_by_id(&self, id: &str) -> impl Future<Output = DbResult<Option<Client>>> + Send;
}

impl CredentialStore for Database {
    fn find_administrator_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = DbResult<Option<Administrator>>> + Send {
        let repo = self.administrators();
        let email = email.to_string();
        async move { repo.find_by_email(&email).await }
    }

    fn find_client_by_email(&self, email: &str) -> impl Future<Output = DbResult<Option<Client>>> + Send {
        let repo = self.clients();
        let email = email.to_string();
        async move { repo.find_by_email(&email).await }
    }

    fn find_administrator_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = DbResult<Option<Administrator>>> + Send {
        let repo = self.administrators();
        let id = id.to_string();
        async move { repo.find_by_id(&id).await }
    }

    fn find_client_by_id(&self, id: &str) -> impl Future<Output = DbResult<Option<Client>>> + Send {
        let repo = self.clients();
        let id = id.to_string();
        async move { repo.find_by_id(&id).await }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// A successful login.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub token: String,
    pub principal: Principal,
    pub name: String,
    pub email: String,
    /// Public account code, clients only.
    pub account_number: Option<String>,
}

/// The stored identity behind a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub principal: Principal,
    pub name: String,
}

/// Resolves credentials and tokens against a [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct Authenticator<S> {
    store: S,
    tokens: TokenService,
}

impl<S: CredentialStore> Authenticator<S> {
    pub fn new(store: S, tokens: TokenService) -> Self {
        Authenticator { store, tokens }
    }

    /// The token service used to sign sessions.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Checks `email`/`password` against administrators, then clients.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Authenticated, AuthError> {
        let email = email.trim();

        if let Some(admin) = self.store.find_administrator_by_email(email).await? {
            if verify_password_blocking(password.to_string(), admin.password_hash.clone()).await {
                info!(id = %admin.id, role = %Role::Admin, "Login succeeded");
                return self.session(Principal::admin(admin.id), admin.name, admin.email, None);
            }
            debug!("Administrator password mismatch, probing clients");
        }

        if let Some(client) = self.store.find_client_by_email(email).await? {
            match client.password_hash.as_deref() {
                Some(hash) if verify_password_blocking(password.to_string(), hash.to_string()).await => {
                    info!(id = %client.id, role = %Role::Client, "Login succeeded");
                    return self.session(
                        Principal::client(client.id),
                        client.name,
                        client.email,
                        Some(client.account_number),
                    );
                }
                Some(_) => debug!("Client password mismatch"),
                None => debug!("Client has no password set"),
            }
        }

        warn!("Login failed");
        Err(AuthError::InvalidCredentials)
    }

    /// Loads the principal a verified token refers to.
    pub async fn resolve(&self, principal: &Principal) -> Result<Identity, AuthError> {
        let name = match principal.role {
            Role::Admin => self
                .store
                .find_administrator_by_id(&principal.id)
                .await?
                .map(|admin| admin.name),
            Role::Client => self
                .store
                .find_client_by_id(&principal.id)
                .await?
                .map(|client| client.name),
        };

        let name = name.ok_or(AuthError::PrincipalNotFound)?;
        Ok(Identity {
            principal: principal.clone(),
            name,
        })
    }

    fn session(
        &self,
        principal: Principal,
        name: String,
        email: String,
        account_number: Option<String>,
    ) -> Result<Authenticated, AuthError> {
        let token = self.tokens.issue(&principal)?;
        Ok(Authenticated {
            token,
            principal,
            name,
            email,
            account_number,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderdesk_db::password::hash_password;
    use std::sync::Mutex;

    /// In-memory store that records which table each lookup hit.
    #[derive(Default)]
    struct RecordingStore {
        admins: Vec<Administrator>,
        clients: Vec<Client>,
        lookups: Mutex<Vec<&'static str>>,
    }

    impl RecordingStore {
        fn record(&self, table: &'static str) {
            if let Ok(mut lookups) = self.lookups.lock() {
                lookups.push(table);
            }
        }

        fn lookups(&self) -> Vec<&'static str> {
            self.lookups.lock().unwrap().clone()
        }
    }

    impl CredentialStore for RecordingStore {
        fn find_administrator_by_email(
            &self,
            email: &str,
        ) -> impl Future<Output = DbResult<Option<Administrator>>> + Send {
            self.record("administrators");
            let found = self.admins.iter().find(|a| a.email == email).cloned();
            async move { Ok(found) }
        }

        fn find_client_by_email(&self, email: &str) -> impl Future<Output = DbResult<Option<Client>>> + Send {
            self.record("clients");
            let found = self.clients.iter().find(|c| c.email == email).cloned();
            async move { Ok(found) }
        }

        fn find_administrator_by_id(
            &self,
            id: &str,
        ) -> impl Future<Output = DbResult<Option<Administrator>>> + Send {
            let found = self.admins.iter().find(|a| a.id == id).cloned();
            async move { Ok(found) }
        }

        fn find_client_by_id(&self, id: &str) -> impl Future<Output = DbResult<Option<Client>>> + Send {
            let found = self.clients.iter().find(|c| c.id == id).cloned();
            async move { Ok(found) }
        }
    }

    fn admin(email: &str, password: &str) -> Administrator {
        Administrator {
            id: "admin-1".to_string(),
            name: "Root".to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn client(email: &str, password: Option<&str>) -> Client {
        Client {
            id: "client-1".to_string(),
            name: "Ana".to_string(),
            email: email.to_string(),
            password_hash: password.map(|p| hash_password(p).unwrap()),
            tax_id: "123".to_string(),
            postal_code: "01001-000".to_string(),
            street: "Rua A".to_string(),
            house_number: "10".to_string(),
            district: "Centro".to_string(),
            city: "Sao Paulo".to_string(),
            state: "SP".to_string(),
            account_number: "482913".to_string(),
            recovery_code: "100200".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn authenticator(store: RecordingStore) -> Authenticator<RecordingStore> {
        Authenticator::new(store, TokenService::new("test-secret", 3600))
    }

    #[tokio::test]
    async fn test_admin_password_mismatch_still_checks_clients() {
        let auth = authenticator(RecordingStore {
            admins: vec![admin("root@example.com", "right-pass")],
            ..Default::default()
        });

        let result = auth.authenticate("root@example.com", "wrong-pass").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(auth.store.lookups(), ["administrators", "clients"]);
    }

    #[tokio::test]
    async fn test_client_wins_after_admin_mismatch() {
        let auth = authenticator(RecordingStore {
            admins: vec![admin("shared@example.com", "admin-pass")],
            clients: vec![client("shared@example.com", Some("client-pass"))],
            ..Default::default()
        });

        let session = auth.authenticate("shared@example.com", "client-pass").await.unwrap();

        assert_eq!(session.principal, Principal::client("client-1"));
        assert_eq!(session.account_number.as_deref(), Some("482913"));
        assert_eq!(auth.tokens().verify(&session.token).unwrap(), session.principal);
    }

    #[tokio::test]
    async fn test_client_password_is_checked() {
        let auth = authenticator(RecordingStore {
            clients: vec![client("ana@example.com", Some("client-pass"))],
            ..Default::default()
        });

        assert!(matches!(
            auth.authenticate("ana@example.com", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        let session = auth.authenticate("ana@example.com", "client-pass").await.unwrap();
        assert_eq!(session.principal, Principal::client("client-1"));
        assert_eq!(session.name, "Ana");
    }

    #[tokio::test]
    async fn test_admin_match_skips_client_lookup() {
        let auth = authenticator(RecordingStore {
            admins: vec![admin("root@example.com", "right-pass")],
            ..Default::default()
        });

        let session = auth.authenticate("  root@example.com ", "right-pass").await.unwrap();

        assert_eq!(session.principal.role, Role::Admin);
        assert!(session.account_number.is_none());
        assert_eq!(auth.store.lookups(), ["administrators"]);
    }

    #[tokio::test]
    async fn test_unknown_email_and_passwordless_client_fail_alike() {
        let auth = authenticator(RecordingStore {
            clients: vec![client("ana@example.com", None)],
            ..Default::default()
        });

        assert!(matches!(
            auth.authenticate("nobody@example.com", "whatever").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("ana@example.com", "whatever").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_email_is_not_lowercased() {
        let auth = authenticator(RecordingStore {
            admins: vec![admin("root@example.com", "right-pass")],
            ..Default::default()
        });

        assert!(matches!(
            auth.authenticate("Root@Example.com", "right-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_resolve() {
        let auth = authenticator(RecordingStore {
            admins: vec![admin("root@example.com", "pw")],
            ..Default::default()
        });

        let identity = auth.resolve(&Principal::admin("admin-1")).await.unwrap();
        assert_eq!(identity.name, "Root");

        assert!(matches!(
            auth.resolve(&Principal::client("admin-1")).await,
            Err(AuthError::PrincipalNotFound)
        ));
    }
}
