//! Application state shared across handlers.

use std::sync::Arc;

use orderdesk_db::Database;

use crate::auth::TokenService;
use crate::config::ApiConfig;
use crate::services::auth_service::Authenticator;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: Database,
    auth: Authenticator<Database>,
}

impl AppState {
    /// Builds the token service from `config`; nothing else in it is
    /// needed once the server is running.
    pub fn new(config: &ApiConfig, db: Database) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_lifetime_secs);
        let auth = Authenticator::new(db.clone(), tokens);

        Self {
            inner: Arc::new(AppStateInner { db, auth }),
        }
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn auth(&self) -> &Authenticator<Database> {
        &self.inner.auth
    }
}
