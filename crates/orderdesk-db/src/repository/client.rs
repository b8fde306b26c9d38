//! # Client Repository
//!
//! Customer principals: registration, partial update and password recovery.
//!
//! ## Recovery Code Lifecycle
//! ```text
//! create()            → recovery_code = R1 (random, 6 digits)
//! recover_password(R1) → password replaced, recovery_code = R2
//! recover_password(R1) → None (R1 is spent)
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use super::six_digit_code;
use crate::error::{DbError, DbResult};
use crate::password;
use orderdesk_core::validation::normalize_email;
use orderdesk_core::{Client, ClientChanges, NewClient};

/// Row shape of the `clients` table.
#[derive(Debug, sqlx::FromRow)]
struct ClientRecord {
    id: String,
    name: String,
    email: String,
    password_hash: Option<String>,
    tax_id: String,
    postal_code: String,
    street: String,
    house_number: String,
    district: String,
    city: String,
    state: String,
    account_number: String,
    recovery_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRecord> for Client {
    fn from(r: ClientRecord) -> Self {
        Client {
            id: r.id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            tax_id: r.tax_id,
            postal_code: r.postal_code,
            street: r.street,
            house_number: r.house_number,
            district: r.district,
            city: r.city,
            state: r.state,
            account_number: r.account_number,
            recovery_code: r.recovery_code,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SELECT_CLIENT: &str = r#"
    SELECT id, name, email, password_hash, tax_id, postal_code, street,
           house_number, district, city, state, account_number, recovery_code,
           created_at, updated_at
    FROM clients
"#;

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Registers a client.
    ///
    /// Generates the public account number and the first recovery code.
    /// A client registered without a password cannot log in until one is set.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation { field: "email" | "name" }`
    pub async fn create(&self, new: &NewClient) -> DbResult<Client> {
        let email = normalize_email(&new.email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(DbError::duplicate("email", email));
        }
        if self.find_by_name(&new.name).await?.is_some() {
            return Err(DbError::duplicate("name", new.name.clone()));
        }

        let password_hash = match &new.password {
            Some(secret) => Some(password::hash_password_blocking(secret.clone()).await?),
            None => None,
        };
        let recovery_code = self.unused_recovery_code(None, six_digit_code).await?;

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            email,
            password_hash,
            tax_id: new.tax_id.clone(),
            postal_code: new.postal_code.clone(),
            street: new.street.clone(),
            house_number: new.house_number.clone(),
            district: new.district.clone(),
            city: new.city.clone(),
            state: new.state.clone(),
            account_number: six_digit_code(),
            recovery_code,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %client.id, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, name, email, password_hash, tax_id, postal_code, street,
                house_number, district, city, state, account_number, recovery_code,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.password_hash)
        .bind(&client.tax_id)
        .bind(&client.postal_code)
        .bind(&client.street)
        .bind(&client.house_number)
        .bind(&client.district)
        .bind(&client.city)
        .bind(&client.state)
        .bind(&client.account_number)
        .bind(&client.recovery_code)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %client.id, account_number = %client.account_number, "Client registered");
        Ok(client)
    }

    /// Lists all clients, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let sql = format!("{} ORDER BY created_at, rowid", SELECT_CLIENT);
        let records = sqlx::query_as::<_, ClientRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(Client::from).collect())
    }

    /// Exact-match lookup by email.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<Client>> {
        self.find_one("email", email).await
    }

    /// Exact-match lookup by display name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Client>> {
        self.find_one("name", name).await
    }

    /// Lookup by id.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        self.find_one("id", id).await
    }

    async fn find_one(&self, column: &'static str, value: &str) -> DbResult<Option<Client>> {
        let sql = format!("{} WHERE {} = ?1", SELECT_CLIENT, column);
        let record = sqlx::query_as::<_, ClientRecord>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Client::from))
    }

    /// Applies a partial update. Absent fields keep their stored value.
    ///
    /// A new email is normalized like on registration; a new password is
    /// rehashed.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no client with `id`
    /// * `DbError::UniqueViolation` - email or name taken by another client
    pub async fn update(&self, id: &str, changes: &ClientChanges) -> DbResult<Client> {
        let Some(current) = self.find_by_id(id).await? else {
            return Err(DbError::not_found("Client", id));
        };

        if changes.is_empty() {
            debug!(id = %id, "Client update carried no changes");
            return Ok(current);
        }

        let email = changes.email.as_deref().map(normalize_email);

        if let Some(email) = &email {
            if matches!(self.find_by_email(email).await?, Some(other) if other.id != id) {
                return Err(DbError::duplicate("email", email.clone()));
            }
        }
        if let Some(name) = &changes.name {
            if matches!(self.find_by_name(name).await?, Some(other) if other.id != id) {
                return Err(DbError::duplicate("name", name.clone()));
            }
        }

        let password_hash = match &changes.password {
            Some(secret) => Some(password::hash_password_blocking(secret.clone()).await?),
            None => None,
        };

        debug!(id = %id, "Updating client");

        sqlx::query(
            r#"
            UPDATE clients SET
                name          = COALESCE(?1, name),
                email         = COALESCE(?2, email),
                password_hash = COALESCE(?3, password_hash),
                tax_id        = COALESCE(?4, tax_id),
                postal_code   = COALESCE(?5, postal_code),
                street        = COALESCE(?6, street),
                house_number  = COALESCE(?7, house_number),
                district      = COALESCE(?8, district),
                city          = COALESCE(?9, city),
                state         = COALESCE(?10, state),
                updated_at    = ?11
            WHERE id = ?12
            "#,
        )
        .bind(&changes.name)
        .bind(&email)
        .bind(&password_hash)
        .bind(&changes.tax_id)
        .bind(&changes.postal_code)
        .bind(&changes.street)
        .bind(&changes.house_number)
        .bind(&changes.district)
        .bind(&changes.city)
        .bind(&changes.state)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Replaces a client's password using their recovery code.
    ///
    /// The code is consumed: on success it is rotated to a fresh value, so
    /// the same code cannot be used twice.
    ///
    /// ## Returns
    /// * `Ok(Some(client))` - password replaced
    /// * `Ok(None)` - no client holds this code (or it was consumed concurrently)
    pub async fn recover_password(
        &self,
        recovery_code: &str,
        new_password: &str,
    ) -> DbResult<Option<Client>> {
        let sql = format!("{} WHERE recovery_code = ?1", SELECT_CLIENT);
        let Some(client) = sqlx::query_as::<_, ClientRecord>(&sql)
            .bind(recovery_code)
            .fetch_optional(&self.pool)
            .await?
            .map(Client::from)
        else {
            debug!("Recovery code did not match any client");
            return Ok(None);
        };

        let password_hash = password::hash_password_blocking(new_password.to_string()).await?;

        let next_code = self
            .unused_recovery_code(Some(recovery_code), six_digit_code)
            .await?;

        // Guarded on the old code so two concurrent recoveries cannot both win.
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET password_hash = ?1, recovery_code = ?2, updated_at = ?3
            WHERE id = ?4 AND recovery_code = ?5
            "#,
        )
        .bind(&password_hash)
        .bind(&next_code)
        .bind(Utc::now())
        .bind(&client.id)
        .bind(recovery_code)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        info!(id = %client.id, "Client password recovered");
        self.find_by_id(&client.id).await
    }

    /// Draws codes from `generate` until one is held by no client and
    /// differs from `previous`.
    ///
    /// The UNIQUE index on `recovery_code` backs this up against a
    /// concurrent writer drawing the same code.
    async fn unused_recovery_code<F>(&self, previous: Option<&str>, mut generate: F) -> DbResult<String>
    where
        F: FnMut() -> String,
    {
        loop {
            let code = generate();
            if previous == Some(code.as_str()) {
                continue;
            }

            let taken: Option<i64> = sqlx::query_scalar("SELECT 1 FROM clients WHERE recovery_code = ?1")
                .bind(&code)
                .fetch_optional(&self.pool)
                .await?;

            if taken.is_none() {
                return Ok(code);
            }
            debug!("Recovery code already in use, drawing another");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::password::verify_password;
    use crate::{Database, DbConfig, DbError};
    use orderdesk_core::{ClientChanges, NewClient};

    fn new_client(name: &str, email: &str, password: Option<&str>) -> NewClient {
        NewClient {
            name: name.to_string(),
            email: email.to_string(),
            tax_id: "12.345.678/0001-90".to_string(),
            postal_code: "01001-000".to_string(),
            street: "Rua A".to_string(),
            house_number: "10".to_string(),
            district: "Centro".to_string(),
            city: "Sao Paulo".to_string(),
            state: "SP".to_string(),
            password: password.map(str::to_string),
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_generates_codes() {
        let db = db().await;
        let client = db
            .clients()
            .create(&new_client("Ana", " Ana@Example.com", Some("secret1")))
            .await
            .unwrap();

        assert_eq!(client.email, "ana@example.com");
        assert_eq!(client.account_number.len(), 6);
        assert_eq!(client.recovery_code.len(), 6);
        assert_eq!(client.tax_id, "12.345.678/0001-90");
        assert!(verify_password("secret1", client.password_hash.as_deref().unwrap()));
    }

    #[tokio::test]
    async fn test_create_without_password() {
        let db = db().await;
        let client = db.clients().create(&new_client("Bo", "bo@example.com", None)).await.unwrap();

        let stored = db.clients().find_by_id(&client.id).await.unwrap().unwrap();
        assert!(stored.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_and_name() {
        let db = db().await;
        let repo = db.clients();
        repo.create(&new_client("Ana", "ana@example.com", None)).await.unwrap();

        let err = repo.create(&new_client("Other", "ANA@example.com", None)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));

        let err = repo.create(&new_client("Ana", "other@example.com", None)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn test_email_shared_with_administrator_is_allowed() {
        let db = db().await;
        db.administrators()
            .create(&orderdesk_core::NewAdministrator {
                name: "Root".to_string(),
                email: "shared@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();

        assert!(db
            .clients()
            .create(&new_client("Ana", "shared@example.com", None))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = db().await;
        let repo = db.clients();
        let client = repo.create(&new_client("Ana", "ana@example.com", None)).await.unwrap();

        let changes = ClientChanges {
            city: Some("Recife".to_string()),
            email: Some(" NEW@example.com ".to_string()),
            password: Some("newpass1".to_string()),
            ..Default::default()
        };
        let updated = repo.update(&client.id, &changes).await.unwrap();

        assert_eq!(updated.city, "Recife");
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.street, "Rua A");
        assert!(verify_password("newpass1", updated.password_hash.as_deref().unwrap()));
    }

    #[tokio::test]
    async fn test_update_missing_and_conflicting() {
        let db = db().await;
        let repo = db.clients();
        let ana = repo.create(&new_client("Ana", "ana@example.com", None)).await.unwrap();
        repo.create(&new_client("Bo", "bo@example.com", None)).await.unwrap();

        let err = repo.update("missing", &ClientChanges::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let changes = ClientChanges {
            name: Some("Bo".to_string()),
            ..Default::default()
        };
        let err = repo.update(&ana.id, &changes).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "name"));

        // Re-submitting its own name is not a conflict.
        let changes = ClientChanges {
            name: Some("Ana".to_string()),
            ..Default::default()
        };
        assert!(repo.update(&ana.id, &changes).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_without_changes_leaves_row_untouched() {
        let db = db().await;
        let repo = db.clients();
        let client = repo.create(&new_client("Ana", "ana@example.com", None)).await.unwrap();

        let same = repo.update(&client.id, &ClientChanges::default()).await.unwrap();

        assert_eq!(same.updated_at, client.updated_at);
        assert_eq!(same.name, "Ana");
    }

    #[tokio::test]
    async fn test_recovery_codes_are_unique() {
        let db = db().await;
        let repo = db.clients();
        let ana = repo.create(&new_client("Ana", "ana@example.com", None)).await.unwrap();
        let bo = repo.create(&new_client("Bo", "bo@example.com", None)).await.unwrap();
        assert_ne!(ana.recovery_code, bo.recovery_code);

        let err = sqlx::query("UPDATE clients SET recovery_code = ?1 WHERE id = ?2")
            .bind(&ana.recovery_code)
            .bind(&bo.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "recovery_code"));
    }

    #[tokio::test]
    async fn test_code_held_by_another_client_is_skipped() {
        let db = db().await;
        let repo = db.clients();
        let ana = repo.create(&new_client("Ana", "ana@example.com", None)).await.unwrap();

        let mut drawn = vec![
            "654321".to_string(),
            "111111".to_string(),
            ana.recovery_code.clone(),
        ];
        let code = repo
            .unused_recovery_code(Some("111111"), || drawn.pop().unwrap())
            .await
            .unwrap();

        assert_eq!(code, "654321");
        assert!(drawn.is_empty());
    }

    #[tokio::test]
    async fn test_recovery_code_is_single_use() {
        let db = db().await;
        let repo = db.clients();
        let client = repo.create(&new_client("Ana", "ana@example.com", Some("oldpass"))).await.unwrap();
        let code = client.recovery_code.clone();

        let recovered = repo.recover_password(&code, "newpass").await.unwrap().unwrap();
        assert_ne!(recovered.recovery_code, code);
        assert!(verify_password("newpass", recovered.password_hash.as_deref().unwrap()));

        assert!(repo.recover_password(&code, "again!").await.unwrap().is_none());
    }
}
