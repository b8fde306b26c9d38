//! # Administrator Repository
//!
//! Back-office principals. Email is unique within this table only.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::password;
use orderdesk_core::validation::normalize_email;
use orderdesk_core::{Administrator, NewAdministrator};

/// Row shape of the `administrators` table.
#[derive(Debug, sqlx::FromRow)]
struct AdministratorRecord {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AdministratorRecord> for Administrator {
    fn from(record: AdministratorRecord) -> Self {
        Administrator {
            id: record.id,
            name: record.name,
            email: record.email,
            password_hash: record.password_hash,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Repository for administrator database operations.
#[derive(Debug, Clone)]
pub struct AdministratorRepository {
    pool: SqlitePool,
}

impl AdministratorRepository {
    /// Creates a new AdministratorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AdministratorRepository { pool }
    }

    /// Registers an administrator.
    ///
    /// The email is stored trimmed and lowercased. The password is hashed
    /// on the blocking pool.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation { field: "email" }` - email already registered
    pub async fn create(&self, new: &NewAdministrator) -> DbResult<Administrator> {
        let email = normalize_email(&new.email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(DbError::duplicate("email", email));
        }

        let password_hash = password::hash_password_blocking(new.password.clone()).await?;
        let now = Utc::now();

        let admin = Administrator {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            email,
            password_hash,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %admin.id, "Inserting administrator");

        sqlx::query(
            r#"
            INSERT INTO administrators (id, name, email, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&admin.id)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %admin.id, "Administrator registered");
        Ok(admin)
    }

    /// Lists all administrators, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Administrator>> {
        let records = sqlx::query_as::<_, AdministratorRecord>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM administrators
            ORDER BY created_at, rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Administrator::from).collect())
    }

    /// Exact-match lookup by email.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<Administrator>> {
        let record = sqlx::query_as::<_, AdministratorRecord>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM administrators
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Administrator::from))
    }

    /// Lookup by id.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Administrator>> {
        let record = sqlx::query_as::<_, AdministratorRecord>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM administrators
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Administrator::from))
    }

    /// Number of registered administrators.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM administrators")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::password::verify_password;
    use crate::{Database, DbConfig, DbError};
    use orderdesk_core::NewAdministrator;

    fn new_admin(email: &str) -> NewAdministrator {
        NewAdministrator {
            name: "Root".to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_email_and_hashes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.administrators();

        let admin = repo.create(&new_admin("  Root@Example.COM ")).await.unwrap();

        assert_eq!(admin.email, "root@example.com");
        assert_ne!(admin.password_hash, "hunter22");
        assert!(verify_password("hunter22", &admin.password_hash));

        let found = repo.find_by_email("root@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, admin.id);
        assert!(repo.find_by_id(&admin.id).await.unwrap().is_some());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.administrators();

        repo.create(&new_admin("root@example.com")).await.unwrap();
        let err = repo.create(&new_admin("ROOT@example.com")).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_is_exact_match() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.administrators();

        repo.create(&new_admin("root@example.com")).await.unwrap();
        assert!(repo.find_by_email("Root@example.com").await.unwrap().is_none());
    }
}
