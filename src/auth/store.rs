// Credential store contract and its Postgres implementation
//
// The auth manager only ever talks to the trait, so tests can swap in an
// in-memory double and the persistence details stay in one place.

use std::future::Future;

use sqlx::PgPool;

use crate::auth::error::AuthError;
use crate::auth::models::{Claim, IdentityError, User};
use crate::auth::password;

/// Failure modes of user creation: a coded rejection that joins the
/// other registration errors, or a store fault that aborts the operation
#[derive(Debug)]
pub enum CreateUserError {
    Rejected(IdentityError),
    Store(AuthError),
}

/// External user/role store consumed by the auth manager
///
/// Roles are expected to pre-exist (seeded by migrations); the store
/// assigns them to users but never creates them here.
pub trait CredentialStore: Send + Sync {
    fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> impl Future<Output = Result<User, CreateUserError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, AuthError>> + Send;

    /// Check a plaintext password against the user's stored credential
    fn check_password(
        &self,
        user: &User,
        password: &str,
    ) -> impl Future<Output = Result<bool, AuthError>> + Send;

    fn get_roles(
        &self,
        user_id: i32,
    ) -> impl Future<Output = Result<Vec<String>, AuthError>> + Send;

    fn get_claims(
        &self,
        user_id: i32,
    ) -> impl Future<Output = Result<Vec<Claim>, AuthError>> + Send;

    fn add_to_role(
        &self,
        user_id: i32,
        role: &str,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, created_at";

/// Postgres-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CredentialStore for PgCredentialStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, CreateUserError> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, first_name, last_name) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(first_name)
            .bind(last_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                // Lost the uniqueness race after the pre-check
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return CreateUserError::Rejected(IdentityError::duplicate_email(email));
                    }
                }
                CreateUserError::Store(AuthError::Database(e.to_string()))
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn check_password(&self, user: &User, password: &str) -> Result<bool, AuthError> {
        password::verify_password(password, &user.password_hash)
    }

    async fn get_roles(&self, user_id: i32) -> Result<Vec<String>, AuthError> {
        let roles = sqlx::query_scalar::<_, String>(
            "SELECT r.name FROM roles r \
             JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 \
             ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn get_claims(&self, user_id: i32) -> Result<Vec<Claim>, AuthError> {
        let claims = sqlx::query_as::<_, Claim>(
            "SELECT claim_type, claim_value FROM user_claims \
             WHERE user_id = $1 \
             ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(claims)
    }

    async fn add_to_role(&self, user_id: i32, role: &str) -> Result<(), AuthError> {
        let result = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) \
             SELECT $1, id FROM roles WHERE name = $2 \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        // Roles are seeded before any registration runs; a missing role
        // is a deployment fault, not a user error
        if result.rows_affected() == 0 {
            let already_assigned = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(\
                 SELECT 1 FROM user_roles ur \
                 JOIN roles r ON r.id = ur.role_id \
                 WHERE ur.user_id = $1 AND r.name = $2)",
            )
            .bind(user_id)
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

            if !already_assigned {
                return Err(AuthError::Config(format!("role '{}' is not seeded", role)));
            }
        }

        Ok(())
    }
}
