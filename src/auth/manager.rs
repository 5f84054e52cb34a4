// Registration and login orchestration over the credential store

use crate::auth::error::AuthError;
use crate::auth::models::{AuthResponse, IdentityError, LoginRequest, RegisterRequest, User};
use crate::auth::password;
use crate::auth::store::{CreateUserError, CredentialStore};
use crate::auth::token::TokenService;

/// Role granted to every newly registered user
pub const DEFAULT_ROLE: &str = "User";

/// Coordinates the credential store and the token issuer
///
/// Stateless request-scoped collaborator; all persistence lives behind
/// the store, all signing behind the token service.
pub struct AuthManager<S> {
    store: S,
    tokens: TokenService,
}

impl<S: CredentialStore> AuthManager<S> {
    pub fn new(store: S, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Register a new user
    ///
    /// Returns the full ordered list of rejection reasons; an empty list
    /// means the user was created and assigned the default role. Store
    /// faults abort the operation instead of joining the list.
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<Vec<IdentityError>, AuthError> {
        let mut errors = password::validate_strength(&request.password);

        if self.store.find_by_email(&request.email).await?.is_some() {
            errors.push(IdentityError::duplicate_email(&request.email));
        }
        if !errors.is_empty() {
            tracing::debug!("registration rejected with {} error(s)", errors.len());
            return Ok(errors);
        }

        let password_hash = password::hash_password(&request.password)?;
        let created = self
            .store
            .create_user(
                &request.email,
                &password_hash,
                &request.first_name,
                &request.last_name,
            )
            .await;

        match created {
            Ok(user) => {
                self.store.add_to_role(user.id, DEFAULT_ROLE).await?;
                tracing::info!("registered user {}", user.id);
                Ok(Vec::new())
            }
            Err(CreateUserError::Rejected(error)) => Ok(vec![error]),
            Err(CreateUserError::Store(error)) => Err(error),
        }
    }

    /// Authenticate credentials and issue a signed token
    ///
    /// `Ok(None)` is the unauthenticated outcome and is identical for an
    /// unknown email and a wrong password, so callers cannot probe which
    /// emails are registered. A token is only ever built after the
    /// password check passes.
    pub async fn login(
        &self,
        credentials: &LoginRequest,
    ) -> Result<Option<AuthResponse>, AuthError> {
        let user = self.store.find_by_email(&credentials.email).await?;
        let verified = match &user {
            Some(user) => {
                self.store
                    .check_password(user, &credentials.password)
                    .await?
            }
            None => false,
        };

        let Some(user) = user.filter(|_| verified) else {
            tracing::debug!("login rejected");
            return Ok(None);
        };

        let token = self.generate_token(&user).await?;
        Ok(Some(AuthResponse {
            token,
            user_id: user.id,
        }))
    }

    /// Assemble the claim set from the store and sign it
    async fn generate_token(&self, user: &User) -> Result<String, AuthError> {
        let roles = self.store.get_roles(user.id).await?;
        let claims = self.store.get_claims(user.id).await?;
        self.tokens.issue(user, &roles, &claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Claim;
    use crate::auth::token::JwtSettings;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory credential store double
    #[derive(Default)]
    struct MemoryStore {
        inner: Mutex<MemoryStoreInner>,
    }

    #[derive(Default)]
    struct MemoryStoreInner {
        users: Vec<User>,
        roles: HashMap<i32, Vec<String>>,
        claims: HashMap<i32, Vec<Claim>>,
        next_id: i32,
    }

    impl MemoryStore {
        fn with_claims(user_id: i32, claims: Vec<Claim>) -> Self {
            let store = Self::default();
            store.inner.lock().unwrap().claims.insert(user_id, claims);
            store
        }
    }

    impl CredentialStore for MemoryStore {
        async fn create_user(
            &self,
            email: &str,
            password_hash: &str,
            first_name: &str,
            last_name: &str,
        ) -> Result<User, CreateUserError> {
            let mut inner = self.inner.lock().unwrap();
            if inner
                .users
                .iter()
                .any(|u| u.email.eq_ignore_ascii_case(email))
            {
                return Err(CreateUserError::Rejected(IdentityError::duplicate_email(
                    email,
                )));
            }
            inner.next_id += 1;
            let user = User {
                id: inner.next_id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                created_at: Utc::now(),
            };
            inner.users.push(user.clone());
            Ok(user)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .users
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned())
        }

        async fn check_password(&self, user: &User, password: &str) -> Result<bool, AuthError> {
            password::verify_password(password, &user.password_hash)
        }

        async fn get_roles(&self, user_id: i32) -> Result<Vec<String>, AuthError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.roles.get(&user_id).cloned().unwrap_or_default())
        }

        async fn get_claims(&self, user_id: i32) -> Result<Vec<Claim>, AuthError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.claims.get(&user_id).cloned().unwrap_or_default())
        }

        async fn add_to_role(&self, user_id: i32, role: &str) -> Result<(), AuthError> {
            let mut inner = self.inner.lock().unwrap();
            inner
                .roles
                .entry(user_id)
                .or_default()
                .push(role.to_string());
            Ok(())
        }
    }

    fn test_manager(store: MemoryStore) -> AuthManager<MemoryStore> {
        let settings = JwtSettings {
            key: "test_signing_key_for_testing_purposes".to_string(),
            issuer: "HotelListingApi".to_string(),
            audience: "HotelListingApiClient".to_string(),
            duration_minutes: 10,
        };
        AuthManager::new(store, TokenService::new(settings))
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_registration_assigns_exactly_the_user_role() {
        let manager = test_manager(MemoryStore::default());

        let errors = manager
            .register(&register_request("a@x.com", "Strong1!"))
            .await
            .unwrap();
        assert!(errors.is_empty());

        let user = manager.store.find_by_email("a@x.com").await.unwrap().unwrap();
        let roles = manager.store.get_roles(user.id).await.unwrap();
        assert_eq!(roles, vec![DEFAULT_ROLE.to_string()]);
    }

    #[tokio::test]
    async fn test_weak_password_reports_errors_and_creates_nothing() {
        let manager = test_manager(MemoryStore::default());

        let errors = manager
            .register(&register_request("a@x.com", "Weak"))
            .await
            .unwrap();

        assert!(errors.iter().any(|e| e.code.starts_with("Password")));
        assert!(manager
            .store
            .find_by_email("a@x.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_reported_alongside_policy_errors() {
        let manager = test_manager(MemoryStore::default());
        manager
            .register(&register_request("a@x.com", "Strong1!"))
            .await
            .unwrap();

        // Second attempt with the same email AND a weak password: both
        // problems must come back in one response
        let errors = manager
            .register(&register_request("a@x.com", "weak"))
            .await
            .unwrap();

        let codes: Vec<&str> = errors.iter().map(|e| e.code.as_str()).collect();
        assert!(codes.contains(&"DuplicateEmail"));
        assert!(codes.iter().any(|c| c.starts_with("Password")));
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
        let manager = test_manager(MemoryStore::default());
        manager
            .register(&register_request("known@x.com", "Strong1!"))
            .await
            .unwrap();

        let unknown = manager
            .login(&login_request("unknown@x.com", "Strong1!"))
            .await
            .unwrap();
        let wrong_password = manager
            .login(&login_request("known@x.com", "Wrong1!!"))
            .await
            .unwrap();

        assert!(unknown.is_none());
        assert!(wrong_password.is_none());
    }

    #[tokio::test]
    async fn test_successful_login_issues_a_decodable_token() {
        let manager = test_manager(MemoryStore::default());
        manager
            .register(&register_request("a@x.com", "Strong1!"))
            .await
            .unwrap();

        let response = manager
            .login(&login_request("a@x.com", "Strong1!"))
            .await
            .unwrap()
            .expect("login should succeed");

        let claims = manager.tokens.decode(&response.token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.uid, response.user_id.to_string());
        assert_eq!(claims.role, vec![DEFAULT_ROLE.to_string()]);
    }

    #[tokio::test]
    async fn test_stored_identity_claims_end_up_in_the_token() {
        let store = MemoryStore::with_claims(1, vec![Claim::new("department", "bookings")]);
        let manager = test_manager(store);
        manager
            .register(&register_request("a@x.com", "Strong1!"))
            .await
            .unwrap();

        let response = manager
            .login(&login_request("a@x.com", "Strong1!"))
            .await
            .unwrap()
            .unwrap();

        let claims = manager.tokens.decode(&response.token).unwrap();
        assert_eq!(
            claims.extra.get("department").and_then(|v| v.as_str()),
            Some("bookings")
        );
    }

    #[tokio::test]
    async fn test_two_logins_issue_tokens_with_distinct_jti() {
        let manager = test_manager(MemoryStore::default());
        manager
            .register(&register_request("a@x.com", "Strong1!"))
            .await
            .unwrap();

        let first = manager
            .login(&login_request("a@x.com", "Strong1!"))
            .await
            .unwrap()
            .unwrap();
        let second = manager
            .login(&login_request("a@x.com", "Strong1!"))
            .await
            .unwrap()
            .unwrap();

        let c1 = manager.tokens.decode(&first.token).unwrap();
        let c2 = manager.tokens.decode(&second.token).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }
}
