// Authentication module
// JWT-based registration and login over a pluggable credential store

pub mod error;
pub mod handlers;
pub mod manager;
pub mod middleware;
pub mod models;
pub mod password;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use manager::{AuthManager, DEFAULT_ROLE};
pub use middleware::{Administrator, AuthenticatedUser, ADMINISTRATOR_ROLE};
pub use models::{AuthResponse, Claim, IdentityError, LoginRequest, RegisterRequest, User};
pub use store::{CredentialStore, PgCredentialStore};
pub use token::{JwtSettings, TokenService};
