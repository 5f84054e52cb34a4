// Authentication extractors for protected routes

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::warn;

use crate::auth::error::AuthError;
use crate::auth::token::{JwtSettings, TokenService};

/// Role required by administrator-only endpoints
pub const ADMINISTRATOR_ROLE: &str = "Administrator";

/// Authenticated user extractor for protected routes
///
/// Verification is purely stateless: bearer parse plus token decode, no
/// store lookup.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub roles: Vec<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let settings = JwtSettings::from_env()?;
        let claims = TokenService::new(settings).decode(token)?;

        let user_id = claims
            .uid
            .parse::<i32>()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
            roles: claims.role,
        })
    }
}

/// Extractor that additionally requires the Administrator role
#[derive(Debug, Clone)]
pub struct Administrator(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for Administrator
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.roles.iter().any(|r| r == ADMINISTRATOR_ROLE) {
            warn!(
                "authorization failed for user {}: missing role '{}'",
                user.user_id, ADMINISTRATOR_ROLE
            );
            return Err(AuthError::InsufficientRole {
                required: ADMINISTRATOR_ROLE.to_string(),
            });
        }

        Ok(Administrator(user))
    }
}
