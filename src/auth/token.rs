// JWT issuance and validation for authenticated sessions

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::models::{Claim, User};

/// Claim type carrying one entry per assigned role
pub const ROLE_CLAIM: &str = "role";

/// Registered JWT claim names the issuer owns; stored identity claims
/// must not override these
const RESERVED_CLAIMS: [&str; 7] = ["sub", "jti", "iss", "aud", "iat", "exp", "nbf"];

/// Token signing configuration, supplied by the environment
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub key: String,
    pub issuer: String,
    pub audience: String,
    pub duration_minutes: i64,
}

impl JwtSettings {
    /// Read JWT_KEY, JWT_ISSUER, JWT_AUDIENCE and JWT_DURATION_MINUTES
    pub fn from_env() -> Result<Self, AuthError> {
        let key = std::env::var("JWT_KEY")
            .map_err(|_| AuthError::Config("JWT_KEY not configured".to_string()))?;
        let issuer = std::env::var("JWT_ISSUER")
            .map_err(|_| AuthError::Config("JWT_ISSUER not configured".to_string()))?;
        let audience = std::env::var("JWT_AUDIENCE")
            .map_err(|_| AuthError::Config("JWT_AUDIENCE not configured".to_string()))?;
        let duration_minutes = std::env::var("JWT_DURATION_MINUTES")
            .map_err(|_| AuthError::Config("JWT_DURATION_MINUTES not configured".to_string()))?
            .parse::<i64>()
            .map_err(|_| {
                AuthError::Config("JWT_DURATION_MINUTES must be an integer".to_string())
            })?;

        Ok(Self {
            key,
            issuer,
            audience,
            duration_minutes,
        })
    }
}

/// Verified claims of a decoded token
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user's email
    pub sub: String,
    /// Unique token id, fresh per issued token
    pub jti: String,
    pub email: String,
    /// User identifier, serialized as a string claim
    pub uid: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, deserialize_with = "one_or_many")]
    pub role: Vec<String>,
    /// Any stored identity claims carried by the token
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Role claims collapse to a plain string when there is exactly one
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Stateless token issuer/verifier (HMAC-SHA-256)
///
/// Issued tokens are never persisted; verification is signature plus
/// registered-claim checks only.
#[derive(Clone)]
pub struct TokenService {
    settings: JwtSettings,
}

impl TokenService {
    pub fn new(settings: JwtSettings) -> Self {
        Self { settings }
    }

    /// Issue a signed token for a verified user
    ///
    /// The claim set is fixed: sub (email), jti (fresh UUID), email, uid,
    /// every stored identity claim, and one role entry per assigned role.
    /// Claims are unioned by (type, value), so duplicates across sources
    /// cannot change the payload.
    pub fn issue(
        &self,
        user: &User,
        roles: &[String],
        user_claims: &[Claim],
    ) -> Result<String, AuthError> {
        let mut claim_set: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        let mut add = |claim_type: &str, value: String| {
            claim_set
                .entry(claim_type.to_string())
                .or_default()
                .insert(value);
        };

        add("email", user.email.clone());
        add("uid", user.id.to_string());
        for claim in user_claims {
            add(&claim.claim_type, claim.claim_value.clone());
        }
        for role in roles {
            add(ROLE_CLAIM, role.clone());
        }

        let now = Utc::now().timestamp();
        let mut payload = serde_json::Map::new();
        for (claim_type, values) in claim_set {
            if RESERVED_CLAIMS.contains(&claim_type.as_str()) {
                continue;
            }
            let value = if values.len() == 1 {
                Value::String(values.into_iter().next().unwrap_or_default())
            } else {
                Value::Array(values.into_iter().map(Value::String).collect())
            };
            payload.insert(claim_type, value);
        }
        payload.insert("sub".to_string(), Value::String(user.email.clone()));
        payload.insert(
            "jti".to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
        payload.insert(
            "iss".to_string(),
            Value::String(self.settings.issuer.clone()),
        );
        payload.insert(
            "aud".to_string(),
            Value::String(self.settings.audience.clone()),
        );
        payload.insert("iat".to_string(), Value::Number(now.into()));
        payload.insert(
            "exp".to_string(),
            Value::Number((now + self.settings.duration_minutes * 60).into()),
        );

        encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(self.settings.key.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Decode and verify a token: signature, expiry, issuer, audience
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.settings.key.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_settings() -> JwtSettings {
        JwtSettings {
            key: "test_signing_key_for_testing_purposes".to_string(),
            issuer: "HotelListingApi".to_string(),
            audience: "HotelListingApiClient".to_string(),
            duration_minutes: 10,
        }
    }

    fn test_service() -> TokenService {
        TokenService::new(test_settings())
    }

    fn test_user(id: i32, email: &str) -> User {
        User {
            id,
            email: email.to_string(),
            password_hash: String::new(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_carries_identity_claims() {
        let service = test_service();
        let user = test_user(42, "test@example.com");

        let token = service
            .issue(&user, &["User".to_string()], &[])
            .unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.sub, "test@example.com");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.uid, "42");
        assert_eq!(claims.role, vec!["User".to_string()]);
        assert_eq!(claims.iss, "HotelListingApi");
        assert_eq!(claims.aud, "HotelListingApiClient");
    }

    /// The payload must contain nothing beyond the specified claim set
    #[test]
    fn test_claim_set_is_exactly_the_specified_one() {
        let service = test_service();
        let user = test_user(7, "a@x.com");
        let stored = vec![Claim::new("department", "bookings")];

        let token = service.issue(&user, &["User".to_string()], &stored).unwrap();

        // Inspect the raw payload rather than the typed view
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine;

        let payload = token.split('.').nth(1).unwrap();
        let json = URL_SAFE_NO_PAD.decode(payload).unwrap();
        let map: serde_json::Map<String, Value> = serde_json::from_slice(&json).unwrap();

        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["aud", "department", "email", "exp", "iat", "iss", "jti", "role", "sub", "uid"]
        );
    }

    #[test]
    fn test_jti_is_unique_per_token() {
        let service = test_service();
        let user = test_user(1, "same@user.com");

        let t1 = service.issue(&user, &[], &[]).unwrap();
        let t2 = service.issue(&user, &[], &[]).unwrap();

        let c1 = service.decode(&t1).unwrap();
        let c2 = service.decode(&t2).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn test_duplicate_source_claims_are_unioned() {
        let service = test_service();
        let user = test_user(3, "dup@x.com");
        // Stored claim duplicates the computed role claim
        let stored = vec![
            Claim::new(ROLE_CLAIM, "User"),
            Claim::new("email", "dup@x.com"),
        ];

        let token = service.issue(&user, &["User".to_string()], &stored).unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.role, vec!["User".to_string()]);
        assert_eq!(claims.email, "dup@x.com");
    }

    #[test]
    fn test_multiple_roles_become_multiple_entries() {
        let service = test_service();
        let user = test_user(9, "admin@x.com");
        let roles = vec!["Administrator".to_string(), "User".to_string()];

        let token = service.issue(&user, &roles, &[]).unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.role, roles);
    }

    #[test]
    fn test_stored_claims_cannot_override_registered_ones() {
        let service = test_service();
        let user = test_user(4, "honest@x.com");
        let stored = vec![Claim::new("sub", "forged@x.com")];

        let token = service.issue(&user, &[], &stored).unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.sub, "honest@x.com");
    }

    #[test]
    fn test_expiry_matches_configured_duration() {
        let service = test_service();
        let user = test_user(1, "t@x.com");

        let token = service.issue(&user, &[], &[]).unwrap();
        let claims = service.decode(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 10 * 60);
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let service = test_service();
        let mut other_settings = test_settings();
        other_settings.key = "a_completely_different_signing_key".to_string();
        let other = TokenService::new(other_settings);

        let token = service
            .issue(&test_user(1, "t@x.com"), &[], &[])
            .unwrap();

        assert!(service.decode(&token).is_ok());
        assert!(matches!(other.decode(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_wrong_issuer_or_audience_is_rejected() {
        let service = test_service();
        let token = service
            .issue(&test_user(1, "t@x.com"), &[], &[])
            .unwrap();

        let mut bad_issuer = test_settings();
        bad_issuer.issuer = "SomeoneElse".to_string();
        assert!(TokenService::new(bad_issuer).decode(&token).is_err());

        let mut bad_audience = test_settings();
        bad_audience.audience = "OtherClient".to_string();
        assert!(TokenService::new(bad_audience).decode(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let settings = test_settings();
        let service = TokenService::new(settings.clone());

        let now = Utc::now().timestamp();
        let payload = serde_json::json!({
            "sub": "t@x.com",
            "jti": Uuid::new_v4().to_string(),
            "email": "t@x.com",
            "uid": "1",
            "iss": settings.issuer,
            "aud": settings.audience,
            "iat": now - 1000,
            "exp": now - 500,
        });
        let token = encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(settings.key.as_bytes()),
        )
        .unwrap();

        assert!(matches!(service.decode(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_service();

        assert!(service.decode("").is_err());
        assert!(service.decode("not.a.token").is_err());
        assert!(service
            .decode("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature")
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_issue_then_decode_preserves_identity(
            user_id in 1i32..1000000,
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)"
        ) {
            let service = test_service();
            let user = test_user(user_id, &email);

            let token = service.issue(&user, &["User".to_string()], &[])
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let claims = service.decode(&token)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert_eq!(claims.sub, email.clone());
            prop_assert_eq!(claims.email, email);
            prop_assert_eq!(claims.uid, user_id.to_string());
        }

        #[test]
        fn prop_random_strings_are_not_tokens(
            garbage in "[a-zA-Z0-9]{10,60}"
        ) {
            let service = test_service();
            prop_assert!(service.decode(&garbage).is_err());
        }
    }
}
