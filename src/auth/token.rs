//! Bearer token verification.
//!
//! Tokens are HS256 JWTs signed by the external auth provider with a shared
//! secret. The core never issues tokens in production.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use super::models::{Actor, Claims};
use crate::error::{CoreError, CoreResult};

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify token signature + expiry and resolve the acting identity
    pub fn verify(&self, token: &str) -> CoreResult<Actor> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            CoreError::Unauthorized
        })?;
        data.claims.actor()
    }

    /// Extract the token from an `Authorization: Bearer <token>` value
    pub fn bearer(header_value: &str) -> CoreResult<&str> {
        header_value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CoreError::Unauthorized)
    }
}

/// Test helper: sign claims the way the auth provider does
#[cfg(test)]
pub fn issue_test_token(secret: &str, actor: &Actor, ttl_secs: i64) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: actor.user_id.to_string(),
        role: actor.role,
        exp: (now + ttl_secs) as usize,
        iat: now as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("encode test token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_verify_roundtrip() {
        let actor = Actor::expert(Uuid::new_v4());
        let token = issue_test_token(SECRET, &actor, 3600);

        let verifier = TokenVerifier::new(SECRET);
        assert_eq!(verifier.verify(&token).unwrap(), actor);
    }

    #[test]
    fn test_verify_wrong_secret() {
        let actor = Actor::client(Uuid::new_v4());
        let token = issue_test_token("other-secret", &actor, 3600);

        let verifier = TokenVerifier::new(SECRET);
        assert_eq!(verifier.verify(&token), Err(CoreError::Unauthorized));
    }

    #[test]
    fn test_verify_expired() {
        let actor = Actor::client(Uuid::new_v4());
        // Well past the default 60s leeway
        let token = issue_test_token(SECRET, &actor, -3600);

        let verifier = TokenVerifier::new(SECRET);
        assert_eq!(verifier.verify(&token), Err(CoreError::Unauthorized));
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(TokenVerifier::bearer("Bearer abc").unwrap(), "abc");
        assert!(TokenVerifier::bearer("Basic abc").is_err());
        assert!(TokenVerifier::bearer("Bearer ").is_err());
    }
}
