//! Actor identity models.
//!
//! The external auth provider authenticates users; the core only consumes
//! the resulting identity (user id + role).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core_types::UserId;
use crate::error::{CoreError, CoreResult};

/// Marketplace role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Expert,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Expert => "expert",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "expert" => Ok(Role::Expert),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// The authenticated user performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn client(user_id: UserId) -> Self {
        Self::new(user_id, Role::Client)
    }

    pub fn expert(user_id: UserId) -> Self {
        Self::new(user_id, Role::Expert)
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless the actor is an admin
    pub fn require_admin(&self) -> CoreResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CoreError::Forbidden)
        }
    }
}

/// Token claims issued by the auth provider
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user id as UUID string)
    pub role: Role,
    pub exp: usize, // Expiration time (as UTC timestamp)
    pub iat: usize, // Issued at
}

impl Claims {
    /// Convert verified claims into an actor
    pub fn actor(&self) -> CoreResult<Actor> {
        let user_id = self
            .sub
            .parse::<UserId>()
            .map_err(|_| CoreError::Unauthorized)?;
        Ok(Actor::new(user_id, self.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_role_from_str() {
        assert_eq!("Expert".parse::<Role>().unwrap(), Role::Expert);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("moderator".parse::<Role>().is_err());
    }

    #[test]
    fn test_require_admin() {
        let id = Uuid::new_v4();
        assert!(Actor::admin(id).require_admin().is_ok());
        assert_eq!(
            Actor::expert(id).require_admin(),
            Err(CoreError::Forbidden)
        );
    }

    #[test]
    fn test_claims_to_actor() {
        let id = Uuid::new_v4();
        let claims = Claims {
            sub: id.to_string(),
            role: Role::Client,
            exp: 0,
            iat: 0,
        };
        assert_eq!(claims.actor().unwrap(), Actor::client(id));

        let bad = Claims {
            sub: "user-1".to_string(),
            ..claims
        };
        assert_eq!(bad.actor(), Err(CoreError::Unauthorized));
    }
}
