//! Session tokens
//!
//! HS256 JWTs carrying the account id and its token version. Bumping the
//! version on the account invalidates every token issued before.

use crate::domain::{User, UserId, UserRole};
use crate::error::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id as a decimal string
    pub sub: String,
    pub ver: i32,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            ver: user.token_version,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verifies signature and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        Ok(decode::<Claims>(token, &self.decoding, &self.validation)?.claims)
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::PasswordHash;

    fn user() -> User {
        User {
            id: UserId::new(5),
            full_name: "Dean".to_string(),
            username: "dean".to_string(),
            password_hash: PasswordHash::try_new("hash".to_string()).unwrap(),
            role: UserRole::Dean,
            faculty_id: None,
            token_version: 3,
            force_password_change: false,
            birth_year: None,
            department: None,
            email: None,
            phone: None,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn issued_token_decodes_to_the_account() {
        let issuer = TokenIssuer::new("secret", 8);
        let token = issuer.issue(&user()).unwrap();
        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.user_id(), Some(UserId::new(5)));
        assert_eq!(claims.ver, 3);
        assert_eq!(claims.role, UserRole::Dean);
        assert_eq!(claims.exp - claims.iat, 8 * 3600);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = TokenIssuer::new("one", 8).issue(&user()).unwrap();
        assert!(TokenIssuer::new("two", 8).decode(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(TokenIssuer::new("secret", 8).decode("not.a.jwt").is_err());
    }
}
