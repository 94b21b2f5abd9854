//! Password hashing
//!
//! bcrypt is deliberately slow, so hashing and verification run on the
//! blocking thread pool.

use crate::domain::password::NewPassword;
use crate::domain::types::PasswordHash;
use crate::error::{Error, Result};
use crate::infrastructure::log_messages;
use tracing::warn;

/// Cost range accepted by bcrypt
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST),
        }
    }

    pub async fn hash(&self, password: &NewPassword) -> Result<PasswordHash> {
        let plain = password.expose().to_string();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
            .await
            .map_err(|_| Error::Internal)??;
        PasswordHash::try_new(hashed).map_err(|_| Error::Internal)
    }

    /// Malformed stored hashes verify as false rather than failing the request.
    pub async fn verify(&self, candidate: &str, hash: &PasswordHash) -> bool {
        let candidate = candidate.to_string();
        let stored = hash.as_ref().to_string();
        match tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &stored)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(err)) => {
                warn!(error = %err, "{}", log_messages::auth::HASH_UNVERIFIABLE);
                false
            }
            Err(_) => false,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_verifies_only_the_hashed_password() {
        let hasher = PasswordHasher::new(MIN_BCRYPT_COST);
        let password = NewPassword::parse("020304").unwrap();
        let hash = hasher.hash(&password).await.unwrap();
        assert!(hasher.verify("020304", &hash).await);
        assert!(!hasher.verify("123456", &hash).await);
    }

    #[tokio::test]
    async fn malformed_hash_does_not_verify() {
        let hasher = PasswordHasher::new(MIN_BCRYPT_COST);
        let bogus = PasswordHash::try_new("not-a-bcrypt-hash".to_string()).unwrap();
        assert!(!hasher.verify("020304", &bogus).await);
    }

    #[test]
    fn cost_is_clamped_to_the_bcrypt_range() {
        assert_eq!(PasswordHasher::new(0).cost, MIN_BCRYPT_COST);
        assert_eq!(PasswordHasher::new(99).cost, MAX_BCRYPT_COST);
        assert_eq!(PasswordHasher::new(10).cost, 10);
    }
}
