use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use async_trait::async_trait;
use rand::rngs::OsRng;
use tracing::debug;

use super::domain::AuthUser;
use super::errors::AuthError;

/// Checks a username/password pair against some user store.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> Result<AuthUser, AuthError>;
}

/// Single admin account whose password is kept as an argon2 PHC hash.
pub struct StaticCredentials {
    user: AuthUser,
    password_hash: String,
}

impl StaticCredentials {
    /// Hash `password` with a fresh salt.
    pub fn new(username: impl Into<String>, password: &str) -> Result<Self, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();
        Self::from_hash(username, hash)
    }

    /// Use an existing PHC string (e.g. `$argon2id$v=19$...`).
    pub fn from_hash(username: impl Into<String>, password_hash: String) -> Result<Self, AuthError> {
        PasswordHash::new(&password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        Ok(Self {
            user: AuthUser { id: "1".into(), username: username.into() },
            password_hash,
        })
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> Result<AuthUser, AuthError> {
        if username != self.user.username {
            debug!(%username, "unknown username");
            return Err(AuthError::Unauthorized);
        }
        let parsed = PasswordHash::new(&self.password_hash)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::Unauthorized)?;
        Ok(self.user.clone())
    }
}
