use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use tracing::{info, instrument, warn};

use super::credentials::CredentialVerifier;
use super::domain::{AuthSession, Claims, LoginInput};
use super::errors::AuthError;

/// Session token configuration
#[derive(Clone)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub session_ttl: chrono::Duration,
}

/// Login and token verification, independent of the web framework.
#[derive(Clone)]
pub struct AuthService {
    verifier: Arc<dyn CredentialVerifier>,
    cfg: SessionConfig,
}

impl AuthService {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, cfg: SessionConfig) -> Self {
        Self { verifier, cfg }
    }

    /// Check credentials and issue an HS256 session token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, SessionConfig}, StaticCredentials};
    /// use service::auth::domain::LoginInput;
    /// use std::sync::Arc;
    /// let creds = Arc::new(StaticCredentials::new("admin", "admin123").unwrap());
    /// let svc = AuthService::new(creds, SessionConfig { jwt_secret: "secret".into(), session_ttl: chrono::Duration::days(7) });
    /// let session = tokio_test::block_on(svc.login(LoginInput { username: "admin".into(), password: "admin123".into() })).unwrap();
    /// assert_eq!(session.user.username, "admin");
    /// assert!(svc.verify_token(&session.token).is_ok());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = match self.verifier.verify(&input.username, &input.password).await {
            Ok(user) => user,
            Err(e) => {
                warn!(code = e.code(), "login rejected");
                return Err(e);
            }
        };

        let now = chrono::Utc::now();
        let exp = (now + self.cfg.session_ttl).timestamp();
        let claims = Claims { sub: user.username.clone(), uid: user.id.clone(), iat: now.timestamp(), exp };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;

        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token, expires_at: exp })
    }

    /// Decode and validate a session token (signature and expiry).
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let key = DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredentials;

    fn service(secret: &str, ttl: chrono::Duration) -> AuthService {
        let creds = Arc::new(StaticCredentials::new("admin", "admin123").unwrap());
        AuthService::new(creds, SessionConfig { jwt_secret: secret.into(), session_ttl: ttl })
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() -> Result<(), anyhow::Error> {
        let svc = service("s3cret", chrono::Duration::days(7));
        let session = svc
            .login(LoginInput { username: "admin".into(), password: "admin123".into() })
            .await?;
        let claims = svc.verify_token(&session.token)?;
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp, session.expires_at);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let svc = service("s3cret", chrono::Duration::days(7));
        let res = svc.login(LoginInput { username: "admin".into(), password: "nope".into() }).await;
        assert!(matches!(res, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn token_from_other_secret_or_expired_is_rejected() -> Result<(), anyhow::Error> {
        let a = service("secret-a", chrono::Duration::days(7));
        let b = service("secret-b", chrono::Duration::days(7));
        let session = a.login(LoginInput { username: "admin".into(), password: "admin123".into() }).await?;
        assert!(matches!(b.verify_token(&session.token), Err(AuthError::TokenError(_))));

        // Past the default 60s leeway.
        let expired = service("secret-a", chrono::Duration::seconds(-120));
        let session = expired.login(LoginInput { username: "admin".into(), password: "admin123".into() }).await?;
        assert!(matches!(expired.verify_token(&session.token), Err(AuthError::TokenError(_))));
        Ok(())
    }
}
