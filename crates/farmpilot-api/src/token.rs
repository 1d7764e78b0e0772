use anyhow::{Context, Result, anyhow};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use farmpilot_types::api::Claims;

/// Signing configuration for bearer tokens. One process-wide secret;
/// rotating it invalidates every outstanding token, which is the only
/// revocation mechanism there is.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    algorithm: Algorithm,
    ttl_minutes: i64,
}

impl TokenConfig {
    pub fn new(secret: String, algorithm: Algorithm, ttl_minutes: i64) -> Self {
        Self {
            secret,
            algorithm,
            ttl_minutes,
        }
    }

    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("FARMPILOT_SECRET_KEY")
            .unwrap_or_else(|_| "dev-secret-change-me".into());

        let algorithm = match std::env::var("FARMPILOT_TOKEN_ALGORITHM") {
            Ok(name) => name
                .parse()
                .map_err(|_| anyhow!("Unrecognized FARMPILOT_TOKEN_ALGORITHM: {}", name))?,
            Err(_) => Algorithm::HS256,
        };

        let ttl_minutes = match std::env::var("FARMPILOT_TOKEN_TTL_MINUTES") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("Bad FARMPILOT_TOKEN_TTL_MINUTES: {}", raw))?,
            Err(_) => 30,
        };

        Ok(Self::new(secret, algorithm, ttl_minutes))
    }

    /// Issue a token for `subject` with the configured default ttl.
    pub fn issue(&self, subject: &str) -> Result<String> {
        self.issue_with_ttl(subject, Duration::minutes(self.ttl_minutes))
    }

    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: (Utc::now() + ttl).timestamp() as usize,
        };

        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    /// Validate signature and expiry. Expiry is a hard cutoff with zero
    /// leeway.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenConfig {
        TokenConfig::new("test-secret".into(), Algorithm::HS256, 30)
    }

    #[test]
    fn issue_then_verify_recovers_subject() {
        let tokens = config();
        let token = tokens.issue("a@x.com").unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = config();
        let token = tokens
            .issue_with_ttl("a@x.com", Duration::seconds(-5))
            .unwrap();

        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn zero_ttl_token_is_rejected_once_the_instant_passes() {
        let tokens = config();
        let token = tokens.issue_with_ttl("a@x.com", Duration::zero()).unwrap();

        // exp is truncated to whole seconds; one tick later it is past.
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = config().issue("a@x.com").unwrap();
        let other = TokenConfig::new("other-secret".into(), Algorithm::HS256, 30);

        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(config().verify("not.a.jwt").is_err());
    }
}
