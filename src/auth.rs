use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub jti: String, // JWT ID (unique per token)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub iss: String, // Issuer
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).context("Token subject is not a valid user id")
    }
}

/// Issues and verifies bearer tokens.
///
/// The WebSocket handshake and the REST extractor both call `verify_token`
/// on the same instance, so both paths accept exactly the same credentials.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl_hours: i64,
    issuer: String,
}

impl AuthManager {
    pub fn new(config: &Config) -> Result<Self> {
        if config.jwt_secret.trim().is_empty() {
            anyhow::bail!("No JWT configuration provided. Set JWT_SECRET");
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_token_ttl_hours: config.access_token_ttl_hours,
            issuer: config.jwt_issuer.clone(),
        })
    }

    /// Create access token
    pub fn create_token(&self, user_id: &Uuid) -> Result<(String, String, i64)> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.access_token_ttl_hours);
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            jti: jti.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")?;

        Ok((token, jti, exp.timestamp()))
    }

    /// Verify signature, expiry and issuer
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.clone()]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Token verification failed")?;

        Ok(token_data.claims)
    }

    /// Verify and return the bound subject as a user id
    pub fn authenticate(&self, token: &str) -> Result<Uuid> {
        self.verify_token(token)?.user_id()
    }
}
