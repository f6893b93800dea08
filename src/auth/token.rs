use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::AuthError;
use crate::config::Config;

const DEV_SECRET: &str = "doc-collab-dev-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidSubject)
    }
}

/// Issues and validates HS256 tokens.
#[derive(Clone)]
pub struct JwtAuthenticator {
    secret: String,
    issuer: String,
    ttl: Duration,
}

impl JwtAuthenticator {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let secret = match &config.auth_jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                if config.is_development() {
                    warn!("No JWT secret configured, using the development secret");
                } else {
                    error!("No JWT secret configured outside development, using the development secret");
                }
                DEV_SECRET.to_string()
            }
        };
        Self::new(secret, config.auth_jwt_issuer.clone(), Duration::hours(config.auth_jwt_exp_hours))
    }

    pub fn generate_token(&self, user_id: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))?)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        Ok(decode::<Claims>(token, &decoding_key, &validation)?.claims)
    }
}
