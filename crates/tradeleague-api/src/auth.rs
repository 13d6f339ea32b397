//! Bearer authentication
//!
//! Users present an HS256 JWT whose `sub` is their account UUID. Scheduled
//! jobs present a shared cron secret, compared in constant time.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tradeleague_types::AccountId;

use crate::error::{ApiError, ApiResult};

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret shared with the identity provider
    pub jwt_secret: String,
    /// Expected `iss`, if any
    #[serde(default)]
    pub issuer: Option<String>,
    /// Expected `aud`, if any
    #[serde(default)]
    pub audience: Option<String>,
    /// Bearer secret for the job endpoints
    pub cron_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            issuer: None,
            audience: None,
            cron_secret: "change-me-cron".to_string(),
        }
    }
}

/// Claims carried by a user token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account UUID
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Identity resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub account_id: AccountId,
    pub username: String,
}

/// JWT verifier for user requests
#[derive(Clone)]
pub struct JwtVerifier {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtVerifier {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Verify a token and resolve the account it names
    pub fn verify(&self, token: &str) -> ApiResult<VerifiedIdentity> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &self.config.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }
        validation.validate_exp = true;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;
        let account_id = AccountId::parse(&claims.sub).map_err(|_| ApiError::InvalidToken)?;
        let username = claims
            .username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("trader-{}", &claims.sub[..8.min(claims.sub.len())]));

        Ok(VerifiedIdentity { account_id, username })
    }

    /// Issue a token for `account_id`; used by local tooling and tests
    pub fn issue(&self, account_id: AccountId, username: &str, ttl: Duration) -> ApiResult<String> {
        let claims = Claims {
            sub: account_id.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
            username: Some(username.to_string()),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode token");
            ApiError::Internal
        })
    }

    /// Check a presented cron secret
    pub fn verify_cron_secret(&self, presented: &str) -> bool {
        constant_time_eq(presented, &self.config.cron_secret)
    }
}

/// Constant-time string comparison
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Strip a `Bearer ` prefix
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
