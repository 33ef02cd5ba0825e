//! JWT decoding/verification.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradepost_core::UserId;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token could not be decoded: {0}")]
    Decode(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies a bearer token and produces validated claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// Wire-level claim layout (registered claim names, unix seconds).
#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: UserId,
    iat: i64,
    exp: i64,
}

/// HS256 symmetric-key validator.
pub struct Hs256JwtValidator {
    decoding: DecodingKey,
    encoding: EncodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            decoding: DecodingKey::from_secret(&secret),
            encoding: EncodingKey::from_secret(&secret),
        }
    }

    /// Issue a token for `sub`. Used by dev tooling and tests; production
    /// deployments are expected to receive tokens from an external issuer.
    pub fn issue(
        &self,
        sub: UserId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let wire = WireClaims {
            sub,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &wire, &self.encoding)
            .map_err(|e| JwtError::Decode(e.to_string()))
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time-window checks are done on the decoded claims below, against
        // the caller-supplied `now`.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding, &validation)
            .map_err(|e| JwtError::Decode(e.to_string()))?;

        let claims = JwtClaims {
            sub: data.claims.sub,
            issued_at: timestamp(data.claims.iat)?,
            expires_at: timestamp(data.claims.exp)?,
        };

        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, JwtError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| JwtError::Decode(format!("timestamp out of range: {secs}")))
}
