//! Bearer credentials from the ambient environment.
//!
//! [`CredentialProvider`] is the async seam callers depend on.
//! [`EnvCredentials`] reads a pre-minted token from an environment variable,
//! [`AdcCredentials`] mints identity tokens through Application Default
//! Credentials, and [`AmbientCredentials`] chains the two.

mod adc;
mod ambient;
mod env;

pub use adc::AdcCredentials;
pub use ambient::AmbientCredentials;
pub use env::EnvCredentials;

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use thiserror::Error;

/// An opaque bearer token with an optional expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// A token that never expires.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Wraps a JWT, reading the expiry from its `exp` claim when present.
    pub fn from_jwt(token: impl Into<String>) -> Self {
        let token = token.into();
        let expires_at = jwt_expiry(&token);
        Self { token, expires_at }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_within(TimeDelta::zero())
    }

    /// `true` if the credential is expired or will be within `margin`.
    pub fn expires_within(&self, margin: TimeDelta) -> bool {
        self.expires_at
            .is_some_and(|at| at <= Utc::now() + margin)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct JwtClaims {
    exp: Option<i64>,
}

fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: JwtClaims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Failure to obtain a credential from the environment.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no ambient credential configured: {0}")]
    NotConfigured(String),

    #[error("application default credentials failed: {0}")]
    Adc(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("credential source returned an empty token")]
    EmptyToken,
}

/// Resolves a bearer credential. Passed explicitly to whatever needs one.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credential(&self) -> Result<Credential, CredentialError>;
}

/// Always returns the same credential.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credential);

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Credential::new(token))
    }
}

#[async_trait::async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credential(&self) -> Result<Credential, CredentialError> {
        if self.0.token().trim().is_empty() {
            return Err(CredentialError::NotConfigured(
                "static token is blank".to_string(),
            ));
        }
        Ok(self.0.clone())
    }
}
