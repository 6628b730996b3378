use google_cloud_auth::credentials::idtoken::{Builder, IDTokenCredentials};
use tracing::debug;

use super::{Credential, CredentialError, CredentialProvider};

/// Identity tokens for an audience from Application Default Credentials.
///
/// ADC covers a service-account key named by `GOOGLE_APPLICATION_CREDENTIALS`,
/// gcloud user and impersonated credentials, and the metadata server on
/// Cloud Run, GCE and GKE. Token caching and refresh happen inside
/// `google-cloud-auth`; the expiry reported here comes from the token's
/// `exp` claim.
#[derive(Clone)]
pub struct AdcCredentials {
    audience: String,
    inner: IDTokenCredentials,
}

impl AdcCredentials {
    pub fn new(audience: impl Into<String>) -> Result<Self, CredentialError> {
        let audience = audience.into();
        let inner = Builder::new(audience.as_str())
            .build()
            .map_err(|e| CredentialError::Adc(Box::new(e)))?;
        Ok(Self { audience, inner })
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }
}

#[async_trait::async_trait]
impl CredentialProvider for AdcCredentials {
    #[tracing::instrument(skip(self), fields(audience = %self.audience))]
    async fn credential(&self) -> Result<Credential, CredentialError> {
        let token = self
            .inner
            .id_token()
            .await
            .map_err(|e| CredentialError::Adc(Box::new(e)))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::EmptyToken);
        }

        let credential = Credential::from_jwt(token);
        debug!(expires_at = ?credential.expires_at(), "Identity token issued");
        Ok(credential)
    }
}
