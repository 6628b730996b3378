use std::sync::Arc;

use tracing::debug;

use super::{AdcCredentials, Credential, CredentialError, CredentialProvider, EnvCredentials};

/// The default lookup chain: an explicit token in the environment wins,
/// otherwise Application Default Credentials mint one.
#[derive(Clone)]
pub struct AmbientCredentials {
    env: EnvCredentials,
    fallback: Arc<dyn CredentialProvider>,
}

impl AmbientCredentials {
    /// Builds the chain for `audience` with default sources.
    pub fn new(audience: impl Into<String>) -> Result<Self, CredentialError> {
        Ok(Self::from_sources(
            EnvCredentials::default(),
            Arc::new(AdcCredentials::new(audience)?),
        ))
    }

    pub fn from_sources(env: EnvCredentials, fallback: Arc<dyn CredentialProvider>) -> Self {
        Self { env, fallback }
    }
}

#[async_trait::async_trait]
impl CredentialProvider for AmbientCredentials {
    async fn credential(&self) -> Result<Credential, CredentialError> {
        match self.env.credential().await {
            Ok(credential) => {
                debug!(var = self.env.var(), "Using token from environment");
                Ok(credential)
            }
            Err(CredentialError::NotConfigured(reason)) => {
                debug!(%reason, "Falling back to application default credentials");
                self.fallback.credential().await
            }
            Err(e) => Err(e),
        }
    }
}
