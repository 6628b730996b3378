use std::fmt;
use std::sync::Arc;

use super::{Credential, CredentialError, CredentialProvider};

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads a pre-minted bearer token from an environment variable.
#[derive(Clone)]
pub struct EnvCredentials {
    var: String,
    lookup: Lookup,
}

impl EnvCredentials {
    pub const DEFAULT_VAR: &'static str = "IDENTITY_TOKEN";

    pub fn from_var(var: impl Into<String>) -> Self {
        Self::with_lookup(var, |name| std::env::var(name).ok())
    }

    /// Resolves `var` through `lookup` instead of the process environment.
    pub fn with_lookup(
        var: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            var: var.into(),
            lookup: Arc::new(lookup),
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::from_var(Self::DEFAULT_VAR)
    }
}

impl fmt::Debug for EnvCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredentials")
            .field("var", &self.var)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl CredentialProvider for EnvCredentials {
    async fn credential(&self) -> Result<Credential, CredentialError> {
        match (self.lookup)(&self.var) {
            Some(token) if !token.trim().is_empty() => Ok(Credential::from_jwt(token.trim())),
            Some(_) => Err(CredentialError::NotConfigured(format!("{} is empty", self.var))),
            None => Err(CredentialError::NotConfigured(format!("{} is not set", self.var))),
        }
    }
}
