//! Credential retrieval
//!
//! Credentials are fetched once per invocation, before any browser exists, and
//! are handed to the login strategy which consumes them. They are never logged.

use crate::error::{NavError, Result};
use serde::Deserialize;
use std::{fmt,
          path::{Path, PathBuf}};

/// Login identifier and secret
#[derive(Deserialize)]
pub struct Credentials {
    #[serde(rename = "username")]
    identifier: String,
    #[serde(rename = "password")]
    secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), secret: secret.into() }
    }

    /// Parse the `{"username": .., "password": ..}` secret payload
    pub fn from_json(payload: &str) -> Result<Self> {
        let credentials: Credentials = serde_json::from_str(payload)
            .map_err(|e| NavError::SecretRetrievalFailure(format!("Malformed secret payload: {}", e)))?;
        if credentials.identifier.is_empty() {
            return Err(NavError::SecretRetrievalFailure("Secret payload has an empty username".to_string()));
        }
        Ok(credentials)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Consume into `(identifier, secret)`
    pub fn into_parts(self) -> (String, String) {
        (self.identifier, self.secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Source of login credentials
pub trait SecretStore {
    /// Fetch the credentials stored under `secret_id` in `region`
    fn get_credentials(&self, secret_id: &str, region: &str) -> Result<Credentials>;
}

impl<T: SecretStore + ?Sized> SecretStore for Box<T> {
    fn get_credentials(&self, secret_id: &str, region: &str) -> Result<Credentials> {
        (**self).get_credentials(secret_id, region)
    }
}

/// Reads `<root>/<region>/<secret-id>.json`
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, secret_id: &str, region: &str) -> PathBuf {
        self.root.join(region).join(format!("{}.json", secret_id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SecretStore for FileSecretStore {
    fn get_credentials(&self, secret_id: &str, region: &str) -> Result<Credentials> {
        if secret_id.split('/').any(|part| part == "..") {
            return Err(NavError::SecretRetrievalFailure(format!("Invalid secret id: {}", secret_id)));
        }

        let path = self.path_for(secret_id, region);
        log::debug!("Reading secret '{}' from {}", secret_id, path.display());
        let payload = std::fs::read_to_string(&path)
            .map_err(|e| NavError::SecretRetrievalFailure(format!("Cannot read {}: {}", path.display(), e)))?;
        Credentials::from_json(&payload)
    }
}

/// Reads the JSON payload from an environment variable, ignoring id and region
#[derive(Debug, Clone)]
pub struct EnvSecretStore {
    variable: String,
}

impl EnvSecretStore {
    pub fn new(variable: impl Into<String>) -> Self {
        Self { variable: variable.into() }
    }
}

impl SecretStore for EnvSecretStore {
    fn get_credentials(&self, secret_id: &str, _region: &str) -> Result<Credentials> {
        let payload = std::env::var(&self.variable).map_err(|e| {
            NavError::SecretRetrievalFailure(format!("{} (for '{}') not available: {}", self.variable, secret_id, e))
        })?;
        Credentials::from_json(&payload)
    }
}

/// Fixed credentials, or a fixed failure
#[derive(Debug, Clone)]
pub struct StaticSecretStore {
    payload: std::result::Result<(String, String), String>,
}

impl StaticSecretStore {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { payload: Ok((identifier.into(), secret.into())) }
    }

    /// A store whose every lookup fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self { payload: Err(reason.into()) }
    }
}

impl SecretStore for StaticSecretStore {
    fn get_credentials(&self, _secret_id: &str, _region: &str) -> Result<Credentials> {
        match &self.payload {
            Ok((identifier, secret)) => Ok(Credentials::new(identifier.clone(), secret.clone())),
            Err(reason) => Err(NavError::SecretRetrievalFailure(reason.clone())),
        }
    }
}
