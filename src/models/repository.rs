//! Repository descriptor DTO.
//!
//! A `Repository` is what a resolver hands back for a repository URL: the
//! URL itself plus whatever the content backend needs to reach it.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ssh_private_key: Option<String>,
    /// Skip TLS verification when the backend talks to the remote
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub proxy: Option<String>,
    /// Local checkout the backend may read from instead of the remote
    #[serde(default)]
    pub local_path: Option<PathBuf>,
}

impl Repository {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.password.is_some() || self.ssh_private_key.is_some()
    }
}

// Secrets never end up in logs or error messages.
impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "ssh_private_key",
                &self.ssh_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("insecure", &self.insecure)
            .field("proxy", &self.proxy)
            .field("local_path", &self.local_path)
            .finish()
    }
}
