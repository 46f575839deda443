//! Configuration for the repo-content binary.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. A TOML file passed with `--config`
//! 3. Environment variables prefixed with `REPO_CONTENT` (`__` separates
//!    nesting, e.g. `REPO_CONTENT_SERVER__BIND=0.0.0.0:8080`)
//!
//! Repository credentials live in `[[repositories]]` entries; shared
//! credentials for every repository under a URL prefix live in
//! `[[credential_templates]]`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::context::RequestContext;
use crate::models::Repository;
use crate::resolver::{CredentialTemplate, RepositoryStore};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub request: RequestSettings,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub credential_templates: Vec<CredentialTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestSettings {
    /// Deadline applied by the CLI and HTTP callers; the facade adds none of its own
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl RequestSettings {
    pub fn context(&self) -> RequestContext {
        match self.timeout_secs {
            Some(secs) => RequestContext::with_timeout(Duration::from_secs(secs)),
            None => RequestContext::background(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`Settings::load`], reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder().set_default("server.bind", "127.0.0.1:3001")?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("REPO_CONTENT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder.build()?.try_deserialize()
    }

    pub fn repository_store(&self) -> RepositoryStore {
        RepositoryStore::new(self.repositories.clone(), self.credential_templates.clone())
    }
}
