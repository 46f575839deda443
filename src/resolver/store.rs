//! In-memory repository credential store.
//!
//! Built once from configuration and read-only afterwards, so a single store
//! can back any number of concurrent resolutions.
//!
//! Lookup order:
//! 1. Exact repository entry, keyed by normalized URL
//! 2. Longest credential template whose URL prefix matches
//! 3. `ResolveError::NotFound`

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

use crate::context::RequestContext;
use crate::error::ResolveError;
use crate::models::Repository;
use crate::resolver::RepositoryResolver;

/// Credentials shared by every repository under a URL prefix.
#[derive(Clone, Default, Deserialize)]
pub struct CredentialTemplate {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ssh_private_key: Option<String>,
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub proxy: Option<String>,
}

impl CredentialTemplate {
    fn apply(&self, repo_url: &str) -> Repository {
        Repository {
            url: repo_url.to_string(),
            username: self.username.clone(),
            password: self.password.clone(),
            ssh_private_key: self.ssh_private_key.clone(),
            insecure: self.insecure,
            proxy: self.proxy.clone(),
            local_path: None,
        }
    }
}

impl fmt::Debug for CredentialTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialTemplate")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "ssh_private_key",
                &self.ssh_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("insecure", &self.insecure)
            .field("proxy", &self.proxy)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct RepositoryStore {
    repositories: HashMap<String, Repository>,
    /// Sorted longest prefix first
    templates: Vec<(String, CredentialTemplate)>,
}

impl RepositoryStore {
    pub fn new(repositories: Vec<Repository>, templates: Vec<CredentialTemplate>) -> Self {
        let repositories = repositories
            .into_iter()
            .map(|repo| (normalize_git_url(&repo.url), repo))
            .collect();

        let mut templates: Vec<(String, CredentialTemplate)> = templates
            .into_iter()
            .map(|t| (normalize_git_url(&t.url), t))
            .collect();
        templates.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            repositories,
            templates,
        }
    }

    pub fn get_repository(&self, repo_url: &str) -> Option<Repository> {
        let key = normalize_git_url(repo_url);

        if let Some(repo) = self.repositories.get(&key) {
            return Some(repo.clone());
        }

        self.templates
            .iter()
            .find(|(prefix, _)| covers(prefix, &key))
            .map(|(_, template)| template.apply(repo_url))
    }

    pub fn list_repositories(&self) -> Vec<&Repository> {
        let mut repos: Vec<&Repository> = self.repositories.values().collect();
        repos.sort_by(|a, b| a.url.cmp(&b.url));
        repos
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

#[async_trait]
impl RepositoryResolver for RepositoryStore {
    async fn resolve(&self, ctx: &RequestContext, repo_url: &str) -> Result<Repository, ResolveError> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        let repo = self
            .get_repository(repo_url)
            .ok_or_else(|| ResolveError::NotFound(repo_url.to_string()))?;

        tracing::debug!(
            url = %repo.url,
            credentials = repo.has_credentials(),
            "Resolved repository"
        );
        Ok(repo)
    }
}

/// A template covers a URL when its prefix ends on a path boundary of it, so
/// `https://example.com/org` covers `.../org/repo` but not `.../organization/repo`.
fn covers(prefix: &str, key: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    match key.strip_prefix(prefix) {
        Some(rest) => {
            rest.is_empty() || rest.starts_with(['/', ':']) || prefix.ends_with(['/', ':'])
        }
        None => false,
    }
}

/// Canonical form used for lookups: trimmed, lowercased, without a trailing
/// `/` or `.git`.
pub fn normalize_git_url(url: &str) -> String {
    let mut normalized = url.trim().to_lowercase();
    while normalized.ends_with('/') {
        normalized.pop();
    }
    if let Some(stripped) = normalized.strip_suffix(".git") {
        normalized.truncate(stripped.len());
    }
    normalized
}
