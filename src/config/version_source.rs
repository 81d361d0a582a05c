//! Remote package manifest location
//!
//! The published package version is read from a `package.json` hosted on a
//! raw source-file host. The location is resolved in priority order:
//! 1. `LASEREYES_VERSION_URL` - full URL, used verbatim
//! 2. `LASEREYES_VERSION_OWNER` / `LASEREYES_VERSION_REPO` / `LASEREYES_VERSION_BRANCH`
//! 3. Built-in defaults pointing at the upstream monorepo
//!
//! # Examples
//!
//! ```bash
//! # Track a fork's development branch
//! export LASEREYES_VERSION_OWNER="my-org"
//! export LASEREYES_VERSION_BRANCH="dev"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable names
mod env_vars {
    pub const VERSION_URL: &str = "LASEREYES_VERSION_URL";
    pub const VERSION_OWNER: &str = "LASEREYES_VERSION_OWNER";
    pub const VERSION_REPO: &str = "LASEREYES_VERSION_REPO";
    pub const VERSION_BRANCH: &str = "LASEREYES_VERSION_BRANCH";
}

/// Upstream defaults
pub mod defaults {
    pub const BASE_URL: &str = "https://raw.githubusercontent.com";
    pub const OWNER: &str = "omnisat";
    pub const REPO: &str = "lasereyes-mono";
    pub const BRANCH: &str = "main";
    pub const PACKAGE_PATH: &str = "packages/lasereyes/package.json";
}

/// Location of the remote `package.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionSource {
    /// Raw file host
    pub base_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Path of the manifest inside the repository
    pub package_path: String,
    /// Full URL that bypasses the fields above
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_override: Option<String>,
}

impl VersionSource {
    /// Build the source from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut source = Self::default();

        if let Ok(url) = std::env::var(env_vars::VERSION_URL) {
            tracing::debug!("Using LASEREYES_VERSION_URL for package manifest");
            source.url_override = Some(url);
            return source;
        }

        if let Ok(owner) = std::env::var(env_vars::VERSION_OWNER) {
            source.owner = owner;
        }
        if let Ok(repo) = std::env::var(env_vars::VERSION_REPO) {
            source.repo = repo;
        }
        if let Ok(branch) = std::env::var(env_vars::VERSION_BRANCH) {
            source.branch = branch;
        }

        source
    }

    /// Point the source at a different host (mirrors, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve the manifest URL
    pub fn url(&self) -> Result<Url> {
        let raw = match &self.url_override {
            Some(url) => url.clone(),
            None => format!(
                "{}/{}/{}/{}/{}",
                self.base_url.trim_end_matches('/'),
                self.owner,
                self.repo,
                self.branch,
                self.package_path.trim_start_matches('/')
            ),
        };

        Url::parse(&raw).map_err(|e| Error::Config(format!("Invalid version URL {}: {}", raw, e)))
    }
}

impl Default for VersionSource {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            owner: defaults::OWNER.to_string(),
            repo: defaults::REPO.to_string(),
            branch: defaults::BRANCH.to_string(),
            package_path: defaults::PACKAGE_PATH.to_string(),
            url_override: None,
        }
    }
}
