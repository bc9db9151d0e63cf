//! Repository descriptors

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A GitHub-hosted component library registered for compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Stable identifier used as the persistence and queue key
    pub id: String,
    pub name: String,
    pub github_username: String,
    pub github_repo: String,
    /// Access token embedded in the clone URL; never logged
    #[serde(default)]
    pub access_token: String,
    /// Environment variable consulted when `access_token` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    /// Full clone URL override for repositories not hosted on github.com
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_url: Option<String>,
}

impl Repository {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        github_username: impl Into<String>,
        github_repo: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            github_username: github_username.into(),
            github_repo: github_repo.into(),
            access_token: String::new(),
            token_env: None,
            clone_url: None,
        }
    }

    /// Authenticated clone URL.
    ///
    /// Embeds the access token - callers must never log or display the
    /// returned string.
    pub fn clone_url(&self) -> String {
        if let Some(url) = &self.clone_url {
            return url.clone();
        }
        if self.access_token.is_empty() {
            format!(
                "https://github.com/{}/{}.git",
                self.github_username, self.github_repo
            )
        } else {
            format!(
                "https://{}@github.com/{}/{}.git",
                self.access_token, self.github_username, self.github_repo
            )
        }
    }

    /// Validate the descriptor fields
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            anyhow::bail!("Repository id cannot be empty");
        }
        if self.name.trim().is_empty() {
            anyhow::bail!("Repository '{}' has an empty name", self.id);
        }
        if self.github_username.trim().is_empty() || self.github_repo.trim().is_empty() {
            anyhow::bail!(
                "Repository '{}' must name its GitHub owner and repo",
                self.name
            );
        }
        Ok(())
    }
}
