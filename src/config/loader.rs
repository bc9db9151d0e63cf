//! Configuration file loading
//!
//! `styledash.yaml` lists the repositories to compile and the pipeline
//! settings. Tokens can live in the file directly or be pulled from the
//! environment via `token_env`.

use super::Repository;
use crate::compiler::CompileOptions;
use crate::constants;
use crate::reconciler::ReconcileOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

fn default_pool_size() -> usize {
    num_cpus::get()
}

fn default_node_binary() -> String {
    constants::compiler::DEFAULT_NODE_BINARY.to_string()
}

fn default_npm_binary() -> String {
    constants::compiler::DEFAULT_NPM_BINARY.to_string()
}

fn default_child_timeout_secs() -> u64 {
    constants::compiler::DEFAULT_CHILD_TIMEOUT_SECS
}

fn default_jsonp_callback() -> String {
    constants::compiler::DEFAULT_JSONP_CALLBACK.to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> String {
    constants::config::DEFAULT_DATA_DIR.to_string()
}

/// Pipeline settings, all optional in the file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum concurrent build child processes
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Save/delete pool size during reconciliation
    #[serde(default = "default_pool_size")]
    pub reconcile_concurrency: usize,
    #[serde(default = "default_node_binary")]
    pub node_binary: String,
    #[serde(default = "default_npm_binary")]
    pub npm_binary: String,
    /// Per-build deadline in seconds; 0 disables the deadline
    #[serde(default = "default_child_timeout_secs")]
    pub child_timeout_secs: u64,
    #[serde(default = "default_jsonp_callback")]
    pub jsonp_callback: String,
    #[serde(default = "default_true")]
    pub delete_old_components: bool,
    /// Root directory of the file-backed component store
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Directory whose `node_modules` provides the bundler; defaults to the
    /// working directory
    #[serde(default)]
    pub bundler_root: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            reconcile_concurrency: default_pool_size(),
            node_binary: default_node_binary(),
            npm_binary: default_npm_binary(),
            child_timeout_secs: default_child_timeout_secs(),
            jsonp_callback: default_jsonp_callback(),
            delete_old_components: true,
            data_dir: default_data_dir(),
            bundler_root: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file.
    ///
    /// Validates every repository, rejects duplicate ids and names, and
    /// resolves `token_env` references against the environment.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {path}"))?;

        let mut seen_ids = HashSet::new();
        let mut seen_names = HashSet::new();
        for repo in &mut config.repositories {
            repo.validate()?;
            if !seen_ids.insert(repo.id.clone()) {
                anyhow::bail!("Duplicate repository id '{}'", repo.id);
            }
            if !seen_names.insert(repo.name.clone()) {
                anyhow::bail!("Duplicate repository name '{}'", repo.name);
            }
            if repo.access_token.is_empty()
                && let Some(var) = &repo.token_env
            {
                repo.access_token = std::env::var(var)
                    .with_context(|| format!("Repository '{}': {var} is not set", repo.name))?;
            }
        }

        Ok(config)
    }

    /// Get a repository by name or id
    pub fn get_repository(&self, name_or_id: &str) -> Option<&Repository> {
        self.repositories
            .iter()
            .find(|repo| repo.name == name_or_id || repo.id == name_or_id)
    }

    /// Repositories matching `names`, or all of them when `names` is empty
    pub fn filter_by_names(&self, names: &[String]) -> Vec<Repository> {
        if names.is_empty() {
            return self.repositories.clone();
        }
        self.repositories
            .iter()
            .filter(|repo| names.iter().any(|n| *n == repo.name || *n == repo.id))
            .cloned()
            .collect()
    }

    /// Compile options derived from the settings
    pub fn compile_options(&self) -> CompileOptions {
        let settings = &self.settings;
        CompileOptions {
            jsonp_callback: settings.jsonp_callback.clone(),
            pool_size: settings.pool_size,
            node_binary: settings.node_binary.clone(),
            npm_binary: settings.npm_binary.clone(),
            child_timeout: (settings.child_timeout_secs > 0)
                .then(|| Duration::from_secs(settings.child_timeout_secs)),
            bundler_root: settings
                .bundler_root
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| {
                    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
                }),
            on_component_compiled: None,
            on_component_failed: None,
        }
    }

    /// Reconcile options derived from the settings
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            delete_old_components: self.settings.delete_old_components,
            concurrency: self.settings.reconcile_concurrency,
            on_component_saved: None,
            on_component_to_be_deleted: None,
        }
    }
}
