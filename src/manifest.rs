//! Package manifest validation and dependency installation
//!
//! The clone must carry a parseable `package.json` before anything else
//! happens; its dependency tables later drive transpilation-preset
//! inference. Installation shells out to the package manager - a broken
//! third-party repository fails the whole compilation, with no retry.

use crate::constants;
use crate::error::PipelineError;
use crate::process::run_process;
use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed `package.json`, limited to the fields the pipeline consumes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    /// Inline transpiler configuration; its presence makes the build defer
    /// to the repository's own setup
    #[serde(default)]
    pub babel: Option<serde_json::Value>,
}

impl PackageManifest {
    /// Whether `package_name` appears in dependencies or devDependencies
    pub fn depends_on(&self, package_name: &str) -> bool {
        self.dependencies.contains_key(package_name)
            || self.dev_dependencies.contains_key(package_name)
    }
}

/// Validate that the repository root carries a parseable package manifest
pub fn validate_manifest(repo_path: &Path) -> Result<PackageManifest> {
    let manifest_path = repo_path.join(constants::manifest::MANIFEST_FILE);

    if !manifest_path.exists() {
        return Err(PipelineError::ManifestMissing(manifest_path).into());
    }

    let content = std::fs::read_to_string(&manifest_path).map_err(|err| {
        PipelineError::ManifestMalformed {
            path: manifest_path.clone(),
            reason: err.to_string(),
        }
    })?;

    let manifest = serde_json::from_str(&content).map_err(|err| {
        PipelineError::ManifestMalformed {
            path: manifest_path,
            reason: err.to_string(),
        }
    })?;

    Ok(manifest)
}

/// Install the repository's dependencies with the configured package
/// manager. Non-zero exit is fatal for the whole compilation.
pub async fn install_dependencies(repo_path: &Path, npm_binary: &str) -> Result<()> {
    let output = run_process(npm_binary, &["install"], repo_path, None, None).await?;

    if !output.success() {
        return Err(PipelineError::InstallFailed {
            exit_code: output.exit_code,
            stderr: output.stderr_text().to_string(),
        }
        .into());
    }

    Ok(())
}
