//! End-to-end repository compilation
//!
//! Sequences clone -> revision -> manifest -> install -> discover -> compile.
//! Every step is fatal on failure and the disposable clone is removed on
//! every exit path, success or error.

use crate::Result;
use crate::compiler::{CompileOptions, CompiledComponent, compile_all};
use crate::config::Repository;
use crate::discovery::discover_components;
use crate::git::{Logger, clone_repository, resolve_head_commit};
use crate::manifest::{install_dependencies, validate_manifest};
use std::path::Path;

/// Result of one successful repository compilation
#[derive(Debug)]
pub struct CompiledRepo {
    pub commit_hash: String,
    /// The successfully compiled subset of the discovered components
    pub components: Vec<CompiledComponent>,
}

/// Compile a configured repository from its authenticated clone URL.
pub async fn compile_repository(
    repo: &Repository,
    options: &CompileOptions,
) -> Result<CompiledRepo> {
    compile_repository_from_url(&repo.name, &repo.clone_url(), options).await
}

/// Compile the repository at `clone_url`.
///
/// The URL may embed credentials and is never logged. The clone directory is
/// cleaned up whether the pipeline succeeds or fails.
pub async fn compile_repository_from_url(
    repo_name: &str,
    clone_url: &str,
    options: &CompileOptions,
) -> Result<CompiledRepo> {
    let logger = Logger;
    logger.info(repo_name, "Cloning repository");
    let mut clone = clone_repository(clone_url).await?;

    let result = compile_clone(repo_name, clone.root(), options).await;
    clone.cleanup();

    match &result {
        Ok(compiled) => {
            let short_hash = &compiled.commit_hash[..compiled.commit_hash.len().min(12)];
            logger.success(
                repo_name,
                &format!(
                    "Compiled {} components at {}",
                    compiled.components.len(),
                    short_hash
                ),
            );
        }
        Err(err) => logger.error(repo_name, &format!("Compilation failed: {err:#}")),
    }

    result
}

async fn compile_clone(
    repo_name: &str,
    root: &Path,
    options: &CompileOptions,
) -> Result<CompiledRepo> {
    let logger = Logger;

    let commit_hash = resolve_head_commit(root).await?;
    let manifest = validate_manifest(root)?;

    logger.info(repo_name, "Installing dependencies");
    install_dependencies(root, &options.npm_binary).await?;

    let parsed = discover_components(root)?;
    logger.info(
        repo_name,
        &format!("Discovered {} candidate components", parsed.len()),
    );

    let components = compile_all(repo_name, root, &manifest, parsed, options).await?;

    Ok(CompiledRepo {
        commit_hash,
        components,
    })
}
