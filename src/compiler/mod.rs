//! Component compilation through isolated bundler child processes
//!
//! Each discovered component becomes one child-process build: a generated
//! single-entry bundler configuration, executed by the checked-in build
//! worker against the host's own bundler installation, producing the wrapped
//! bundle on stdout. A bounded pool runs the builds; one component failing
//! never stops the others.

use crate::discovery::{ComponentDoc, ParsedComponent};
use crate::git::Logger;
use crate::manifest::PackageManifest;
use crate::pool::run_bounded;
use crate::process::run_process;
use crate::utils::get_exit_code_description;
use crate::{Result, constants};
use anyhow::{Context, bail};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// The standalone build worker, materialized into the clone's scratch
/// directory before the first build
const BUILD_WORKER_SOURCE: &str = include_str!("build_worker.js");

pub type ComponentCompiledCallback = Arc<dyn Fn(&CompiledComponent) + Send + Sync>;
pub type ComponentFailedCallback = Arc<dyn Fn(&ParsedComponent, &anyhow::Error) + Send + Sync>;

/// Settings for one repository compilation run
#[derive(Clone)]
pub struct CompileOptions {
    /// Global callback name compiled bundles invoke with `(key, module)`
    pub jsonp_callback: String,
    /// Maximum concurrent build child processes
    pub pool_size: usize,
    pub node_binary: String,
    pub npm_binary: String,
    /// Per-build deadline; a build exceeding it is killed and counted as
    /// that component's failure
    pub child_timeout: Option<Duration>,
    /// Directory whose `node_modules` provides the bundler for the worker
    pub bundler_root: PathBuf,
    /// Invoked once per successful build, in completion order
    pub on_component_compiled: Option<ComponentCompiledCallback>,
    /// Invoked once per failed build
    pub on_component_failed: Option<ComponentFailedCallback>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            jsonp_callback: constants::compiler::DEFAULT_JSONP_CALLBACK.to_string(),
            pool_size: num_cpus::get(),
            node_binary: constants::compiler::DEFAULT_NODE_BINARY.to_string(),
            npm_binary: constants::compiler::DEFAULT_NPM_BINARY.to_string(),
            child_timeout: Some(Duration::from_secs(
                constants::compiler::DEFAULT_CHILD_TIMEOUT_SECS,
            )),
            bundler_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            on_component_compiled: None,
            on_component_failed: None,
        }
    }
}

impl std::fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOptions")
            .field("jsonp_callback", &self.jsonp_callback)
            .field("pool_size", &self.pool_size)
            .field("node_binary", &self.node_binary)
            .field("npm_binary", &self.npm_binary)
            .field("child_timeout", &self.child_timeout)
            .field("bundler_root", &self.bundler_root)
            .finish()
    }
}

/// A component and its finished bundle
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledComponent {
    pub name: String,
    pub filepath: PathBuf,
    pub relative_filepath: String,
    pub doc: ComponentDoc,
    /// Fully bundled module text, wrapped for script-tag loading
    pub compiled_bundle: String,
}

/// Infer transpilation presets from the manifest, or `None` to defer
/// entirely to the repository's own transpiler configuration.
pub fn infer_babel_presets(repo_root: &Path, manifest: &PackageManifest) -> Option<Vec<String>> {
    if manifest.babel.is_some() {
        return None;
    }
    for config_file in constants::compiler::TRANSPILER_CONFIG_FILES {
        if repo_root.join(config_file).exists() {
            return None;
        }
    }

    let mut presets: Vec<String> = Vec::new();
    for (package, preset) in constants::compiler::PRESET_PACKAGES {
        if manifest.depends_on(package) && !presets.iter().any(|existing| existing == preset) {
            presets.push((*preset).to_string());
        }
    }
    Some(presets)
}

/// Single-entry bundler configuration handed to the build worker
fn bundler_config(
    repo_root: &Path,
    component: &ParsedComponent,
    presets: &Option<Vec<String>>,
    options: &CompileOptions,
) -> serde_json::Value {
    json!({
        "entryPath": component.filepath,
        "repoRoot": repo_root,
        "componentKey": component.relative_filepath,
        "callbackName": options.jsonp_callback,
        "babelPresets": presets,
        "bundlerRoot": options.bundler_root,
    })
}

/// Compile a single component through the build worker
async fn compile_component(
    repo_root: &Path,
    scratch_dir: &Path,
    worker_script: &Path,
    presets: &Option<Vec<String>>,
    component: &ParsedComponent,
    options: &CompileOptions,
) -> Result<CompiledComponent> {
    let config = bundler_config(repo_root, component, presets, options);
    let config_path = scratch_dir.join(format!("{}.json", Uuid::new_v4()));
    std::fs::write(&config_path, serde_json::to_vec(&config)?)
        .with_context(|| format!("Failed to write build config for {}", component.name))?;

    let worker_arg = worker_script.display().to_string();
    let config_arg = config_path.display().to_string();
    let result = run_process(
        &options.node_binary,
        &[worker_arg.as_str(), config_arg.as_str()],
        repo_root,
        None,
        options.child_timeout,
    )
    .await;
    let _ = std::fs::remove_file(&config_path);
    let output = result?;

    if !output.success() {
        bail!(
            "Build exited with code {} ({}): {}",
            output.exit_code,
            get_exit_code_description(output.exit_code),
            output.stderr_text()
        );
    }
    let Some(compiled_bundle) = output.stdout else {
        bail!("Build produced no output");
    };

    Ok(CompiledComponent {
        name: component.name.clone(),
        filepath: component.filepath.clone(),
        relative_filepath: component.relative_filepath.clone(),
        doc: component.doc.clone(),
        compiled_bundle,
    })
}

/// Compile every discovered component under a bounded pool.
///
/// A failed build is reported through the failure callback and the log, then
/// dropped from the result; the remaining components keep compiling. The
/// returned set is therefore a subset of `components`, in completion order.
pub async fn compile_all(
    repo_name: &str,
    repo_root: &Path,
    manifest: &PackageManifest,
    components: Vec<ParsedComponent>,
    options: &CompileOptions,
) -> Result<Vec<CompiledComponent>> {
    if components.is_empty() {
        return Ok(Vec::new());
    }

    let scratch_dir = repo_root.join(constants::compiler::BUILD_SCRATCH_DIR);
    std::fs::create_dir_all(&scratch_dir).context("Failed to create build scratch directory")?;
    let worker_script = scratch_dir.join("build_worker.js");
    std::fs::write(&worker_script, BUILD_WORKER_SOURCE)
        .context("Failed to materialize build worker")?;

    let presets = infer_babel_presets(repo_root, manifest);
    let logger = Logger;

    let results = run_bounded(options.pool_size, components, |component| {
        let scratch_dir = &scratch_dir;
        let worker_script = &worker_script;
        let presets = &presets;
        let logger = &logger;
        async move {
            match compile_component(
                repo_root,
                scratch_dir,
                worker_script,
                presets,
                &component,
                options,
            )
            .await
            {
                Ok(compiled) => {
                    logger.info(repo_name, &format!("Compiled {}", compiled.relative_filepath));
                    if let Some(callback) = &options.on_component_compiled {
                        callback(&compiled);
                    }
                    Some(compiled)
                }
                Err(err) => {
                    logger.warn(
                        repo_name,
                        &format!("Failed to compile {}: {err:#}", component.relative_filepath),
                    );
                    if let Some(callback) = &options.on_component_failed {
                        callback(&component, &err);
                    }
                    None
                }
            }
        }
    })
    .await;

    let _ = std::fs::remove_dir_all(&scratch_dir);

    Ok(results.into_iter().flatten().collect())
}
