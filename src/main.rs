use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use styledash::config::Config;
use styledash::constants;
use styledash::git::Logger;
use styledash::orchestrator::compile_repository;
use styledash::queue::{MemoryTransport, enqueue_compile_job};
use styledash::reconciler::reconcile;
use styledash::store::{ComponentStore, FileStore, RepositoryStore};
use styledash::worker::{WorkerContext, run_worker};

#[derive(Parser)]
#[command(name = "styledash")]
#[command(about = "Compile component library repositories into loadable bundles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile configured repositories and reconcile the component catalog
    Compile {
        /// Specific repository names to compile (if not provided, compiles
        /// all configured repositories)
        repos: Vec<String>,

        /// Configuration file path
        #[arg(short, long, default_value_t = constants::config::DEFAULT_CONFIG_FILE.to_string())]
        config: String,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process queued compile jobs one at a time until the backlog drains
    Worker {
        /// Specific repository names to enqueue (if not provided, enqueues
        /// all configured repositories)
        repos: Vec<String>,

        /// Configuration file path
        #[arg(short, long, default_value_t = constants::config::DEFAULT_CONFIG_FILE.to_string())]
        config: String,
    },

    /// List configured repositories and their persisted component counts
    Ls {
        /// Configuration file path
        #[arg(short, long, default_value_t = constants::config::DEFAULT_CONFIG_FILE.to_string())]
        config: String,

        /// Output in JSON format for machine consumption
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            repos,
            config,
            json,
        } => compile_command(&repos, &config, json).await,
        Commands::Worker { repos, config } => worker_command(&repos, &config).await,
        Commands::Ls { config, json } => ls_command(&config, json).await,
    }
}

async fn compile_command(repos: &[String], config_path: &str, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let repositories = config.filter_by_names(repos);
    if repositories.is_empty() {
        anyhow::bail!("No matching repositories configured in {config_path}");
    }

    let store = FileStore::open(&config.settings.data_dir, config.repositories.clone())?;
    let compile_options = config.compile_options();
    let reconcile_options = config.reconcile_options();
    let logger = Logger;

    let mut rows = Vec::new();
    let mut failures = 0usize;

    for repository in &repositories {
        match compile_repository(repository, &compile_options).await {
            Ok(compiled) => {
                let summary = reconcile(
                    &repository.id,
                    &compiled.components,
                    &store,
                    &reconcile_options,
                )
                .await?;
                rows.push(serde_json::json!({
                    "repository": repository.name,
                    "commit": compiled.commit_hash,
                    "compiled": compiled.components.len(),
                    "created": summary.created,
                    "updated": summary.updated,
                    "deleted": summary.deleted,
                    "failed": summary.failed,
                }));
            }
            Err(err) => {
                failures += 1;
                logger.error(&repository.name, &format!("{err:#}"));
                rows.push(serde_json::json!({
                    "repository": repository.name,
                    "error": format!("{err:#}"),
                }));
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            if let Some(err) = row.get("error") {
                println!("{}: failed: {}", row["repository"].as_str().unwrap_or("?"), err);
            } else {
                println!(
                    "{}: {} compiled, {} created, {} updated, {} deleted",
                    row["repository"].as_str().unwrap_or("?"),
                    row["compiled"],
                    row["created"],
                    row["updated"],
                    row["deleted"],
                );
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} repository compilation(s) failed");
    }
    Ok(())
}

async fn worker_command(repos: &[String], config_path: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    let repositories = config.filter_by_names(repos);
    if repositories.is_empty() {
        anyhow::bail!("No matching repositories configured in {config_path}");
    }

    let store = Arc::new(FileStore::open(
        &config.settings.data_dir,
        config.repositories.clone(),
    )?);
    let transport = Arc::new(MemoryTransport::new());

    for repository in &repositories {
        enqueue_compile_job(transport.as_ref(), &repository.id).await?;
    }
    // Closing after the enqueues makes the worker exit once the backlog is
    // drained
    transport.close();

    let ctx = WorkerContext {
        transport: transport as Arc<dyn styledash::queue::QueueTransport>,
        repositories: Arc::clone(&store) as Arc<dyn RepositoryStore>,
        components: store as Arc<dyn ComponentStore>,
        compile_options: config.compile_options(),
        reconcile_options: config.reconcile_options(),
    };
    run_worker(ctx).await
}

async fn ls_command(config_path: &str, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let store = FileStore::open(&config.settings.data_dir, config.repositories.clone())?;

    let mut rows = Vec::new();
    for repository in &config.repositories {
        let components = store.list_components(&repository.id).await?;
        rows.push(serde_json::json!({
            "id": repository.id,
            "name": repository.name,
            "github": format!("{}/{}", repository.github_username, repository.github_repo),
            "components": components.len(),
        }));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!(
                "{} ({}) - {} components",
                row["name"].as_str().unwrap_or("?"),
                row["github"].as_str().unwrap_or("?"),
                row["components"],
            );
        }
    }
    Ok(())
}
