//! Worker loop: take compile jobs off the queue, run the pipeline,
//! reconcile the results
//!
//! A job is acknowledged exactly once, after the compile + reconcile
//! sequence finishes, whether it succeeded or failed. Failed compilations
//! are not redelivered; the next webhook delivery or a manual refresh
//! triggers the next attempt.

use crate::Result;
use crate::compiler::CompileOptions;
use crate::config::Repository;
use crate::git::Logger;
use crate::orchestrator::compile_repository;
use crate::queue::{CompileJobConsumer, QueueTransport};
use crate::reconciler::{ReconcileOptions, reconcile};
use crate::store::{ComponentStore, RepositoryStore};
use std::sync::Arc;

/// Everything a worker needs to process compile jobs
pub struct WorkerContext {
    pub transport: Arc<dyn QueueTransport>,
    pub repositories: Arc<dyn RepositoryStore>,
    pub components: Arc<dyn ComponentStore>,
    pub compile_options: CompileOptions,
    pub reconcile_options: ReconcileOptions,
}

/// Compile one repository and reconcile the persisted catalog.
///
/// Fatal pipeline errors are logged and swallowed here: the job is finished
/// either way and its message must be acknowledged, not retried. Returns
/// the commit hash on success.
pub async fn process_repository(ctx: &WorkerContext, repository: &Repository) -> Option<String> {
    let logger = Logger;

    let compiled = match compile_repository(repository, &ctx.compile_options).await {
        Ok(compiled) => compiled,
        Err(err) => {
            logger.error(&repository.name, &format!("Compilation failed: {err:#}"));
            return None;
        }
    };

    match reconcile(
        &repository.id,
        &compiled.components,
        ctx.components.as_ref(),
        &ctx.reconcile_options,
    )
    .await
    {
        Ok(summary) => {
            logger.success(
                &repository.name,
                &format!(
                    "Reconciled: {} created, {} updated, {} deleted, {} failed",
                    summary.created, summary.updated, summary.deleted, summary.failed
                ),
            );
            Some(compiled.commit_hash)
        }
        Err(err) => {
            logger.error(&repository.name, &format!("Reconciliation failed: {err:#}"));
            None
        }
    }
}

/// Consume compile jobs until the transport closes.
pub async fn run_worker(ctx: WorkerContext) -> Result<()> {
    let consumer = CompileJobConsumer::new(
        Arc::clone(&ctx.transport),
        Arc::clone(&ctx.repositories),
    );
    let ctx = &ctx;

    consumer
        .run(|job| async move {
            process_repository(ctx, &job.repository).await;
            if let Err(err) = job.ack.ack().await {
                Logger.error(
                    &job.repository.name,
                    &format!("Failed to acknowledge job: {err:#}"),
                );
            }
        })
        .await
}
