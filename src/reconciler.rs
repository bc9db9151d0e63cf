//! Reconciliation of compiled components against the persisted catalog
//!
//! Brings the stored component set for a repository in line with the latest
//! successful compilation: matched filepaths are updated in place, new
//! filepaths are created, and stored records whose filepath no longer
//! appears are deleted. Deletion is driven only by what this run actually
//! reconciled - a component that failed to compile is left stale rather
//! than lost.

use crate::Result;
use crate::compiler::CompiledComponent;
use crate::git::Logger;
use crate::pool::run_bounded;
use crate::store::{ComponentStore, NewComponent, StoredComponent};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub type ComponentSavedCallback = Arc<dyn Fn(&StoredComponent, bool) + Send + Sync>;
pub type ComponentDeletedCallback = Arc<dyn Fn(&StoredComponent) + Send + Sync>;

/// Settings for one reconciliation run
#[derive(Clone)]
pub struct ReconcileOptions {
    /// Remove stored components absent from this run's compiled set
    pub delete_old_components: bool,
    /// Save/delete pool size
    pub concurrency: usize,
    /// Invoked after each component is persisted; the flag is true for a
    /// newly created record
    pub on_component_saved: Option<ComponentSavedCallback>,
    /// Invoked immediately before a stale component is deleted
    pub on_component_to_be_deleted: Option<ComponentDeletedCallback>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            delete_old_components: true,
            concurrency: num_cpus::get(),
            on_component_saved: None,
            on_component_to_be_deleted: None,
        }
    }
}

impl std::fmt::Debug for ReconcileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileOptions")
            .field("delete_old_components", &self.delete_old_components)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

/// Net effect of one reconciliation run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Per-item save or delete failures, excluded from the bookkeeping
    pub failed: usize,
}

/// Reconcile `compiled` against the persisted components of
/// `repository_id`.
///
/// Re-running with the same compiled set is a no-op: every lookup hits the
/// existing-match branch and the deletion candidate set is empty. A single
/// item failing to save is logged and skipped; it will be retried by the
/// next full compilation pass.
pub async fn reconcile(
    repository_id: &str,
    compiled: &[CompiledComponent],
    store: &dyn ComponentStore,
    options: &ReconcileOptions,
) -> Result<ReconcileSummary> {
    let logger = Logger;

    // The old set is fetched before any writes; it defines the deletion
    // candidates.
    let old_components: HashMap<String, StoredComponent> = if options.delete_old_components {
        store
            .list_components(repository_id)
            .await?
            .into_iter()
            .map(|component| (component.id.clone(), component))
            .collect()
    } else {
        HashMap::new()
    };

    let new_ids = Mutex::new(HashSet::new());
    let summary = Mutex::new(ReconcileSummary::default());

    run_bounded(options.concurrency, compiled, |component| {
        let new_ids = &new_ids;
        let summary = &summary;
        let logger = &logger;
        async move {
            match save_component(repository_id, component, store).await {
                Ok((stored, is_new)) => {
                    new_ids.lock().unwrap().insert(stored.id.clone());
                    {
                        let mut summary = summary.lock().unwrap();
                        if is_new {
                            summary.created += 1;
                        } else {
                            summary.updated += 1;
                        }
                    }
                    if let Some(callback) = &options.on_component_saved {
                        callback(&stored, is_new);
                    }
                }
                Err(err) => {
                    summary.lock().unwrap().failed += 1;
                    logger.warn(
                        repository_id,
                        &format!(
                            "Failed to save component {}: {err:#}",
                            component.relative_filepath
                        ),
                    );
                }
            }
        }
    })
    .await;

    if options.delete_old_components {
        let new_ids = new_ids.into_inner().unwrap();
        let stale: Vec<StoredComponent> = old_components
            .into_values()
            .filter(|component| !new_ids.contains(&component.id))
            .collect();

        run_bounded(options.concurrency, stale, |component| {
            let summary = &summary;
            let logger = &logger;
            async move {
                if let Some(callback) = &options.on_component_to_be_deleted {
                    callback(&component);
                }
                match store.delete_component(&component.id).await {
                    Ok(()) => summary.lock().unwrap().deleted += 1,
                    Err(err) => {
                        summary.lock().unwrap().failed += 1;
                        logger.warn(
                            repository_id,
                            &format!(
                                "Failed to delete stale component {}: {err:#}",
                                component.filepath
                            ),
                        );
                    }
                }
            }
        })
        .await;
    }

    Ok(summary.into_inner().unwrap())
}

/// Upsert one compiled component, keyed by `(repository_id, filepath)`
async fn save_component(
    repository_id: &str,
    component: &CompiledComponent,
    store: &dyn ComponentStore,
) -> Result<(StoredComponent, bool)> {
    let doc_json = serde_json::to_string(&component.doc)?;

    match store
        .find_component(repository_id, &component.relative_filepath)
        .await?
    {
        Some(existing) => {
            let updated = store
                .update_component(&existing.id, &doc_json, &component.compiled_bundle)
                .await?;
            Ok((updated, false))
        }
        None => {
            let created = store
                .create_component(NewComponent {
                    repository_id: repository_id.to_string(),
                    name: component.name.clone(),
                    filepath: component.relative_filepath.clone(),
                    doc_json,
                    compiled_bundle: component.compiled_bundle.clone(),
                })
                .await?;
            Ok((created, true))
        }
    }
}
