//! Persisted component catalog access
//!
//! The pipeline never talks to a database directly; it goes through these
//! traits. [`memory`] backs tests and the in-process worker, [`file`] backs
//! the CLI with plain JSON records on disk.
//!
//! The persistence invariant the reconciler relies on: component records are
//! unique per `(repository_id, filepath)`.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::Result;
use crate::config::Repository;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A persisted component record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredComponent {
    pub id: String,
    pub repository_id: String,
    pub name: String,
    /// Repository-root-relative filepath, the identity key within a
    /// repository
    pub filepath: String,
    /// JSON-serialized documentation object
    pub doc_json: String,
    pub compiled_bundle: String,
}

/// Fields for creating a component record
#[derive(Debug, Clone)]
pub struct NewComponent {
    pub repository_id: String,
    pub name: String,
    pub filepath: String,
    pub doc_json: String,
    pub compiled_bundle: String,
}

/// Access to persisted component records
#[async_trait]
pub trait ComponentStore: Send + Sync {
    /// All components persisted for a repository
    async fn list_components(&self, repository_id: &str) -> Result<Vec<StoredComponent>>;

    /// The component for `(repository_id, filepath)`, if any
    async fn find_component(
        &self,
        repository_id: &str,
        filepath: &str,
    ) -> Result<Option<StoredComponent>>;

    async fn create_component(&self, component: NewComponent) -> Result<StoredComponent>;

    /// Replace the doc and bundle of an existing record in place
    async fn update_component(
        &self,
        id: &str,
        doc_json: &str,
        compiled_bundle: &str,
    ) -> Result<StoredComponent>;

    async fn delete_component(&self, id: &str) -> Result<()>;
}

/// Resolution of repository descriptors by id
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    async fn find_repository(&self, repository_id: &str) -> Result<Option<Repository>>;
}
