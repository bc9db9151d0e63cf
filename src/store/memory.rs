//! In-memory store, used by tests and the in-process worker

use super::{ComponentStore, NewComponent, RepositoryStore, StoredComponent};
use crate::Result;
use crate::config::Repository;
use anyhow::bail;
use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    components: Mutex<Vec<StoredComponent>>,
    repositories: Mutex<Vec<Repository>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository so the queue consumer can resolve it
    pub fn add_repository(&self, repository: Repository) {
        self.repositories.lock().unwrap().push(repository);
    }

    /// Total persisted component count, across repositories
    pub fn component_count(&self) -> usize {
        self.components.lock().unwrap().len()
    }
}

#[async_trait]
impl ComponentStore for MemoryStore {
    async fn list_components(&self, repository_id: &str) -> Result<Vec<StoredComponent>> {
        Ok(self
            .components
            .lock()
            .unwrap()
            .iter()
            .filter(|component| component.repository_id == repository_id)
            .cloned()
            .collect())
    }

    async fn find_component(
        &self,
        repository_id: &str,
        filepath: &str,
    ) -> Result<Option<StoredComponent>> {
        Ok(self
            .components
            .lock()
            .unwrap()
            .iter()
            .find(|component| {
                component.repository_id == repository_id && component.filepath == filepath
            })
            .cloned())
    }

    async fn create_component(&self, component: NewComponent) -> Result<StoredComponent> {
        let mut components = self.components.lock().unwrap();
        if components.iter().any(|existing| {
            existing.repository_id == component.repository_id
                && existing.filepath == component.filepath
        }) {
            bail!(
                "Component already exists for repository {} at {}",
                component.repository_id,
                component.filepath
            );
        }

        let stored = StoredComponent {
            id: Uuid::new_v4().to_string(),
            repository_id: component.repository_id,
            name: component.name,
            filepath: component.filepath,
            doc_json: component.doc_json,
            compiled_bundle: component.compiled_bundle,
        };
        components.push(stored.clone());
        Ok(stored)
    }

    async fn update_component(
        &self,
        id: &str,
        doc_json: &str,
        compiled_bundle: &str,
    ) -> Result<StoredComponent> {
        let mut components = self.components.lock().unwrap();
        let Some(component) = components.iter_mut().find(|component| component.id == id) else {
            bail!("No component with id {id}");
        };
        component.doc_json = doc_json.to_string();
        component.compiled_bundle = compiled_bundle.to_string();
        Ok(component.clone())
    }

    async fn delete_component(&self, id: &str) -> Result<()> {
        let mut components = self.components.lock().unwrap();
        let before = components.len();
        components.retain(|component| component.id != id);
        if components.len() == before {
            bail!("No component with id {id}");
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryStore for MemoryStore {
    async fn find_repository(&self, repository_id: &str) -> Result<Option<Repository>> {
        Ok(self
            .repositories
            .lock()
            .unwrap()
            .iter()
            .find(|repository| repository.id == repository_id)
            .cloned())
    }
}
