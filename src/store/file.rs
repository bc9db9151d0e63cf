//! File-backed store: one JSON document per component record
//!
//! Layout: `<root>/<sanitized repository id>/<record id>.json`. Good enough
//! for the CLI and for small catalogs; anything larger belongs behind the
//! same traits with a real database.

use super::{ComponentStore, NewComponent, RepositoryStore, StoredComponent};
use crate::Result;
use crate::config::Repository;
use crate::utils::sanitize_for_filename;
use anyhow::{Context, bail};
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

pub struct FileStore {
    root: PathBuf,
    repositories: Vec<Repository>,
}

impl FileStore {
    /// Open (or create) a store rooted at `root`. `repositories` backs the
    /// [`RepositoryStore`] side, typically straight from the config file.
    pub fn open(root: impl Into<PathBuf>, repositories: Vec<Repository>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create store directory {}", root.display()))?;
        Ok(Self { root, repositories })
    }

    fn repository_dir(&self, repository_id: &str) -> PathBuf {
        self.root.join(sanitize_for_filename(repository_id))
    }

    fn record_path(&self, repository_id: &str, id: &str) -> PathBuf {
        self.repository_dir(repository_id)
            .join(format!("{id}.json"))
    }

    fn read_record(&self, path: &PathBuf) -> Result<StoredComponent> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read component record {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed component record {}", path.display()))
    }

    fn write_record(&self, component: &StoredComponent) -> Result<()> {
        let dir = self.repository_dir(&component.repository_id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = self.record_path(&component.repository_id, &component.id);
        std::fs::write(&path, serde_json::to_string_pretty(component)?)
            .with_context(|| format!("Failed to write component record {}", path.display()))
    }

    /// All records across every repository directory; used for id-keyed
    /// update and delete
    fn all_records(&self) -> Result<Vec<(PathBuf, StoredComponent)>> {
        let mut records = Vec::new();
        for repo_entry in std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read store directory {}", self.root.display()))?
        {
            let repo_dir = repo_entry?.path();
            if !repo_dir.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(&repo_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    let record = self.read_record(&path)?;
                    records.push((path, record));
                }
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl ComponentStore for FileStore {
    async fn list_components(&self, repository_id: &str) -> Result<Vec<StoredComponent>> {
        let dir = self.repository_dir(repository_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut components = Vec::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                components.push(self.read_record(&path)?);
            }
        }
        Ok(components)
    }

    async fn find_component(
        &self,
        repository_id: &str,
        filepath: &str,
    ) -> Result<Option<StoredComponent>> {
        Ok(self
            .list_components(repository_id)
            .await?
            .into_iter()
            .find(|component| component.filepath == filepath))
    }

    async fn create_component(&self, component: NewComponent) -> Result<StoredComponent> {
        if self
            .find_component(&component.repository_id, &component.filepath)
            .await?
            .is_some()
        {
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
        self.write_record(&stored)?;
        Ok(stored)
    }

    async fn update_component(
        &self,
        id: &str,
        doc_json: &str,
        compiled_bundle: &str,
    ) -> Result<StoredComponent> {
        for (_, mut record) in self.all_records()? {
            if record.id == id {
                record.doc_json = doc_json.to_string();
                record.compiled_bundle = compiled_bundle.to_string();
                self.write_record(&record)?;
                return Ok(record);
            }
        }
        bail!("No component with id {id}");
    }

    async fn delete_component(&self, id: &str) -> Result<()> {
        for (path, record) in self.all_records()? {
            if record.id == id {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to delete {}", path.display()))?;
                return Ok(());
            }
        }
        bail!("No component with id {id}");
    }
}

#[async_trait]
impl RepositoryStore for FileStore {
    async fn find_repository(&self, repository_id: &str) -> Result<Option<Repository>> {
        Ok(self
            .repositories
            .iter()
            .find(|repository| repository.id == repository_id)
            .cloned())
    }
}
