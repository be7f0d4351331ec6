//! Persistence boundary
//!
//! The workflow engine reads and writes records only through [`Store`], which is
//! handed to it explicitly. [`MemoryStore`] backs tests and embedded use;
//! [`YamlStore`] keeps one YAML file per record in a project directory.
//! Neither does concurrency control: the last write wins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::entity::EntityKind;
use crate::core::identity::{EntityId, RevisionId};
use crate::entities::{Entity, Revision};
use crate::yaml::{parse_yaml_file, YamlError};

/// File suffix for stored records
const RECORD_SUFFIX: &str = ".psv.yaml";

#[derive(Debug, Error, miette::Diagnostic)]
pub enum StoreError {
    #[error("{what} not found: {id}")]
    #[diagnostic(code(psvt::store::not_found))]
    NotFound { what: &'static str, id: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("failed to serialize {id}: {message}")]
    #[diagnostic(code(psvt::store::serialize))]
    Serialize { id: String, message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(psvt::io))]
    Io(#[from] std::io::Error),
}

impl StoreError {
    fn entity_not_found(id: &EntityId) -> Self {
        StoreError::NotFound {
            what: "entity",
            id: id.to_string(),
        }
    }

    fn revision_not_found(id: &RevisionId) -> Self {
        StoreError::NotFound {
            what: "revision",
            id: id.to_string(),
        }
    }
}

/// Record storage consumed by the ledger and controller
pub trait Store {
    fn load(&self, id: &EntityId) -> Result<Entity, StoreError>;

    fn save(&mut self, entity: &Entity) -> Result<(), StoreError>;

    /// Every stored entity, in no particular order
    fn list(&self) -> Result<Vec<Entity>, StoreError>;

    /// Revisions belonging to one entity, in no particular order
    fn load_revisions(
        &self,
        entity_type: EntityKind,
        entity_id: &EntityId,
    ) -> Result<Vec<Revision>, StoreError>;

    fn load_revision(&self, id: &RevisionId) -> Result<Revision, StoreError>;

    fn save_revision(&mut self, revision: &Revision) -> Result<(), StoreError>;

    fn delete_revision(&mut self, id: &RevisionId) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: HashMap<EntityId, Entity>,
    revisions: HashMap<RevisionId, Revision>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn load(&self, id: &EntityId) -> Result<Entity, StoreError> {
        self.entities
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::entity_not_found(id))
    }

    fn save(&mut self, entity: &Entity) -> Result<(), StoreError> {
        self.entities.insert(entity.id, entity.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Entity>, StoreError> {
        Ok(self.entities.values().cloned().collect())
    }

    fn load_revisions(
        &self,
        entity_type: EntityKind,
        entity_id: &EntityId,
    ) -> Result<Vec<Revision>, StoreError> {
        Ok(self
            .revisions
            .values()
            .filter(|r| r.entity_type == entity_type && r.entity_id == *entity_id)
            .cloned()
            .collect())
    }

    fn load_revision(&self, id: &RevisionId) -> Result<Revision, StoreError> {
        self.revisions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::revision_not_found(id))
    }

    fn save_revision(&mut self, revision: &Revision) -> Result<(), StoreError> {
        self.revisions.insert(revision.id, revision.clone());
        Ok(())
    }

    fn delete_revision(&mut self, id: &RevisionId) -> Result<(), StoreError> {
        self.revisions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::revision_not_found(id))
    }
}

/// File-backed store: `entities/<kind>/<ID>.psv.yaml` and `revisions/<ID>.psv.yaml`
#[derive(Debug, Clone)]
pub struct YamlStore {
    root: PathBuf,
}

impl YamlStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entities_dir(&self) -> PathBuf {
        self.root.join("entities")
    }

    fn revisions_dir(&self) -> PathBuf {
        self.root.join("revisions")
    }

    fn entity_path(&self, id: &EntityId) -> PathBuf {
        self.entities_dir()
            .join(id.kind().dir_name())
            .join(format!("{}{}", id, RECORD_SUFFIX))
    }

    fn revision_path(&self, id: &RevisionId) -> PathBuf {
        self.revisions_dir().join(format!("{}{}", id, RECORD_SUFFIX))
    }

    fn write_yaml<T: serde::Serialize>(path: &Path, id: &str, value: &T) -> Result<(), StoreError> {
        let content = serde_yml::to_string(value).map_err(|e| StoreError::Serialize {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// All record files under `dir`
    fn record_files(dir: &Path) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(RECORD_SUFFIX))
            .map(|e| e.into_path())
    }

    fn load_all_revisions(&self) -> Result<Vec<Revision>, StoreError> {
        Self::record_files(&self.revisions_dir())
            .map(|path| parse_yaml_file::<Revision>(&path).map_err(StoreError::from))
            .collect()
    }
}

impl Store for YamlStore {
    fn load(&self, id: &EntityId) -> Result<Entity, StoreError> {
        let path = self.entity_path(id);
        if !path.exists() {
            return Err(StoreError::entity_not_found(id));
        }
        Ok(parse_yaml_file(&path)?)
    }

    fn save(&mut self, entity: &Entity) -> Result<(), StoreError> {
        let path = self.entity_path(&entity.id);
        tracing::debug!(path = %path.display(), "writing entity");
        Self::write_yaml(&path, &entity.id.to_string(), entity)
    }

    fn list(&self) -> Result<Vec<Entity>, StoreError> {
        Self::record_files(&self.entities_dir())
            .map(|path| parse_yaml_file::<Entity>(&path).map_err(StoreError::from))
            .collect()
    }

    fn load_revisions(
        &self,
        entity_type: EntityKind,
        entity_id: &EntityId,
    ) -> Result<Vec<Revision>, StoreError> {
        Ok(self
            .load_all_revisions()?
            .into_iter()
            .filter(|r| r.entity_type == entity_type && r.entity_id == *entity_id)
            .collect())
    }

    fn load_revision(&self, id: &RevisionId) -> Result<Revision, StoreError> {
        let path = self.revision_path(id);
        if !path.exists() {
            return Err(StoreError::revision_not_found(id));
        }
        Ok(parse_yaml_file(&path)?)
    }

    fn save_revision(&mut self, revision: &Revision) -> Result<(), StoreError> {
        let path = self.revision_path(&revision.id);
        tracing::debug!(path = %path.display(), "writing revision");
        Self::write_yaml(&path, &revision.id.to_string(), revision)
    }

    fn delete_revision(&mut self, id: &RevisionId) -> Result<(), StoreError> {
        let path = self.revision_path(id);
        if !path.exists() {
            return Err(StoreError::revision_not_found(id));
        }
        fs::remove_file(path)?;
        Ok(())
    }
}
