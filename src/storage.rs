//! Record storage consumed by the harvester
//!
//! Every stored entity is a [`MetadataRecord`] plus its optional Turtle
//! content. Storage is safe for concurrent use at single-record
//! granularity; nothing here spans more than one record.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::metadata::{FileType, MetadataRecord};

/// A record together with its serialized entity
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub metadata: MetadataRecord,
    pub content: Option<String>,
}

/// Record filter. Empty fields do not restrict the result; every listed
/// tag must carry at least one of the given values.
#[derive(Debug, Clone, Default)]
pub struct StorageQuery {
    pub types: Vec<FileType>,
    pub parent_id: Option<String>,
    pub publisher: Option<String>,
    pub tags: BTreeMap<String, Vec<String>>,
    pub ids: Vec<String>,
}

impl StorageQuery {
    pub fn of_type(file_type: FileType) -> Self {
        Self {
            types: vec![file_type],
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.tags
            .entry(key.to_string())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.ids.push(id.into());
        self
    }

    pub fn matches(&self, record: &MetadataRecord) -> bool {
        if !self.types.is_empty() && !self.types.contains(&record.file_type()) {
            return false;
        }
        if !self.ids.is_empty() && !self.ids.iter().any(|id| id == record.id()) {
            return false;
        }
        if self.parent_id.is_some() && self.parent_id.as_deref() != record.parent_id() {
            return false;
        }
        if self.publisher.is_some() && self.publisher.as_deref() != record.publisher() {
            return false;
        }
        self.tags.iter().all(|(key, wanted)| {
            let values = record.tag(key);
            wanted.iter().any(|w| values.contains(w))
        })
    }
}

/// Storage collaborator
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<StoredDocument>>;

    async fn query(&self, query: &StorageQuery) -> Result<Vec<StoredDocument>>;

    /// Insert, or overwrite the record with the same id
    async fn insert_or_update(&self, metadata: &MetadataRecord, content: Option<&str>) -> Result<()>;

    /// Returns false when no record had this id
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Overwrite a record's metadata, keeping its content
    async fn update_metadata(&self, metadata: &MetadataRecord) -> Result<()> {
        let current = self
            .get(metadata.id())
            .await?
            .ok_or_else(|| CatalogError::NotFound(metadata.id().to_string()))?;
        self.insert_or_update(metadata, current.content.as_deref())
            .await
    }

    /// Local id of the series a dataset is part of
    async fn get_parent_dataset(&self, id: &str) -> Result<Option<String>> {
        Ok(self
            .get(id)
            .await?
            .filter(|doc| doc.metadata.file_type() == FileType::Dataset)
            .and_then(|doc| doc.metadata.parent_id().map(str::to_string)))
    }
}

/// In-memory storage, mainly for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<BTreeMap<String, StoredDocument>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts, updates and deletes performed so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStorage for MemoryStorage {
    async fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn query(&self, query: &StorageQuery) -> Result<Vec<StoredDocument>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|doc| query.matches(&doc.metadata))
            .cloned()
            .collect())
    }

    async fn insert_or_update(&self, metadata: &MetadataRecord, content: Option<&str>) -> Result<()> {
        self.records.write().await.insert(
            metadata.id().to_string(),
            StoredDocument {
                metadata: metadata.clone(),
                content: content.map(str::to_string),
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.records.write().await.remove(id).is_some();
        if removed {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }
}

const CONTENT_EXTENSION: &str = "ttl";
const METADATA_EXTENSION: &str = "json";

/// Directory-backed storage: `<id>.json` holds the record, `<id>.ttl` the
/// content
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open a storage directory, creating it when missing
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, id: &str, extension: &str) -> Result<PathBuf> {
        if id.is_empty()
            || id.starts_with('.')
            || id.contains(['/', '\\'])
            || id.contains("..")
        {
            return Err(CatalogError::Storage(format!("invalid record id '{}'", id)));
        }
        Ok(self.root.join(format!("{}.{}", id, extension)))
    }

    async fn read_optional(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_optional(path: &Path) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self, id: &str) -> Result<Option<StoredDocument>> {
        let Some(json) = Self::read_optional(&self.path(id, METADATA_EXTENSION)?).await? else {
            return Ok(None);
        };
        let metadata: MetadataRecord = serde_json::from_str(&json)?;
        let content = Self::read_optional(&self.path(id, CONTENT_EXTENSION)?).await?;
        Ok(Some(StoredDocument { metadata, content }))
    }
}

#[async_trait]
impl DocumentStorage for FileStorage {
    async fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
        self.load(id).await
    }

    async fn query(&self, query: &StorageQuery) -> Result<Vec<StoredDocument>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(METADATA_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();

        let mut found = Vec::new();
        for id in ids {
            if let Some(doc) = self.load(&id).await? {
                if query.matches(&doc.metadata) {
                    found.push(doc);
                }
            }
        }
        Ok(found)
    }

    async fn insert_or_update(&self, metadata: &MetadataRecord, content: Option<&str>) -> Result<()> {
        let id = metadata.id();
        let content_path = self.path(id, CONTENT_EXTENSION)?;
        match content {
            Some(text) => fs::write(&content_path, text).await?,
            None => {
                Self::remove_optional(&content_path).await?;
            }
        }

        // The record file is the one queries look for; replace it last
        let metadata_path = self.path(id, METADATA_EXTENSION)?;
        let staging = self.root.join(format!(".{}.{}.tmp", id, METADATA_EXTENSION));
        fs::write(&staging, serde_json::to_vec_pretty(metadata)?).await?;
        fs::rename(&staging, &metadata_path).await?;

        debug!(local_id = %id, path = %metadata_path.display(), "Record written");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let existed = Self::remove_optional(&self.path(id, METADATA_EXTENSION)?).await?;
        Self::remove_optional(&self.path(id, CONTENT_EXTENSION)?).await?;
        if existed {
            debug!(local_id = %id, "Record deleted");
        }
        Ok(existed)
    }
}
