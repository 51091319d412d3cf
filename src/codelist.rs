//! Codelist (concept scheme) lookups with a time-bounded cache
//!
//! Readers get an immutable [`CodelistSnapshot`]. A stale snapshot is
//! rebuilt by one caller at a time under the refresh lock and published
//! with a single pointer swap, so a reader sees either the old snapshot
//! or the new one, never a partial one.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::dcat::{ConceptScheme, DcatEntity};
use crate::error::{ErrorChain, Result};
use crate::metadata::FileType;
use crate::storage::{DocumentStorage, StorageQuery};

pub const DEFAULT_CODELIST_TTL: Duration = Duration::from_secs(300);

/// Loads every known concept scheme
#[async_trait]
pub trait CodelistProvider: Send + Sync {
    async fn load(&self) -> Result<Vec<ConceptScheme>>;
}

/// Concept schemes stored as `Codelist` records
pub struct StorageCodelistProvider {
    storage: Arc<dyn DocumentStorage>,
}

impl StorageCodelistProvider {
    pub fn new(storage: Arc<dyn DocumentStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl CodelistProvider for StorageCodelistProvider {
    async fn load(&self) -> Result<Vec<ConceptScheme>> {
        let mut schemes = Vec::new();
        let records = self
            .storage
            .query(&StorageQuery::of_type(FileType::Codelist))
            .await?;
        for doc in records {
            let Some(text) = doc.content.as_deref() else {
                continue;
            };
            // One broken codelist must not hide the others
            match ConceptScheme::parse(text) {
                Ok(Some(scheme)) => schemes.push(scheme),
                Ok(None) => {}
                Err(e) => warn!(
                    local_id = %doc.metadata.id(),
                    error = %ErrorChain(&e),
                    "Unreadable codelist skipped"
                ),
            }
        }
        Ok(schemes)
    }
}

/// Immutable view of all schemes at one point in time
#[derive(Debug)]
pub struct CodelistSnapshot {
    schemes: HashMap<String, ConceptScheme>,
    loaded_at: Instant,
}

impl CodelistSnapshot {
    fn new(schemes: Vec<ConceptScheme>) -> Self {
        let schemes = schemes
            .into_iter()
            .filter_map(|s| s.uri().map(str::to_string).map(|uri| (uri, s)))
            .collect();
        Self {
            schemes,
            loaded_at: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    pub fn scheme(&self, uri: &str) -> Option<&ConceptScheme> {
        self.schemes.get(uri)
    }

    pub fn label(&self, scheme: &str, concept: &str, language: &str) -> Option<String> {
        self.scheme(scheme)?.concept(concept)?.label(language)
    }
}

pub struct CodelistCache {
    provider: Arc<dyn CodelistProvider>,
    ttl: Duration,
    current: RwLock<Option<Arc<CodelistSnapshot>>>,
    refresh: Mutex<()>,
}

impl CodelistCache {
    pub fn new(provider: Arc<dyn CodelistProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    fn fresh(&self) -> Option<Arc<CodelistSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|s| s.loaded_at.elapsed() < self.ttl)
            .cloned()
    }

    /// Current snapshot, rebuilt first when missing or older than the TTL
    pub async fn snapshot(&self) -> Result<Arc<CodelistSnapshot>> {
        if let Some(snapshot) = self.fresh() {
            return Ok(snapshot);
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have refreshed while we waited
        if let Some(snapshot) = self.fresh() {
            return Ok(snapshot);
        }

        let snapshot = Arc::new(CodelistSnapshot::new(self.provider.load().await?));
        debug!(schemes = snapshot.len(), "Codelist cache refreshed");
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    pub async fn get_scheme(&self, uri: &str) -> Result<Option<ConceptScheme>> {
        Ok(self.snapshot().await?.scheme(uri).cloned())
    }

    pub async fn get_label(
        &self,
        scheme: &str,
        concept: &str,
        language: &str,
    ) -> Result<Option<String>> {
        Ok(self.snapshot().await?.label(scheme, concept, language))
    }

    /// Force the next lookup to reload
    pub fn invalidate(&self) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
