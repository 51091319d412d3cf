//! Harvest reconciliation
//!
//! One pass walks every stored local catalog, fetches the remote datasets
//! and distributions it describes and brings the stored mirror in line:
//! new entities are inserted, changed ones refreshed, and harvested
//! records the remote side no longer describes are removed. Records
//! without the `Harvested` tag are never touched.
//!
//! Each catalog is processed independently; a failure is logged with its
//! cause chain and the pass moves on to the next catalog.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use crate::dcat::{Agent, Catalog, Dataset, DcatEntity, Distribution};
use crate::error::{ErrorChain, Result};
use crate::metadata::{
    DeriveContext, FileType, MetadataRecord, SERIE_VALUE, TAG_DISTRIBUTION_COUNT, TAG_FORMATS,
    TAG_HARVESTED, TAG_LOCAL_CATALOG, TAG_SERIE, TAG_URI, TRUE_VALUE,
};
use crate::sparql::HarvestSource;
use crate::storage::{DocumentStorage, StorageQuery, StoredDocument};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LANGUAGE: &str = "sk";

/// Engine options
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestConfig {
    /// Endpoint used for catalogs that do not declare `dcat:endpointURL`
    pub sparql_endpoint: Option<String>,
    pub timeout: Duration,
    /// Language of the titles written to the log
    pub default_language: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            sparql_endpoint: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl HarvestConfig {
    /// Read `DCAT_SPARQL_ENDPOINT`, `DCAT_SPARQL_TIMEOUT_SECS` and
    /// `DCAT_DEFAULT_LANGUAGE`; unset or unparsable values keep defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sparql_endpoint: std::env::var("DCAT_SPARQL_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            timeout: std::env::var("DCAT_SPARQL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            default_language: std::env::var("DCAT_DEFAULT_LANGUAGE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_language),
        }
    }
}

/// Identity records are written under while one catalog is harvested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    publisher: String,
}

impl Principal {
    pub fn new(publisher: impl Into<String>) -> Self {
        Self {
            publisher: publisher.into(),
        }
    }

    /// Canonical URI of the publisher acted for
    pub fn publisher(&self) -> &str {
        &self.publisher
    }
}

/// Switches identity to a catalog's publisher for the duration of its pass
#[async_trait]
pub trait Impersonator: Send + Sync {
    async fn impersonate(&self, publisher_uri: &str, agent: &Agent) -> Result<Principal>;
}

/// Acts as the publisher itself without consulting an identity service
#[derive(Debug, Clone, Copy, Default)]
pub struct PublisherPrincipal;

#[async_trait]
impl Impersonator for PublisherPrincipal {
    async fn impersonate(&self, publisher_uri: &str, _agent: &Agent) -> Result<Principal> {
        Ok(Principal::new(publisher_uri))
    }
}

/// Outcome of reconciling one fetched entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
    Unchanged,
}

struct Reconciled<T> {
    entity: T,
    record: MetadataRecord,
    change: Change,
}

/// Series link to settle once every dataset of a catalog is stored
struct SeriesLink {
    child_id: String,
    parent_uri: Option<String>,
}

/// Per-catalog state shared by the dataset and distribution levels
struct CatalogPass {
    catalog_uri: String,
    endpoint: Option<String>,
    principal: Principal,
}

pub struct Harvester {
    storage: Arc<dyn DocumentStorage>,
    source: Arc<dyn HarvestSource>,
    impersonator: Arc<dyn Impersonator>,
    config: HarvestConfig,
}

impl Harvester {
    pub fn new(
        storage: Arc<dyn DocumentStorage>,
        source: Arc<dyn HarvestSource>,
        config: HarvestConfig,
    ) -> Self {
        Self {
            storage,
            source,
            impersonator: Arc::new(PublisherPrincipal),
            config,
        }
    }

    pub fn with_impersonator(mut self, impersonator: Arc<dyn Impersonator>) -> Self {
        self.impersonator = impersonator;
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Harvest every local catalog. Only failing to list the catalogs is
    /// reported; per-catalog failures are logged.
    pub async fn run(&self) -> Result<()> {
        let catalogs = self
            .storage
            .query(&StorageQuery::of_type(FileType::LocalCatalog))
            .await?;
        info!(count = catalogs.len(), "Harvest started");

        for catalog in &catalogs {
            if let Err(e) = self.harvest_catalog(catalog).await {
                error!(
                    catalog = %catalog.metadata.id(),
                    error = %ErrorChain(&e),
                    "Catalog harvest failed"
                );
            }
        }

        info!(count = catalogs.len(), "Harvest finished");
        Ok(())
    }

    #[instrument(skip(self, catalog), fields(catalog = %catalog.metadata.id()))]
    pub async fn harvest_catalog(&self, catalog: &StoredDocument) -> Result<()> {
        let record = &catalog.metadata;
        let Some((publisher_uri, agent)) = self.resolve_publisher(record).await? else {
            warn!(publisher = ?record.publisher(), "Publisher description not found, catalog skipped");
            return Ok(());
        };
        let principal = self.impersonator.impersonate(&publisher_uri, &agent).await?;

        let local = match catalog.content.as_deref() {
            Some(text) => Catalog::parse(text)?,
            None => None,
        };
        let catalog_uri = record
            .uri()
            .map(str::to_string)
            .or_else(|| local.as_ref().and_then(|c| c.uri().map(str::to_string)));
        let Some(catalog_uri) = catalog_uri else {
            warn!("Catalog has no canonical URI, skipped");
            return Ok(());
        };

        let endpoint = match &local {
            Some(local) => local
                .endpoint_url()
                .or_else(|| self.config.sparql_endpoint.clone()),
            None => None,
        };
        let endpoint = match endpoint {
            Some(endpoint) => match self.source.fetch_catalog(&endpoint, &catalog_uri).await {
                Ok(Some(_)) => Some(endpoint),
                Ok(None) => {
                    warn!(catalog_uri = %catalog_uri, endpoint = %endpoint, "Remote catalog not found");
                    None
                }
                Err(e) => {
                    warn!(
                        catalog_uri = %catalog_uri,
                        endpoint = %endpoint,
                        error = %ErrorChain(&e),
                        "Remote catalog could not be fetched"
                    );
                    None
                }
            },
            None => None,
        };
        if endpoint.is_none() {
            info!(catalog_uri = %catalog_uri, "No remote source, removing harvested datasets");
        }

        let pass = CatalogPass {
            catalog_uri,
            endpoint,
            principal,
        };
        self.harvest_datasets(&pass).await
    }

    /// Publisher URI of a catalog record and its stored agent description
    async fn resolve_publisher(&self, record: &MetadataRecord) -> Result<Option<(String, Agent)>> {
        let Some(publisher) = record.publisher() else {
            return Ok(None);
        };
        let query = StorageQuery::of_type(FileType::Publisher).with_tag(TAG_URI, publisher);
        for doc in self.storage.query(&query).await? {
            if let Some(agent) = doc.content.as_deref().map(Agent::parse).transpose()?.flatten() {
                return Ok(Some((publisher.to_string(), agent)));
            }
        }
        Ok(None)
    }

    async fn harvest_datasets(&self, pass: &CatalogPass) -> Result<()> {
        let scope = StorageQuery::of_type(FileType::Dataset)
            .with_tag(TAG_HARVESTED, TRUE_VALUE)
            .with_tag(TAG_LOCAL_CATALOG, pass.catalog_uri.as_str());
        let ctx = DeriveContext {
            publisher: Some(pass.principal.publisher().to_string()),
            is_public: true,
            ..Default::default()
        }
        .with_tag(TAG_HARVESTED, TRUE_VALUE)
        .with_tag(TAG_LOCAL_CATALOG, pass.catalog_uri.as_str());

        let fetched = match &pass.endpoint {
            Some(endpoint) => self.source.fetch_datasets(endpoint, &pass.catalog_uri).await,
            None => Ok(Vec::new()),
        };
        let outcomes = self
            .reconcile::<Dataset>("dataset", &scope, &ctx, fetched)
            .await?;

        let links: Vec<SeriesLink> = outcomes
            .iter()
            .map(|o| SeriesLink {
                child_id: o.record.id().to_string(),
                parent_uri: o.entity.is_part_of(),
            })
            .collect();

        if let Some(endpoint) = &pass.endpoint {
            // Unchanged datasets too: an earlier pass may have failed midway
            for outcome in &outcomes {
                if let Err(e) = self
                    .harvest_distributions(endpoint, &outcome.entity, &outcome.record, pass)
                    .await
                {
                    error!(
                        dataset = %outcome.record.id(),
                        error = %ErrorChain(&e),
                        "Distribution harvest failed"
                    );
                }
            }
        }

        self.resolve_series(links).await
    }

    #[instrument(skip_all, fields(dataset = %record.id()))]
    async fn harvest_distributions(
        &self,
        endpoint: &str,
        dataset: &Dataset,
        record: &MetadataRecord,
        pass: &CatalogPass,
    ) -> Result<()> {
        let Some(dataset_uri) = dataset.uri() else {
            return Ok(());
        };
        let scope = StorageQuery::of_type(FileType::Distribution)
            .with_parent(record.id())
            .with_tag(TAG_HARVESTED, TRUE_VALUE);
        let ctx = DeriveContext {
            publisher: Some(pass.principal.publisher().to_string()),
            is_public: true,
            parent_id: Some(record.id().to_string()),
            ..Default::default()
        }
        .with_tag(TAG_HARVESTED, TRUE_VALUE);

        let fetched = self.source.fetch_distributions(endpoint, dataset_uri).await;
        let result = self
            .reconcile::<Distribution>("distribution", &scope, &ctx, fetched)
            .await;
        self.refresh_dataset(record.id()).await?;
        result.map(|_| ())
    }

    /// Diff fetched entities of one level against the stored harvested
    /// records in `scope`, keyed by canonical URI.
    ///
    /// Stored records left unmatched are removed whether or not the fetch
    /// or the processing succeeded; records matched by a fetched URI are
    /// never removed.
    async fn reconcile<T: DcatEntity>(
        &self,
        kind: &'static str,
        scope: &StorageQuery,
        ctx: &DeriveContext,
        fetched: Result<Vec<T>>,
    ) -> Result<Vec<Reconciled<T>>> {
        let mut local: HashMap<String, StoredDocument> = HashMap::new();
        let mut orphans = Vec::new();
        for doc in self.storage.query(scope).await? {
            match doc.metadata.uri().map(str::to_string) {
                Some(uri) if !local.contains_key(&uri) => {
                    local.insert(uri, doc);
                }
                _ => orphans.push(doc),
            }
        }

        let processed = match fetched {
            Ok(entities) => {
                let mut matched = HashMap::new();
                for entity in &entities {
                    if let Some(uri) = entity.uri() {
                        if let Some(doc) = local.remove(uri) {
                            matched.insert(uri.to_string(), doc);
                        }
                    }
                }
                self.apply(kind, entities, matched, ctx).await
            }
            Err(e) => Err(e),
        };

        orphans.extend(local.into_values());
        orphans.sort_by(|a, b| a.metadata.id().cmp(b.metadata.id()));
        let removed = orphans.len();
        let cleanup = self.remove_orphans(kind, orphans).await;

        let outcomes = processed?;
        cleanup?;

        let count = |change: Change| outcomes.iter().filter(|o| o.change == change).count();
        info!(
            kind,
            created = count(Change::Created),
            updated = count(Change::Updated),
            unchanged = count(Change::Unchanged),
            removed,
            "Level reconciled"
        );
        Ok(outcomes)
    }

    async fn apply<T: DcatEntity>(
        &self,
        kind: &'static str,
        entities: Vec<T>,
        mut matched: HashMap<String, StoredDocument>,
        ctx: &DeriveContext,
    ) -> Result<Vec<Reconciled<T>>> {
        let mut outcomes = Vec::with_capacity(entities.len());
        let mut seen = HashSet::new();

        for entity in entities {
            let Some(uri) = entity.uri().map(str::to_string) else {
                warn!(kind, "Fetched entity has no URI, skipped");
                continue;
            };
            if !seen.insert(uri.clone()) {
                debug!(kind, uri = %uri, "Duplicate entity in fetch result, skipped");
                continue;
            }

            let text = entity.to_text()?;
            let (record, change) = match matched.remove(&uri) {
                Some(doc) if doc.content.as_deref() == Some(text.as_str()) => {
                    (doc.metadata, Change::Unchanged)
                }
                Some(doc) => {
                    let record = entity.derive_metadata(Some(&doc.metadata), ctx);
                    self.storage.insert_or_update(&record, Some(&text)).await?;
                    (record, Change::Updated)
                }
                None => {
                    let record = entity.derive_metadata(None, ctx);
                    self.storage.insert_or_update(&record, Some(&text)).await?;
                    (record, Change::Created)
                }
            };

            let title = entity
                .display_name()
                .remove(&self.config.default_language)
                .unwrap_or_default();
            match change {
                Change::Unchanged => {
                    debug!(kind, uri = %uri, local_id = %record.id(), "Unchanged")
                }
                Change::Created | Change::Updated => info!(
                    kind,
                    uri = %uri,
                    local_id = %record.id(),
                    title = %title,
                    change = ?change,
                    "Stored"
                ),
            }
            outcomes.push(Reconciled {
                entity,
                record,
                change,
            });
        }
        Ok(outcomes)
    }

    /// Delete orphans, dataset orphans after their harvested distributions.
    /// Keeps going past failures and reports the first one.
    async fn remove_orphans(&self, kind: &'static str, orphans: Vec<StoredDocument>) -> Result<()> {
        let mut first_error = None;
        for orphan in orphans {
            if let Err(e) = self.remove_record(&orphan.metadata).await {
                error!(kind, local_id = %orphan.metadata.id(), error = %ErrorChain(&e), "Removal failed");
                first_error.get_or_insert(e);
                continue;
            }
            info!(
                kind,
                local_id = %orphan.metadata.id(),
                uri = ?orphan.metadata.uri(),
                "Removed"
            );
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn remove_record(&self, record: &MetadataRecord) -> Result<()> {
        if record.file_type() == FileType::Dataset {
            let children = StorageQuery::of_type(FileType::Distribution)
                .with_parent(record.id())
                .with_tag(TAG_HARVESTED, TRUE_VALUE);
            for child in self.storage.query(&children).await? {
                self.storage.delete(child.metadata.id()).await?;
                debug!(local_id = %child.metadata.id(), dataset = %record.id(), "Distribution removed with its dataset");
            }
        }
        self.storage.delete(record.id()).await?;
        Ok(())
    }

    /// Recompute the tags a dataset derives from its distributions; writes
    /// only when they changed
    async fn refresh_dataset(&self, dataset_id: &str) -> Result<()> {
        let Some(dataset) = self.storage.get(dataset_id).await? else {
            return Ok(());
        };
        let distributions = self
            .storage
            .query(&StorageQuery::of_type(FileType::Distribution).with_parent(dataset_id))
            .await?;

        let count = vec![distributions.len().to_string()];
        let mut formats: Vec<String> = distributions
            .iter()
            .flat_map(|d| d.metadata.tag(TAG_FORMATS).iter().cloned())
            .collect();
        formats.sort();
        formats.dedup();

        let record = &dataset.metadata;
        if record.tag(TAG_DISTRIBUTION_COUNT) == count.as_slice()
            && record.tag(TAG_FORMATS) == formats.as_slice()
        {
            return Ok(());
        }

        let updated = record
            .to_builder()
            .tag(TAG_DISTRIBUTION_COUNT, count)
            .tag(TAG_FORMATS, formats)
            .build();
        self.storage
            .insert_or_update(&updated, dataset.content.as_deref())
            .await?;
        debug!(dataset = %dataset_id, "Dataset distribution tags refreshed");
        Ok(())
    }

    /// Mirror `dct:isPartOf` of harvested datasets into record parent
    /// links. Parents are looked up by canonical URI among all stored
    /// datasets; an unknown parent drops the link until a later pass finds
    /// it. No writes when nothing changed.
    async fn resolve_series(&self, links: Vec<SeriesLink>) -> Result<()> {
        for link in links {
            let Some(child) = self.storage.get(&link.child_id).await? else {
                continue;
            };

            let parent = match &link.parent_uri {
                Some(parent_uri) => match self.find_dataset(parent_uri).await? {
                    Some(parent) if parent.metadata.id() == child.metadata.id() => {
                        debug!(dataset = %link.child_id, "Dataset declares itself as its series");
                        None
                    }
                    Some(parent) => Some(parent),
                    None => {
                        warn!(
                            dataset = %link.child_id,
                            parent_uri = %parent_uri,
                            "Series parent not stored, link dropped"
                        );
                        None
                    }
                },
                None => None,
            };

            match parent {
                Some(parent) => {
                    let parent_id = parent.metadata.id().to_string();
                    if !parent.metadata.is_serie() {
                        let updated = parent
                            .metadata
                            .to_builder()
                            .tag(TAG_SERIE, [SERIE_VALUE])
                            .build();
                        self.storage
                            .insert_or_update(&updated, parent.content.as_deref())
                            .await?;
                    }
                    if child.metadata.parent_id() != Some(parent_id.as_str()) {
                        let updated = child
                            .metadata
                            .to_builder()
                            .parent_id(Some(parent_id.clone()))
                            .build();
                        self.storage
                            .insert_or_update(&updated, child.content.as_deref())
                            .await?;
                        info!(dataset = %link.child_id, parent = %parent_id, "Dataset linked to series");
                    }
                }
                None if child.metadata.parent_id().is_some() => {
                    let updated = child.metadata.to_builder().parent_id(None).build();
                    self.storage
                        .insert_or_update(&updated, child.content.as_deref())
                        .await?;
                    info!(dataset = %link.child_id, "Dataset unlinked from series");
                }
                None => {}
            }
        }
        Ok(())
    }

    async fn find_dataset(&self, uri: &str) -> Result<Option<StoredDocument>> {
        let query = StorageQuery::of_type(FileType::Dataset).with_tag(TAG_URI, uri);
        Ok(self.storage.query(&query).await?.into_iter().next())
    }
}
