//! Shared fixtures: a scripted remote side and storage seeding helpers

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use dcat_mirror::metadata::{TAG_LOCAL_CATALOG, TAG_URI};
use dcat_mirror::{
    Agent, Catalog, CatalogError, Dataset, DcatEntity, DeriveContext, Distribution, Document,
    DocumentStorage, FileType, HarvestConfig, HarvestSource, Harvester, MemoryStorage,
    MetadataRecord, Result, StorageQuery, StoredDocument,
};

pub const ENDPOINT: &str = "https://sparql.example/query";
pub const PUBLISHER: &str = "https://data.example/agent/ministry";
pub const CATALOG: &str = "https://data.example/catalog/main";

/// Remote side answering from Turtle snippets set up by the test
#[derive(Default)]
pub struct ScriptedSource {
    catalogs: Mutex<HashSet<String>>,
    datasets: Mutex<HashMap<String, Vec<String>>>,
    distributions: Mutex<HashMap<String, Vec<String>>>,
    failing: Mutex<HashSet<String>>,
    failing_lookups: Mutex<HashSet<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish_catalog(&self, uri: &str) {
        self.catalogs.lock().unwrap().insert(uri.to_string());
    }

    pub fn withdraw_catalog(&self, uri: &str) {
        self.catalogs.lock().unwrap().remove(uri);
    }

    pub fn set_datasets(&self, catalog_uri: &str, texts: Vec<String>) {
        self.datasets
            .lock()
            .unwrap()
            .insert(catalog_uri.to_string(), texts);
    }

    pub fn set_distributions(&self, dataset_uri: &str, texts: Vec<String>) {
        self.distributions
            .lock()
            .unwrap()
            .insert(dataset_uri.to_string(), texts);
    }

    /// Make every fetch for this catalog or dataset URI fail
    pub fn fail(&self, uri: &str) {
        self.failing.lock().unwrap().insert(uri.to_string());
    }

    pub fn heal(&self, uri: &str) {
        self.failing.lock().unwrap().remove(uri);
    }

    /// Make the existence check of this catalog fail
    pub fn fail_catalog_lookup(&self, catalog_uri: &str) {
        self.failing_lookups
            .lock()
            .unwrap()
            .insert(catalog_uri.to_string());
    }

    fn check(&self, uri: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(uri) {
            return Err(CatalogError::Fetch {
                endpoint: ENDPOINT.to_string(),
                reason: format!("scripted failure for {}", uri),
            });
        }
        Ok(())
    }

    fn document(texts: Option<Vec<String>>) -> Result<Document> {
        Document::parse(&texts.unwrap_or_default().join("\n"))
    }
}

#[async_trait]
impl HarvestSource for ScriptedSource {
    async fn fetch_catalog(&self, _endpoint: &str, catalog_uri: &str) -> Result<Option<Catalog>> {
        if self.failing_lookups.lock().unwrap().contains(catalog_uri) {
            return Err(CatalogError::Fetch {
                endpoint: ENDPOINT.to_string(),
                reason: format!("scripted catalog lookup failure for {}", catalog_uri),
            });
        }
        if !self.catalogs.lock().unwrap().contains(catalog_uri) {
            return Ok(None);
        }
        Catalog::create(catalog_uri).map(Some)
    }

    async fn fetch_datasets(&self, _endpoint: &str, catalog_uri: &str) -> Result<Vec<Dataset>> {
        self.check(catalog_uri)?;
        let texts = self.datasets.lock().unwrap().get(catalog_uri).cloned();
        Ok(Self::document(texts)?.datasets)
    }

    async fn fetch_distributions(
        &self,
        _endpoint: &str,
        dataset_uri: &str,
    ) -> Result<Vec<Distribution>> {
        self.check(dataset_uri)?;
        let texts = self.distributions.lock().unwrap().get(dataset_uri).cloned();
        Ok(Self::document(texts)?.distributions)
    }
}

pub struct Fixture {
    pub storage: Arc<MemoryStorage>,
    pub source: Arc<ScriptedSource>,
}

impl Fixture {
    /// Storage holding the publisher and the main catalog, published remotely
    pub async fn new() -> Self {
        let fixture = Self {
            storage: Arc::new(MemoryStorage::new()),
            source: Arc::new(ScriptedSource::new()),
        };
        fixture.add_publisher().await;
        fixture.add_catalog(CATALOG).await;
        fixture.source.publish_catalog(CATALOG);
        fixture
    }

    pub fn harvester(&self) -> Harvester {
        Harvester::new(
            self.storage.clone(),
            self.source.clone(),
            HarvestConfig::default(),
        )
    }

    pub async fn add_publisher(&self) -> MetadataRecord {
        let agent = Agent::create(PUBLISHER).unwrap();
        agent.set_names([("sk", "Ministerstvo"), ("en", "Ministry")]);
        let ctx = DeriveContext {
            publisher: Some(PUBLISHER.to_string()),
            ..Default::default()
        };
        self.store(&agent, &ctx).await
    }

    pub async fn add_catalog(&self, uri: &str) -> MetadataRecord {
        let catalog = Catalog::create(uri).unwrap();
        catalog.set_titles([("sk", "Katalóg")]);
        catalog.set_publisher(Some(PUBLISHER));
        catalog.set_endpoint_url(Some(ENDPOINT));
        let ctx = DeriveContext {
            publisher: Some(PUBLISHER.to_string()),
            ..Default::default()
        };
        self.store(&catalog, &ctx).await
    }

    pub async fn store<T: DcatEntity>(&self, entity: &T, ctx: &DeriveContext) -> MetadataRecord {
        let record = entity.derive_metadata(None, ctx);
        self.storage
            .insert_or_update(&record, Some(&entity.to_text().unwrap()))
            .await
            .unwrap();
        record
    }

    /// Harvested datasets stored under a catalog
    pub async fn datasets_of(&self, catalog_uri: &str) -> Vec<StoredDocument> {
        self.storage
            .query(
                &StorageQuery::of_type(FileType::Dataset).with_tag(TAG_LOCAL_CATALOG, catalog_uri),
            )
            .await
            .unwrap()
    }

    pub async fn find(&self, file_type: FileType, uri: &str) -> Vec<StoredDocument> {
        self.storage
            .query(&StorageQuery::of_type(file_type).with_tag(TAG_URI, uri))
            .await
            .unwrap()
    }

    pub async fn find_one(&self, file_type: FileType, uri: &str) -> StoredDocument {
        let mut found = self.find(file_type, uri).await;
        assert_eq!(found.len(), 1, "expected exactly one record for {}", uri);
        found.remove(0)
    }

    pub async fn distributions_of(&self, dataset_id: &str) -> Vec<StoredDocument> {
        self.storage
            .query(&StorageQuery::of_type(FileType::Distribution).with_parent(dataset_id))
            .await
            .unwrap()
    }
}

pub fn dataset_ttl(uri: &str, title: &str, part_of: Option<&str>) -> String {
    let dataset = Dataset::create(uri).unwrap();
    dataset.set_titles([("sk", title)]);
    dataset.set_keywords(&[("sk".to_string(), vec!["kľúčové".to_string()])].into());
    dataset.set_is_part_of(part_of);
    dataset.to_text().unwrap()
}

pub fn distribution_ttl(uri: &str, format: &str) -> String {
    let distribution = Distribution::create(uri).unwrap();
    distribution.set_titles([("sk", "Súbor")]);
    distribution.set_format(Some(format));
    distribution.set_download_url(Some(&format!("{}/download", uri)));
    distribution.to_text().unwrap()
}

/// Dataset whose temporal coverage is two blank `dct:PeriodOfTime` nodes,
/// written as raw Turtle so every parse mints new blank node labels
pub fn dataset_with_periods_ttl(uri: &str, title: &str) -> String {
    format!(
        r#"
@prefix dcat: <http://www.w3.org/ns/dcat#> .
@prefix dct: <http://purl.org/dc/terms/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

<{uri}> a dcat:Dataset ;
    dct:title "{title}"@sk ;
    dct:temporal [ a dct:PeriodOfTime ; dcat:startDate "2020-01-01"^^xsd:date ] ,
                 [ a dct:PeriodOfTime ; dcat:startDate "2021-01-01"^^xsd:date ] .
"#
    )
}
